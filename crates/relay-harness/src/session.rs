//! A two-party simulated session: two communicators joined by a pair of
//! [`LossyChannel`]s, driven tick by tick.

use relay_core::{Communicator, CommunicatorConfig, scheduler::TxAction};
use relay_proto::Frame;

use crate::{channel::FaultProfile, invariants::SystemSnapshot, LossyChannel};

/// Two communicators wired together through independent lossy channels in
/// each direction, with an accumulated [`SystemSnapshot`] of everything
/// transmitted so far.
#[derive(Debug)]
pub struct LossySession {
    /// The first party.
    pub a: Communicator,
    /// The second party.
    pub b: Communicator,
    a_to_b: LossyChannel,
    b_to_a: LossyChannel,
    now_ms: u64,
    tick_ms: u64,
    /// Accumulated history for invariant checking.
    pub history: SystemSnapshot,
}

impl LossySession {
    /// Construct a session where both parties share `config`, the channel in
    /// each direction is seeded from `seed` (offset by direction so the two
    /// are independent), and `tick_ms` advances the simulated clock per
    /// [`LossySession::tick`].
    #[must_use]
    pub fn new(config: CommunicatorConfig, seed: u64, profile: FaultProfile, tick_ms: u64) -> Self {
        Self {
            a: Communicator::new(config),
            b: Communicator::new(config),
            a_to_b: LossyChannel::new(seed, profile),
            b_to_a: LossyChannel::new(seed.wrapping_add(1), profile),
            now_ms: 0,
            tick_ms,
            history: SystemSnapshot::empty(),
        }
    }

    /// Advance the simulated clock by one tick, driving both communicators'
    /// TX schedulers and RX dispatchers and ferrying bytes across the
    /// channels in both directions.
    pub fn tick(&mut self) {
        self.now_ms += self.tick_ms;

        if let Some(TxAction::Transmit(frame)) = self.a.spin_tx(self.now_ms) {
            self.record_send(&frame);
            self.deliver(&frame, Direction::AtoB);
        }
        if let Some(TxAction::Transmit(frame)) = self.b.spin_tx(self.now_ms) {
            self.record_send(&frame);
            self.deliver(&frame, Direction::BtoA);
        }

        for TxAction::Transmit(frame) in self.a.spin_rx() {
            self.deliver(&frame, Direction::AtoB);
        }
        for TxAction::Transmit(frame) in self.b.spin_rx() {
            self.deliver(&frame, Direction::BtoA);
        }
    }

    /// Run `n` ticks in sequence.
    pub fn run_ticks(&mut self, n: u32) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Capture a fresh occupancy snapshot merged with the accumulated
    /// transmission history.
    #[must_use]
    pub fn snapshot(&self) -> SystemSnapshot {
        let mut snapshot = self.history.clone();
        snapshot.tx_occupied = self.a.tx_occupied().max(self.b.tx_occupied());
        snapshot.tx_capacity = usize::from(self.a.queue_size());
        snapshot.rx_occupied = self.a.rx_occupied().max(self.b.rx_occupied());
        snapshot.rx_capacity = usize::from(self.a.queue_size());
        snapshot
    }

    fn record_send(&mut self, frame: &Frame) {
        self.history.record_transmission(frame.sequence);
        if self.history.transmissions_per_sequence.get(&frame.sequence) == Some(&1) {
            self.history.record_sent(frame.sequence);
        }
    }

    fn deliver(&mut self, frame: &Frame, direction: Direction) {
        let wire = frame.encode();
        match direction {
            Direction::AtoB => {
                let arrived = self.a_to_b.transmit(&wire);
                self.b.on_bytes(&arrived);
            },
            Direction::BtoA => {
                let arrived = self.b_to_a.transmit(&wire);
                self.a.on_bytes(&arrived);
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    AtoB,
    BtoA,
}
