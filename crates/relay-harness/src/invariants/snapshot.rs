//! Observable engine state extracted for invariant checking.

use std::collections::HashMap;

/// A point-in-time (or whole-run, for history fields) view of one or more
/// communicators under test.
///
/// Occupancy fields describe a single instant; `sent_sequences` and
/// `transmissions_per_sequence` accumulate across an entire simulated
/// session, since properties like "sequence numbers strictly increase" are
/// only meaningful over history.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Occupied TX slots at the time of capture.
    pub tx_occupied: usize,
    /// Total TX slot capacity at the time of capture.
    pub tx_capacity: usize,
    /// Occupied RX slots at the time of capture.
    pub rx_occupied: usize,
    /// Total RX slot capacity at the time of capture.
    pub rx_capacity: usize,
    /// Sequence numbers assigned by `send`, in assignment order.
    pub sent_sequences: Vec<u32>,
    /// Count of frames transmitted on the wire, keyed by sequence number.
    pub transmissions_per_sequence: HashMap<u32, u8>,
}

impl SystemSnapshot {
    /// An empty snapshot: no occupancy, no history. Trivially passes every
    /// invariant.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record one occupied/capacity observation, overwriting any prior one.
    pub fn with_occupancy(mut self, tx_occupied: usize, tx_capacity: usize, rx_occupied: usize, rx_capacity: usize) -> Self {
        self.tx_occupied = tx_occupied;
        self.tx_capacity = tx_capacity;
        self.rx_occupied = rx_occupied;
        self.rx_capacity = rx_capacity;
        self
    }

    /// Append a sequence number to the send history.
    pub fn record_sent(&mut self, sequence: u32) {
        self.sent_sequences.push(sequence);
    }

    /// Record one more transmission of `sequence` on the wire.
    pub fn record_transmission(&mut self, sequence: u32) {
        *self.transmissions_per_sequence.entry(sequence).or_insert(0) += 1;
    }
}
