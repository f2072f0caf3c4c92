//! Invariant checks over simulated sessions on a lossy channel.
//!
//! These verify the quantified properties from the transport engine's
//! testable-properties section, not single fixed scenarios.

use relay_core::scheduler::TxAction;
use relay_core::{CommunicatorConfig, status::new_tracker};
use relay_harness::{FaultProfile, InvariantRegistry, LossySession};
use relay_proto::Message;

#[test]
fn invariants_hold_across_many_seeds() {
    let config = CommunicatorConfig::default();
    let profile = FaultProfile { drop_probability: 0.15, corrupt_probability: 0.15 };

    for seed in 0..8u64 {
        let mut session = LossySession::new(config, seed, profile, 20);
        for id in 0..config.queue_size {
            let tracker = new_tracker();
            let _ = session.a.send(Message::empty(id).with_priority((id % 8) as u8), true, Some(tracker));
        }
        session.run_ticks(100);

        let registry = InvariantRegistry::standard(config.max_transmissions);
        registry.assert_all(&session.snapshot(), &format!("seed {seed}"));
    }
}

#[test]
fn heavy_loss_still_terminates_every_message() {
    let config = CommunicatorConfig { queue_size: 2, receipt_timeout_ms: 10, max_transmissions: 3 };
    let profile = FaultProfile { drop_probability: 0.8, corrupt_probability: 0.0 };
    let mut session = LossySession::new(config, 42, profile, 10);

    let trackers: Vec<_> = (0..2)
        .map(|id| {
            let tracker = new_tracker();
            session.a.send(Message::empty(id), true, Some(tracker.clone())).unwrap();
            tracker
        })
        .collect();

    session.run_ticks(200);

    for tracker in trackers {
        assert!(tracker.lock().unwrap().is_terminal());
    }
}

#[test]
fn priority_message_is_dispatched_before_a_lower_priority_retransmit_backlog() {
    let config = CommunicatorConfig::default();
    let mut session = LossySession::new(config, 5, FaultProfile::clean(), 20);

    session.a.send(Message::empty(1).with_priority(1), false, None).unwrap();
    session.a.send(Message::empty(2).with_priority(9), false, None).unwrap();

    let first = session.a.spin_tx(20).unwrap();
    let TxAction::Transmit(frame) = first;
    assert_eq!(frame.message.priority(), 9);
}
