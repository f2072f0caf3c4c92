//! Standard invariant checks.
//!
//! These invariants capture the quantified properties the transport engine
//! must hold, not specific test scenarios.

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// No slot is ever occupied beyond its queue's capacity.
pub struct SlotOccupancyWithinCapacity;

impl Invariant for SlotOccupancyWithinCapacity {
    fn name(&self) -> &'static str {
        "slot_occupancy_within_capacity"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        if state.tx_occupied > state.tx_capacity {
            return Err(Violation {
                invariant: self.name(),
                message: format!("TX occupied {} exceeds capacity {}", state.tx_occupied, state.tx_capacity),
            });
        }
        if state.rx_occupied > state.rx_capacity {
            return Err(Violation {
                invariant: self.name(),
                message: format!("RX occupied {} exceeds capacity {}", state.rx_occupied, state.rx_capacity),
            });
        }
        Ok(())
    }
}

/// Sequence numbers assigned by `send` strictly increase, ignoring the
/// single wraparound from `u32::MAX` back to `0`.
pub struct SequenceNumbersStrictlyIncreasing;

impl Invariant for SequenceNumbersStrictlyIncreasing {
    fn name(&self) -> &'static str {
        "sequence_numbers_strictly_increasing"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for window in state.sent_sequences.windows(2) {
            let (prev, next) = (window[0], window[1]);
            if next <= prev && !(prev == u32::MAX && next == 0) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("sequence did not increase: {prev} -> {next}"),
                });
            }
        }
        Ok(())
    }
}

/// No sequence number is transmitted on the wire more than `max_transmissions` times.
pub struct MaxTransmissionsBound {
    /// The configured ceiling to check against.
    pub max_transmissions: u8,
}

impl Invariant for MaxTransmissionsBound {
    fn name(&self) -> &'static str {
        "max_transmissions_bound"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (&sequence, &count) in &state.transmissions_per_sequence {
            if count > self.max_transmissions {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "sequence {sequence} transmitted {count} times, exceeding max_transmissions {}",
                        self.max_transmissions
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_passes_within_capacity() {
        let snapshot = SystemSnapshot::empty().with_occupancy(2, 4, 1, 4);
        assert!(SlotOccupancyWithinCapacity.check(&snapshot).is_ok());
    }

    #[test]
    fn occupancy_fails_when_over_capacity() {
        let snapshot = SystemSnapshot::empty().with_occupancy(5, 4, 0, 4);
        let result = SlotOccupancyWithinCapacity.check(&snapshot);
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("TX occupied"));
    }

    #[test]
    fn sequences_pass_when_increasing() {
        let mut snapshot = SystemSnapshot::empty();
        for seq in [0, 1, 2, 5, 9] {
            snapshot.record_sent(seq);
        }
        assert!(SequenceNumbersStrictlyIncreasing.check(&snapshot).is_ok());
    }

    #[test]
    fn sequences_fail_when_repeated() {
        let mut snapshot = SystemSnapshot::empty();
        snapshot.record_sent(3);
        snapshot.record_sent(3);
        let result = SequenceNumbersStrictlyIncreasing.check(&snapshot);
        assert!(result.is_err());
    }

    #[test]
    fn sequences_tolerate_single_wraparound() {
        let mut snapshot = SystemSnapshot::empty();
        snapshot.record_sent(u32::MAX);
        snapshot.record_sent(0);
        assert!(SequenceNumbersStrictlyIncreasing.check(&snapshot).is_ok());
    }

    #[test]
    fn max_transmissions_passes_at_the_boundary() {
        let mut snapshot = SystemSnapshot::empty();
        for _ in 0..5 {
            snapshot.record_transmission(7);
        }
        let check = MaxTransmissionsBound { max_transmissions: 5 };
        assert!(check.check(&snapshot).is_ok());
    }

    #[test]
    fn max_transmissions_fails_past_the_boundary() {
        let mut snapshot = SystemSnapshot::empty();
        for _ in 0..6 {
            snapshot.record_transmission(7);
        }
        let check = MaxTransmissionsBound { max_transmissions: 5 };
        let result = check.check(&snapshot);
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("sequence 7"));
    }
}
