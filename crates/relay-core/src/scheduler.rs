//! Transmit scheduler: priority/age slot selection, first-send vs.
//! retransmit vs. give-up, and receipt processing.
//!
//! Mirrors the sans-IO, action-returning pattern used throughout this
//! workspace: `spin_tx` takes the current time and returns at most one
//! action for the driver to execute. No I/O happens inside this module.

use relay_proto::{Frame, Message, ReceiptType};
use tracing::{debug, warn};

use crate::{
    config::CommunicatorConfig,
    error::QueueError,
    queue::{SlotQueue, TxEntry},
    status::{Status, StatusTracker},
};

/// An action the driver must execute as a result of a scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxAction {
    /// Write this frame's encoded bytes to the serial device.
    Transmit(Frame),
}

/// Transmit-side half of the transport engine.
#[derive(Debug)]
pub struct Scheduler {
    queue: SlotQueue<TxEntry>,
    next_sequence: u32,
    receipt_timeout_ms: u32,
    max_transmissions: u8,
}

impl Scheduler {
    /// Construct a scheduler from its configuration.
    #[must_use]
    pub fn new(config: &CommunicatorConfig) -> Self {
        Self {
            queue: SlotQueue::new(config.queue_size),
            next_sequence: 0,
            receipt_timeout_ms: config.receipt_timeout_ms,
            max_transmissions: config.max_transmissions,
        }
    }

    /// Enqueue `message` for transmission.
    ///
    /// Assigns the next sequence number and returns immediately; no
    /// transmission happens until a subsequent [`Scheduler::spin_tx`].
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] with `message` attached if the TX queue
    /// has no empty slot.
    pub fn send(
        &mut self,
        message: Message,
        receipt_required: bool,
        tracker: Option<StatusTracker>,
    ) -> Result<(), QueueError> {
        let capacity = self.queue.capacity();
        let sequence = self.next_sequence;
        let entry = TxEntry {
            message,
            sequence,
            receipt_required,
            n_transmissions: 0,
            last_tx_timestamp_ms: 0,
            status: Status::Queued,
            tracker,
        };
        match self.queue.try_insert(entry) {
            Ok(()) => {
                self.next_sequence = self.next_sequence.wrapping_add(1);
                Ok(())
            },
            Err(entry) => {
                Err(QueueError::Full { capacity, message: Box::new(entry.message) })
            },
        }
    }

    /// Select and advance exactly one TX slot, if any is eligible.
    ///
    /// `now_ms` is a monotonic millisecond clock supplied by the driver; the
    /// engine never reads the wall clock itself.
    pub fn spin_tx(&mut self, now_ms: u64) -> Option<TxAction> {
        let timeout = u64::from(self.receipt_timeout_ms);
        let max_transmissions = self.max_transmissions;

        let index = self.queue.select(|entry| {
            if entry.status == Status::Verifying {
                now_ms.saturating_sub(entry.last_tx_timestamp_ms) >= timeout
            } else {
                true
            }
        })?;

        let first_send = self.queue.get(index).map(|e| e.n_transmissions == 0)?;

        if first_send {
            let frame = {
                let entry = self.queue.get_mut(index)?;
                let receipt_type =
                    if entry.receipt_required { ReceiptType::Required } else { ReceiptType::NotRequired };
                let frame = Frame::new(entry.sequence, receipt_type, entry.message.clone());
                entry.last_tx_timestamp_ms = now_ms;
                entry.n_transmissions += 1;
                frame
            };

            let entry = self.queue.get_mut(index)?;
            if entry.receipt_required {
                entry.set_status(Status::Verifying);
                debug!(sequence = entry.sequence, "first transmission, awaiting receipt");
            } else {
                entry.set_status(Status::Sent);
                debug!(sequence = entry.sequence, "fire-and-forget transmission complete");
                self.queue.take(index);
            }
            return Some(TxAction::Transmit(frame));
        }

        let give_up = self.queue.get(index).map(|e| e.n_transmissions >= max_transmissions)?;
        if give_up {
            let entry = self.queue.get_mut(index)?;
            warn!(sequence = entry.sequence, attempts = entry.n_transmissions, "giving up, no receipt");
            entry.set_status(Status::NotReceived);
            self.queue.take(index);
            return None;
        }

        let frame = {
            let entry = self.queue.get_mut(index)?;
            entry.last_tx_timestamp_ms = now_ms;
            entry.n_transmissions += 1;
            debug!(sequence = entry.sequence, attempt = entry.n_transmissions, "retransmitting");
            Frame::new(entry.sequence, ReceiptType::Required, entry.message.clone())
        };
        Some(TxAction::Transmit(frame))
    }

    /// Apply an inbound receipt to the matching TX entry, if one exists.
    ///
    /// `kind` must be [`ReceiptType::Received`] or [`ReceiptType::ChecksumMismatch`];
    /// any other value is ignored.
    pub fn handle_receipt(&mut self, sequence: u32, kind: ReceiptType) -> Option<TxAction> {
        let index = self.queue.select(|entry| entry.sequence == sequence)?;

        match kind {
            ReceiptType::Received => {
                let entry = self.queue.get_mut(index)?;
                entry.set_status(Status::Received);
                self.queue.take(index);
                None
            },
            ReceiptType::ChecksumMismatch => {
                let can_retry = self.queue.get(index).map(|e| e.n_transmissions < self.max_transmissions)?;
                if can_retry {
                    let entry = self.queue.get_mut(index)?;
                    entry.last_tx_timestamp_ms = 0; // force eligibility on the next tick
                    None
                } else {
                    let entry = self.queue.get_mut(index)?;
                    entry.set_status(Status::NotReceived);
                    self.queue.take(index);
                    None
                }
            },
            ReceiptType::NotRequired | ReceiptType::Required => None,
        }
    }

    /// Count of occupied TX slots.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.queue.occupied()
    }

    /// Current TX queue capacity.
    #[must_use]
    pub fn queue_size(&self) -> u16 {
        #[allow(clippy::cast_possible_truncation)]
        let size = self.queue.capacity() as u16;
        size
    }

    /// Resize the TX queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::WouldTruncate`] if `new_size` is below the
    /// current occupancy.
    pub fn set_queue_size(&mut self, new_size: u16) -> Result<(), QueueError> {
        self.queue.resize(new_size)
    }

    /// Current receipt timeout, in milliseconds.
    #[must_use]
    pub fn receipt_timeout_ms(&self) -> u32 {
        self.receipt_timeout_ms
    }

    /// Set the receipt timeout, in milliseconds.
    pub fn set_receipt_timeout_ms(&mut self, timeout_ms: u32) {
        self.receipt_timeout_ms = timeout_ms;
    }

    /// Current max-transmissions ceiling.
    #[must_use]
    pub fn max_transmissions(&self) -> u8 {
        self.max_transmissions
    }

    /// Set the max-transmissions ceiling.
    pub fn set_max_transmissions(&mut self, max_transmissions: u8) {
        self.max_transmissions = max_transmissions;
    }
}

#[cfg(test)]
mod tests {
    use relay_proto::Message;

    use super::*;

    fn scheduler(max_transmissions: u8, receipt_timeout_ms: u32) -> Scheduler {
        Scheduler::new(&CommunicatorConfig { queue_size: 4, receipt_timeout_ms, max_transmissions })
    }

    #[test]
    fn fire_and_forget_frees_slot_immediately() {
        let mut sched = scheduler(5, 100);
        sched.send(Message::empty(1), false, None).unwrap();

        let action = sched.spin_tx(0);
        assert!(matches!(action, Some(TxAction::Transmit(_))));
        assert_eq!(sched.queue.occupied(), 0);
    }

    #[test]
    fn receipted_message_waits_then_frees_on_received_receipt() {
        let mut sched = scheduler(5, 100);
        sched.send(Message::empty(1), true, None).unwrap();

        sched.spin_tx(0);
        assert_eq!(sched.queue.occupied(), 1);

        // Too soon: nothing eligible.
        assert!(sched.spin_tx(50).is_none());

        sched.handle_receipt(0, ReceiptType::Received);
        assert_eq!(sched.queue.occupied(), 0);
    }

    #[test]
    fn retransmits_then_gives_up() {
        let mut sched = scheduler(3, 100);
        let tracker = crate::status::new_tracker();
        sched.send(Message::empty(1), true, Some(tracker.clone())).unwrap();

        sched.spin_tx(0); // 1st send
        sched.spin_tx(100); // retransmit
        sched.spin_tx(200); // retransmit (3rd attempt, at max)
        assert_eq!(sched.queue.occupied(), 1);

        sched.spin_tx(300); // give up
        assert_eq!(sched.queue.occupied(), 0);
        assert_eq!(*tracker.lock().unwrap(), Status::NotReceived);
    }

    #[test]
    fn send_into_full_queue_returns_message() {
        let mut sched = scheduler(5, 100);
        for _ in 0..4 {
            sched.send(Message::empty(1), true, None).unwrap();
        }
        let err = sched.send(Message::empty(2), true, None).unwrap_err();
        assert_eq!(err.into_message(), Some(Message::empty(2)));
    }
}
