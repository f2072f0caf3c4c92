//! Public engine API tying the scheduler, dispatcher, and configuration
//! together.

use relay_proto::Message;

use crate::{
    config::CommunicatorConfig,
    dispatcher::{Dispatcher, RxOutcome, WILDCARD_ID},
    error::CommunicatorError,
    scheduler::{Scheduler, TxAction},
    status::StatusTracker,
};

/// Reliable, prioritized, message-oriented transport over a byte-oriented
/// serial link.
///
/// `Communicator` is sans-IO: it never touches a [`crate::SerialPort`]
/// itself. A driver feeds it incoming bytes via [`Communicator::on_bytes`],
/// calls [`Communicator::spin_tx`] and [`Communicator::spin_rx`] on a
/// periodic tick, and executes the [`TxAction`]s those calls return against
/// the real device.
#[derive(Debug)]
pub struct Communicator {
    scheduler: Scheduler,
    dispatcher: Dispatcher,
}

impl Communicator {
    /// Construct a communicator from its configuration.
    #[must_use]
    pub fn new(config: CommunicatorConfig) -> Self {
        Self { scheduler: Scheduler::new(&config), dispatcher: Dispatcher::new(&config) }
    }

    /// Enqueue `message` for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`CommunicatorError::Queue`] with the message attached if the
    /// TX queue is full.
    pub fn send(
        &mut self,
        message: Message,
        receipt_required: bool,
        tracker: Option<StatusTracker>,
    ) -> Result<(), CommunicatorError> {
        self.scheduler.send(message, receipt_required, tracker).map_err(CommunicatorError::Queue)
    }

    /// Feed raw bytes that arrived from the serial device. Never blocks.
    pub fn on_bytes(&mut self, bytes: &[u8]) {
        self.dispatcher.on_bytes(bytes);
    }

    /// Advance the transmit scheduler by one tick.
    ///
    /// At most one frame is transmitted per call, preserving strict priority
    /// ordering without letting a burst starve a newly enqueued message.
    pub fn spin_tx(&mut self, now_ms: u64) -> Option<TxAction> {
        self.scheduler.spin_tx(now_ms)
    }

    /// Parse and dispatch every complete frame currently buffered.
    ///
    /// Returns the frames the driver must transmit immediately (receipts,
    /// which always bypass the TX queue). Receipts for outbound messages are
    /// applied to the scheduler internally.
    pub fn spin_rx(&mut self) -> Vec<TxAction> {
        let mut actions = Vec::new();
        for outcome in self.dispatcher.spin_rx() {
            match outcome {
                RxOutcome::Delivered | RxOutcome::DroppedFull | RxOutcome::DroppedInvalid => {},
                RxOutcome::Receipt { sequence, kind } => {
                    if let Some(action) = self.scheduler.handle_receipt(sequence, kind) {
                        actions.push(action);
                    }
                },
                RxOutcome::TransmitReceipt(frame) => actions.push(TxAction::Transmit(frame)),
            }
        }
        actions
    }

    /// Count of delivered messages awaiting [`Communicator::receive`].
    #[must_use]
    pub fn messages_available(&self) -> usize {
        self.dispatcher.messages_available()
    }

    /// Count of occupied TX slots (queued, verifying, or awaiting its first send).
    #[must_use]
    pub fn tx_occupied(&self) -> usize {
        self.scheduler.occupied()
    }

    /// Count of occupied RX slots (delivered messages not yet collected).
    #[must_use]
    pub fn rx_occupied(&self) -> usize {
        self.dispatcher.messages_available()
    }

    /// Remove and return the highest-priority, oldest delivered message
    /// matching `id`.
    pub fn receive(&mut self, id: u16) -> Option<Message> {
        self.dispatcher.receive(id)
    }

    /// Remove and return the highest-priority, oldest delivered message,
    /// regardless of id.
    pub fn receive_any(&mut self) -> Option<Message> {
        self.dispatcher.receive(WILDCARD_ID)
    }

    /// Current queue capacity (shared by TX and RX queues).
    #[must_use]
    pub fn queue_size(&self) -> u16 {
        self.scheduler.queue_size()
    }

    /// Resize both the TX and RX queues.
    ///
    /// # Errors
    ///
    /// Returns [`CommunicatorError::Queue`] if either queue's occupancy
    /// exceeds `new_size`. The two queues are resized independently; if the
    /// RX resize fails after the TX resize already succeeded, the TX queue
    /// is left at its new size (the two never need to agree with each
    /// other, only with their own occupancy).
    pub fn set_queue_size(&mut self, new_size: u16) -> Result<(), CommunicatorError> {
        self.scheduler.set_queue_size(new_size).map_err(CommunicatorError::Queue)?;
        self.dispatcher.set_queue_size(new_size).map_err(CommunicatorError::Queue)
    }

    /// Current receipt timeout, in milliseconds.
    #[must_use]
    pub fn receipt_timeout_ms(&self) -> u32 {
        self.scheduler.receipt_timeout_ms()
    }

    /// Set the receipt timeout, in milliseconds.
    pub fn set_receipt_timeout_ms(&mut self, timeout_ms: u32) {
        self.scheduler.set_receipt_timeout_ms(timeout_ms);
    }

    /// Current max-transmissions ceiling.
    #[must_use]
    pub fn max_transmissions(&self) -> u8 {
        self.scheduler.max_transmissions()
    }

    /// Set the max-transmissions ceiling.
    pub fn set_max_transmissions(&mut self, max_transmissions: u8) {
        self.scheduler.set_max_transmissions(max_transmissions);
    }
}

#[cfg(test)]
mod tests {
    use relay_proto::{Frame, ReceiptType};

    use super::*;
    use crate::status::{Status, new_tracker};

    #[test]
    fn fire_and_forget_end_to_end() {
        let mut comm = Communicator::new(CommunicatorConfig::default());
        comm.send(Message::empty(0x0101), false, None).unwrap();

        let action = comm.spin_tx(0);
        let Some(TxAction::Transmit(frame)) = action else { panic!("expected a transmit action") };
        assert_eq!(frame.encode_raw(), vec![
            0xAA, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0xAB
        ]);
    }

    #[test]
    fn receipted_round_trip_across_two_communicators() {
        let mut sender = Communicator::new(CommunicatorConfig::default());
        let mut receiver = Communicator::new(CommunicatorConfig::default());

        let tracker = new_tracker();
        sender.send(Message::empty(1).with_priority(5), true, Some(tracker.clone())).unwrap();

        let Some(TxAction::Transmit(frame)) = sender.spin_tx(0) else { panic!("expected transmit") };
        receiver.on_bytes(&frame.encode());

        let actions = receiver.spin_rx();
        assert_eq!(actions.len(), 1);
        let TxAction::Transmit(receipt) = &actions[0];
        assert_eq!(receipt.receipt_type, ReceiptType::Received);

        sender.on_bytes(&receipt.encode());
        let actions = sender.spin_rx();
        assert!(actions.is_empty());
        assert_eq!(*tracker.lock().unwrap(), Status::Received);
    }

    #[test]
    fn escape_round_trip_for_header_byte_id() {
        let mut sender = Communicator::new(CommunicatorConfig::default());
        let mut receiver = Communicator::new(CommunicatorConfig::default());

        sender.send(Message::empty(0x00AA), false, None).unwrap();
        let Some(TxAction::Transmit(frame)) = sender.spin_tx(0) else { panic!("expected transmit") };
        let wire = frame.encode();
        assert!(wire.windows(3).any(|w| w == [0x00, 0x1B, 0xA9]));

        receiver.on_bytes(&wire);
        receiver.spin_rx();
        let received = receiver.receive_any().unwrap();
        assert_eq!(received.id(), 0x00AA);
    }

    #[test]
    fn queue_full_returns_message_to_caller() {
        let config = CommunicatorConfig { queue_size: 1, ..CommunicatorConfig::default() };
        let mut comm = Communicator::new(config);
        comm.send(Message::empty(1), false, None).unwrap();
        let err = comm.send(Message::empty(2), false, None).unwrap_err();
        match err {
            CommunicatorError::Queue(queue_err) => {
                assert_eq!(queue_err.into_message(), Some(Message::empty(2)));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn resize_below_occupancy_is_rejected() {
        let mut comm = Communicator::new(CommunicatorConfig::default());
        comm.send(Message::empty(1), false, None).unwrap();
        comm.send(Message::empty(2), false, None).unwrap();
        assert!(comm.set_queue_size(1).is_err());
    }

    #[test]
    fn unrequested_frame_ignored_when_no_matching_sequence() {
        let mut comm = Communicator::new(CommunicatorConfig::default());
        let stray_receipt = Frame::receipt(999, ReceiptType::Received, 1, 0);
        comm.on_bytes(&stray_receipt.encode());
        let actions = comm.spin_rx();
        assert!(actions.is_empty());
    }
}
