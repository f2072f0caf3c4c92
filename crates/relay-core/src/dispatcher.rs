//! Receive dispatcher: byte-buffer framing, checksum validation, receipt
//! synthesis, and delivery-queue enqueue.

use std::collections::VecDeque;

use relay_proto::{EscapeDecoder, Frame, HEADER_BYTE, ReceiptType};
use tracing::{trace, warn};

use crate::{
    config::CommunicatorConfig,
    queue::{RxEntry, SlotQueue},
};

/// Wildcard message id accepted by [`crate::Communicator::receive`], matching any id.
pub const WILDCARD_ID: u16 = 0xFFFF;

/// An outcome of parsing one frame out of the receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RxOutcome {
    /// A valid, non-receipt frame was enqueued for the application.
    Delivered,
    /// The RX queue was full; the valid frame was dropped.
    DroppedFull,
    /// A frame or receipt failed its checksum and carried no recovery action.
    DroppedInvalid,
    /// A receipt frame arrived and must be applied to the TX scheduler.
    Receipt {
        /// Sequence number the receipt acknowledges.
        sequence: u32,
        /// Positive or negative receipt.
        kind: ReceiptType,
    },
    /// A receipt frame must be transmitted immediately, bypassing the TX queue.
    TransmitReceipt(Frame),
}

/// Receive-side half of the transport engine.
#[derive(Debug)]
pub struct Dispatcher {
    buffer: VecDeque<u8>,
    decoder: EscapeDecoder,
    queue: SlotQueue<RxEntry>,
}

impl Dispatcher {
    /// Construct a dispatcher from its configuration.
    #[must_use]
    pub fn new(config: &CommunicatorConfig) -> Self {
        Self { buffer: VecDeque::new(), decoder: EscapeDecoder::new(), queue: SlotQueue::new(config.queue_size) }
    }

    /// Feed raw wire bytes as they arrive from the serial device.
    ///
    /// Unescaping happens here, at fill time, so the internal buffer always
    /// holds unescaped frame bytes. This must never block.
    pub fn on_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if let Some(unescaped) = self.decoder.feed(byte) {
                self.buffer.push_back(unescaped);
            }
        }
    }

    /// Parse and dispatch every complete frame currently buffered.
    ///
    /// Returns one [`RxOutcome`] per frame processed. Garbage bytes preceding
    /// the next header candidate are silently discarded (logged at `trace`).
    pub fn spin_rx(&mut self) -> Vec<RxOutcome> {
        let mut outcomes = Vec::new();

        loop {
            let mut skipped = 0;
            while let Some(&b) = self.buffer.front() {
                if b == HEADER_BYTE {
                    break;
                }
                self.buffer.pop_front();
                skipped += 1;
            }
            if skipped > 0 {
                trace!(skipped, "resynchronizing: skipped garbage bytes before header");
            }

            let contiguous: Vec<u8> = self.buffer.iter().copied().collect();
            let packet_len = match Frame::peek_packet_len(&contiguous) {
                Ok(len) => len,
                Err(_) => break, // not enough bytes yet to know the packet length
            };
            if contiguous.len() < packet_len {
                break; // full frame not yet buffered
            }

            let raw: Vec<u8> = contiguous[..packet_len].to_vec();
            self.buffer.drain(..packet_len);

            let (frame, checksum_ok) = match Frame::decode_lenient(&raw) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(%err, "dropping unparseable frame");
                    continue;
                },
            };

            outcomes.push(self.dispatch_one(frame, checksum_ok));
        }

        outcomes
    }

    fn dispatch_one(&mut self, frame: Frame, checksum_ok: bool) -> RxOutcome {
        match frame.receipt_type {
            ReceiptType::NotRequired => {
                if checksum_ok {
                    self.enqueue(frame)
                } else {
                    trace!(sequence = frame.sequence, "dropping checksum-invalid frame");
                    RxOutcome::DroppedInvalid
                }
            },
            ReceiptType::Required => {
                let kind = if checksum_ok { ReceiptType::Received } else { ReceiptType::ChecksumMismatch };
                let receipt =
                    Frame::receipt(frame.sequence, kind, frame.message.id(), frame.message.priority());
                if checksum_ok {
                    self.enqueue(frame);
                }
                RxOutcome::TransmitReceipt(receipt)
            },
            ReceiptType::Received | ReceiptType::ChecksumMismatch => {
                if checksum_ok {
                    RxOutcome::Receipt { sequence: frame.sequence, kind: frame.receipt_type }
                } else {
                    trace!(sequence = frame.sequence, "dropping checksum-invalid receipt");
                    RxOutcome::DroppedInvalid
                }
            },
        }
    }

    fn enqueue(&mut self, frame: Frame) -> RxOutcome {
        let entry = RxEntry { message: frame.message, sequence: frame.sequence };
        match self.queue.try_insert(entry) {
            Ok(()) => RxOutcome::Delivered,
            Err(_) => {
                warn!("RX queue full, dropping delivered message");
                RxOutcome::DroppedFull
            },
        }
    }

    /// Count of delivered messages awaiting [`crate::Communicator::receive`].
    #[must_use]
    pub fn messages_available(&self) -> usize {
        self.queue.occupied()
    }

    /// Remove and return the highest-priority, oldest delivered message whose
    /// id matches `id` ([`WILDCARD_ID`] matches any id).
    pub fn receive(&mut self, id: u16) -> Option<relay_proto::Message> {
        let index =
            self.queue.select(|entry| id == WILDCARD_ID || entry.message.id() == id)?;
        self.queue.take(index).map(|entry| entry.message)
    }

    /// Current RX queue capacity.
    #[must_use]
    pub fn queue_size(&self) -> u16 {
        #[allow(clippy::cast_possible_truncation)]
        let size = self.queue.capacity() as u16;
        size
    }

    /// Resize the RX queue.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::QueueError::WouldTruncate`] if `new_size` is
    /// below the current occupancy.
    pub fn set_queue_size(&mut self, new_size: u16) -> Result<(), crate::error::QueueError> {
        self.queue.resize(new_size)
    }
}
