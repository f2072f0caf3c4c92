//! Error types for the transport engine core.
//!
//! Strongly typed per layer: queue errors (capacity, resize) and the
//! top-level communicator error, which wraps queue and wire-format errors.
//!
//! We avoid using `std::io::Error` for engine logic to keep the sans-IO core
//! free of I/O concerns; conversion to `io::Error` happens only at the
//! driver boundary.

use std::io;

use relay_proto::{Message, ProtocolError};
use thiserror::Error;

/// Errors raised by the fixed-capacity TX/RX queues.
#[derive(Error, Debug)]
pub enum QueueError {
    /// No empty slot was available to accept the message.
    ///
    /// The rejected message is returned to the caller rather than dropped.
    #[error("queue full: all {capacity} slots occupied")]
    Full {
        /// Configured queue capacity.
        capacity: usize,
        /// The message that could not be enqueued.
        message: Box<Message>,
    },

    /// A resize to below the current occupancy was requested.
    #[error("cannot resize queue to {requested}: {occupied} slots currently occupied")]
    WouldTruncate {
        /// Requested new capacity.
        requested: usize,
        /// Slots currently holding an entry.
        occupied: usize,
    },
}

impl QueueError {
    /// Take back ownership of the message rejected by [`QueueError::Full`], if any.
    #[must_use]
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Full { message, .. } => Some(*message),
            Self::WouldTruncate { .. } => None,
        }
    }
}

/// Top-level errors surfaced by [`crate::Communicator`].
#[derive(Error, Debug)]
pub enum CommunicatorError {
    /// The TX queue rejected a send, or a queue resize was invalid.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// A frame failed to decode; always recoverable by resynchronizing on the
    /// next header byte, never surfaced to the application directly.
    #[error("framing error: {0}")]
    Framing(#[from] ProtocolError),

    /// The underlying serial device returned an I/O error.
    #[error("serial device error: {0}")]
    Device(String),
}

impl CommunicatorError {
    /// True if retrying the same operation later might succeed.
    ///
    /// Framing errors are self-correcting (the dispatcher resynchronizes on
    /// the next tick) and device errors may be transient; a full queue is not
    /// transient until the application drains it.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Framing(_) | Self::Device(_))
    }
}

impl From<io::Error> for CommunicatorError {
    fn from(err: io::Error) -> Self {
        Self::Device(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_error_returns_message() {
        let msg = Message::empty(1);
        let err = QueueError::Full { capacity: 10, message: Box::new(msg.clone()) };
        assert_eq!(err.into_message(), Some(msg));
    }

    #[test]
    fn truncate_error_returns_no_message() {
        let err = QueueError::WouldTruncate { requested: 2, occupied: 5 };
        assert_eq!(err.into_message(), None);
    }

    #[test]
    fn framing_and_device_errors_are_transient() {
        assert!(CommunicatorError::Device("broken pipe".into()).is_transient());
        assert!(
            CommunicatorError::Framing(ProtocolError::ChecksumMismatch { claimed: 1, computed: 2 })
                .is_transient()
        );
        assert!(
            !CommunicatorError::Queue(QueueError::WouldTruncate { requested: 1, occupied: 2 })
                .is_transient()
        );
    }
}
