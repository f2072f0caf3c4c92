//! Lifecycle of a queued outbound message.

use std::sync::{Arc, Mutex};

/// State of an outbound message as it moves through the transmit scheduler.
///
/// `Sent`, `Received`, and `NotReceived` are terminal: once reached, the
/// owning TX slot is freed and the status no longer changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Enqueued, not yet transmitted.
    Queued,
    /// Transmitted at least once, awaiting a receipt.
    Verifying,
    /// Transmitted once, no receipt was required. Terminal.
    Sent,
    /// A matching positive receipt arrived. Terminal.
    Received,
    /// `max_transmissions` was reached with no receipt. Terminal.
    NotReceived,
}

impl Status {
    /// True for the three terminal states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Received | Self::NotReceived)
    }
}

/// A shared, reference-counted cell an application can hold onto after
/// [`crate::Communicator::send`] to observe a message's final status without
/// keeping the message itself alive.
pub type StatusTracker = Arc<Mutex<Status>>;

/// Construct a fresh tracker initialized to [`Status::Queued`].
#[must_use]
pub fn new_tracker() -> StatusTracker {
    Arc::new(Mutex::new(Status::Queued))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(Status::Sent.is_terminal());
        assert!(Status::Received.is_terminal());
        assert!(Status::NotReceived.is_terminal());
        assert!(!Status::Queued.is_terminal());
        assert!(!Status::Verifying.is_terminal());
    }
}
