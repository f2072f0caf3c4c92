//! Configuration for a [`crate::Communicator`].

/// Default capacity of both the TX and RX queues.
pub const DEFAULT_QUEUE_SIZE: u16 = 10;

/// Default time a `Verifying` entry waits for a receipt before retransmitting.
pub const DEFAULT_RECEIPT_TIMEOUT_MS: u32 = 100;

/// Default ceiling on total transmission attempts (including the first) per message.
pub const DEFAULT_MAX_TRANSMISSIONS: u8 = 5;

/// Tunable parameters governing queue capacity, retransmission timing, and
/// give-up behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommunicatorConfig {
    /// Capacity of the TX and RX slot queues.
    pub queue_size: u16,
    /// Milliseconds a `Verifying` entry waits before being retransmitted.
    pub receipt_timeout_ms: u32,
    /// Maximum number of transmission attempts per message.
    pub max_transmissions: u8,
}

impl Default for CommunicatorConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            receipt_timeout_ms: DEFAULT_RECEIPT_TIMEOUT_MS,
            max_transmissions: DEFAULT_MAX_TRANSMISSIONS,
        }
    }
}
