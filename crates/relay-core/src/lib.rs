//! Transport engine: a reliable, prioritized, message-oriented protocol
//! layered over a half-duplex, unreliable, variable-latency serial byte
//! link.
//!
//! The engine is sans-IO and single-threaded: [`Communicator`] never touches
//! a [`SerialPort`] itself. A driver owns the device and the clock, feeding
//! bytes in via [`Communicator::on_bytes`] and advancing the scheduler and
//! dispatcher on a periodic tick via [`Communicator::spin_tx`] /
//! [`Communicator::spin_rx`], executing whatever [`scheduler::TxAction`]s
//! come back.

pub mod communicator;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod queue;
pub mod scheduler;
pub mod serial;
pub mod status;

pub use communicator::Communicator;
pub use config::CommunicatorConfig;
pub use error::{CommunicatorError, QueueError};
pub use serial::{LoopbackSerialPort, SerialPort};
pub use status::{Status, StatusTracker};
