//! Wire format for the serial relay protocol.
//!
//! This crate is the pure, allocation-light data layer: [`Message`] encoding,
//! the [`Frame`] wire layout, the XOR checksum, and the header-escape
//! transform. It has no notion of queues, retries, or time — that state
//! machinery lives in `relay-core`.

pub mod errors;
pub mod frame;
pub mod message;

pub use errors::{ProtocolError, Result};
pub use frame::{EscapeDecoder, ESCAPE_BYTE, Frame, HEADER_BYTE, ReceiptType, escape_encode, xor_checksum};
pub use message::{Message, WireValue};
