//! Error types for message and frame encoding/decoding.

use thiserror::Error;

/// Result type used throughout the wire-format layer.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding messages and frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer did not contain enough bytes for the claimed structure.
    #[error("frame truncated: expected at least {expected} bytes, found {actual}")]
    FrameTruncated {
        /// Bytes required to complete the structure.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// The leading byte was not the frame header marker.
    #[error("missing header byte: expected {expected:#04x}, found {actual:#04x}")]
    MissingHeader {
        /// The required header byte.
        expected: u8,
        /// The byte actually found.
        actual: u8,
    },

    /// The trailing checksum did not match the computed checksum.
    #[error("checksum mismatch: frame claims {claimed:#04x}, computed {computed:#04x}")]
    ChecksumMismatch {
        /// Checksum byte carried on the wire.
        claimed: u8,
        /// Checksum computed over the received bytes.
        computed: u8,
    },

    /// The receipt-type field carried a value outside the four defined kinds.
    #[error("unknown receipt type: {0:#04x}")]
    UnknownReceiptType(u8),

    /// A typed field accessor was used with an unsupported width.
    #[error("unsupported field width: {0} bytes (expected 1, 2, 4, or 8)")]
    UnsupportedFieldWidth(usize),

    /// A typed field accessor addressed bytes outside the message's data buffer.
    #[error("field out of bounds: offset {offset} + width {width} exceeds data length {data_len}")]
    FieldOutOfBounds {
        /// Byte offset requested.
        offset: usize,
        /// Width of the access in bytes.
        width: usize,
        /// Total length of the data buffer.
        data_len: usize,
    },
}
