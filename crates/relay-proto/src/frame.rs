//! Wire-level frame: header byte, sequence number, receipt type, message
//! body, and checksum, plus the escape transform applied to everything after
//! the header byte.
//!
//! Raw (pre-escape) layout:
//!
//! ```text
//! offset  size          field
//!   0     1             header byte (0xAA)
//!   1     4             sequence number (big-endian u32)
//!   5     1             receipt type
//!   6     message.serialized_len()  message body
//!   …     1             XOR checksum of all preceding raw bytes
//! ```

use crate::{
    errors::{ProtocolError, Result},
    message::Message,
};

/// Marks the start of a frame on the wire. Never escaped.
pub const HEADER_BYTE: u8 = 0xAA;

/// Escapes an occurrence of [`HEADER_BYTE`] or itself elsewhere in the frame.
pub const ESCAPE_BYTE: u8 = 0x1B;

/// Bytes preceding the message body in a raw frame: header + sequence + receipt type.
const PREFIX_LEN: usize = 6;

/// Overhead of a raw frame beyond the message body: prefix plus the trailing checksum.
const FRAME_OVERHEAD: usize = PREFIX_LEN + 1;

/// Receipt-type wire field, distinguishing ordinary message frames from receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptType {
    /// Fire-and-forget: no receipt expected.
    NotRequired,
    /// Sender expects a receipt frame in response.
    Required,
    /// This frame is a positive receipt acknowledging a prior sequence number.
    Received,
    /// This frame is a negative receipt: the acknowledged frame failed its checksum.
    ChecksumMismatch,
}

impl ReceiptType {
    /// Encode as the wire byte value.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::NotRequired => 0,
            Self::Required => 1,
            Self::Received => 2,
            Self::ChecksumMismatch => 3,
        }
    }

    /// Decode from a wire byte value.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownReceiptType`] for any value outside 0..=3.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::NotRequired),
            1 => Ok(Self::Required),
            2 => Ok(Self::Received),
            3 => Ok(Self::ChecksumMismatch),
            other => Err(ProtocolError::UnknownReceiptType(other)),
        }
    }

    /// True for the two receipt kinds (as opposed to ordinary message frames).
    #[must_use]
    pub fn is_receipt(self) -> bool {
        matches!(self, Self::Received | Self::ChecksumMismatch)
    }
}

/// A complete protocol frame: a sequenced, receipt-typed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Sequence number assigned by the sender's communicator.
    pub sequence: u32,
    /// Whether this frame requires/carries a receipt.
    pub receipt_type: ReceiptType,
    /// The carried message (empty data for receipt frames).
    pub message: Message,
}

impl Frame {
    /// Construct a new frame.
    #[must_use]
    pub fn new(sequence: u32, receipt_type: ReceiptType, message: Message) -> Self {
        Self { sequence, receipt_type, message }
    }

    /// Build a receipt frame (zero data) acknowledging `sequence` with `kind`.
    ///
    /// `kind` must be [`ReceiptType::Received`] or [`ReceiptType::ChecksumMismatch`].
    #[must_use]
    pub fn receipt(sequence: u32, kind: ReceiptType, id: u16, priority: u8) -> Self {
        debug_assert!(kind.is_receipt(), "receipt frame built with a non-receipt type");
        Self { sequence, receipt_type: kind, message: Message::empty(id).with_priority(priority) }
    }

    /// Raw (pre-escape) length of this frame on the wire.
    #[must_use]
    pub fn raw_len(&self) -> usize {
        FRAME_OVERHEAD + self.message.serialized_len()
    }

    /// Encode this frame to its raw (pre-escape) byte representation, including checksum.
    #[must_use]
    pub fn encode_raw(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.raw_len());
        out.push(HEADER_BYTE);
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out.push(self.receipt_type.to_u8());
        out.extend_from_slice(&self.message.serialize());
        let checksum = xor_checksum(&out);
        out.push(checksum);
        out
    }

    /// Encode this frame to its on-wire (escaped) byte representation.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        escape_encode(&self.encode_raw())
    }

    /// Decode a frame from a raw (already unescaped), exact-length byte slice.
    ///
    /// The caller is responsible for framing: `raw` must contain exactly one
    /// frame's worth of bytes (header through checksum, inclusive).
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::FrameTruncated`] if `raw` is shorter than the minimum frame size.
    /// - [`ProtocolError::MissingHeader`] if the leading byte is not [`HEADER_BYTE`].
    /// - [`ProtocolError::ChecksumMismatch`] if the trailing checksum does not match.
    /// - [`ProtocolError::UnknownReceiptType`] if the receipt-type byte is invalid.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < FRAME_OVERHEAD {
            return Err(ProtocolError::FrameTruncated { expected: FRAME_OVERHEAD, actual: raw.len() });
        }
        if raw[0] != HEADER_BYTE {
            return Err(ProtocolError::MissingHeader { expected: HEADER_BYTE, actual: raw[0] });
        }

        let claimed = raw[raw.len() - 1];
        let computed = xor_checksum(&raw[..raw.len() - 1]);
        if claimed != computed {
            return Err(ProtocolError::ChecksumMismatch { claimed, computed });
        }

        let sequence = u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]);
        let receipt_type = ReceiptType::from_u8(raw[5])?;
        let message = Message::from_serialized(&raw[PREFIX_LEN..raw.len() - 1])?;

        Ok(Self { sequence, receipt_type, message })
    }

    /// Decode a frame without rejecting a checksum mismatch, returning the
    /// parsed frame alongside whether its checksum was valid.
    ///
    /// The receive dispatcher needs the sequence number and receipt type of a
    /// corrupted frame to synthesize a negative receipt, so it cannot use the
    /// strict [`Frame::decode`] for that path. Structural errors (truncation,
    /// missing header, an unrecognized receipt-type byte) are still fatal.
    ///
    /// # Errors
    ///
    /// Same as [`Frame::decode`], except a checksum mismatch is reported via
    /// the returned `bool` rather than an `Err`.
    pub fn decode_lenient(raw: &[u8]) -> Result<(Self, bool)> {
        if raw.len() < FRAME_OVERHEAD {
            return Err(ProtocolError::FrameTruncated { expected: FRAME_OVERHEAD, actual: raw.len() });
        }
        if raw[0] != HEADER_BYTE {
            return Err(ProtocolError::MissingHeader { expected: HEADER_BYTE, actual: raw[0] });
        }

        let claimed = raw[raw.len() - 1];
        let computed = xor_checksum(&raw[..raw.len() - 1]);
        let checksum_ok = claimed == computed;

        let sequence = u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]);
        let receipt_type = ReceiptType::from_u8(raw[5])?;
        let message = Message::from_serialized(&raw[PREFIX_LEN..raw.len() - 1])?;

        Ok((Self { sequence, receipt_type, message }, checksum_ok))
    }

    /// Parse the `data_length` field (offset 9, big-endian u16) out of a raw
    /// buffer that holds at least the frame's fixed-size prefix, without
    /// requiring the full frame to be present yet.
    ///
    /// Used by the receive dispatcher to learn how many more bytes to wait
    /// for before attempting [`Frame::decode`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FrameTruncated`] if fewer than
    /// [`Frame::PREFIX_AND_MESSAGE_HEADER_LEN`] bytes are available.
    pub fn peek_packet_len(raw: &[u8]) -> Result<usize> {
        if raw.len() < Self::PREFIX_AND_MESSAGE_HEADER_LEN {
            return Err(ProtocolError::FrameTruncated {
                expected: Self::PREFIX_AND_MESSAGE_HEADER_LEN,
                actual: raw.len(),
            });
        }
        let data_length = u16::from_be_bytes([raw[9], raw[10]]) as usize;
        Ok(FRAME_OVERHEAD + crate::message::HEADER_LEN + data_length)
    }

    /// Bytes needed before [`Frame::peek_packet_len`] can compute the total packet length:
    /// header(1) + sequence(4) + receipt type(1) + message id(2) + priority(1) + data_length(2).
    pub const PREFIX_AND_MESSAGE_HEADER_LEN: usize = PREFIX_LEN + 5;
}

/// XOR all bytes together into a single checksum byte.
#[must_use]
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Apply the escape transform to `raw`, leaving the leading header byte
/// untouched and escaping every subsequent occurrence of [`HEADER_BYTE`] or
/// [`ESCAPE_BYTE`] as `ESCAPE_BYTE, byte - 1`.
#[must_use]
pub fn escape_encode(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let Some((&first, rest)) = raw.split_first() else {
        return out;
    };
    out.push(first);
    for &byte in rest {
        if byte == HEADER_BYTE || byte == ESCAPE_BYTE {
            out.push(ESCAPE_BYTE);
            out.push(byte.wrapping_sub(1));
        } else {
            out.push(byte);
        }
    }
    out
}

/// Streaming escape-removal matching the receive buffer's fill-time
/// unescaping: tracks whether the previous byte was an escape marker and
/// increments the following byte by one when it was, regardless of its
/// value.
#[derive(Debug, Default, Clone, Copy)]
pub struct EscapeDecoder {
    escape_next: bool,
}

impl EscapeDecoder {
    /// Construct a decoder with no pending escape.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw wire byte, returning the unescaped byte to append to the
    /// receive buffer, or `None` if this byte was an escape marker (nothing
    /// to emit yet).
    pub fn feed(&mut self, byte: u8) -> Option<u8> {
        if byte == ESCAPE_BYTE {
            self.escape_next = true;
            return None;
        }
        let out = if self.escape_next { byte.wrapping_add(1) } else { byte };
        self.escape_next = false;
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::message::Message;

    #[test]
    fn fire_and_forget_frame_bytes() {
        let msg = Message::empty(0x0101);
        let frame = Frame::new(0, ReceiptType::NotRequired, msg);
        let raw = frame.encode_raw();
        assert_eq!(raw, vec![0xAA, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0xAB]);
    }

    #[test]
    fn escape_encode_escapes_header_and_escape_bytes() {
        let msg = Message::empty(0x00AA);
        let frame = Frame::new(0, ReceiptType::NotRequired, msg);
        let wire = frame.encode();
        assert!(wire.windows(3).any(|w| w == [0x00, 0x1B, 0xA9]));
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        let msg = Message::empty(1);
        let mut raw = Frame::new(0, ReceiptType::NotRequired, msg).encode_raw();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        assert!(matches!(Frame::decode(&raw), Err(ProtocolError::ChecksumMismatch { .. })));
    }

    #[test]
    fn decode_lenient_reports_bad_checksum_without_erroring() {
        let msg = Message::empty(1);
        let original = Frame::new(5, ReceiptType::Required, msg);
        let mut raw = original.encode_raw();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;

        let (frame, checksum_ok) = Frame::decode_lenient(&raw).expect("structurally valid");
        assert!(!checksum_ok);
        assert_eq!(frame.sequence, 5);
        assert_eq!(frame.receipt_type, ReceiptType::Required);
    }

    #[test]
    fn decode_rejects_missing_header() {
        let msg = Message::empty(1);
        let mut raw = Frame::new(0, ReceiptType::NotRequired, msg).encode_raw();
        raw[0] = 0x00;
        assert!(matches!(Frame::decode(&raw), Err(ProtocolError::MissingHeader { .. })));
    }

    #[test]
    fn escape_decoder_round_trips_header_byte() {
        let msg = Message::empty(0x00AA);
        let frame = Frame::new(7, ReceiptType::Required, msg);
        let wire = frame.encode();

        let mut decoder = EscapeDecoder::new();
        let mut unescaped = Vec::new();
        for &b in &wire {
            if let Some(out) = decoder.feed(b) {
                unescaped.push(out);
            }
        }
        let decoded = Frame::decode(&unescaped).unwrap();
        assert_eq!(decoded, frame);
    }

    proptest! {
        #[test]
        fn frame_round_trip(
            sequence: u32,
            id: u16,
            priority: u8,
            data in proptest::collection::vec(any::<u8>(), 0..32),
        ) {
            let mut msg = Message::sized(id, data.len() as u16);
            msg.data_mut().copy_from_slice(&data);
            let msg = msg.with_priority(priority);
            let frame = Frame::new(sequence, ReceiptType::NotRequired, msg);

            let raw = frame.encode_raw();
            let decoded = Frame::decode(&raw).expect("should decode");
            prop_assert_eq!(decoded, frame);
        }

        #[test]
        fn escape_round_trip(raw in proptest::collection::vec(any::<u8>(), 1..64)) {
            let encoded = escape_encode(&raw);
            let mut decoder = EscapeDecoder::new();
            let mut unescaped = Vec::new();
            for (i, &b) in encoded.iter().enumerate() {
                if i == 0 {
                    unescaped.push(b);
                    continue;
                }
                if let Some(out) = decoder.feed(b) {
                    unescaped.push(out);
                }
            }
            prop_assert_eq!(unescaped, raw);
        }
    }
}
