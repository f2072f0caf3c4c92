//! Application-visible payload carried inside a frame.
//!
//! Wire layout (big-endian), matching [`Message::serialize`]:
//!
//! ```text
//! offset  size  field
//!   0     2     id
//!   2     1     priority
//!   3     2     data_length
//!   5     N     data
//! ```

use std::mem::size_of;

use crate::errors::{ProtocolError, Result};

/// Minimum serialized length of a message (zero-length data).
pub const HEADER_LEN: usize = 5;

/// Application message: an id, a priority, and an opaque data buffer.
///
/// Typed field accessors ([`Message::get_field`], [`Message::set_field`]) read
/// and write big-endian integers and floats at caller-supplied byte offsets
/// within `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: u16,
    priority: u8,
    data: Vec<u8>,
}

impl Message {
    /// Construct a message with no data.
    #[must_use]
    pub fn empty(id: u16) -> Self {
        Self { id, priority: 0, data: Vec::new() }
    }

    /// Construct a message with `data_length` zero-initialized data bytes.
    #[must_use]
    pub fn sized(id: u16, data_length: u16) -> Self {
        Self { id, priority: 0, data: vec![0u8; data_length as usize] }
    }

    /// Set the priority and return `self`, for builder-style construction.
    #[must_use]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Deserialize a message from its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FrameTruncated`] if `bytes` is shorter than
    /// the header plus the claimed `data_length`.
    pub fn from_serialized(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ProtocolError::FrameTruncated { expected: HEADER_LEN, actual: bytes.len() });
        }
        let id = u16::from_be_bytes([bytes[0], bytes[1]]);
        let priority = bytes[2];
        let data_length = u16::from_be_bytes([bytes[3], bytes[4]]) as usize;
        let total = HEADER_LEN + data_length;
        if bytes.len() < total {
            return Err(ProtocolError::FrameTruncated { expected: total, actual: bytes.len() });
        }
        let data = bytes[HEADER_LEN..total].to_vec();
        Ok(Self { id, priority, data })
    }

    /// Serialize this message to its wire representation.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        out.extend_from_slice(&self.id.to_be_bytes());
        out.push(self.priority);
        #[allow(clippy::cast_possible_truncation)]
        let data_length = self.data.len() as u16;
        out.extend_from_slice(&data_length.to_be_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    /// Total length of [`Message::serialize`]'s output: `data.len() + 5`.
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        HEADER_LEN + self.data.len()
    }

    /// Message id.
    #[must_use]
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Message priority; higher is more urgent.
    #[must_use]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Mutable access to the priority.
    pub fn priority_mut(&mut self) -> &mut u8 {
        &mut self.priority
    }

    /// Length of the opaque data buffer.
    #[must_use]
    pub fn data_length(&self) -> u16 {
        #[allow(clippy::cast_possible_truncation)]
        let len = self.data.len() as u16;
        len
    }

    /// The opaque data buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the opaque data buffer.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read a big-endian typed value at `offset` within `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FieldOutOfBounds`] if `offset + size_of::<T>()`
    /// exceeds the data buffer length.
    pub fn get_field<T: WireValue>(&self, offset: usize) -> Result<T> {
        let width = size_of::<T>();
        let end = offset
            .checked_add(width)
            .ok_or(ProtocolError::FieldOutOfBounds { offset, width, data_len: self.data.len() })?;
        let slice = self.data.get(offset..end).ok_or(ProtocolError::FieldOutOfBounds {
            offset,
            width,
            data_len: self.data.len(),
        })?;
        Ok(T::from_be_bytes_slice(slice))
    }

    /// Write a big-endian typed value at `offset` within `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FieldOutOfBounds`] if `offset + size_of::<T>()`
    /// exceeds the data buffer length.
    pub fn set_field<T: WireValue>(&mut self, offset: usize, value: T) -> Result<()> {
        let width = size_of::<T>();
        let end = offset
            .checked_add(width)
            .ok_or(ProtocolError::FieldOutOfBounds { offset, width, data_len: self.data.len() })?;
        if end > self.data.len() {
            return Err(ProtocolError::FieldOutOfBounds { offset, width, data_len: self.data.len() });
        }
        self.data[offset..end].copy_from_slice(&value.to_be_bytes_vec());
        Ok(())
    }
}

/// A value type that can be read and written as a big-endian field of fixed
/// width (1, 2, 4, or 8 bytes) inside a [`Message`]'s data buffer.
pub trait WireValue: Copy + Sized {
    /// Encode `self` as big-endian bytes.
    fn to_be_bytes_vec(self) -> Vec<u8>;

    /// Decode `self` from a big-endian byte slice of exactly `size_of::<Self>()` bytes.
    fn from_be_bytes_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_wire_value {
    ($t:ty) => {
        impl WireValue for $t {
            fn to_be_bytes_vec(self) -> Vec<u8> {
                self.to_be_bytes().to_vec()
            }

            fn from_be_bytes_slice(bytes: &[u8]) -> Self {
                let mut buf = [0u8; size_of::<$t>()];
                buf.copy_from_slice(bytes);
                Self::from_be_bytes(buf)
            }
        }
    };
}

impl_wire_value!(u8);
impl_wire_value!(u16);
impl_wire_value!(u32);
impl_wire_value!(u64);
impl_wire_value!(i8);
impl_wire_value!(i16);
impl_wire_value!(i32);
impl_wire_value!(i64);
impl_wire_value!(f32);
impl_wire_value!(f64);

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_message_round_trip() {
        let msg = Message::empty(0x0101);
        let bytes = msg.serialize();
        let parsed = Message::from_serialized(&bytes).unwrap();
        assert_eq!(msg, parsed);
    }

    #[test]
    fn sized_message_has_zeroed_data() {
        let msg = Message::sized(7, 4);
        assert_eq!(msg.data(), &[0, 0, 0, 0]);
        assert_eq!(msg.data_length(), 4);
    }

    #[test]
    fn reject_truncated_header() {
        let result = Message::from_serialized(&[0, 1, 2]);
        assert!(matches!(result, Err(ProtocolError::FrameTruncated { .. })));
    }

    #[test]
    fn reject_truncated_data() {
        let mut bytes = Message::sized(1, 4).serialize();
        bytes.truncate(bytes.len() - 1);
        let result = Message::from_serialized(&bytes);
        assert!(matches!(result, Err(ProtocolError::FrameTruncated { .. })));
    }

    #[test]
    fn typed_field_round_trip() {
        let mut msg = Message::sized(1, 8);
        msg.set_field::<u32>(0, 0xDEAD_BEEF).unwrap();
        msg.set_field::<u16>(4, 0x1234).unwrap();
        assert_eq!(msg.get_field::<u32>(0).unwrap(), 0xDEAD_BEEF);
        assert_eq!(msg.get_field::<u16>(4).unwrap(), 0x1234);
    }

    #[test]
    fn field_out_of_bounds() {
        let msg = Message::sized(1, 2);
        assert!(matches!(
            msg.get_field::<u32>(0),
            Err(ProtocolError::FieldOutOfBounds { .. })
        ));
    }

    proptest! {
        #[test]
        fn message_round_trip(
            id: u16,
            priority: u8,
            data in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let msg = Message { id, priority, data };
            let bytes = msg.serialize();
            let parsed = Message::from_serialized(&bytes).expect("should decode");
            prop_assert_eq!(msg, parsed);
        }

        #[test]
        fn field_accessor_round_trip(value: u32, pad in 0usize..16) {
            let mut msg = Message::sized(0, (pad + 4) as u16);
            msg.set_field::<u32>(pad, value).unwrap();
            prop_assert_eq!(msg.get_field::<u32>(pad).unwrap(), value);
        }
    }
}
