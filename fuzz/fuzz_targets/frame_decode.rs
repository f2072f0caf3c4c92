//! Fuzz target for `Frame::decode`.
//!
//! Tests frame decoding with arbitrary byte sequences to find parser
//! crashes, integer overflows in length calculations, and buffer over-reads.
//! The fuzzer should never panic; all invalid inputs must return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_proto::Frame;

fuzz_target!(|data: &[u8]| {
    let _ = Frame::decode(data);
    let _ = Frame::decode_lenient(data);
    let _ = Frame::peek_packet_len(data);
});
