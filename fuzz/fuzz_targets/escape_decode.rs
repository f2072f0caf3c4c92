//! Fuzz target for `EscapeDecoder`.
//!
//! Feeds arbitrary byte streams through the stateful unescaper one byte at a
//! time, the way the dispatcher's byte-arrival handler does. Must never
//! panic regardless of how the escape byte and header byte are interleaved.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_proto::EscapeDecoder;

fuzz_target!(|data: &[u8]| {
    let mut decoder = EscapeDecoder::new();
    for &byte in data {
        let _ = decoder.feed(byte);
    }
});
