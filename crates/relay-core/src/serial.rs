//! The serial device boundary: an opaque byte sink/source the engine drives
//! but never owns the implementation of.

use std::{
    collections::VecDeque,
    io,
    time::Duration,
};

/// A half-duplex byte transport the engine writes frames to and reads
/// incoming bytes from.
///
/// The engine is sans-IO: it never calls these methods itself. A driver
/// polls `bytes_available`/`read` on its own schedule and feeds the result to
/// [`crate::Communicator::on_bytes`].
pub trait SerialPort {
    /// Write `bytes`, returning the number actually accepted. May return
    /// before the bytes are physically on the wire.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Block until the most recent write has drained, or `timeout` elapses.
    /// `None` waits indefinitely.
    fn wait_for_bytes_written(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Read up to `buf.len()` currently available bytes.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Number of bytes currently buffered for reading.
    fn bytes_available(&self) -> usize;
}

/// An in-memory, lossless loopback: bytes written are immediately available
/// to read. Useful for demos and deterministic tests; not a stand-in for a
/// real device's latency or loss characteristics.
#[derive(Debug, Default)]
pub struct LoopbackSerialPort {
    inbox: VecDeque<u8>,
}

impl LoopbackSerialPort {
    /// Construct an empty loopback port.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject bytes as if they arrived from the far end, bypassing `write`.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.inbox.extend(bytes);
    }
}

impl SerialPort for LoopbackSerialPort {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.inbox.extend(bytes);
        Ok(bytes.len())
    }

    fn wait_for_bytes_written(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.inbox.len());
        for slot in buf.iter_mut().take(n) {
            #[allow(clippy::expect_used)]
            {
                *slot = self.inbox.pop_front().expect("n bounded by inbox.len()");
            }
        }
        Ok(n)
    }

    fn bytes_available(&self) -> usize {
        self.inbox.len()
    }
}
