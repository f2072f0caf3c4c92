//! Tick-driven demonstration loop: two communicators joined by a pair of
//! loopback serial ports, exercised interactively rather than over a real
//! device.

use std::{thread, time::Duration};

use relay_core::{Communicator, CommunicatorConfig, LoopbackSerialPort, SerialPort, scheduler::TxAction};
use relay_proto::Message;
use tracing::{debug, info, warn};

/// Process-level configuration layered over [`CommunicatorConfig`]: protocol
/// tuning plus the driver's own tick cadence and run length.
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Protocol-level tuning (queue size, receipt timeout, max transmissions).
    pub communicator: CommunicatorConfig,
    /// Milliseconds between scheduler/dispatcher ticks.
    pub tick_interval_ms: u64,
    /// Number of ticks to run before exiting.
    pub tick_count: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { communicator: CommunicatorConfig::default(), tick_interval_ms: 20, tick_count: 50 }
    }
}

/// Run a small two-party demo: party A sends a receipted and a
/// fire-and-forget message to party B over a loopback link, logging engine
/// actions at each tick, then prints whatever B has collected.
///
/// # Errors
///
/// Returns an error if the loopback serial port fails to read or write,
/// which does not happen in practice but keeps this demo honest about the
/// device boundary's fallibility.
pub fn run_demo(config: DriverConfig) -> std::io::Result<()> {
    let mut a = Communicator::new(config.communicator);
    let mut b = Communicator::new(config.communicator);
    let mut wire_a_to_b = LoopbackSerialPort::new();
    let mut wire_b_to_a = LoopbackSerialPort::new();

    if let Err(err) = a.send(Message::empty(1).with_priority(5), true, None) {
        warn!(%err, "demo message 1 rejected");
    }
    if let Err(err) = a.send(Message::empty(2), false, None) {
        warn!(%err, "demo message 2 rejected");
    }

    let mut now_ms = 0u64;
    for tick in 0..config.tick_count {
        now_ms += config.tick_interval_ms;
        thread::sleep(Duration::from_millis(config.tick_interval_ms));

        if let Some(TxAction::Transmit(frame)) = a.spin_tx(now_ms) {
            wire_a_to_b.write(&frame.encode())?;
        }
        if let Some(TxAction::Transmit(frame)) = b.spin_tx(now_ms) {
            wire_b_to_a.write(&frame.encode())?;
        }

        pump(&mut wire_a_to_b, &mut b)?;
        pump(&mut wire_b_to_a, &mut a)?;

        for TxAction::Transmit(frame) in a.spin_rx() {
            wire_a_to_b.write(&frame.encode())?;
        }
        for TxAction::Transmit(frame) in b.spin_rx() {
            wire_b_to_a.write(&frame.encode())?;
        }

        pump(&mut wire_a_to_b, &mut b)?;
        pump(&mut wire_b_to_a, &mut a)?;

        debug!(tick, messages_at_b = b.messages_available(), "tick complete");
    }

    while let Some(message) = b.receive_any() {
        info!(id = message.id(), "delivered message");
    }

    Ok(())
}

fn pump(wire: &mut LoopbackSerialPort, receiver: &mut Communicator) -> std::io::Result<()> {
    let available = wire.bytes_available();
    if available == 0 {
        return Ok(());
    }
    let mut buf = vec![0u8; available];
    let n = wire.read(&mut buf)?;
    receiver.on_bytes(&buf[..n]);
    Ok(())
}
