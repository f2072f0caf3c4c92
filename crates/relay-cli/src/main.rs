//! Demonstration driver binary for the relay transport engine.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in two-party loopback demo with default tuning
//! relay-cli
//!
//! # Tighten retransmission behavior
//! relay-cli --receipt-timeout-ms 50 --max-transmissions 3
//! ```

mod driver;

use clap::Parser;
use driver::DriverConfig;
use relay_core::CommunicatorConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Relay transport engine demo driver
#[derive(Parser, Debug)]
#[command(name = "relay-cli")]
#[command(about = "Two-party loopback demo for the relay transport engine")]
#[command(version)]
struct Args {
    /// Capacity of the TX and RX slot queues
    #[arg(long, default_value_t = relay_core::config::DEFAULT_QUEUE_SIZE)]
    queue_size: u16,

    /// Milliseconds a `Verifying` entry waits before being retransmitted
    #[arg(long, default_value_t = relay_core::config::DEFAULT_RECEIPT_TIMEOUT_MS)]
    receipt_timeout_ms: u32,

    /// Maximum number of transmission attempts per message
    #[arg(long, default_value_t = relay_core::config::DEFAULT_MAX_TRANSMISSIONS)]
    max_transmissions: u8,

    /// Milliseconds between scheduler/dispatcher ticks
    #[arg(long, default_value_t = 20)]
    tick_interval_ms: u64,

    /// Number of ticks to run before exiting
    #[arg(long, default_value_t = 50)]
    tick_count: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("relay-cli demo starting");

    let config = DriverConfig {
        communicator: CommunicatorConfig {
            queue_size: args.queue_size,
            receipt_timeout_ms: args.receipt_timeout_ms,
            max_transmissions: args.max_transmissions,
        },
        tick_interval_ms: args.tick_interval_ms,
        tick_count: args.tick_count,
    };

    driver::run_demo(config)?;

    tracing::info!("relay-cli demo finished");

    Ok(())
}
