//! Deterministic simulation harness for the transport engine.
//!
//! The `channel` module provides a seeded, lossy/corrupting virtual serial
//! link standing in for the real half-duplex device. The `invariants` module
//! checks the quantified properties the engine must hold across a simulated
//! run, the way model-based and property tests do for richer protocols.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod invariants;
pub mod session;

pub use channel::{FaultProfile, LossyChannel};
pub use invariants::{Invariant, InvariantRegistry, InvariantResult, SystemSnapshot, Violation};
pub use session::LossySession;
