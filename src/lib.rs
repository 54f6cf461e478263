//! # Energy Node Library
//!
//! Industrial energy-metering node: synthetic electrical telemetry, a
//! fixed-point holding-register bank for supervisory polling, and an
//! encrypted over-the-air firmware lifecycle.
//!
//! The register-protocol server and the web layer are external; they consume
//! [`registers::sink::HoldingRegisters`] and [`api::NodeApi`] respectively.

pub mod config;
pub mod error;
pub mod logging;
pub mod telemetry;
pub mod registers;
pub mod ota;
pub mod runtime;
pub mod api;
