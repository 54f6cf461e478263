//! # Holding Register Module
//!
//! Maps telemetry onto the fixed 16-bit holding-register bank polled by
//! supervisory systems.
//!
//! This module handles:
//! - Register addresses and scale factors
//! - Fixed-point encoding of snapshots (round half away from zero, wrap to 16 bits)
//! - Handing the encoded bank to the register-protocol server

pub mod map;
pub mod encoder;
pub mod sink;
