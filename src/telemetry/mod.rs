//! # Telemetry Module
//!
//! Produces and publishes electrical telemetry.
//!
//! This module handles:
//! - Synthesizing AC voltage/current windows and reducing them to RMS and power figures
//! - Publishing one immutable snapshot per cycle
//! - Shared read access to the latest snapshot

pub mod generator;
pub mod store;

use serde::Serialize;

/// One generation cycle's worth of electrical telemetry
///
/// Serializes with the flat key set served by the telemetry endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    /// RMS voltage in volts
    pub voltage: f64,

    /// RMS current in amperes
    pub current: f64,

    /// Active power in watts
    pub active_power: f64,

    /// Reactive power in VAR
    pub reactive_power: f64,

    /// Power factor, -1.0..=1.0
    #[serde(rename = "pf")]
    pub power_factor: f64,

    /// Grid frequency in Hz
    pub frequency: f64,

    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

impl TelemetrySnapshot {
    /// Nominal boot-time reading published before the first generation cycle
    pub fn initial(frequency: f64, timestamp: u64) -> Self {
        Self {
            voltage: 230.0,
            current: 1.23,
            active_power: 283.0,
            reactive_power: 20.0,
            power_factor: 0.95,
            frequency,
            timestamp,
        }
    }
}

/// Current wall-clock time in whole seconds since the Unix epoch
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_json_keys() {
        let snapshot = TelemetrySnapshot::initial(50.0, 1_700_000_000);
        let value = serde_json::to_value(snapshot).unwrap();

        assert_eq!(value["voltage"], 230.0);
        assert_eq!(value["current"], 1.23);
        assert_eq!(value["active_power"], 283.0);
        assert_eq!(value["reactive_power"], 20.0);
        assert_eq!(value["pf"], 0.95);
        assert_eq!(value["frequency"], 50.0);
        assert_eq!(value["timestamp"], 1_700_000_000u64);
        assert_eq!(value.as_object().unwrap().len(), 7);
    }

    #[test]
    fn test_unix_now_is_recent() {
        // 2023-11-14, comfortably in the past
        assert!(unix_now() > 1_700_000_000);
    }
}
