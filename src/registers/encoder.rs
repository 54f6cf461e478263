//! # Register Encoder
//!
//! Encodes a [`TelemetrySnapshot`] into the holding-register bank.

use super::map::*;
use crate::telemetry::TelemetrySnapshot;

/// Encode a snapshot into a complete register bank
///
/// Deterministic and infallible. Every field is scaled, rounded half away
/// from zero and wrapped to 16 bits; the timestamp is split across two
/// words, high half first.
///
/// # Examples
///
/// ```
/// use energy_node::registers::encoder::encode;
/// use energy_node::registers::map::REG_VOLTAGE;
/// use energy_node::telemetry::TelemetrySnapshot;
///
/// let map = encode(&TelemetrySnapshot::initial(50.0, 0));
/// assert_eq!(map.get(REG_VOLTAGE), Some(23000));
/// ```
pub fn encode(snapshot: &TelemetrySnapshot) -> RegisterMap {
    let mut map = RegisterMap::default();

    map.set(REG_VOLTAGE, scale_to_word(snapshot.voltage, VOLTAGE_SCALE));
    map.set(REG_CURRENT, scale_to_word(snapshot.current, CURRENT_SCALE));
    map.set(REG_ACTIVE_POWER, scale_to_word(snapshot.active_power, ACTIVE_POWER_SCALE));
    map.set(REG_REACTIVE_POWER, scale_to_word(snapshot.reactive_power, REACTIVE_POWER_SCALE));
    map.set(REG_POWER_FACTOR, scale_to_word(snapshot.power_factor, POWER_FACTOR_SCALE));
    map.set(REG_FREQUENCY, scale_to_word(snapshot.frequency, FREQUENCY_SCALE));

    let (high, low) = split_timestamp(snapshot.timestamp);
    map.set(REG_TIMESTAMP_HIGH, high);
    map.set(REG_TIMESTAMP_LOW, low);

    map
}

/// Scale to fixed point and keep the low 16 bits
///
/// Negative results wrap as two's complement, e.g. -1.0 at ×10 gives 0xFFF6.
pub fn scale_to_word(value: f64, scale: f64) -> u16 {
    ((value * scale).round() as i64 & 0xFFFF) as u16
}

/// Split a timestamp into `(high, low)` 16-bit halves of its low 32 bits
pub fn split_timestamp(timestamp: u64) -> (u16, u16) {
    (((timestamp >> 16) & 0xFFFF) as u16, (timestamp & 0xFFFF) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            voltage: 230.0,
            current: 1.23,
            active_power: 283.0,
            reactive_power: 20.0,
            power_factor: 0.95,
            frequency: 50.0,
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_reference_encoding() {
        let map = encode(&reference_snapshot());

        assert_eq!(map.get(REG_VOLTAGE), Some(23000));
        assert_eq!(map.get(REG_CURRENT), Some(1230));
        assert_eq!(map.get(REG_ACTIVE_POWER), Some(2830));
        assert_eq!(map.get(REG_REACTIVE_POWER), Some(200));
        assert_eq!(map.get(REG_POWER_FACTOR), Some(950));
        assert_eq!(map.get(REG_FREQUENCY), Some(5000));
        assert_eq!(map.get(REG_TIMESTAMP_HIGH), Some(((1_700_000_000u64 >> 16) & 0xFFFF) as u16));
        assert_eq!(map.get(REG_TIMESTAMP_LOW), Some((1_700_000_000u64 & 0xFFFF) as u16));
        assert_eq!(map.get(REG_TIMESTAMP_HIGH), Some(25939));
        assert_eq!(map.get(REG_TIMESTAMP_LOW), Some(61696));
    }

    #[test]
    fn test_unassigned_addresses_are_zero() {
        let map = encode(&reference_snapshot());
        let assigned = [0, 1, 2, 3, 4, 5, 9, 10];

        for address in 0..REGISTER_BANK_SIZE {
            if !assigned.contains(&address) {
                assert_eq!(map.get(address), Some(0), "address {} should be zero", address);
            }
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let snapshot = reference_snapshot();
        assert_eq!(encode(&snapshot), encode(&snapshot));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(scale_to_word(0.125, 100.0), 13);
        assert_eq!(scale_to_word(0.124, 100.0), 12);
        assert_eq!(scale_to_word(-0.125, 100.0), (-13i64 & 0xFFFF) as u16);
    }

    #[test]
    fn test_negative_values_wrap() {
        assert_eq!(scale_to_word(-1.0, 10.0), 0xFFF6);
        assert_eq!(scale_to_word(-0.5, 1000.0), 65036);
    }

    #[test]
    fn test_overflow_wraps() {
        // 700 V × 100 = 70000 = 0x11170
        assert_eq!(scale_to_word(700.0, VOLTAGE_SCALE), 0x1170);
        assert_eq!(scale_to_word(655.36, VOLTAGE_SCALE), 0);
    }

    #[test]
    fn test_negative_power_factor_register() {
        let mut snapshot = reference_snapshot();
        snapshot.active_power = -283.0;
        snapshot.power_factor = -0.95;
        let map = encode(&snapshot);

        assert_eq!(map.get(REG_ACTIVE_POWER), Some(0xF4F2));
        assert_eq!(map.get(REG_POWER_FACTOR), Some(0xFC4A));
    }

    #[test]
    fn test_split_timestamp() {
        assert_eq!(split_timestamp(0), (0, 0));
        assert_eq!(split_timestamp(0x0001_0002), (1, 2));
        assert_eq!(split_timestamp(0xFFFF_FFFF), (0xFFFF, 0xFFFF));
        // Only the low 32 bits are representable
        assert_eq!(split_timestamp(0x1_0000_0005), (0, 5));
    }
}
