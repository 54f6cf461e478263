//! # Register Map Constants and Types
//!
//! Address layout of the holding-register bank. Address 0 corresponds to
//! protocol register 40001.

/// Number of holding registers exposed to the protocol server
pub const REGISTER_BANK_SIZE: usize = 125;

/// RMS voltage, volts × 100
pub const REG_VOLTAGE: usize = 0;

/// RMS current, amperes × 1000
pub const REG_CURRENT: usize = 1;

/// Active power, watts × 10
pub const REG_ACTIVE_POWER: usize = 2;

/// Reactive power, VAR × 10
pub const REG_REACTIVE_POWER: usize = 3;

/// Power factor × 1000
pub const REG_POWER_FACTOR: usize = 4;

/// Frequency, Hz × 100
pub const REG_FREQUENCY: usize = 5;

/// Upper 16 bits of the Unix timestamp
pub const REG_TIMESTAMP_HIGH: usize = 9;

/// Lower 16 bits of the Unix timestamp
pub const REG_TIMESTAMP_LOW: usize = 10;

pub const VOLTAGE_SCALE: f64 = 100.0;
pub const CURRENT_SCALE: f64 = 1000.0;
pub const ACTIVE_POWER_SCALE: f64 = 10.0;
pub const REACTIVE_POWER_SCALE: f64 = 10.0;
pub const POWER_FACTOR_SCALE: f64 = 1000.0;
pub const FREQUENCY_SCALE: f64 = 100.0;

/// Full contents of the holding-register bank
///
/// Unassigned addresses are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    words: [u16; REGISTER_BANK_SIZE],
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self { words: [0; REGISTER_BANK_SIZE] }
    }
}

impl RegisterMap {
    /// Word at `address`, or `None` past the end of the bank
    pub fn get(&self, address: usize) -> Option<u16> {
        self.words.get(address).copied()
    }

    /// Store `value` at `address`
    ///
    /// # Panics
    ///
    /// Panics if `address >= REGISTER_BANK_SIZE`; all callers use the
    /// `REG_*` constants.
    pub(crate) fn set(&mut self, address: usize, value: u16) {
        self.words[address] = value;
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_layout() {
        assert_eq!(REGISTER_BANK_SIZE, 125);
        assert_eq!(REG_VOLTAGE, 0);
        assert_eq!(REG_FREQUENCY, 5);
        assert_eq!(REG_TIMESTAMP_HIGH, 9);
        assert_eq!(REG_TIMESTAMP_LOW, 10);
    }

    #[test]
    fn test_default_map_is_zero() {
        let map = RegisterMap::default();
        assert_eq!(map.as_slice().len(), REGISTER_BANK_SIZE);
        assert!(map.as_slice().iter().all(|&w| w == 0));
    }

    #[test]
    fn test_get_out_of_range() {
        let map = RegisterMap::default();
        assert_eq!(map.get(124), Some(0));
        assert_eq!(map.get(125), None);
    }

    #[test]
    fn test_set_writes_single_word() {
        let mut map = RegisterMap::default();
        map.set(REG_CURRENT, 7);
        map.set(REG_TIMESTAMP_LOW, 3);
        assert_eq!(map.get(REG_CURRENT), Some(7));
        assert_eq!(map.get(REG_TIMESTAMP_LOW), Some(3));
        assert_eq!(map.as_slice().iter().filter(|&&w| w != 0).count(), 2);
    }
}
