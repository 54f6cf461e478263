//! Seam between the register encoder and the register-protocol server

use std::sync::Arc;

use parking_lot::RwLock;

use super::map::{RegisterMap, REGISTER_BANK_SIZE};
use crate::error::Result;

/// Destination of encoded register banks
///
/// Implemented by whatever serves holding registers to supervisory systems.
/// Each call replaces the whole bank.
#[cfg_attr(test, mockall::automock)]
pub trait RegisterSink: Send + Sync {
    fn publish(&self, map: &RegisterMap) -> Result<()>;
}

/// Shared in-memory holding-register bank
///
/// A protocol server keeps a clone and answers reads from it while the
/// refresh task publishes into it.
#[derive(Debug, Clone)]
pub struct HoldingRegisters {
    bank: Arc<RwLock<RegisterMap>>,
}

impl Default for HoldingRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl HoldingRegisters {
    pub fn new() -> Self {
        Self { bank: Arc::new(RwLock::new(RegisterMap::default())) }
    }

    /// Read `count` words starting at `start`
    ///
    /// Returns `None` if the range runs past the end of the bank.
    pub fn read(&self, start: usize, count: usize) -> Option<Vec<u16>> {
        let end = start.checked_add(count)?;
        if end > REGISTER_BANK_SIZE {
            return None;
        }
        Some(self.bank.read().as_slice()[start..end].to_vec())
    }

    /// Copy of the whole bank
    pub fn snapshot(&self) -> RegisterMap {
        *self.bank.read()
    }
}

impl RegisterSink for HoldingRegisters {
    fn publish(&self, map: &RegisterMap) -> Result<()> {
        *self.bank.write() = *map;
        Ok(())
    }
}
