//! # OTA Firmware Module
//!
//! Encrypted firmware artifact lifecycle: upload → apply → download.
//!
//! This module handles:
//! - AES-256-CBC encryption of uploaded firmware under a fixed process key
//! - Atomic persistence of the encrypted artifact and the applied plaintext
//! - The `Empty → Uploaded → Applied` state machine

pub mod cipher;
pub mod storage;
pub mod state;

use crate::config::OtaConfig;
use crate::error::Result;

use cipher::FirmwareCipher;
use state::{BlobNames, OtaStateMachine};
use storage::DirBlobStore;

impl From<&OtaConfig> for BlobNames {
    fn from(config: &OtaConfig) -> Self {
        Self {
            artifact: config.artifact_name.clone(),
            applied: config.applied_name.clone(),
        }
    }
}

/// Build the on-disk state machine described by `config`
///
/// # Errors
///
/// Key errors (`KeyEncoding`, `KeyLength`) and failure to create the storage
/// directory; callers treat all of these as fatal at startup.
pub fn open(config: &OtaConfig) -> Result<OtaStateMachine<DirBlobStore>> {
    let cipher = FirmwareCipher::new(&config.key_bytes()?)?;
    let store = DirBlobStore::open(&config.storage_dir)?;
    OtaStateMachine::new(cipher, store, BlobNames::from(config))
}
