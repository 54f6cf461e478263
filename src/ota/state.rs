//! # OTA State Machine
//!
//! Lifecycle of the encrypted firmware artifact.
//!
//! ```text
//!            upload              apply
//!   Empty ───────────▶ Uploaded ───────▶ Applied
//!                       ▲    ▲              │ │
//!                       │    └── upload ────┘ │ apply
//!                       └─ upload             ▼
//!                                          Applied
//! ```
//!
//! Operations are serialised by one lock, so concurrent callers observe a
//! linear history of uploads and applies.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use super::cipher::FirmwareCipher;
use super::storage::BlobStore;
use crate::error::{EnergyNodeError, Result};

/// Lifecycle state of the stored firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OtaState {
    /// Nothing uploaded
    Empty,
    /// Encrypted artifact stored, not applied since the last upload
    Uploaded,
    /// Current artifact decrypted into the applied blob
    Applied,
}

/// Blob names used by the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobNames {
    pub artifact: String,
    pub applied: String,
}

impl Default for BlobNames {
    fn default() -> Self {
        Self {
            artifact: "firmware.enc".to_string(),
            applied: "firmware_applied.bin".to_string(),
        }
    }
}

/// Controller over the persisted artifact and applied plaintext
#[derive(Debug)]
pub struct OtaStateMachine<S> {
    cipher: FirmwareCipher,
    store: S,
    names: BlobNames,
    state: Mutex<OtaState>,
}

impl<S: BlobStore> OtaStateMachine<S> {
    /// Create the state machine over `store`
    ///
    /// An artifact already present in the store is treated as `Uploaded`;
    /// whether it was applied before a restart is not recorded.
    pub fn new(cipher: FirmwareCipher, store: S, names: BlobNames) -> Result<Self> {
        let state = if store.read(&names.artifact)?.is_some() {
            OtaState::Uploaded
        } else {
            OtaState::Empty
        };
        info!("OTA state recovered as {:?}", state);

        Ok(Self { cipher, store, names, state: Mutex::new(state) })
    }

    pub fn state(&self) -> OtaState {
        *self.state.lock()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encrypt `firmware` and store it as the artifact
    ///
    /// Always ends in `Uploaded`, replacing any earlier artifact. A previously
    /// applied blob stays on disk until the next successful apply.
    ///
    /// # Errors
    ///
    /// `EmptyPayload` for an empty body; `Io` if the artifact cannot be stored
    /// (state is then unchanged).
    pub fn upload(&self, firmware: &[u8]) -> Result<OtaState> {
        if firmware.is_empty() {
            return Err(EnergyNodeError::EmptyPayload);
        }

        let mut state = self.state.lock();
        let artifact = self.cipher.encrypt(firmware);
        self.store.write(&self.names.artifact, &artifact)?;
        *state = OtaState::Uploaded;

        info!(
            "Firmware uploaded: {} bytes plaintext, {} bytes encrypted",
            firmware.len(),
            artifact.len()
        );
        Ok(*state)
    }

    /// Decrypt the stored artifact into the applied blob
    ///
    /// Returns the number of plaintext bytes applied. On any failure the
    /// state and the applied blob are left untouched.
    ///
    /// # Errors
    ///
    /// `NoArtifact` before any upload; `MalformedArtifact` / `InvalidPadding`
    /// if decryption fails; `Io` on storage failure.
    pub fn apply(&self) -> Result<usize> {
        let mut state = self.state.lock();
        let artifact = self.load_artifact(*state)?;

        let firmware = self.cipher.decrypt(&artifact).map_err(|e| {
            warn!("Firmware decrypt failed: {}", e);
            e
        })?;

        self.store.write(&self.names.applied, &firmware)?;
        *state = OtaState::Applied;

        info!("Firmware applied: {} bytes", firmware.len());
        Ok(firmware.len())
    }

    /// Raw stored artifact, exactly as persisted
    ///
    /// # Errors
    ///
    /// `NoArtifact` before any upload
    pub fn download(&self) -> Result<Vec<u8>> {
        let state = self.state.lock();
        self.load_artifact(*state)
    }

    fn load_artifact(&self, state: OtaState) -> Result<Vec<u8>> {
        if state == OtaState::Empty {
            return Err(EnergyNodeError::NoArtifact);
        }
        self.store
            .read(&self.names.artifact)?
            .ok_or(EnergyNodeError::NoArtifact)
    }
}
