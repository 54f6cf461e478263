//! # Error Types
//!
//! Custom error types for the energy node using `thiserror`.

use thiserror::Error;

/// Main error type for the energy node
#[derive(Debug, Error)]
pub enum EnergyNodeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key material is not valid hex
    #[error("Invalid key encoding: {0}")]
    KeyEncoding(#[from] hex::FromHexError),

    /// Upload called with an empty body
    #[error("No firmware payload provided")]
    EmptyPayload,

    /// Apply or download called before any upload
    #[error("No encrypted firmware present")]
    NoArtifact,

    /// Key is not exactly 32 bytes
    #[error("Firmware key must be 32 bytes, got {0}")]
    KeyLength(usize),

    /// Persisted artifact is too short or not block aligned
    #[error("Malformed firmware artifact ({0} bytes)")]
    MalformedArtifact(usize),

    /// Decrypted pad byte outside 1..=16
    #[error("Invalid padding (pad byte {0})")]
    InvalidPadding(u8),
}

impl EnergyNodeError {
    /// True for failures the requester can fix by issuing a different request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyPayload | Self::NoArtifact)
    }
}

/// Result type alias for the energy node
pub type Result<T> = std::result::Result<T, EnergyNodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classes() {
        assert!(EnergyNodeError::EmptyPayload.is_client_error());
        assert!(EnergyNodeError::NoArtifact.is_client_error());
        assert!(!EnergyNodeError::KeyLength(16).is_client_error());
        assert!(!EnergyNodeError::MalformedArtifact(7).is_client_error());
        assert!(!EnergyNodeError::InvalidPadding(0).is_client_error());
    }

    #[test]
    fn test_error_messages_carry_detail() {
        assert_eq!(
            EnergyNodeError::KeyLength(31).to_string(),
            "Firmware key must be 32 bytes, got 31"
        );
        assert_eq!(
            EnergyNodeError::InvalidPadding(200).to_string(),
            "Invalid padding (pad byte 200)"
        );
    }
}
