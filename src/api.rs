//! # Endpoint Logic
//!
//! Framework-neutral handlers behind the node's request-style endpoints.
//! A web layer maps each [`ApiResponse`] onto its own response type.
//!
//! | Endpoint                  | Handler                         |
//! |---------------------------|---------------------------------|
//! | `GET  /api/telemetry`     | [`NodeApi::telemetry`]          |
//! | `GET  /api/status`        | [`NodeApi::status`]             |
//! | `POST /ota/upload`        | [`NodeApi::upload`]             |
//! | `POST /ota/apply`         | [`NodeApi::apply`]              |
//! | `GET  /ota/download-encrypted` | [`NodeApi::download_encrypted`] |

use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use tracing::{info, warn};

use crate::error::EnergyNodeError;
use crate::ota::state::OtaStateMachine;
use crate::ota::storage::BlobStore;
use crate::telemetry::store::TelemetryStore;

/// Attachment name of the downloaded artifact
pub const DOWNLOAD_FILENAME: &str = "firmware.enc";

/// HTTP status of a handler result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    InternalServerError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
        }
    }
}

/// Response payload
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(serde_json::Value),
    Attachment { filename: String, bytes: Bytes },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: Status,
    pub body: Body,
}

impl ApiResponse {
    fn text(status: Status, message: impl Into<String>) -> Self {
        Self { status, body: Body::Text(message.into()) }
    }

    fn json(value: serde_json::Value) -> Self {
        Self { status: Status::Ok, body: Body::Json(value) }
    }
}

/// Handlers over the telemetry store and the OTA state machine
pub struct NodeApi<S> {
    telemetry: TelemetryStore,
    ota: Arc<OtaStateMachine<S>>,
}

impl<S> Clone for NodeApi<S> {
    fn clone(&self) -> Self {
        Self { telemetry: self.telemetry.clone(), ota: Arc::clone(&self.ota) }
    }
}

impl<S: BlobStore> NodeApi<S> {
    pub fn new(telemetry: TelemetryStore, ota: Arc<OtaStateMachine<S>>) -> Self {
        Self { telemetry, ota }
    }

    /// Current snapshot as a flat JSON object
    pub fn telemetry(&self) -> ApiResponse {
        match serde_json::to_value(*self.telemetry.read()) {
            Ok(value) => ApiResponse::json(value),
            Err(e) => ApiResponse::text(Status::InternalServerError, e.to_string()),
        }
    }

    /// Lifecycle state of the stored firmware
    pub fn status(&self) -> ApiResponse {
        ApiResponse::json(json!({ "ota_state": self.ota.state() }))
    }

    /// Encrypt and store an uploaded firmware image
    pub fn upload(&self, body: &[u8]) -> ApiResponse {
        match self.ota.upload(body) {
            Ok(_) => ApiResponse::text(Status::Ok, "Firmware uploaded and encrypted"),
            Err(EnergyNodeError::EmptyPayload) => {
                ApiResponse::text(Status::BadRequest, "No file provided")
            }
            Err(e) => {
                warn!("Firmware upload failed: {}", e);
                ApiResponse::text(Status::InternalServerError, format!("Upload failed: {}", e))
            }
        }
    }

    /// Decrypt the stored artifact into the applied image
    pub fn apply(&self) -> ApiResponse {
        match self.ota.apply() {
            Ok(len) => {
                info!("Apply request completed ({} bytes)", len);
                ApiResponse::text(Status::Ok, "Firmware decrypted and applied (simulated)")
            }
            Err(EnergyNodeError::NoArtifact) => {
                ApiResponse::text(Status::BadRequest, EnergyNodeError::NoArtifact.to_string())
            }
            Err(EnergyNodeError::Io(e)) => {
                warn!("Firmware apply failed: {}", e);
                ApiResponse::text(Status::InternalServerError, format!("Apply failed: {}", e))
            }
            Err(e) => ApiResponse::text(
                Status::InternalServerError,
                format!("Decrypt failed: {}", e),
            ),
        }
    }

    /// Raw encrypted artifact as a `firmware.enc` attachment
    pub fn download_encrypted(&self) -> ApiResponse {
        match self.ota.download() {
            Ok(artifact) => ApiResponse {
                status: Status::Ok,
                body: Body::Attachment {
                    filename: DOWNLOAD_FILENAME.to_string(),
                    bytes: Bytes::from(artifact),
                },
            },
            Err(EnergyNodeError::NoArtifact) => {
                ApiResponse::text(Status::NotFound, EnergyNodeError::NoArtifact.to_string())
            }
            Err(e) => ApiResponse::text(Status::InternalServerError, e.to_string()),
        }
    }
}
