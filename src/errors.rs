//! Error taxonomy for the `chamberflow` core.
//!
//! Three failure classes cross the HTTP boundary:
//! - `NotFound` – a read or control command named an unknown device id
//! - `Storage` – the key-value backend failed; the operation was aborted
//! - `InvalidPayload` – a command or sample failed validation before dispatch
//!
//! Handlers return `CoreError` directly; the [`IntoResponse`] impl maps each
//! variant to its status code with an `{"error": "..."}` body. Failures are
//! surfaced as-is — the server never reports success for a mutation that did
//! not happen.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

// ---

/// Domain errors surfaced by the registry and command dispatcher.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No device is registered under the requested id.
    #[error("Device not found")]
    NotFound {
        /// Device id that missed.
        id: String,
    },

    /// The key-value backend failed mid-operation.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// A request body failed validation before it reached the registry.
    #[error("invalid payload: {reason}")]
    InvalidPayload {
        /// Human-readable validation failure.
        reason: String,
    },
}

impl CoreError {
    // ---

    /// Shorthand for a `NotFound` on the given device id.
    pub fn not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound { id: id.into() }
    }

    /// Shorthand for an `InvalidPayload` with the given reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        CoreError::InvalidPayload {
            reason: reason.into(),
        }
    }
}

impl IntoResponse for CoreError {
    // ---
    fn into_response(self) -> Response {
        let status = match &self {
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
        };

        if let CoreError::NotFound { id } = &self {
            tracing::debug!("Lookup missed for device {}", id);
        }
        if let CoreError::Storage(e) = &self {
            tracing::error!("Storage backend failure: {}", e);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
