//! Telemetry ingestion endpoint.
//!
//! `POST /devices/{id}/telemetry` is the chambers' reporting channel; the
//! response is the only feedback path from server to device, carrying the
//! current setpoint and control mode for reconciliation.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use tracing::{debug, info};

use super::AppState;
use crate::errors::CoreError;
use crate::registry::{IngestOutcome, TelemetryFrame};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/devices/{id}/telemetry", post(post_telemetry))
}

async fn post_telemetry(
    Path(id): Path<String>,
    State((registry, _)): State<AppState>,
    Json(frame): Json<TelemetryFrame>,
) -> Result<Json<IngestOutcome>, CoreError> {
    // ---
    debug!("POST /devices/{id}/telemetry");

    let outcome = registry.ingest(&id, frame).await?;
    if let IngestOutcome::Provisioned { device, .. } = &outcome {
        info!("POST /devices/{id}/telemetry - provisioned '{}'", device.name);
    }
    Ok(Json(outcome))
}
