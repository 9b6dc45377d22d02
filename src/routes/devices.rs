//! Device read endpoints: fleet listing and single-device lookup.
//!
//! Reads are side-effect-free apart from the empty-registry auto-seed on
//! the list route; process progress is refreshed in the response without
//! being persisted.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, info};

use super::AppState;
use crate::errors::CoreError;
use crate::models::Device;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/devices", get(list_devices))
        .route("/devices/{id}", get(get_device))
}

async fn list_devices(
    State((registry, _)): State<AppState>,
) -> Result<Json<Vec<Device>>, CoreError> {
    // ---
    info!("GET /devices");
    let devices = registry.list_devices().await?;
    debug!("GET /devices - returning {} devices", devices.len());
    Ok(Json(devices))
}

async fn get_device(
    Path(id): Path<String>,
    State((registry, _)): State<AppState>,
) -> Result<Json<Device>, CoreError> {
    // ---
    debug!("GET /devices/{id}");
    let device = registry.get_device(&id).await?;
    Ok(Json(device))
}
