//! Operator control endpoint.
//!
//! `POST /devices/{id}/control` takes the raw `{action, params}` wire
//! shape, validates it into a typed command, and dispatches it against
//! the registry. A failed command surfaces as its error status; success
//! is never fabricated.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use super::AppState;
use crate::commands::ControlRequest;
use crate::errors::CoreError;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/devices/{id}/control", post(post_control))
}

async fn post_control(
    Path(id): Path<String>,
    State((registry, _)): State<AppState>,
    Json(request): Json<ControlRequest>,
) -> Result<Json<Value>, CoreError> {
    // ---
    info!("POST /devices/{id}/control - action '{}'", request.action);

    let command = request.into_command()?;
    let device = registry.dispatch(&id, command).await?;

    Ok(Json(json!({ "status": "updated", "device": device })))
}
