//! Telemetry history endpoint.
//!
//! Serves `{source, points}` so dashboards can tell recorded data from
//! the synthesized demo series apart.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::errors::CoreError;
use crate::history::HistorySeries;

// ---

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    days: Option<u32>,
}

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/devices/{id}/history", get(get_history))
}

async fn get_history(
    Path(id): Path<String>,
    Query(params): Query<HistoryQuery>,
    State((registry, _)): State<AppState>,
) -> Result<Json<HistorySeries>, CoreError> {
    // ---
    let days = params.days.unwrap_or(1);
    info!("GET /devices/{id}/history - {days} day(s)");

    let series = registry.history(&id, days).await?;
    Ok(Json(series))
}
