//! Demo-fleet seeding endpoint.

use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use super::AppState;
use crate::errors::CoreError;
use crate::registry::SeedOutcome;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/seed", post(post_seed))
}

async fn post_seed(
    State((registry, _)): State<AppState>,
) -> Result<Json<SeedOutcome>, CoreError> {
    // ---
    info!("POST /seed");
    let outcome = registry.seed().await?;
    Ok(Json(outcome))
}
