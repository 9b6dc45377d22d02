//! Built-in recipe catalog endpoint.
//!
//! Each catalog entry is served with its derived totals so dashboards do
//! not have to reimplement the venting minutes-to-hours conversion.

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::debug;

use crate::recipe::{self, Recipe};

// ---

#[derive(Serialize)]
struct RecipeSummary {
    // ---
    #[serde(flatten)]
    recipe: Recipe,
    #[serde(rename = "totalDurationHours")]
    total_duration_hours: f64,
    #[serde(rename = "enabledPhases")]
    enabled_phases: usize,
}

async fn list_recipes() -> Json<Vec<RecipeSummary>> {
    // ---
    debug!("GET /recipes");
    let summaries = recipe::catalog()
        .into_iter()
        .map(|recipe| {
            let total_duration_hours = recipe.total_duration_hours();
            let enabled_phases = recipe.sequence().len();
            RecipeSummary {
                recipe,
                total_duration_hours,
                enabled_phases,
            }
        })
        .collect();
    Json(summaries)
}

/// Generic over the state: the catalog is static reference data and needs
/// none of it.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/recipes", get(list_recipes))
}
