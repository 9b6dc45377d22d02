use std::sync::Arc;

use axum::Router;

use crate::{Config, Registry};

mod control;
mod devices;
mod health;
mod history;
mod recipes;
mod seed;
mod telemetry;

// ---

/// Shared state handed to every handler.
pub type AppState = (Arc<Registry>, Config);

pub fn router(registry: Arc<Registry>, config: Config) -> Router {
    // ---
    let api = Router::new()
        .merge(devices::router())
        .merge(history::router())
        .merge(telemetry::router())
        .merge(control::router())
        .merge(seed::router())
        .merge(recipes::router())
        .merge(health::router());

    let prefix = config.api_prefix.clone();
    Router::new()
        .nest(&prefix, api)
        .with_state((registry, config))
}
