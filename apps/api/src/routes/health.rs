use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, and the loaded preset catalog size.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "fitscore-api",
        "scorer": state.engine.scorer_backend(),
        "presets": state.engine.catalog().names().count(),
        "score_cache": state.cache.is_enabled(),
    }))
}
