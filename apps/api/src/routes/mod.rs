pub mod health;

use axum::{routing::get, Router};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/coaches/:id/matches",
            get(handlers::handle_coach_matches),
        )
        .route(
            "/api/v1/jobs/:id/candidates",
            get(handlers::handle_job_candidates),
        )
        .route(
            "/api/v1/coaches/:coach_id/jobs/:job_id/fitscore",
            get(handlers::handle_pair_fitscore),
        )
        .route("/api/v1/presets", get(handlers::handle_list_presets))
        .with_state(state)
}
