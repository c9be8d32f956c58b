use std::sync::Arc;

use crate::config::Config;
use crate::fitscore::engine::MatchEngine;
use crate::matching::cache::ScoreCache;
use crate::matching::store::MatchStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Coach and job source. `PgMatchStore` in production, in-memory in tests.
    pub store: Arc<dyn MatchStore>,
    /// Preset catalog and scorer, immutable after startup.
    pub engine: MatchEngine,
    pub cache: ScoreCache,
    pub config: Config,
}
