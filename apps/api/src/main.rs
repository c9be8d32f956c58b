mod auth;
mod config;
mod db;
mod errors;
mod fitscore;
mod matching;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::fitscore::engine::MatchEngine;
use crate::fitscore::scoring::WeightedFitScorer;
use crate::fitscore::settings::EngineSettings;
use crate::matching::cache::ScoreCache;
use crate::matching::store::PgMatchStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting FitScore API v{}", env!("CARGO_PKG_VERSION"));

    // Presets and coefficients are validated here; a bad override aborts boot.
    let settings = EngineSettings::load(config.fitscore_config_path.as_deref())?;
    let presets: Vec<&str> = settings.catalog.names().collect();
    info!("FitScore presets: {}", presets.join(", "));
    let fingerprint = settings.fingerprint(config.strict_certifications)?;

    let engine = MatchEngine::new(
        Arc::new(settings.catalog),
        Arc::new(WeightedFitScorer::new(settings.coefficients)),
    )
    .with_partition_size(config.scoring_partition_size);
    info!(
        "Match engine ready (scorer: {}, partition size: {}, strict certifications: {})",
        engine.scorer_backend(),
        config.scoring_partition_size,
        config.strict_certifications
    );

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize Redis score cache (optional)
    let cache = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!(
                "Redis score cache enabled (ttl {}s, settings {fingerprint})",
                config.score_cache_ttl_secs
            );
            ScoreCache::new(client, config.score_cache_ttl_secs).with_fingerprint(fingerprint)
        }
        None => {
            info!("REDIS_URL not set; score cache disabled");
            ScoreCache::disabled()
        }
    };

    // Build app state
    let state = AppState {
        store: Arc::new(PgMatchStore::new(db)),
        engine,
        cache,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
