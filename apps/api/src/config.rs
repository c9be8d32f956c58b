use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::fitscore::engine::DEFAULT_PARTITION_SIZE;
use crate::fitscore::ranker::DEFAULT_LIMIT;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Score cache is disabled when unset.
    pub redis_url: Option<String>,
    /// JSON file with preset and coefficient overrides.
    pub fitscore_config_path: Option<PathBuf>,
    pub default_match_limit: usize,
    pub max_match_limit: usize,
    pub scoring_partition_size: usize,
    pub strict_certifications: bool,
    pub score_cache_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            redis_url: optional_env("REDIS_URL"),
            fitscore_config_path: optional_env("FITSCORE_CONFIG_PATH").map(PathBuf::from),
            default_match_limit: parse_env("DEFAULT_MATCH_LIMIT", DEFAULT_LIMIT)?,
            max_match_limit: parse_env("MAX_MATCH_LIMIT", DEFAULT_LIMIT)?,
            scoring_partition_size: parse_env("SCORING_PARTITION_SIZE", DEFAULT_PARTITION_SIZE)?,
            strict_certifications: parse_env("STRICT_CERTIFICATIONS", false)?,
            score_cache_ttl_secs: parse_env("SCORE_CACHE_TTL_SECS", 3600)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        anyhow::ensure!(
            self.database_max_connections >= 1,
            "DATABASE_MAX_CONNECTIONS must be at least 1"
        );
        anyhow::ensure!(self.max_match_limit >= 1, "MAX_MATCH_LIMIT must be at least 1");
        anyhow::ensure!(
            (1..=self.max_match_limit).contains(&self.default_match_limit),
            "DEFAULT_MATCH_LIMIT must be between 1 and MAX_MATCH_LIMIT"
        );
        anyhow::ensure!(
            self.scoring_partition_size >= 1,
            "SCORING_PARTITION_SIZE must be at least 1"
        );
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
