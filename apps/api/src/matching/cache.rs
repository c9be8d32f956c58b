use std::sync::Arc;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::fitscore::model::{CoachProfile, JobPosting, ScoredPair};

/// Raw string storage under the score cache.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> redis::RedisResult<Option<String>>;

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> redis::RedisResult<()>;
}

pub struct RedisBackend {
    client: redis::Client,
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> redis::RedisResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.get(key).await
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> redis::RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex(key, value, ttl_secs).await
    }
}

/// Map-backed store for tests. TTLs are ignored.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryBackend {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> redis::RedisResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set_ex(&self, key: &str, value: String, _ttl_secs: u64) -> redis::RedisResult<()> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

/// Optional cache for single-pair scores.
///
/// Keys embed both records' `updated_at` and the fingerprint of the scoring settings,
/// so editing either record or restarting with different weights, coefficients or
/// strict mode misses the cache instead of needing an explicit purge. Backend failures
/// degrade to a miss.
#[derive(Clone)]
pub struct ScoreCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl_secs: u64,
    fingerprint: String,
}

impl ScoreCache {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self::with_backend(Arc::new(RedisBackend { client }), ttl_secs)
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>, ttl_secs: u64) -> Self {
        Self {
            backend: Some(backend),
            ttl_secs,
            fingerprint: String::new(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl_secs: 0,
            fingerprint: String::new(),
        }
    }

    /// Versions every key with the digest from `EngineSettings::fingerprint`.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn key(&self, coach: &CoachProfile, job: &JobPosting) -> String {
        format!(
            "fitscore:v2:{}:{}:{}:{}:{}:{}",
            self.fingerprint,
            coach.id,
            coach.updated_at.timestamp_micros(),
            job.id,
            job.updated_at.timestamp_micros(),
            job.weighting_preset
        )
    }

    pub async fn get(&self, coach: &CoachProfile, job: &JobPosting) -> Option<ScoredPair> {
        let backend = self.backend.as_ref()?;
        let key = self.key(coach, job);

        let raw = match backend.get(&key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Score cache read failed for {key}: {e}");
                return None;
            }
        };

        let pair = raw.and_then(|raw| match serde_json::from_str::<ScoredPair>(&raw) {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!("Discarding unreadable cache entry {key}: {e}");
                None
            }
        });
        debug!("Score cache {} for {key}", if pair.is_some() { "hit" } else { "miss" });
        pair
    }

    pub async fn put(&self, coach: &CoachProfile, job: &JobPosting, pair: &ScoredPair) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let key = self.key(coach, job);
        let value = match serde_json::to_string(pair) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize score for {key}: {e}");
                return;
            }
        };

        if let Err(e) = backend.set_ex(&key, value, self.ttl_secs).await {
            warn!("Score cache write failed for {key}: {e}");
        }
    }
}
