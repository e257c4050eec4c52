use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use crate::models::MatchContext;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Byte-level memoization of identical requests
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set_raw(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}

/// Multi-tier cache manager
///
/// L1 is an in-process moka cache. L2 is Redis when a URL is configured,
/// shared across instances. A disabled manager always misses and drops writes.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
    enabled: bool,
}

impl CacheManager {
    /// Create a cache manager with an L2 Redis tier
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            ..Self::in_memory(l1_size, ttl_secs)
        })
    }

    /// Create an L1-only cache manager
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            redis: None,
            l1_cache,
            ttl_secs,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::in_memory(1, 1)
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.get_raw(key).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Err(CacheError::CacheMiss(key.to_string())),
        }
    }

    /// Set a value in both tiers with the configured TTL
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.set_raw(key, bytes, self.ttl()).await
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            l1_size: self.l1_cache.entry_count(),
            l2_configured: self.redis.is_some(),
        }
    }
}

#[async_trait]
impl ResponseCache for CacheManager {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        if !self.enabled {
            return Ok(None);
        }

        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(Some(bytes));
        }

        let Some(redis) = &self.redis else {
            tracing::trace!("Cache miss: {}", key);
            return Ok(None);
        };

        let mut conn = redis.lock().await;
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        match value {
            Some(bytes) => {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache.insert(key.to_string(), bytes.clone()).await;
                Ok(Some(bytes))
            }
            None => {
                tracing::trace!("Cache miss: {}", key);
                Ok(None)
            }
        }
    }

    async fn set_raw(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        if !self.enabled {
            return Ok(());
        }

        // L1 entries expire on the manager-wide TTL
        self.l1_cache.insert(key.to_string(), bytes.clone()).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(ttl.as_secs().max(1))
                .arg(bytes)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub l1_size: u64,
    pub l2_configured: bool,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for a find-matches response; identical parameters share a key
    pub fn matches(user_id: &str, context: MatchContext, min_confidence: f64, max_results: usize) -> String {
        format!("matches:{}:{}:{:.4}:{}", user_id, context, min_confidence, max_results)
    }

    /// Key for a pairwise similarity response
    pub fn similarity(user_id_1: &str, user_id_2: &str, context: MatchContext) -> String {
        format!("similarity:{}:{}:{}", user_id_1, user_id_2, context)
    }
}
