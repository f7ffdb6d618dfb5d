use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use crate::models::FilterCriteria;
use crate::services::traits::CriteriaStore;

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

/// Two-tier cache manager
///
/// L1 is an in-process moka cache, L2 is Redis shared across instances.
/// Holds per-user filter criteria so they survive between sessions.
pub struct CacheManager {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a new cache manager
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1_cache,
            ttl_secs,
        })
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        if let Some(json) = value {
            tracing::trace!("L2 cache hit: {}", key);
            self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;
            return Ok(serde_json::from_str(&json)?);
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in both tiers, expiring from Redis after the TTL
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        self.write(key, value, Some(self.ttl_secs)).await
    }

    /// Set a value in both tiers with no Redis expiry
    ///
    /// The L1 copy still follows the TTL and is refilled from Redis.
    pub async fn persist<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        self.write(key, value, None).await
    }

    async fn write<T>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

        let mut conn = self.redis.lock().await;
        let _: () = write_command(key, &json, ttl_secs)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        tracing::trace!("Cache set: {} (ttl {:?})", key, ttl_secs);
        Ok(())
    }
}

fn write_command(key: &str, json: &str, ttl_secs: Option<u64>) -> redis::Cmd {
    match ttl_secs {
        Some(ttl) => {
            let mut cmd = redis::cmd("SETEX");
            cmd.arg(key).arg(ttl).arg(json);
            cmd
        }
        None => {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(json);
            cmd
        }
    }
}

#[async_trait]
impl CriteriaStore for CacheManager {
    async fn load_criteria(&self, user_id: &str) -> Result<Option<FilterCriteria>, CacheError> {
        match self.get(&CacheKey::criteria(user_id)).await {
            Ok(criteria) => Ok(Some(criteria)),
            Err(CacheError::CacheMiss(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn save_criteria(&self, user_id: &str, criteria: &FilterCriteria) -> Result<(), CacheError> {
        self.persist(&CacheKey::criteria(user_id), criteria).await
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for persisted filter criteria
    pub fn criteria(user_id: &str) -> String {
        format!("criteria:{}", user_id)
    }
}
