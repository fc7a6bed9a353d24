//! Cache layer
//!
//! This module provides the caching abstraction used for rendered article HTML
//! and validated sessions. Entries are held in process by a moka cache.
//!
//! # Usage
//!
//! ```rust,ignore
//! use oddspress::cache::{create_cache, CacheLayer};
//! use oddspress::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("key", &"value", Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

/// Cache layer trait
///
/// The generic methods make this trait unusable as `dyn CacheLayer`;
/// hold the concrete `Cache` enum instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

pub use memory::MemoryCache;

/// Cache backend selected at startup
#[derive(Debug)]
pub enum Cache {
    /// In-memory cache using moka
    Memory(MemoryCache),
}

impl Cache {
    /// Default TTL configured for the backend
    pub fn default_ttl(&self) -> Duration {
        match self {
            Cache::Memory(cache) => cache.default_ttl(),
        }
    }
}

#[async_trait]
impl CacheLayer for Cache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self {
            Cache::Memory(cache) => cache.get(key).await,
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.delete(key).await,
        }
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.delete_pattern(pattern).await,
        }
    }

    async fn clear(&self) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.clear().await,
        }
    }
}

/// Create the cache described by configuration
pub fn create_cache(config: &CacheConfig) -> Arc<Cache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    let cache = MemoryCache::with_capacity_and_ttl(config.max_capacity, ttl);
    Arc::new(Cache::Memory(cache))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig {
            ttl_seconds: 42,
            max_capacity: 16,
        };
        let cache = create_cache(&config);
        assert_eq!(cache.default_ttl(), Duration::from_secs(42));

        cache.set("k", &1u32, cache.default_ttl()).await.unwrap();
        let value: Option<u32> = cache.get("k").await.unwrap();
        assert_eq!(value, Some(1));
    }

    #[tokio::test]
    async fn test_enum_dispatch_delete_and_clear() {
        let cache = create_cache(&CacheConfig::default());
        cache.set("post_html:en:a", &"a", Duration::from_secs(60)).await.unwrap();
        cache.set("post_html:ja:a", &"b", Duration::from_secs(60)).await.unwrap();
        cache.set("session:x", &"c", Duration::from_secs(60)).await.unwrap();

        cache.delete_pattern("post_html:*").await.unwrap();
        assert_eq!(cache.get::<String>("post_html:en:a").await.unwrap(), None);
        assert_eq!(cache.get::<String>("session:x").await.unwrap(), Some("c".to_string()));

        cache.clear().await.unwrap();
        assert_eq!(cache.get::<String>("session:x").await.unwrap(), None);
    }
}
