//! Response memoization with per-entry expiry
//!
//! [`ResponseCache`] is the seam where a networked key-value store plugs in;
//! [`MemoryCache`] keeps entries in-process.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde_json::Value;
use tracing::debug;

pub const PREDICTIONS_PREFIX: &str = "predictions";
pub const INSIGHTS_PREFIX: &str = "insights";

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set_with_expiry(&self, key: &str, value: Value, ttl: Duration);
}

/// `"<prefix>:<hash>"` of the payload's canonical JSON text
pub fn cache_key(prefix: &str, payload: &Value) -> String {
    let mut hasher = DefaultHasher::new();
    payload.to_string().hash(&mut hasher);
    format!("{prefix}:{:016x}", hasher.finish())
}

#[derive(Clone)]
struct CachedResponse {
    value: Value,
    ttl: Duration,
}

/// Each entry lives for the TTL it was stored with
struct PerEntryTtl;

impl Expiry<String, CachedResponse> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedResponse,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedResponse,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache bounded by entry count
pub struct MemoryCache {
    cache: Cache<String, CachedResponse>,
}

impl MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }

    /// Approximate number of live entries
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply pending evictions and expirations
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        self.cache.get(key).await.map(|entry| entry.value)
    }

    async fn set_with_expiry(&self, key: &str, value: Value, ttl: Duration) {
        debug!(%key, ttl_secs = ttl.as_secs(), "caching response");
        self.cache
            .insert(key.to_string(), CachedResponse { value, ttl })
            .await;
    }
}
