/// Redis caching layer for the tender search service.
///
/// All operations return `Option<T>` for graceful degradation. If Redis is
/// unavailable, callers fall through to compute from source.
///
/// Key schema (namespaced to avoid collisions):
/// - `tds:v1:feed:{feed_id}` — JSON-serialized Vec<TenderRecord> (TTL: 300s)
/// - `tds:v1:search:{sha256(key|limit)}` — JSON-serialized TenderSearchResponse (TTL: 600s)
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::model::TenderRecord;
use tender_common::api::TenderSearchResponse;
use tender_common::redis::RedisCache;

const KEY_PREFIX: &str = "tds:v1:";
/// Feeds are static snapshots, but short enough that a refreshed file is
/// picked up without a restart.
const FEED_TTL_SECS: u64 = 300;
const SEARCH_TTL_SECS: u64 = 600;

pub struct TenderCache {
    redis: RedisCache,
}

impl TenderCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    // --- Feed snapshots ---

    pub async fn get_feed(&self, feed_id: &str) -> Option<Vec<TenderRecord>> {
        let key = format!("{KEY_PREFIX}feed:{feed_id}");
        let json = self.redis.get(&key).await?;
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    pub async fn set_feed(&self, feed_id: &str, records: &[TenderRecord]) {
        let key = format!("{KEY_PREFIX}feed:{feed_id}");
        if let Ok(json) = serde_json::to_string(records) {
            self.redis.set_with_ttl(&key, &json, FEED_TTL_SECS).await;
        }
    }

    // --- Search envelopes ---

    pub async fn get_search(&self, cache_key: &str, limit: usize) -> Option<TenderSearchResponse> {
        let key = search_key(cache_key, limit);
        let json = self.redis.get(&key).await?;
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    pub async fn set_search(&self, cache_key: &str, limit: usize, response: &TenderSearchResponse) {
        let key = search_key(cache_key, limit);
        if let Ok(json) = serde_json::to_string(response) {
            self.redis.set_with_ttl(&key, &json, SEARCH_TTL_SECS).await;
        }
    }

    // --- Invalidation ---

    /// Delete all cached data. Uses SCAN-based prefix deletion (not KEYS).
    /// Returns `false` when no cache is connected or the deletion failed.
    pub async fn invalidate_all(&self) -> bool {
        self.redis.delete_by_prefix(KEY_PREFIX).await
    }
}

/// Compute a deterministic cache key for a search using SHA-256.
fn search_key(cache_key: &str, limit: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cache_key.as_bytes());
    hasher.update(b"|");
    hasher.update(limit.to_string().as_bytes());
    let hash = hasher.finalize();
    format!("{KEY_PREFIX}search:{:x}", hash)
}
