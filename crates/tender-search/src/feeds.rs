/// Data feed registry.
///
/// One JSON document per portal under the feeds directory, each an array of
/// `TenderRecord` objects. Feeds are read-only snapshots loaded fresh per
/// query, memoized in Redis with a short TTL to bound repeated I/O. A single
/// feed failing to load never aborts the search: it is skipped, logged, and
/// reported in the summary's failed-feed list.
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::cache::TenderCache;
use crate::error::AppError;
use crate::model::TenderRecord;

/// One portal's records, tagged with the portal id (the file stem).
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub id: String,
    pub records: Vec<TenderRecord>,
}

pub struct FeedRegistry {
    dir: PathBuf,
}

impl FeedRegistry {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Portal ids available on disk, sorted for deterministic probe order.
    pub fn feed_ids(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            warn!(dir = %self.dir.display(), "feeds directory unreadable");
            return Vec::new();
        };
        let mut ids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        ids
    }

    pub fn feed_path(&self, feed_id: &str) -> PathBuf {
        self.dir.join(format!("{feed_id}.json"))
    }

    /// Load one feed from disk.
    pub fn load(&self, feed_id: &str) -> Result<FeedSnapshot, AppError> {
        let path = self.feed_path(feed_id);
        let records = load_records(&path).map_err(|message| AppError::Feed {
            id: feed_id.to_string(),
            message,
        })?;
        Ok(FeedSnapshot {
            id: feed_id.to_string(),
            records,
        })
    }

    /// Load every feed (optionally restricted to one portal), going through the
    /// cache. Returns the loaded snapshots plus the ids of feeds that failed;
    /// failures are logged and skipped.
    pub async fn load_all(
        &self,
        cache: &TenderCache,
        portal: Option<&str>,
    ) -> (Vec<FeedSnapshot>, Vec<String>) {
        let ids: Vec<String> = self
            .feed_ids()
            .into_iter()
            .filter(|id| portal.is_none_or(|p| id.eq_ignore_ascii_case(p)))
            .collect();

        let loads = ids.iter().map(|id| self.load_cached(cache, id));
        let outcomes = futures::future::join_all(loads).await;

        let mut snapshots = Vec::new();
        let mut failed = Vec::new();
        for (id, outcome) in ids.into_iter().zip(outcomes) {
            match outcome {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    warn!(feed = %id, error = %e, "feed unavailable, skipping");
                    failed.push(id);
                }
            }
        }
        (snapshots, failed)
    }

    async fn load_cached(&self, cache: &TenderCache, feed_id: &str) -> Result<FeedSnapshot, AppError> {
        if let Some(records) = cache.get_feed(feed_id).await {
            return Ok(FeedSnapshot {
                id: feed_id.to_string(),
                records,
            });
        }
        let snapshot = self.load(feed_id)?;
        cache.set_feed(feed_id, &snapshot.records).await;
        Ok(snapshot)
    }
}

fn load_records(path: &Path) -> Result<Vec<TenderRecord>, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("parse {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tender_common::redis::RedisCache;

    const FEED: &str = r#"[
        {
            "tender_id": "GEM-2026-001",
            "title": "Supply of 11KV HT XLPE Cable",
            "organisation": "Metro Power Distribution Ltd",
            "city": "Mumbai",
            "due_date": "2026-09-15",
            "estimated_cost": 4500000.0,
            "requirements": [
                {"category": "ht_power_cable", "voltage_kv": 11.0, "core_count": 3,
                 "cross_section_sqmm": 95.0, "conductor_material": "aluminium",
                 "quantity_km": 12.5}
            ]
        }
    ]"#;

    #[tokio::test]
    async fn loads_well_formed_feed_and_skips_corrupt_one() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("gem.json"), FEED).unwrap();
        std::fs::write(tmp.path().join("eprocure.json"), "{not json").unwrap();

        let registry = FeedRegistry::new(tmp.path().to_path_buf());
        let cache = TenderCache::new(RedisCache::new(None));
        let (snapshots, failed) = registry.load_all(&cache, None).await;

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].id, "gem");
        assert_eq!(snapshots[0].records[0].tender_id, "GEM-2026-001");
        assert_eq!(snapshots[0].records[0].requirements[0].voltage_kv, Some(11.0));
        assert_eq!(failed, vec!["eprocure".to_string()]);
    }

    #[tokio::test]
    async fn portal_filter_restricts_feeds() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("gem.json"), FEED).unwrap();
        std::fs::write(tmp.path().join("ireps.json"), "[]").unwrap();

        let registry = FeedRegistry::new(tmp.path().to_path_buf());
        let cache = TenderCache::new(RedisCache::new(None));
        let (snapshots, failed) = registry.load_all(&cache, Some("ireps")).await;

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].id, "ireps");
        assert!(failed.is_empty());
    }

    #[test]
    fn feed_ids_sorted() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("ireps.json"), "[]").unwrap();
        std::fs::write(tmp.path().join("gem.json"), "[]").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let registry = FeedRegistry::new(tmp.path().to_path_buf());
        assert_eq!(registry.feed_ids(), vec!["gem".to_string(), "ireps".to_string()]);
    }
}
