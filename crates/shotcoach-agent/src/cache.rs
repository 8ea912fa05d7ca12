//! Fingerprint-keyed, time-expiring store for validated suggestion sets.
//!
//! Entries live in memory behind one async mutex so that lookups and the
//! evict-then-insert sequence never interleave. When a file path is
//! configured the whole map is written back after every insert; read and
//! write failures only ever degrade to a miss.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use shotcoach_models::{ImageMetrics, Suggestion, TiltEstimate};

use crate::metrics;

/// One cached suggestion set. `timestamp` is seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: Vec<Suggestion>,
    pub timestamp: f64,
}

/// Identity of the bytes a frame came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceStamp {
    /// File on disk: size and modification time.
    File { size: u64, modified: f64 },
    /// In-memory upload: length and content digest.
    Memory { len: usize, digest: String },
}

impl SourceStamp {
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Ok(SourceStamp::File {
            size: meta.len(),
            modified,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        SourceStamp::Memory {
            len: bytes.len(),
            digest: format!("{:x}", Sha256::digest(bytes)),
        }
    }
}

/// Cache key for one advice request.
///
/// Changes whenever the source bytes, the measured brightness or tilt, the
/// requested suggestion count or the captured intent change.
pub fn fingerprint(
    source: &SourceStamp,
    metrics: &ImageMetrics,
    tilt: &TiltEstimate,
    count: usize,
    intent: Option<&str>,
) -> String {
    let source_part = match source {
        SourceStamp::File { size, modified } => format!("file:{}:{:.6}", size, modified),
        SourceStamp::Memory { len, digest } => format!("mem:{}:{}", len, digest),
    };
    let material = format!(
        "{}|{:.1}|{:.1}|{}|{}|{}",
        source_part,
        metrics.brightness,
        tilt.tilt_angle,
        tilt.is_level,
        count,
        intent.unwrap_or("")
    );
    format!("{:x}", Sha256::digest(material.as_bytes()))
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Shared result cache.
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
    path: Option<PathBuf>,
}

impl ResultCache {
    /// In-memory cache with no persistence.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
            path: None,
        }
    }

    /// Cache backed by `path`. A missing or corrupt file starts empty.
    pub fn open(path: impl Into<PathBuf>, ttl: Duration, capacity: usize) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
                Ok(entries) => {
                    info!(path = %path.display(), entries = entries.len(), "Loaded result cache");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cache file corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache file unreadable, starting empty");
                HashMap::new()
            }
        };

        Self {
            entries: Mutex::new(entries),
            ttl,
            capacity: capacity.max(1),
            path: Some(path),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn get(&self, key: &str) -> Option<Vec<Suggestion>> {
        self.get_at(key, now_secs()).await
    }

    /// Lookup as of `now`. Expired entries are skipped, not purged.
    pub async fn get_at(&self, key: &str, now: f64) -> Option<Vec<Suggestion>> {
        let entries = self.entries.lock().await;
        let hit = entries
            .get(key)
            .filter(|entry| now - entry.timestamp < self.ttl.as_secs_f64())
            .map(|entry| entry.result.clone());

        metrics::record_cache_lookup(hit.is_some());
        debug!(key = %key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    pub async fn put(&self, key: &str, suggestions: Vec<Suggestion>) {
        self.put_at(key, suggestions, now_secs()).await;
    }

    /// Insert as of `now`, evicting the oldest entries first when full.
    pub async fn put_at(&self, key: &str, suggestions: Vec<Suggestion>, now: f64) {
        let mut entries = self.entries.lock().await;

        if !entries.contains_key(key) && entries.len() >= self.capacity {
            let excess = entries.len() + 1 - self.capacity;
            let mut by_age: Vec<(String, f64)> = entries
                .iter()
                .map(|(k, entry)| (k.clone(), entry.timestamp))
                .collect();
            by_age.sort_by(|a, b| a.1.total_cmp(&b.1));

            for (old_key, _) in by_age.into_iter().take(excess) {
                entries.remove(&old_key);
            }
            debug!(evicted = excess, "Cache evicted oldest entries");
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                result: suggestions,
                timestamp: now,
            },
        );

        if let Some(path) = &self.path {
            persist(path, &entries).await;
        }
    }
}

async fn persist(path: &Path, entries: &HashMap<String, CacheEntry>) {
    let raw = match serde_json::to_string_pretty(entries) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Failed to serialize result cache");
            return;
        }
    };
    if let Err(e) = tokio::fs::write(path, raw).await {
        warn!(path = %path.display(), error = %e, "Failed to persist result cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotcoach_models::{Direction, Intensity};

    const HOUR: f64 = 3600.0;

    fn day_cache(capacity: usize) -> ResultCache {
        ResultCache::new(Duration::from_secs(86_400), capacity)
    }

    fn sample(action: &str) -> Vec<Suggestion> {
        vec![Suggestion::new(action, Direction::Left, Intensity::DEFAULT, "r")]
    }

    #[tokio::test]
    async fn test_hit_and_miss() {
        let cache = day_cache(100);
        assert!(cache.get("absent").await.is_none());

        cache.put("k", sample("Step left")).await;
        let hit = cache.get("k").await.unwrap();
        assert_eq!(hit[0].action, "Step left");
    }

    #[tokio::test]
    async fn test_expired_entry_is_skipped() {
        let cache = day_cache(100);
        let inserted = 1_000_000.0;
        cache.put_at("k", sample("old"), inserted).await;

        assert!(cache.get_at("k", inserted + 23.0 * HOUR).await.is_some());
        assert!(cache.get_at("k", inserted + 25.0 * HOUR).await.is_none());
        // Skipped, not purged.
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_101st_insert_evicts_oldest() {
        let cache = day_cache(100);
        for i in 0..100 {
            cache.put_at(&format!("k{}", i), sample("a"), 1000.0 + i as f64).await;
        }
        assert_eq!(cache.len().await, 100);

        // Touching an old key must not protect it: eviction is by insertion time.
        assert!(cache.get_at("k0", 2000.0).await.is_some());

        cache.put_at("k100", sample("b"), 5000.0).await;
        assert_eq!(cache.len().await, 100);
        assert!(cache.get_at("k0", 5000.0).await.is_none());
        assert!(cache.get_at("k1", 5000.0).await.is_some());
        assert!(cache.get_at("k100", 5000.0).await.is_some());
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let cache = day_cache(2);
        cache.put_at("a", sample("1"), 1.0).await;
        cache.put_at("b", sample("2"), 2.0).await;
        cache.put_at("a", sample("3"), 3.0).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get_at("a", 4.0).await.unwrap()[0].action, "3");
        assert!(cache.get_at("b", 4.0).await.is_some());
    }

    #[tokio::test]
    async fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai_cache.json");

        let cache = ResultCache::open(&path, Duration::from_secs(86_400), 100);
        assert!(cache.is_empty().await);
        cache.put("k", sample("Crouch")).await;
        assert!(path.exists());

        let reopened = ResultCache::open(&path, Duration::from_secs(86_400), 100);
        assert_eq!(reopened.get("k").await.unwrap()[0].action, "Crouch");

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["k"]["timestamp"].as_f64().unwrap() > 0.0);
        assert_eq!(raw["k"]["result"][0]["direction"], "left");
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai_cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = ResultCache::open(&path, Duration::from_secs(86_400), 100);
        assert!(cache.is_empty().await);

        // Still writable afterwards.
        cache.put("k", sample("a")).await;
        assert!(cache.get("k").await.is_some());
    }

    #[tokio::test]
    async fn test_unwritable_path_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("cache.json");
        let cache = ResultCache::open(&path, Duration::from_secs(86_400), 100);
        cache.put("k", sample("a")).await;
        assert!(cache.get("k").await.is_some());
    }

    #[test]
    fn test_fingerprint_sensitivity() {
        let metrics = ImageMetrics::new(640, 480, 128.04);
        let level = TiltEstimate::level(1.0);
        let file = SourceStamp::File {
            size: 1000,
            modified: 1_700_000_000.5,
        };

        let base = fingerprint(&file, &metrics, &level, 5, None);
        assert_eq!(base, fingerprint(&file, &metrics, &level, 5, None));
        assert_eq!(base.len(), 64);

        // Same reading after rounding.
        let close = ImageMetrics::new(640, 480, 128.01);
        assert_eq!(base, fingerprint(&file, &close, &level, 5, None));

        let brighter = ImageMetrics::new(640, 480, 130.0);
        assert_ne!(base, fingerprint(&file, &brighter, &level, 5, None));

        let touched = SourceStamp::File {
            size: 1000,
            modified: 1_700_000_100.0,
        };
        assert_ne!(base, fingerprint(&touched, &metrics, &level, 5, None));

        assert_ne!(base, fingerprint(&file, &metrics, &level, 4, None));
        assert_ne!(base, fingerprint(&file, &metrics, &level, 5, Some("food")));
    }

    #[test]
    fn test_memory_stamp_uses_content() {
        assert_eq!(SourceStamp::from_bytes(b"abc"), SourceStamp::from_bytes(b"abc"));
        assert_ne!(SourceStamp::from_bytes(b"abc"), SourceStamp::from_bytes(b"abd"));
    }

    #[test]
    fn test_file_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        std::fs::write(&path, b"12345").unwrap();
        match SourceStamp::from_path(&path).unwrap() {
            SourceStamp::File { size, .. } => assert_eq!(size, 5),
            other => panic!("unexpected stamp {:?}", other),
        }
        assert!(SourceStamp::from_path(&dir.path().join("nope.jpg")).is_err());
    }
}
