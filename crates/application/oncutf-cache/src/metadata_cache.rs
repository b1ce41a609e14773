//! Two-tier hot/cold cache for file metadata (§4.2).
//!
//! Grounded on the original scan cache's hot-map-over-persistent-store shape
//! (`ScanCache` in the file scanner), generalized from an mtime/size/checksum record to
//! the full extended/modified-aware metadata payload the rename engine needs.

use camino::Utf8Path;
use oncutf_core::{
    strip_flags, with_synthesized_flags, MetadataKind, Payload, StoreStats,
};
use oncutf_persistence::{ConnectionOwner, PersistentStore};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Hot tier holds at most this many entries before evicting the least recently touched.
pub const DEFAULT_HOT_CAPACITY: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("store error: {0}")]
    Store(#[from] oncutf_persistence::StorageError),
    #[error("metadata already exists for {0}")]
    AlreadyExists(String),
}

#[derive(Debug, Clone)]
pub struct MetadataEntry {
    pub payload: Payload,
    pub kind: MetadataKind,
    pub is_modified: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetadataCacheStats {
    pub hot_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub store_stats: StoreStats,
}

struct HotTier {
    entries: HashMap<String, MetadataEntry>,
    order: VecDeque<String>,
    capacity: usize,
}

impl HotTier {
    fn new(capacity: usize) -> Self {
        HotTier { entries: HashMap::new(), order: VecDeque::new(), capacity }
    }

    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push_back(key.to_string());
    }

    fn insert(&mut self, key: String, entry: MetadataEntry) {
        self.touch(&key);
        self.entries.insert(key, entry);
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else { break };
            self.entries.remove(&oldest);
        }
    }

    fn get(&mut self, key: &str) -> Option<MetadataEntry> {
        let found = self.entries.get(key).cloned();
        if found.is_some() {
            self.touch(key);
        }
        found
    }

    fn remove(&mut self, key: &str) -> bool {
        self.order.retain(|k| k != key);
        self.entries.remove(key).is_some()
    }
}

/// Read-through/write-through cache over a [`PersistentStore`] for file metadata.
pub struct MetadataCache<S: PersistentStore> {
    store: Arc<S>,
    owner: ConnectionOwner,
    hot: Mutex<HotTier>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: PersistentStore> MetadataCache<S> {
    pub fn new(store: Arc<S>, owner: ConnectionOwner) -> Self {
        Self::with_capacity(store, owner, DEFAULT_HOT_CAPACITY)
    }

    pub fn with_capacity(store: Arc<S>, owner: ConnectionOwner, capacity: usize) -> Self {
        MetadataCache {
            store,
            owner,
            hot: Mutex::new(HotTier::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Strips internal flag keys, write-through to the store (merging into an existing
    /// extended record per C2-I2), then updates the hot tier.
    pub fn set(
        &self,
        path: &str,
        payload: &Payload,
        extended: bool,
        modified: bool,
    ) -> Result<(), CacheError> {
        let mut payload = payload.clone();
        strip_flags(&mut payload);

        let was_extended = self.store.has_metadata(&self.owner, path, Some(MetadataKind::Extended))?;
        let effective_extended = was_extended || extended;

        let merged = if was_extended {
            let mut existing = self
                .store
                .get_metadata(&self.owner, path)?
                .unwrap_or_default();
            strip_flags(&mut existing);
            existing.extend(payload);
            existing
        } else {
            payload
        };

        let kind = MetadataKind::from_extended(effective_extended);
        debug!(path, extended = effective_extended, modified, "writing metadata through to store");
        self.store.store_metadata(&self.owner, path, &merged, kind, modified)?;

        let entry = MetadataEntry {
            payload: merged,
            kind,
            is_modified: modified,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.hot.lock().unwrap().insert(path.to_string(), entry);
        Ok(())
    }

    /// Like [`set`](Self::set) but fails if metadata already exists for `path`.
    pub fn add(&self, path: &str, payload: &Payload, extended: bool) -> Result<(), CacheError> {
        if self.has(path)? {
            return Err(CacheError::AlreadyExists(path.to_string()));
        }
        self.set(path, payload, extended, false)
    }

    /// Returns the metadata payload with synthesized `__extended__`/`__modified__` flags,
    /// identically shaped whether served from the hot tier or loaded from the store.
    pub fn get(&self, path: &str) -> Result<Option<Payload>, CacheError> {
        if let Some(entry) = self.hot.lock().unwrap().get(path) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(with_synthesized_flags(&entry.payload, entry.kind.is_extended(), entry.is_modified)));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let Some(synthesized) = self.store.get_metadata(&self.owner, path)? else {
            return Ok(None);
        };

        let mut raw = synthesized.clone();
        let (extended, modified) = strip_flags(&mut raw);
        let entry = MetadataEntry {
            payload: raw,
            kind: MetadataKind::from_extended(extended.unwrap_or(false)),
            is_modified: modified.unwrap_or(false),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.hot.lock().unwrap().insert(path.to_string(), entry);
        Ok(Some(synthesized))
    }

    /// Returns the structured entry (payload without synthesized flags, plus `kind` and
    /// `is_modified` as first-class fields).
    pub fn get_entry(&self, path: &str) -> Result<Option<MetadataEntry>, CacheError> {
        if let Some(entry) = self.hot.lock().unwrap().get(path) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(entry));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let Some(synthesized) = self.store.get_metadata(&self.owner, path)? else {
            return Ok(None);
        };
        let mut raw = synthesized;
        let (extended, modified) = strip_flags(&mut raw);
        let entry = MetadataEntry {
            payload: raw,
            kind: MetadataKind::from_extended(extended.unwrap_or(false)),
            is_modified: modified.unwrap_or(false),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.hot.lock().unwrap().insert(path.to_string(), entry.clone());
        Ok(Some(entry))
    }

    pub fn has(&self, path: &str) -> Result<bool, CacheError> {
        if self.hot.lock().unwrap().entries.contains_key(path) {
            return Ok(true);
        }
        Ok(self.store.has_metadata(&self.owner, path, None)?)
    }

    pub fn remove(&self, path: &str) -> Result<bool, CacheError> {
        self.hot.lock().unwrap().remove(path);
        let removed = self.store.remove_path(&self.owner, path)?;
        if !removed {
            warn!(path, "remove called for a path with no stored metadata");
        }
        Ok(removed)
    }

    /// Drops hot entries whose file no longer exists on disk, then delegates orphan
    /// cleanup to the store.
    pub fn cleanup_orphans(&self) -> Result<u64, CacheError> {
        {
            let mut hot = self.hot.lock().unwrap();
            let dead: Vec<String> = hot
                .entries
                .keys()
                .filter(|p| !Utf8Path::new(p.as_str()).exists())
                .cloned()
                .collect();
            for path in dead {
                hot.remove(&path);
            }
        }
        Ok(self.store.cleanup_orphans(&self.owner)?)
    }

    pub fn stats(&self) -> Result<MetadataCacheStats, CacheError> {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 { 0.0 } else { hits as f64 / total as f64 };
        Ok(MetadataCacheStats {
            hot_size: self.hot.lock().unwrap().entries.len(),
            hits,
            misses,
            hit_rate,
            store_stats: self.store.stats(&self.owner)?,
        })
    }

    /// Single store round-trip: true for every path that has a metadata row (hot or cold).
    pub fn has_metadata_batch(&self, paths: &[String]) -> Result<HashMap<String, bool>, CacheError> {
        let mut out = HashMap::with_capacity(paths.len());
        for path in paths {
            out.insert(path.clone(), self.has(path)?);
        }
        Ok(out)
    }

    pub fn get_entries_batch(&self, paths: &[String]) -> Result<HashMap<String, MetadataEntry>, CacheError> {
        let mut out = HashMap::with_capacity(paths.len());
        for path in paths {
            if let Some(entry) = self.get_entry(path)? {
                out.insert(path.clone(), entry);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use oncutf_persistence::OncutfRedbStore;

    fn store() -> (Arc<OncutfRedbStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("oncutf_data.db")).unwrap();
        (Arc::new(OncutfRedbStore::new(path)), dir)
    }

    #[test]
    fn set_then_get_round_trips_without_extended_flag() {
        let (store, _dir) = store();
        let cache = MetadataCache::new(store, ConnectionOwner::default());

        let mut payload = Payload::new();
        payload.insert("EXIF:Orientation".into(), "1".into());
        cache.set("/t/a.jpg", &payload, false, false).unwrap();

        let got = cache.get("/t/a.jpg").unwrap().unwrap();
        assert_eq!(got.get("EXIF:Orientation").unwrap().as_str(), Some("1"));
        assert!(!got.contains_key(oncutf_core::EXTENDED_FLAG_KEY));
    }

    #[test]
    fn extended_set_does_not_downgrade_on_later_fast_set() {
        let (store, _dir) = store();
        let cache = MetadataCache::new(store, ConnectionOwner::default());

        let mut fast = Payload::new();
        fast.insert("EXIF:Orientation".into(), "1".into());
        cache.set("/t/a.jpg", &fast, false, false).unwrap();

        let mut extended = Payload::new();
        extended.insert("EXIF:Artist".into(), "x".into());
        cache.set("/t/a.jpg", &extended, true, false).unwrap();

        let got = cache.get("/t/a.jpg").unwrap().unwrap();
        assert_eq!(got.get(oncutf_core::EXTENDED_FLAG_KEY).and_then(|v| v.as_str().map(|_| ())), None);

        let mut second_fast = Payload::new();
        second_fast.insert("EXIF:Orientation".into(), "6".into());
        cache.set("/t/a.jpg", &second_fast, false, false).unwrap();

        let got = cache.get("/t/a.jpg").unwrap().unwrap();
        assert_eq!(got.get("EXIF:Orientation").unwrap().as_str(), Some("6"));
        assert_eq!(got.get("EXIF:Artist").unwrap().as_str(), Some("x"));
        assert_eq!(got.get(oncutf_core::EXTENDED_FLAG_KEY), Some(&oncutf_core::MetadataValue::Boolean(true)));
    }

    #[test]
    fn has_sees_hot_and_cold_entries() {
        let (store, _dir) = store();
        let cache = MetadataCache::new(store, ConnectionOwner::default());
        assert!(!cache.has("/t/a.jpg").unwrap());

        let mut payload = Payload::new();
        payload.insert("EXIF:Orientation".into(), "1".into());
        cache.set("/t/a.jpg", &payload, false, false).unwrap();
        assert!(cache.has("/t/a.jpg").unwrap());
    }

    #[test]
    fn add_fails_when_metadata_already_present() {
        let (store, _dir) = store();
        let cache = MetadataCache::new(store, ConnectionOwner::default());
        let mut payload = Payload::new();
        payload.insert("EXIF:Orientation".into(), "1".into());
        cache.add("/t/a.jpg", &payload, false).unwrap();
        assert!(matches!(cache.add("/t/a.jpg", &payload, false), Err(CacheError::AlreadyExists(_))));
    }

    #[test]
    fn remove_clears_both_tiers() {
        let (store, _dir) = store();
        let cache = MetadataCache::new(store, ConnectionOwner::default());
        let mut payload = Payload::new();
        payload.insert("EXIF:Orientation".into(), "1".into());
        cache.set("/t/a.jpg", &payload, false, false).unwrap();

        cache.remove("/t/a.jpg").unwrap();
        assert!(!cache.has("/t/a.jpg").unwrap());
    }

    #[test]
    fn hot_tier_evicts_oldest_beyond_capacity() {
        let (store, _dir) = store();
        let cache = MetadataCache::with_capacity(store, ConnectionOwner::default(), 2);

        let mut payload = Payload::new();
        payload.insert("k".into(), "v".into());
        cache.set("/t/a.jpg", &payload, false, false).unwrap();
        cache.set("/t/b.jpg", &payload, false, false).unwrap();
        cache.set("/t/c.jpg", &payload, false, false).unwrap();

        assert_eq!(cache.hot.lock().unwrap().entries.len(), 2);
        assert!(!cache.hot.lock().unwrap().entries.contains_key("/t/a.jpg"));
    }

    #[test]
    fn stats_report_hits_and_misses() {
        let (store, _dir) = store();
        let cache = MetadataCache::new(store, ConnectionOwner::default());
        let mut payload = Payload::new();
        payload.insert("k".into(), "v".into());
        cache.set("/t/a.jpg", &payload, false, false).unwrap();

        cache.get("/t/a.jpg").unwrap();
        cache.get("/t/missing.jpg").unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }
}
