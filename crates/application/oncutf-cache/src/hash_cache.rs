//! Two-tier hot/cold cache for content hashes (§4.3).
//!
//! Mirrors [`crate::metadata_cache::MetadataCache`]'s hot-map-over-store shape; the
//! hash value itself is produced elsewhere (the rename engine's hash handler, or
//! `oncutf_infra::crc32::hash_file_crc32` for CLI/test callers) and handed to `store_hash`.

use oncutf_core::DEFAULT_HASH_ALGORITHM;
use oncutf_persistence::{ConnectionOwner, PersistentStore};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_HOT_CAPACITY: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("store error: {0}")]
    Store(#[from] oncutf_persistence::StorageError),
}

fn hot_key(path: &str, algorithm: &str) -> String {
    format!("{path}\0{algorithm}")
}

struct HotTier {
    entries: HashMap<String, String>,
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

    fn insert(&mut self, key: String, value: String) {
        self.touch(&key);
        self.entries.insert(key, value);
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else { break };
            self.entries.remove(&oldest);
        }
    }

    fn get(&mut self, key: &str) -> Option<String> {
        let found = self.entries.get(key).cloned();
        if found.is_some() {
            self.touch(key);
        }
        found
    }

    fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.entries.remove(key);
    }
}

/// Read-through/write-through cache over a [`PersistentStore`] for content hashes.
pub struct HashCache<S: PersistentStore> {
    store: Arc<S>,
    owner: ConnectionOwner,
    hot: Mutex<HotTier>,
}

impl<S: PersistentStore> HashCache<S> {
    pub fn new(store: Arc<S>, owner: ConnectionOwner) -> Self {
        Self::with_capacity(store, owner, DEFAULT_HOT_CAPACITY)
    }

    pub fn with_capacity(store: Arc<S>, owner: ConnectionOwner, capacity: usize) -> Self {
        HashCache { store, owner, hot: Mutex::new(HotTier::new(capacity)) }
    }

    pub fn store_hash(&self, path: &str, hash_value: &str, algorithm: &str) -> Result<(), CacheError> {
        debug!(path, algorithm, "storing hash");
        self.store.store_hash(&self.owner, path, hash_value, algorithm)?;
        self.hot.lock().unwrap().insert(hot_key(path, algorithm), hash_value.to_string());
        Ok(())
    }

    pub fn get_hash(&self, path: &str, algorithm: &str) -> Result<Option<String>, CacheError> {
        let key = hot_key(path, algorithm);
        if let Some(value) = self.hot.lock().unwrap().get(&key) {
            return Ok(Some(value));
        }
        let Some(value) = self.store.get_hash(&self.owner, path, algorithm)? else {
            return Ok(None);
        };
        self.hot.lock().unwrap().insert(key, value.clone());
        Ok(Some(value))
    }

    pub fn has_hash(&self, path: &str, algorithm: &str) -> Result<bool, CacheError> {
        if self.hot.lock().unwrap().entries.contains_key(&hot_key(path, algorithm)) {
            return Ok(true);
        }
        Ok(self.store.has_hash(&self.owner, path, algorithm)?)
    }

    pub fn remove(&self, path: &str, algorithm: &str) {
        self.hot.lock().unwrap().remove(&hot_key(path, algorithm));
    }

    /// Single-pass check over `paths` for which have a stored hash under `algorithm`.
    pub fn get_files_with_hash_batch(
        &self,
        paths: &[String],
        algorithm: &str,
    ) -> Result<HashSet<String>, CacheError> {
        let mut out = HashSet::new();
        for path in paths {
            if self.has_hash(path, algorithm)? {
                out.insert(path.clone());
            }
        }
        Ok(out)
    }

    /// Groups `paths` by hash value, keeping only groups with 2 or more members.
    pub fn find_duplicates(
        &self,
        paths: &[String],
        algorithm: &str,
    ) -> Result<HashMap<String, Vec<String>>, CacheError> {
        let mut by_hash: HashMap<String, Vec<String>> = HashMap::new();
        for path in paths {
            if let Some(hash) = self.get_hash(path, algorithm)? {
                by_hash.entry(hash).or_default().push(path.clone());
            }
        }
        by_hash.retain(|_, group| group.len() >= 2);
        Ok(by_hash)
    }
}

pub fn default_algorithm() -> &'static str {
    DEFAULT_HASH_ALGORITHM
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
    fn store_then_get_round_trips() {
        let (store, _dir) = store();
        let cache = HashCache::new(store, ConnectionOwner::default());
        cache.store_hash("/t/a.jpg", "deadbeef", "CRC32").unwrap();
        assert_eq!(cache.get_hash("/t/a.jpg", "CRC32").unwrap(), Some("deadbeef".to_string()));
        assert!(cache.has_hash("/t/a.jpg", "CRC32").unwrap());
    }

    #[test]
    fn find_duplicates_only_returns_groups_of_two_or_more() {
        let (store, _dir) = store();
        let cache = HashCache::new(store, ConnectionOwner::default());
        cache.store_hash("/t/a.jpg", "same", "CRC32").unwrap();
        cache.store_hash("/t/b.jpg", "same", "CRC32").unwrap();
        cache.store_hash("/t/c.jpg", "unique", "CRC32").unwrap();

        let paths = vec!["/t/a.jpg".to_string(), "/t/b.jpg".to_string(), "/t/c.jpg".to_string()];
        let dupes = cache.find_duplicates(&paths, "CRC32").unwrap();
        assert_eq!(dupes.len(), 1);
        assert_eq!(dupes.get("same").unwrap().len(), 2);
    }

    #[test]
    fn get_files_with_hash_batch_reports_only_hashed_paths() {
        let (store, _dir) = store();
        let cache = HashCache::new(store, ConnectionOwner::default());
        cache.store_hash("/t/a.jpg", "x", "CRC32").unwrap();

        let paths = vec!["/t/a.jpg".to_string(), "/t/b.jpg".to_string()];
        let present = cache.get_files_with_hash_batch(&paths, "CRC32").unwrap();
        assert!(present.contains("/t/a.jpg"));
        assert!(!present.contains("/t/b.jpg"));
    }
}
