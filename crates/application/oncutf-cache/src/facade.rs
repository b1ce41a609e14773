//! Thin read-mostly surface over [`MetadataCache`] and [`HashCache`] (§4.9).
//!
//! Hides which tier a query actually hit and works in terms of dotted key paths into
//! an otherwise-opaque metadata payload, the way UI glue and the validators want it.

use oncutf_core::{MetadataValue, Payload};
use oncutf_persistence::PersistentStore;
use std::collections::HashMap;
use std::sync::Arc;

use crate::hash_cache::HashCache;
use crate::metadata_cache::{CacheError, MetadataCache, MetadataEntry};

/// Key path segment that, written anywhere, collapses to a single top-level
/// `"Rotation"` entry (§4.9's `set_metadata_value` special case).
const ROTATION_KEY: &str = "Rotation";

pub struct FileStatusFacade<S: PersistentStore> {
    metadata: Arc<MetadataCache<S>>,
    hashes: Arc<HashCache<S>>,
}

impl<S: PersistentStore> FileStatusFacade<S> {
    pub fn new(metadata: Arc<MetadataCache<S>>, hashes: Arc<HashCache<S>>) -> Self {
        FileStatusFacade { metadata, hashes }
    }

    pub fn get_metadata_for_file(&self, path: &str) -> Result<Option<Payload>, CacheError> {
        self.metadata.get(path)
    }

    pub fn has_metadata(&self, path: &str) -> Result<bool, CacheError> {
        self.metadata.has(path)
    }

    pub fn get_metadata_cache_entry(&self, path: &str) -> Result<Option<MetadataEntry>, CacheError> {
        self.metadata.get_entry(path)
    }

    pub fn set_metadata_for_file(&self, path: &str, payload: &Payload, extended: bool) -> Result<(), CacheError> {
        self.metadata.set(path, payload, extended, false)
    }

    pub fn is_metadata_extended(&self, path: &str) -> Result<bool, CacheError> {
        Ok(self.metadata.get_entry(path)?.map(|e| e.kind.is_extended()).unwrap_or(false))
    }

    pub fn is_metadata_modified(&self, path: &str) -> Result<bool, CacheError> {
        Ok(self.metadata.get_entry(path)?.map(|e| e.is_modified).unwrap_or(false))
    }

    /// Walks `key_path` (dot-separated, e.g. `"EXIF.Rotation"`) through nested
    /// [`MetadataValue::Map`] values, falling back to `default` if any segment is
    /// absent or the payload itself has no metadata for `path`.
    pub fn get_metadata_value(
        &self,
        path: &str,
        key_path: &str,
        default: Option<MetadataValue>,
    ) -> Result<Option<MetadataValue>, CacheError> {
        let Some(payload) = self.metadata.get(path)? else {
            return Ok(default);
        };
        Ok(walk(&payload, key_path).cloned().or(default))
    }

    /// Writes `value` at `key_path`, creating intermediate maps as needed, and marks
    /// the record modified. `key_path == "Rotation"` (case-insensitive) is special:
    /// any existing `Rotation` key at any depth is removed first and the new value is
    /// written as a single top-level `"Rotation"` entry instead of along the given path.
    pub fn set_metadata_value(&self, path: &str, key_path: &str, value: MetadataValue) -> Result<(), CacheError> {
        let mut payload = self.metadata.get(path)?.unwrap_or_default();
        let extended = self.is_metadata_extended(path)?;

        if key_path.eq_ignore_ascii_case(ROTATION_KEY) {
            remove_key_recursive(&mut payload, ROTATION_KEY);
            payload.insert(ROTATION_KEY.to_string(), value);
        } else {
            set_nested(&mut payload, key_path, value);
        }

        self.metadata.set(path, &payload, extended, true)
    }

    pub fn get_hash_for_file(&self, path: &str, algorithm: &str) -> Result<Option<String>, CacheError> {
        self.hashes.get_hash(path, algorithm)
    }

    pub fn has_hash(&self, path: &str, algorithm: &str) -> Result<bool, CacheError> {
        self.hashes.has_hash(path, algorithm)
    }

    pub fn batch_metadata_status(&self, paths: &[String]) -> Result<HashMap<String, bool>, CacheError> {
        self.metadata.has_metadata_batch(paths)
    }

    pub fn batch_hash_status(&self, paths: &[String], algorithm: &str) -> Result<HashMap<String, bool>, CacheError> {
        let mut out = HashMap::with_capacity(paths.len());
        for path in paths {
            out.insert(path.clone(), self.hashes.has_hash(path, algorithm)?);
        }
        Ok(out)
    }
}

fn walk<'a>(payload: &'a Payload, key_path: &str) -> Option<&'a MetadataValue> {
    let mut segments = key_path.split('.');
    let first = segments.next()?;
    let mut current = payload.get(first)?;
    for segment in segments {
        let MetadataValue::Map(map) = current else {
            return None;
        };
        current = map.get(segment)?;
    }
    Some(current)
}

fn set_nested(payload: &mut Payload, key_path: &str, value: MetadataValue) {
    let mut segments: Vec<&str> = key_path.split('.').collect();
    let last = segments.pop().expect("split always yields at least one segment");

    let mut current = payload;
    for segment in &segments {
        let entry = current
            .entry((*segment).to_string())
            .or_insert_with(|| MetadataValue::Map(Default::default()));
        if !matches!(entry, MetadataValue::Map(_)) {
            *entry = MetadataValue::Map(Default::default());
        }
        let MetadataValue::Map(map) = entry else { unreachable!() };
        current = map;
    }
    current.insert(last.to_string(), value);
}

fn remove_key_recursive(payload: &mut Payload, key: &str) {
    payload.remove(key);
    for value in payload.values_mut() {
        if let MetadataValue::Map(map) = value {
            map.remove(key);
            remove_key_recursive_map(map, key);
        }
    }
}

fn remove_key_recursive_map(map: &mut std::collections::BTreeMap<String, MetadataValue>, key: &str) {
    for value in map.values_mut() {
        if let MetadataValue::Map(nested) = value {
            nested.remove(key);
            remove_key_recursive_map(nested, key);
        }
    }
}
