use std::sync::{Arc, Mutex, OnceLock};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};

use crate::api::{ConnectionOwner, DbState, CURRENT_SCHEMA, ONCUTF_DB_FILENAME};
use crate::cache_key::{HashKey, RenameKey};
use crate::codec::{
    decode_hash, decode_metadata, decode_path, decode_rename_entry, encode_hash, encode_metadata,
    encode_path, encode_rename_entry,
};
use crate::maintenance::quarantine_corrupt_file;
use crate::paths::canonical_key;
use crate::PersistentStore;
use oncutf_core::{
    HashRecord, MetadataKind, MetadataRecord, OperationKind, OperationSummary, Payload, PathId,
    PathRecord, RenameEntry, StoreStats,
};

const META: TableDefinition<&str, &str> = TableDefinition::new("meta");
const PATHS_BY_ID: TableDefinition<i64, &[u8]> = TableDefinition::new("paths_by_id");
const PATHS_BY_KEY: TableDefinition<&str, i64> = TableDefinition::new("paths_by_key");
const METADATA: TableDefinition<i64, &[u8]> = TableDefinition::new("metadata");
const HASHES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("hashes");
const RENAME_HISTORY: TableDefinition<&[u8], &[u8]> = TableDefinition::new("rename_history");

const META_FORMAT_KEY: &str = "format";
const META_FORMAT_VALUE: &str = "oncutf-redb";
const META_SCHEMA_VERSION: &str = "schema_version";
const META_CREATED_AT: &str = "created_at";
const META_NEXT_PATH_ID: &str = "next_path_id";

/// redb-backed [`PersistentStore`] (C1). Mirrors the original's SQLite schema table
/// for table; since redb has no foreign keys, cascade deletes (path -> metadata/hash/
/// rename_history) and uniqueness invariants I1/I2/I4 are enforced explicitly in each
/// method instead of by the storage engine. See DESIGN.md for the full mapping.
#[derive(Debug, Clone)]
pub struct OncutfRedbStore {
    path: Utf8PathBuf,
}

impl OncutfRedbStore {
    fn db_cache() -> &'static Mutex<std::collections::HashMap<Utf8PathBuf, Arc<Database>>> {
        static CACHE: OnceLock<Mutex<std::collections::HashMap<Utf8PathBuf, Arc<Database>>>> =
            OnceLock::new();
        CACHE.get_or_init(|| Mutex::new(std::collections::HashMap::new()))
    }

    pub fn new(store_path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: store_path.into() }
    }

    pub fn default_filename() -> &'static str {
        ONCUTF_DB_FILENAME
    }

    fn open_or_create(&self) -> Result<Arc<Database>, crate::StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut cache = Self::db_cache().lock().expect("db cache lock poisoned");
        if let Some(existing) = cache.get(&self.path) {
            return Ok(existing.clone());
        }

        let db = if self.path.exists() {
            match Database::open(self.path.as_std_path()) {
                Ok(db) => db,
                Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                    return Err(crate::StorageError::DatabaseAlreadyOpen);
                }
                Err(redb::DatabaseError::Storage(redb::StorageError::Corrupted(_))) => {
                    let _ = quarantine_corrupt_file(&self.path);
                    return Err(crate::StorageError::Corrupt);
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            Database::create(self.path.as_std_path())?
        };

        self.ensure_schema(&db)?;
        let db = Arc::new(db);
        cache.insert(self.path.clone(), db.clone());
        Ok(db)
    }

    fn ensure_schema(&self, db: &Database) -> Result<(), crate::StorageError> {
        let write_tx = db.begin_write()?;
        {
            let mut meta = write_tx.open_table(META)?;
            let format: Option<String> =
                meta.get(META_FORMAT_KEY)?.map(|g| g.value().to_string());
            if format.is_none() {
                let schema_version = CURRENT_SCHEMA.to_string();
                let created_at = Utc::now().to_rfc3339();
                meta.insert(META_FORMAT_KEY, META_FORMAT_VALUE)?;
                meta.insert(META_SCHEMA_VERSION, schema_version.as_str())?;
                meta.insert(META_CREATED_AT, created_at.as_str())?;
                meta.insert(META_NEXT_PATH_ID, "1")?;
            } else if format.as_deref() != Some(META_FORMAT_VALUE) {
                drop(meta);
                drop(write_tx);
                let _ = quarantine_corrupt_file(&self.path);
                return Err(crate::StorageError::Corrupt);
            }
        }
        let _ = write_tx.open_table(PATHS_BY_ID)?;
        let _ = write_tx.open_table(PATHS_BY_KEY)?;
        let _ = write_tx.open_table(METADATA)?;
        let _ = write_tx.open_table(HASHES)?;
        let _ = write_tx.open_table(RENAME_HISTORY)?;
        write_tx.commit()?;

        let read_tx = db.begin_read()?;
        let meta = read_tx.open_table(META)?;
        let schema_version = meta
            .get(META_SCHEMA_VERSION)?
            .and_then(|g| g.value().parse::<u32>().ok())
            .unwrap_or(0);
        if schema_version == 0 {
            let _ = quarantine_corrupt_file(&self.path);
            return Err(crate::StorageError::Corrupt);
        }
        if schema_version > CURRENT_SCHEMA {
            return Err(crate::StorageError::NewerSchema {
                found: schema_version,
                supported: CURRENT_SCHEMA,
            });
        }
        // A linear chain of `fn(&mut WriteTransaction) -> Result<(), StorageError>` steps
        // would run here between `schema_version` and `CURRENT_SCHEMA`; there is only one
        // schema version so far, so the migration chain is empty.
        Ok(())
    }

    /// Allocates the next path id and bumps the counter, all inside the caller's
    /// transaction so the allocation is rolled back along with everything else on
    /// failure.
    fn next_path_id(
        meta: &mut redb::Table<&str, &str>,
    ) -> Result<PathId, crate::StorageError> {
        let current = meta
            .get(META_NEXT_PATH_ID)?
            .and_then(|g| g.value().parse::<PathId>().ok())
            .unwrap_or(1);
        let next = (current + 1).to_string();
        meta.insert(META_NEXT_PATH_ID, next.as_str())?;
        Ok(current)
    }

    fn stat_file(file_path: &str) -> (Option<u64>, Option<String>) {
        match std::fs::metadata(file_path) {
            Ok(meta) => {
                let size = Some(meta.len());
                let modified = meta
                    .modified()
                    .ok()
                    .map(chrono::DateTime::<Utc>::from)
                    .map(|dt| dt.to_rfc3339());
                (size, modified)
            }
            Err(_) => (None, None),
        }
    }

    fn basename(file_path: &str) -> String {
        std::path::Path::new(file_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file_path)
            .to_string()
    }
}

impl PersistentStore for OncutfRedbStore {
    fn validate(&self) -> Result<DbState, crate::StorageError> {
        if !self.path.exists() {
            return Ok(DbState::Missing);
        }
        {
            let cache = Self::db_cache().lock().expect("db cache lock poisoned");
            if cache.contains_key(&self.path) {
                return Ok(DbState::Valid);
            }
        }
        match Database::open(self.path.as_std_path()) {
            Ok(db) => match self.ensure_schema(&db) {
                Ok(()) => Ok(DbState::Valid),
                Err(crate::StorageError::NewerSchema { found, supported }) => {
                    Ok(DbState::NewerSchema { found, supported })
                }
                Err(crate::StorageError::DatabaseAlreadyOpen) => Ok(DbState::Busy),
                Err(crate::StorageError::Corrupt) => Ok(DbState::Corrupt),
                Err(_) => Ok(DbState::Corrupt),
            },
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => Ok(DbState::Busy),
            Err(redb::DatabaseError::Storage(redb::StorageError::Corrupted(_))) => {
                let _ = quarantine_corrupt_file(&self.path);
                Ok(DbState::Corrupt)
            }
            Err(_) => Ok(DbState::Corrupt),
        }
    }

    fn upsert_path(
        &self,
        _owner: &ConnectionOwner,
        file_path: &str,
        filename: &str,
        size: Option<u64>,
    ) -> Result<PathId, crate::StorageError> {
        let key = canonical_key(file_path);
        let (stat_size, stat_modified) = Self::stat_file(&key);
        let file_size = stat_size.or(size);
        let modified_time = stat_modified;
        let now = Utc::now().to_rfc3339();

        let db = self.open_or_create()?;
        let write_tx = db.begin_write()?;
        let path_id = {
            let mut by_key = write_tx.open_table(PATHS_BY_KEY)?;
            let mut by_id = write_tx.open_table(PATHS_BY_ID)?;
            let existing = by_key.get(key.as_str())?.map(|g| g.value());
            let (id, created_at) = match existing {
                Some(id) => {
                    let created_at = by_id
                        .get(id)?
                        .map(|g| decode_path(g.value()))
                        .transpose()?
                        .map(|r| r.created_at)
                        .unwrap_or_else(|| now.clone());
                    (id, created_at)
                }
                None => {
                    let mut meta = write_tx.open_table(META)?;
                    (Self::next_path_id(&mut meta)?, now.clone())
                }
            };
            let record = PathRecord {
                id,
                file_path: key.clone(),
                filename: filename.to_string(),
                file_size,
                modified_time,
                created_at,
                updated_at: now.clone(),
            };
            let bytes = encode_path(&record)?;
            by_id.insert(id, bytes.as_slice())?;
            by_key.insert(key.as_str(), id)?;
            id
        };
        write_tx.commit()?;
        Ok(path_id)
    }

    fn get_path_id(
        &self,
        _owner: &ConnectionOwner,
        file_path: &str,
    ) -> Result<Option<PathId>, crate::StorageError> {
        let key = canonical_key(file_path);
        let path = self.path.clone();
        if !path.exists() {
            return Ok(None);
        }
        let db = self.open_or_create()?;
        let read_tx = db.begin_read()?;
        let by_key = read_tx.open_table(PATHS_BY_KEY)?;
        Ok(by_key.get(key.as_str())?.map(|g| g.value()))
    }

    fn remove_path(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
    ) -> Result<bool, crate::StorageError> {
        let Some(path_id) = self.get_path_id(owner, file_path)? else {
            return Ok(false);
        };
        let key = canonical_key(file_path);
        let db = self.open_or_create()?;
        let write_tx = db.begin_write()?;
        {
            let mut by_key = write_tx.open_table(PATHS_BY_KEY)?;
            let mut by_id = write_tx.open_table(PATHS_BY_ID)?;
            let mut metadata = write_tx.open_table(METADATA)?;
            let mut hashes = write_tx.open_table(HASHES)?;
            let mut rename_history = write_tx.open_table(RENAME_HISTORY)?;

            by_key.remove(key.as_str())?;
            by_id.remove(path_id)?;
            metadata.remove(path_id)?;

            let hash_keys: Vec<Vec<u8>> = hashes
                .iter()?
                .filter_map(|row| row.ok())
                .map(|(k, _)| k.value().to_vec())
                .filter(|k| k.starts_with(&HashKey::prefix_for_path(path_id)))
                .collect();
            for k in hash_keys {
                hashes.remove(k.as_slice())?;
            }

            let rename_keys: Vec<Vec<u8>> = rename_history
                .iter()?
                .filter_map(|row| row.ok())
                .filter_map(|(k, v)| {
                    decode_rename_entry(v.value())
                        .ok()
                        .filter(|e| e.path_id == path_id)
                        .map(|_| k.value().to_vec())
                })
                .collect();
            for k in rename_keys {
                rename_history.remove(k.as_slice())?;
            }
        }
        write_tx.commit()?;
        Ok(true)
    }

    fn store_metadata(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        payload: &Payload,
        kind: MetadataKind,
        is_modified: bool,
    ) -> Result<bool, crate::StorageError> {
        let filename = Self::basename(file_path);
        let path_id = self.upsert_path(owner, file_path, &filename, None)?;
        let record = MetadataRecord {
            path_id,
            kind,
            payload: payload.clone(),
            is_modified,
            updated_at: Utc::now().to_rfc3339(),
        };
        let db = self.open_or_create()?;
        let write_tx = db.begin_write()?;
        {
            let mut table = write_tx.open_table(METADATA)?;
            table.insert(path_id, encode_metadata(&record)?.as_slice())?;
        }
        write_tx.commit()?;
        Ok(true)
    }

    fn get_metadata(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
    ) -> Result<Option<Payload>, crate::StorageError> {
        let Some(path_id) = self.get_path_id(owner, file_path)? else {
            return Ok(None);
        };
        let db = self.open_or_create()?;
        let read_tx = db.begin_read()?;
        let table = read_tx.open_table(METADATA)?;
        let Some(guard) = table.get(path_id)? else {
            return Ok(None);
        };
        let record = decode_metadata(guard.value())?;
        Ok(Some(oncutf_core::with_synthesized_flags(
            &record.payload,
            record.kind.is_extended(),
            record.is_modified,
        )))
    }

    fn has_metadata(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        kind: Option<MetadataKind>,
    ) -> Result<bool, crate::StorageError> {
        let Some(path_id) = self.get_path_id(owner, file_path)? else {
            return Ok(false);
        };
        let db = self.open_or_create()?;
        let read_tx = db.begin_read()?;
        let table = read_tx.open_table(METADATA)?;
        let Some(guard) = table.get(path_id)? else {
            return Ok(false);
        };
        match kind {
            None => Ok(true),
            Some(expected) => Ok(decode_metadata(guard.value())?.kind == expected),
        }
    }

    fn update_metadata_modified_flag(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        flag: bool,
    ) -> Result<bool, crate::StorageError> {
        let Some(path_id) = self.get_path_id(owner, file_path)? else {
            return Ok(false);
        };
        let db = self.open_or_create()?;
        let write_tx = db.begin_write()?;
        let updated = {
            let mut table = write_tx.open_table(METADATA)?;
            match table.get(path_id)? {
                Some(guard) => {
                    let mut record = decode_metadata(guard.value())?;
                    drop(guard);
                    record.is_modified = flag;
                    record.updated_at = Utc::now().to_rfc3339();
                    table.insert(path_id, encode_metadata(&record)?.as_slice())?;
                    true
                }
                None => false,
            }
        };
        write_tx.commit()?;
        Ok(updated)
    }

    fn store_hash(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        hash_value: &str,
        algorithm: &str,
    ) -> Result<bool, crate::StorageError> {
        let filename = Self::basename(file_path);
        let path_id = self.upsert_path(owner, file_path, &filename, None)?;
        let (size, _) = Self::stat_file(&canonical_key(file_path));
        let record = HashRecord {
            path_id,
            algorithm: algorithm.to_string(),
            hash_value: hash_value.to_string(),
            file_size_at_hash: size,
            created_at: Utc::now().to_rfc3339(),
        };
        let db = self.open_or_create()?;
        let write_tx = db.begin_write()?;
        {
            let mut table = write_tx.open_table(HASHES)?;
            let key = HashKey::new(path_id, algorithm).to_bytes();
            table.insert(key.as_slice(), encode_hash(&record)?.as_slice())?;
        }
        write_tx.commit()?;
        Ok(true)
    }

    fn get_hash(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        algorithm: &str,
    ) -> Result<Option<String>, crate::StorageError> {
        let Some(path_id) = self.get_path_id(owner, file_path)? else {
            return Ok(None);
        };
        let db = self.open_or_create()?;
        let read_tx = db.begin_read()?;
        let table = read_tx.open_table(HASHES)?;
        let key = HashKey::new(path_id, algorithm).to_bytes();
        match table.get(key.as_slice())? {
            Some(guard) => Ok(Some(decode_hash(guard.value())?.hash_value)),
            None => Ok(None),
        }
    }

    fn has_hash(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        algorithm: &str,
    ) -> Result<bool, crate::StorageError> {
        Ok(self.get_hash(owner, file_path, algorithm)?.is_some())
    }

    fn record_rename_operation(
        &self,
        owner: &ConnectionOwner,
        operation_id: &str,
        entries: &[(String, String)],
        modules_json: Option<&str>,
        post_transform_json: Option<&str>,
        operation_kind: OperationKind,
    ) -> Result<bool, crate::StorageError> {
        if entries.is_empty() {
            return Ok(true);
        }
        let now = Utc::now().to_rfc3339();
        let db = self.open_or_create()?;
        let write_tx = db.begin_write()?;
        {
            let mut by_key = write_tx.open_table(PATHS_BY_KEY)?;
            let mut by_id = write_tx.open_table(PATHS_BY_ID)?;
            let mut history = write_tx.open_table(RENAME_HISTORY)?;

            for (old_path, new_path) in entries {
                let old_key = canonical_key(old_path);
                let path_id = match by_key.get(old_key.as_str())?.map(|g| g.value()) {
                    Some(id) => id,
                    None => {
                        let mut meta = write_tx.open_table(META)?;
                        let id = Self::next_path_id(&mut meta)?;
                        let record = PathRecord {
                            id,
                            file_path: old_key.clone(),
                            filename: Self::basename(&old_key),
                            file_size: None,
                            modified_time: None,
                            created_at: now.clone(),
                            updated_at: now.clone(),
                        };
                        by_id.insert(id, encode_path(&record)?.as_slice())?;
                        by_key.insert(old_key.as_str(), id)?;
                        id
                    }
                };

                let entry = RenameEntry {
                    operation_id: operation_id.to_string(),
                    path_id,
                    old_path: old_key.clone(),
                    new_path: canonical_key(new_path),
                    old_filename: Self::basename(&old_key),
                    new_filename: Self::basename(new_path),
                    operation_kind,
                    modules_json: modules_json.map(str::to_string),
                    post_transform_json: post_transform_json.map(str::to_string),
                    created_at: now.clone(),
                };
                let key = RenameKey::new(operation_id, path_id).to_bytes();
                history.insert(key.as_slice(), encode_rename_entry(&entry)?.as_slice())?;
            }
        }
        write_tx.commit()?;
        Ok(true)
    }

    fn get_rename_history(
        &self,
        _owner: &ConnectionOwner,
        limit: usize,
    ) -> Result<Vec<OperationSummary>, crate::StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let db = self.open_or_create()?;
        let read_tx = db.begin_read()?;
        let table = read_tx.open_table(RENAME_HISTORY)?;

        let mut by_operation: std::collections::BTreeMap<String, (String, usize, OperationKind)> =
            std::collections::BTreeMap::new();
        for row in table.iter()? {
            let (_, v) = row?;
            let entry = decode_rename_entry(v.value())?;
            let slot = by_operation
                .entry(entry.operation_id.clone())
                .or_insert((entry.created_at.clone(), 0, entry.operation_kind));
            slot.1 += 1;
            if entry.created_at < slot.0 {
                slot.0 = entry.created_at.clone();
            }
        }

        let mut summaries: Vec<OperationSummary> = by_operation
            .into_iter()
            .map(|(operation_id, (operation_time, file_count, operation_kind))| OperationSummary {
                operation_id,
                operation_time,
                file_count,
                operation_kind,
            })
            .collect();
        summaries.sort_by(|a, b| b.operation_time.cmp(&a.operation_time));
        summaries.truncate(limit);
        Ok(summaries)
    }

    fn get_operation_entries(
        &self,
        _owner: &ConnectionOwner,
        operation_id: &str,
    ) -> Result<Vec<RenameEntry>, crate::StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let db = self.open_or_create()?;
        let read_tx = db.begin_read()?;
        let table = read_tx.open_table(RENAME_HISTORY)?;
        let prefix = RenameKey::prefix_for_operation(operation_id);

        let mut entries = Vec::new();
        for row in table.iter()? {
            let (k, v) = row?;
            if k.value().starts_with(&prefix) {
                entries.push(decode_rename_entry(v.value())?);
            }
        }
        Ok(entries)
    }

    fn cleanup_orphans(&self, owner: &ConnectionOwner) -> Result<u64, crate::StorageError> {
        if !self.path.exists() {
            return Ok(0);
        }
        let db = self.open_or_create()?;
        let stale: Vec<(PathId, String)> = {
            let read_tx = db.begin_read()?;
            let by_id = read_tx.open_table(PATHS_BY_ID)?;
            by_id
                .iter()?
                .filter_map(|row| row.ok())
                .filter_map(|(k, v)| decode_path(v.value()).ok().map(|r| (k.value(), r.file_path)))
                .filter(|(_, file_path)| !std::path::Path::new(file_path).exists())
                .collect()
        };
        let mut removed = 0u64;
        for (_, file_path) in &stale {
            if self.remove_path(owner, file_path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn stats(&self, _owner: &ConnectionOwner) -> Result<StoreStats, crate::StorageError> {
        if !self.path.exists() {
            return Ok(StoreStats::default());
        }
        let db = self.open_or_create()?;
        let read_tx = db.begin_read()?;
        let paths = read_tx.open_table(PATHS_BY_ID)?.len()?;
        let metadata = read_tx.open_table(METADATA)?.len()?;
        let hashes = read_tx.open_table(HASHES)?.len()?;
        let rename_entries = read_tx.open_table(RENAME_HISTORY)?.len()?;
        Ok(StoreStats { paths, metadata, hashes, rename_entries })
    }

    fn close(&self) -> Result<(), crate::StorageError> {
        let mut cache = Self::db_cache().lock().expect("db cache lock poisoned");
        cache.remove(&self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PersistentStore;

    fn temp_store() -> (tempfile::TempDir, OncutfRedbStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join(ONCUTF_DB_FILENAME)).unwrap();
        (dir, OncutfRedbStore::new(path))
    }

    #[test]
    fn upsert_path_is_idempotent_on_id() {
        let (_dir, store) = temp_store();
        let owner = ConnectionOwner::default();
        let id1 = store.upsert_path(&owner, "/tmp/a/report.txt", "report.txt", Some(10)).unwrap();
        let id2 = store.upsert_path(&owner, "/tmp/a/report.txt", "report.txt", Some(20)).unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn metadata_round_trips_with_synthesized_flags() {
        let (_dir, store) = temp_store();
        let owner = ConnectionOwner::default();
        let mut payload = Payload::new();
        payload.insert("EXIF:Artist".into(), "me".into());
        store
            .store_metadata(&owner, "/tmp/a.jpg", &payload, MetadataKind::Extended, true)
            .unwrap();
        let got = store.get_metadata(&owner, "/tmp/a.jpg").unwrap().unwrap();
        assert_eq!(got.get("EXIF:Artist").unwrap().as_str(), Some("me"));
        assert!(got.contains_key(oncutf_core::EXTENDED_FLAG_KEY));
        assert!(got.contains_key(oncutf_core::MODIFIED_FLAG_KEY));
    }

    #[test]
    fn hash_is_keyed_by_path_and_algorithm() {
        let (_dir, store) = temp_store();
        let owner = ConnectionOwner::default();
        store.store_hash(&owner, "/tmp/a.bin", "deadbeef", "CRC32").unwrap();
        assert_eq!(
            store.get_hash(&owner, "/tmp/a.bin", "CRC32").unwrap(),
            Some("deadbeef".to_string())
        );
        assert_eq!(store.get_hash(&owner, "/tmp/a.bin", "MD5").unwrap(), None);
    }

    #[test]
    fn remove_path_cascades_metadata_and_hash() {
        let (_dir, store) = temp_store();
        let owner = ConnectionOwner::default();
        let mut payload = Payload::new();
        payload.insert("EXIF:Artist".into(), "me".into());
        store
            .store_metadata(&owner, "/tmp/a.jpg", &payload, MetadataKind::Fast, false)
            .unwrap();
        store.store_hash(&owner, "/tmp/a.jpg", "abc", "CRC32").unwrap();

        assert!(store.remove_path(&owner, "/tmp/a.jpg").unwrap());
        assert_eq!(store.get_metadata(&owner, "/tmp/a.jpg").unwrap(), None);
        assert_eq!(store.get_hash(&owner, "/tmp/a.jpg", "CRC32").unwrap(), None);
        assert!(!store.remove_path(&owner, "/tmp/a.jpg").unwrap());
    }

    #[test]
    fn rename_operation_is_grouped_and_queryable() {
        let (_dir, store) = temp_store();
        let owner = ConnectionOwner::default();
        store
            .record_rename_operation(
                &owner,
                "op-1",
                &[
                    ("/tmp/a.txt".to_string(), "/tmp/a2.txt".to_string()),
                    ("/tmp/b.txt".to_string(), "/tmp/b2.txt".to_string()),
                ],
                None,
                None,
                OperationKind::Rename,
            )
            .unwrap();

        let history = store.get_rename_history(&owner, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].file_count, 2);
        assert_eq!(history[0].operation_kind, OperationKind::Rename);

        let entries = store.get_operation_entries(&owner, "op-1").unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn stats_reflect_store_contents() {
        let (_dir, store) = temp_store();
        let owner = ConnectionOwner::default();
        store.upsert_path(&owner, "/tmp/a.txt", "a.txt", None).unwrap();
        let stats = store.stats(&owner).unwrap();
        assert_eq!(stats.paths, 1);
    }
}
