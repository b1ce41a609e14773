use oncutf_core::{HashRecord, OperationKind, OperationSummary, PathId, RenameEntry, StoreStats};
use serde::{Deserialize, Serialize};

pub const ONCUTF_DB_FILENAME: &str = "oncutf_data.db";
pub const CURRENT_SCHEMA: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbState {
    Missing,
    Valid,
    Busy,
    Corrupt,
    NewerSchema { found: u32, supported: u32 },
}

/// Identifies the logical worker a store call is made on (CLI command, background
/// worker thread, ...). The backing `redb::Database` is still a single process-wide
/// handle shared behind an `Arc` — redb only allows one `Database` per file per
/// process, and sharing one `Arc<Database>` across threads is exactly how the
/// teacher's own concurrent-open test exercises it — but every public method still
/// takes a `ConnectionOwner` so the store can attribute a call to the worker that made
/// it and so a future per-owner store split is a non-breaking change. See DESIGN.md.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionOwner(pub String);

impl ConnectionOwner {
    pub fn new(label: impl Into<String>) -> Self {
        ConnectionOwner(label.into())
    }
}

impl Default for ConnectionOwner {
    fn default() -> Self {
        ConnectionOwner("default".to_string())
    }
}

pub trait PersistentStore: Send + Sync {
    fn validate(&self) -> Result<DbState, crate::StorageError>;

    fn upsert_path(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        filename: &str,
        size: Option<u64>,
    ) -> Result<PathId, crate::StorageError>;

    fn get_path_id(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
    ) -> Result<Option<PathId>, crate::StorageError>;

    fn remove_path(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
    ) -> Result<bool, crate::StorageError>;

    fn store_metadata(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        payload: &oncutf_core::Payload,
        kind: oncutf_core::MetadataKind,
        is_modified: bool,
    ) -> Result<bool, crate::StorageError>;

    fn get_metadata(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
    ) -> Result<Option<oncutf_core::Payload>, crate::StorageError>;

    fn has_metadata(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        kind: Option<oncutf_core::MetadataKind>,
    ) -> Result<bool, crate::StorageError>;

    fn update_metadata_modified_flag(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        flag: bool,
    ) -> Result<bool, crate::StorageError>;

    fn store_hash(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        hash_value: &str,
        algorithm: &str,
    ) -> Result<bool, crate::StorageError>;

    fn get_hash(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        algorithm: &str,
    ) -> Result<Option<String>, crate::StorageError>;

    fn has_hash(
        &self,
        owner: &ConnectionOwner,
        file_path: &str,
        algorithm: &str,
    ) -> Result<bool, crate::StorageError>;

    fn record_rename_operation(
        &self,
        owner: &ConnectionOwner,
        operation_id: &str,
        entries: &[(String, String)],
        modules_json: Option<&str>,
        post_transform_json: Option<&str>,
        operation_kind: OperationKind,
    ) -> Result<bool, crate::StorageError>;

    fn get_rename_history(
        &self,
        owner: &ConnectionOwner,
        limit: usize,
    ) -> Result<Vec<OperationSummary>, crate::StorageError>;

    fn get_operation_entries(
        &self,
        owner: &ConnectionOwner,
        operation_id: &str,
    ) -> Result<Vec<RenameEntry>, crate::StorageError>;

    fn cleanup_orphans(&self, owner: &ConnectionOwner) -> Result<u64, crate::StorageError>;

    fn stats(&self, owner: &ConnectionOwner) -> Result<StoreStats, crate::StorageError>;

    fn close(&self) -> Result<(), crate::StorageError>;
}

/// Reassembles a full [`HashRecord`] from the pieces the redb table actually stores,
/// kept here rather than in `oncutf-core` because only this crate knows the on-disk
/// `file_size_at_hash`/`created_at` bookkeeping.
pub fn hash_record_from_parts(
    path_id: PathId,
    algorithm: &str,
    hash_value: &str,
    file_size_at_hash: Option<u64>,
    created_at: &str,
) -> HashRecord {
    HashRecord {
        path_id,
        algorithm: algorithm.to_string(),
        hash_value: hash_value.to_string(),
        file_size_at_hash,
        created_at: created_at.to_string(),
    }
}
