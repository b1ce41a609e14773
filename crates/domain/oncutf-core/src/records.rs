//! The entities owned exclusively by the persistent store (§3).

use crate::value::Payload;
use serde::{Deserialize, Serialize};

pub type PathId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRecord {
    pub id: PathId,
    pub file_path: String,
    pub filename: String,
    pub file_size: Option<u64>,
    pub modified_time: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataKind {
    Fast,
    Extended,
}

impl MetadataKind {
    pub fn from_extended(extended: bool) -> Self {
        if extended {
            MetadataKind::Extended
        } else {
            MetadataKind::Fast
        }
    }

    pub fn is_extended(self) -> bool {
        matches!(self, MetadataKind::Extended)
    }
}

/// I2: exactly one per path. I3: `payload` never contains the synthetic flag keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub path_id: PathId,
    pub kind: MetadataKind,
    pub payload: Payload,
    pub is_modified: bool,
    pub updated_at: String,
}

pub const DEFAULT_HASH_ALGORITHM: &str = "CRC32";

/// I4: (path_id, algorithm) unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashRecord {
    pub path_id: PathId,
    pub algorithm: String,
    pub hash_value: String,
    pub file_size_at_hash: Option<u64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Rename,
    Undo,
    /// Not currently produced by any component (O5); present in the data model so a
    /// future redo implementation does not require a schema change.
    Redo,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Rename => "rename",
            OperationKind::Undo => "undo",
            OperationKind::Redo => "redo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rename" => Some(OperationKind::Rename),
            "undo" => Some(OperationKind::Undo),
            "redo" => Some(OperationKind::Redo),
            _ => None,
        }
    }
}

/// I5: entries sharing an `operation_id` form one atomic logical batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameEntry {
    pub operation_id: String,
    pub path_id: PathId,
    pub old_path: String,
    pub new_path: String,
    pub old_filename: String,
    pub new_filename: String,
    pub operation_kind: OperationKind,
    pub modules_json: Option<String>,
    pub post_transform_json: Option<String>,
    pub created_at: String,
}

/// Derived view over a set of [`RenameEntry`] sharing an `operation_id`; never stored
/// as its own row.
#[derive(Debug, Clone, PartialEq)]
pub struct RenameBatch {
    pub operation_id: String,
    pub entries: Vec<RenameEntry>,
    pub modules_json: Option<String>,
    pub post_transform_json: Option<String>,
    pub created_at: String,
}

impl RenameBatch {
    pub fn from_entries(operation_id: String, entries: Vec<RenameEntry>) -> Option<Self> {
        let first = entries.first()?;
        Some(RenameBatch {
            operation_id,
            modules_json: first.modules_json.clone(),
            post_transform_json: first.post_transform_json.clone(),
            created_at: first.created_at.clone(),
            entries,
        })
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }
}

/// Summary row returned by `get_rename_history` (§4.1), grouped by operation_id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub operation_id: String,
    pub operation_time: String,
    pub file_count: usize,
    pub operation_kind: OperationKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub paths: u64,
    pub metadata: u64,
    pub hashes: u64,
    pub rename_entries: u64,
}
