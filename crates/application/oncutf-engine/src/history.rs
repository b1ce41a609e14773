//! Rename history (C7, §4.6): records batches of renames as an undoable journal on
//! top of the persistent store's `rename_history` table.

use oncutf_core::{OperationKind, OperationSummary, RenameBatch};
use oncutf_infra::rename_with_case_guard;
use oncutf_persistence::{ConnectionOwner, PersistentStore};
use std::sync::Arc;
use tracing::{info, warn};

const TRUNCATE_NAMES_FOR_REASON: usize = 3;
const TRUNCATE_NAMES_FOR_UNDO_FAILURE: usize = 3;

pub struct RenameHistory<S: PersistentStore> {
    store: Arc<S>,
    owner: ConnectionOwner,
}

fn truncated_name_list(names: &[String], limit: usize) -> String {
    let shown: Vec<&str> = names.iter().take(limit).map(|s| s.as_str()).collect();
    if names.len() > limit {
        format!("{}...", shown.join(", "))
    } else {
        shown.join(", ")
    }
}

impl<S: PersistentStore> RenameHistory<S> {
    pub fn new(store: Arc<S>, owner: ConnectionOwner) -> Self {
        RenameHistory { store, owner }
    }

    /// Records one atomic batch of `(old_path, new_path)` renames under a fresh
    /// operation id, returning that id.
    pub fn record_batch(
        &self,
        renames: &[(String, String)],
        modules_json: Option<&str>,
        post_transform_json: Option<&str>,
    ) -> Result<String, oncutf_persistence::StorageError> {
        self.record_batch_as(renames, modules_json, post_transform_json, OperationKind::Rename)
    }

    fn record_batch_as(
        &self,
        renames: &[(String, String)],
        modules_json: Option<&str>,
        post_transform_json: Option<&str>,
        operation_kind: OperationKind,
    ) -> Result<String, oncutf_persistence::StorageError> {
        let operation_id = uuid::Uuid::new_v4().to_string();
        self.store.record_rename_operation(
            &self.owner,
            &operation_id,
            renames,
            modules_json,
            post_transform_json,
            operation_kind,
        )?;
        info!(operation_id, files = renames.len(), kind = operation_kind.as_str(), "recorded rename batch");
        Ok(operation_id)
    }

    /// `display_text` is `"Renamed {n} file(s) - {timestamp}"`, timestamp to the
    /// second with `T` replaced by a space (§4.6).
    pub fn recent_operations(
        &self,
        limit: usize,
    ) -> Result<Vec<(OperationSummary, String)>, oncutf_persistence::StorageError> {
        let summaries = self.store.get_rename_history(&self.owner, limit)?;
        Ok(summaries
            .into_iter()
            .map(|s| {
                let timestamp = to_the_second(&s.operation_time);
                let display_text = format!("Renamed {} file(s) - {}", s.file_count, timestamp);
                (s, display_text)
            })
            .collect())
    }

    pub fn operation_details(
        &self,
        operation_id: &str,
    ) -> Result<Option<RenameBatch>, oncutf_persistence::StorageError> {
        let entries = self.store.get_operation_entries(&self.owner, operation_id)?;
        if entries.is_empty() {
            return Ok(None);
        }
        Ok(RenameBatch::from_entries(operation_id.to_string(), entries))
    }

    /// Returns `(can_undo, reason)`. `reason` is empty when `can_undo` is true.
    pub fn can_undo(&self, operation_id: &str) -> Result<(bool, String), oncutf_persistence::StorageError> {
        let Some(batch) = self.operation_details(operation_id)? else {
            return Ok((false, format!("No such operation: {operation_id}")));
        };

        let mut missing = Vec::new();
        let mut renamed_again = Vec::new();
        for entry in &batch.entries {
            if !std::path::Path::new(&entry.new_path).exists() {
                missing.push(entry.new_filename.clone());
                continue;
            }
            if std::path::Path::new(&entry.old_path).exists() {
                renamed_again.push(entry.new_filename.clone());
            }
        }

        if !missing.is_empty() {
            return Ok((false, format!("Missing files: {}", truncated_name_list(&missing, TRUNCATE_NAMES_FOR_REASON))));
        }
        if !renamed_again.is_empty() {
            return Ok((
                false,
                format!("Files have been renamed again: {}", truncated_name_list(&renamed_again, 2)),
            ));
        }
        Ok((true, String::new()))
    }

    /// Reverses every entry in `operation_id`, then records the reversal itself as a
    /// new `Undo` batch (not a mutation of the original). Returns
    /// `(success, message, files_processed)`.
    pub fn undo(&self, operation_id: &str) -> Result<(bool, String, usize), oncutf_persistence::StorageError> {
        let (can_undo, reason) = self.can_undo(operation_id)?;
        if !can_undo {
            return Ok((false, reason, 0));
        }
        let batch = self
            .operation_details(operation_id)?
            .expect("can_undo confirmed the operation exists");

        let mut succeeded = 0usize;
        let mut failed_names = Vec::new();
        let mut reversed = Vec::new();

        for entry in &batch.entries {
            let from = std::path::Path::new(&entry.new_path);
            let to = std::path::Path::new(&entry.old_path);
            match rename_with_case_guard(from, to) {
                Ok(()) => {
                    succeeded += 1;
                    reversed.push((entry.new_path.clone(), entry.old_path.clone()));
                }
                Err(e) => {
                    warn!(path = %entry.new_path, error = %e, "undo rename failed");
                    failed_names.push(entry.new_filename.clone());
                }
            }
        }

        if !reversed.is_empty() {
            self.record_batch_as(&reversed, batch.modules_json.as_deref(), batch.post_transform_json.as_deref(), OperationKind::Undo)?;
        }

        let total = batch.entries.len();
        if failed_names.is_empty() {
            Ok((true, format!("Successfully undid rename operation for {succeeded} files"), succeeded))
        } else {
            Ok((
                false,
                format!(
                    "Undid {succeeded}/{total} files. Failed: {}",
                    truncated_name_list(&failed_names, TRUNCATE_NAMES_FOR_UNDO_FAILURE)
                ),
                succeeded,
            ))
        }
    }

    /// Documented stub (O1): the original delegates time-based pruning to orphan
    /// cleanup rather than implementing a real age-based sweep.
    pub fn cleanup_old(&self, _days: u32) -> Result<u64, oncutf_persistence::StorageError> {
        self.store.cleanup_orphans(&self.owner)
    }

    /// Placeholder (O5): no component currently produces a `Redo` entry to replay.
    pub fn redo(&self, _operation_id: &str) -> Result<(bool, String), oncutf_persistence::StorageError> {
        Ok((false, "redo is not implemented".to_string()))
    }
}

fn to_the_second(timestamp: &str) -> String {
    let trimmed = timestamp.split('.').next().unwrap_or(timestamp);
    trimmed.replacen('T', " ", 1)
}
