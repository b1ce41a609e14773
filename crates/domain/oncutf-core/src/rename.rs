//! Preview/validate/execute result shapes produced by the rename engine (§4.4).
//!
//! These are plain data — the engine that populates them lives in the application
//! layer. Keeping them here lets the persistence and cache crates reference the same
//! shapes without depending on the engine crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One proposed `(old_name, new_name)` pair, before any filesystem or duplicate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePair {
    pub old_name: String,
    pub new_name: String,
}

/// Output of the preview stage (§4.4.2): the module pipeline applied to every selected
/// file, with no filesystem interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub name_pairs: Vec<NamePair>,
    pub has_changes: bool,
    pub errors: Vec<String>,
}

impl PreviewResult {
    pub fn new(name_pairs: Vec<NamePair>, errors: Vec<String>) -> Self {
        let has_changes = name_pairs.iter().any(|p| p.old_name != p.new_name);
        PreviewResult { name_pairs, has_changes, errors }
    }
}

/// Per-file outcome of the validation stage (§4.4.3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationItem {
    pub old_name: String,
    pub new_name: String,
    pub is_valid: bool,
    pub is_duplicate: bool,
    pub is_unchanged: bool,
    pub error_message: Option<String>,
}

/// Aggregate validation outcome for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub items: Vec<ValidationItem>,
    pub duplicates: BTreeSet<String>,
    pub has_errors: bool,
}

impl ValidationResult {
    pub fn from_items(items: Vec<ValidationItem>) -> Self {
        let has_errors = items.iter().any(|i| !i.is_valid);
        let duplicates = items
            .iter()
            .filter(|i| i.is_duplicate)
            .map(|i| i.new_name.clone())
            .collect();
        ValidationResult { items, duplicates, has_errors }
    }
}

/// How a name collision with an existing on-disk file was resolved, or should be
/// resolved, during execution (§4.4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictResolution {
    Skip,
    SkipAll,
    Overwrite,
    Cancel,
}

/// Per-file outcome of the execution stage (§4.4.4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionItem {
    pub old_path: String,
    pub new_path: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub skip_reason: Option<String>,
    pub is_conflict: bool,
    pub conflict_resolved: Option<ConflictResolution>,
}

/// Aggregate execution outcome for a batch, driving the final user-facing summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub items: Vec<ExecutionItem>,
    pub success_count: usize,
    pub error_count: usize,
    pub skipped_count: usize,
    pub conflicts_count: usize,
}

impl ExecutionResult {
    pub fn from_items(items: Vec<ExecutionItem>) -> Self {
        let success_count = items.iter().filter(|i| i.success).count();
        let error_count = items
            .iter()
            .filter(|i| !i.success && i.skip_reason.is_none())
            .count();
        let skipped_count = items.iter().filter(|i| i.skip_reason.is_some()).count();
        let conflicts_count = items.iter().filter(|i| i.is_conflict).count();
        ExecutionResult { items, success_count, error_count, skipped_count, conflicts_count }
    }
}
