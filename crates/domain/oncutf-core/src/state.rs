//! Pure state/reducer core for the rename workflow (§4.4.1).
//!
//! Mirrors the original's `RenameStateManager`, which recomputes whether anything
//! meaningful changed since the last preview by diffing a small state snapshot, but is
//! reshaped into the event/reducer split this codebase already uses elsewhere: a
//! `DomainEvent` describes something that happened, `reduce` folds it into a new
//! `RenameState` with no side effects, and the owning service is the only place that
//! talks to a channel.

use crate::rename::{ExecutionResult, PreviewResult, ValidationResult};
use serde::{Deserialize, Serialize};

/// Snapshot of everything that can influence what a preview/validate/execute pass
/// produces. Two snapshots being equal on the fields `_detect_state_changes` compares
/// is what lets the engine skip recomputing a preview.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenameState {
    pub selected_files: Vec<String>,
    pub module_config_hash: String,
    pub metadata_extended: bool,
    pub post_transform_enabled: bool,
    pub preview: Option<PreviewResult>,
    pub validation: Option<ValidationResult>,
    pub last_execution: Option<ExecutionResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainEvent {
    FilesSelected(Vec<String>),
    ModuleConfigChanged(String),
    MetadataExtendedToggled(bool),
    PostTransformToggled(bool),
    PreviewComputed(PreviewResult),
    ValidationComputed(ValidationResult),
    ExecutionCompleted(ExecutionResult),
    Reset,
}

/// Folds one event into a new state. Never touches the filesystem, the store, or a
/// clock — all of that happens in the service that dispatches events, not here.
pub fn reduce(state: &RenameState, event: DomainEvent) -> RenameState {
    let mut next = state.clone();
    match event {
        DomainEvent::FilesSelected(files) => {
            next.selected_files = files;
            next.preview = None;
            next.validation = None;
        }
        DomainEvent::ModuleConfigChanged(hash) => {
            next.module_config_hash = hash;
            next.preview = None;
            next.validation = None;
        }
        DomainEvent::MetadataExtendedToggled(extended) => {
            next.metadata_extended = extended;
            next.preview = None;
        }
        DomainEvent::PostTransformToggled(enabled) => {
            next.post_transform_enabled = enabled;
            next.preview = None;
        }
        DomainEvent::PreviewComputed(preview) => {
            next.preview = Some(preview);
            next.validation = None;
        }
        DomainEvent::ValidationComputed(validation) => {
            next.validation = Some(validation);
        }
        DomainEvent::ExecutionCompleted(result) => {
            next.last_execution = Some(result);
        }
        DomainEvent::Reset => {
            next = RenameState::default();
        }
    }
    next
}

/// Tracks the last-reduced state and reports whether recomputing a preview is
/// actually necessary, the same question `_detect_state_changes` answers in the
/// original.
#[derive(Debug, Default)]
pub struct StateManager {
    state: RenameState,
}

impl StateManager {
    pub fn new() -> Self {
        StateManager::default()
    }

    pub fn state(&self) -> &RenameState {
        &self.state
    }

    pub fn dispatch(&mut self, event: DomainEvent) {
        self.state = reduce(&self.state, event);
    }

    /// True when the current `selected_files`/`module_config_hash`/`metadata_extended`
    /// differ from the snapshot that produced `self.state.preview`, i.e. any previously
    /// computed preview is stale and must be recomputed.
    pub fn needs_preview(&self) -> bool {
        self.state.preview.is_none()
    }

    pub fn needs_validation(&self) -> bool {
        self.state.preview.is_some() && self.state.validation.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_files_clears_stale_preview() {
        let mut state = RenameState::default();
        state.preview = Some(PreviewResult::default());
        let next = reduce(&state, DomainEvent::FilesSelected(vec!["a.txt".into()]));
        assert!(next.preview.is_none());
        assert_eq!(next.selected_files, vec!["a.txt".to_string()]);
    }

    #[test]
    fn config_change_invalidates_preview_and_validation() {
        let mut state = RenameState::default();
        state.preview = Some(PreviewResult::default());
        state.validation = Some(ValidationResult::default());
        let next = reduce(&state, DomainEvent::ModuleConfigChanged("abc123".into()));
        assert!(next.preview.is_none());
        assert!(next.validation.is_none());
        assert_eq!(next.module_config_hash, "abc123");
    }

    #[test]
    fn reset_returns_to_default() {
        let mut state = RenameState::default();
        state.selected_files = vec!["a".into()];
        let next = reduce(&state, DomainEvent::Reset);
        assert_eq!(next, RenameState::default());
    }

    #[test]
    fn state_manager_tracks_pending_work() {
        let mut manager = StateManager::new();
        assert!(manager.needs_preview());
        manager.dispatch(DomainEvent::PreviewComputed(PreviewResult::default()));
        assert!(!manager.needs_preview());
        assert!(manager.needs_validation());
        manager.dispatch(DomainEvent::ValidationComputed(ValidationResult::default()));
        assert!(!manager.needs_validation());
    }
}
