//! Top-level rename engine (C6, §4.4.1): wires the preview/validate/execute
//! sub-engines to the pure [`RenameState`] reducer through a background-thread
//! dispatch loop.
//!
//! Mirrors the dispatch -> background-thread -> event -> reducer loop the ambient
//! application core uses elsewhere, with a plain `std::sync::mpsc` channel standing in
//! for that core's `tokio::sync::mpsc`: this engine's own blocking work (filesystem
//! renames, store round-trips) never runs inside an async runtime, so there is nothing
//! here for a tokio channel to buy.

use oncutf_cache::{HashCache, MetadataCache};
use oncutf_core::{canonical_json, DomainEvent, ExecutionResult, PreviewResult, RenameState, StateManager, ValidationResult};
use oncutf_persistence::PersistentStore;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::execute::{ConflictCallback, ExecutionEngine, FilenameValidator};
use crate::modules::RenameModule;
use crate::post_transform::PostTransform;
use crate::preview::PreviewEngine;
use crate::validate::ValidationEngine;

pub struct RenameEngine<S: PersistentStore + 'static> {
    preview_engine: Arc<PreviewEngine<S>>,
    validation_engine: Arc<ValidationEngine>,
    execution_engine: Arc<ExecutionEngine>,
    state: Mutex<StateManager>,
    tx: Sender<DomainEvent>,
    rx: Mutex<Receiver<DomainEvent>>,
}

impl<S: PersistentStore + 'static> RenameEngine<S> {
    pub fn new(metadata_cache: Arc<MetadataCache<S>>, hash_cache: Arc<HashCache<S>>) -> Self {
        let (tx, rx) = channel();
        RenameEngine {
            preview_engine: Arc::new(PreviewEngine::new(metadata_cache, hash_cache)),
            validation_engine: Arc::new(ValidationEngine::new()),
            execution_engine: Arc::new(ExecutionEngine::new()),
            state: Mutex::new(StateManager::new()),
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// A cloneable handle background work can use to post events back to this
    /// engine's reducer, the counterpart of the ambient kernel's `sender()`.
    pub fn sender(&self) -> Sender<DomainEvent> {
        self.tx.clone()
    }

    /// Drains whatever events have arrived since the last tick and folds them into
    /// the current state. Call this from whatever owns the engine's event loop.
    pub fn tick(&self) {
        let rx = self.rx.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        while let Ok(event) = rx.try_recv() {
            state.dispatch(event);
        }
    }

    pub fn state(&self) -> RenameState {
        self.state.lock().unwrap().state().clone()
    }

    pub fn dispatch(&self, event: DomainEvent) {
        self.state.lock().unwrap().dispatch(event);
    }

    /// Runs the preview sub-engine synchronously and folds the result into state.
    /// Kept synchronous (rather than spawned on a background thread) because preview
    /// computation here is already memoized and fast; `preview_in_background` is the
    /// spawned counterpart for callers that want the dispatch-loop shape.
    pub fn preview(&self, modules: &[Box<dyn RenameModule>], post_transform: &PostTransform) -> PreviewResult {
        let files = self.state().selected_files;
        let result = self.preview_engine.generate_preview(&files, modules, post_transform);
        self.dispatch(DomainEvent::PreviewComputed(result.clone()));
        result
    }

    pub fn validate(&self) -> ValidationResult {
        let pairs = self.state().preview.map(|p| p.name_pairs).unwrap_or_default();
        let result = self.validation_engine.validate_preview(&pairs);
        self.dispatch(DomainEvent::ValidationComputed(result.clone()));
        result
    }

    pub fn execute(
        &self,
        files: &[String],
        new_names: &[String],
        conflict_callback: Option<&dyn ConflictCallback>,
        validator: Option<&dyn FilenameValidator>,
    ) -> ExecutionResult {
        let result = self.execution_engine.execute(files, new_names, conflict_callback, validator);
        self.dispatch(DomainEvent::ExecutionCompleted(result.clone()));
        result
    }

    pub fn select_files(&self, files: Vec<String>) {
        self.dispatch(DomainEvent::FilesSelected(files));
    }

    pub fn set_module_config(&self, modules: &[Box<dyn RenameModule>]) {
        let json: Vec<_> = modules.iter().map(|m| m.config_json()).collect();
        self.dispatch(DomainEvent::ModuleConfigChanged(canonical_json(&json)));
    }

    /// Spawns preview computation on a background thread and posts the result back
    /// through `sender()` as a `PreviewComputed` event, for callers that want the
    /// dispatch/tick shape instead of the synchronous `preview` call above.
    pub fn preview_in_background(
        self: &Arc<Self>,
        files: Vec<String>,
        modules: Vec<Box<dyn RenameModule>>,
        post_transform: PostTransform,
    ) {
        let preview_engine = self.preview_engine.clone();
        let tx = self.tx.clone();
        std::thread::Builder::new()
            .name("oncutf-preview".to_string())
            .spawn(move || {
                let result = preview_engine.generate_preview(&files, &modules, &post_transform);
                let _ = tx.send(DomainEvent::PreviewComputed(result));
            })
            .expect("spawn preview worker thread");
    }
}
