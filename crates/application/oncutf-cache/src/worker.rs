//! Cooperative metadata-loading producer (§4.7).
//!
//! Progress reporting follows the same shape the original directory scanner uses: a
//! plain `AtomicBool` cancellation flag checked between units of work on the worker
//! thread, while progress callbacks fire inline rather than from a second polling
//! thread, since metadata reads (unlike a parallel directory walk) are already
//! sequential here.

use oncutf_core::{MetadataValue, Payload, EXTENDED_FLAG_KEY};
use oncutf_persistence::PersistentStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::metadata_cache::MetadataCache;

/// Number of pending writes accumulated before a batch flush, when batching is enabled.
const BATCH_FLUSH_SIZE: usize = 25;

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("{0}")]
    Probe(String),
}

/// Injected probe client; the core never constructs one itself.
pub trait MetadataReader: Send + Sync {
    fn read_metadata(&self, path: &str) -> Result<Payload, ReaderError>;
}

#[derive(Default)]
pub struct WorkerCallbacks {
    pub on_progress: Option<Box<dyn Fn(usize, usize) + Send + Sync>>,
    pub on_size_progress: Option<Box<dyn Fn(u64, u64) + Send + Sync>>,
    pub on_file_loaded: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

#[derive(Debug, Default)]
pub struct WorkerResult {
    pub processed: usize,
    pub total: usize,
    pub errors: Vec<(String, String)>,
    pub cancelled: bool,
}

pub struct MetadataWorker<S: PersistentStore, R: MetadataReader> {
    reader: Arc<R>,
    cache: Arc<MetadataCache<S>>,
    files: Vec<String>,
    use_extended: bool,
    batch_enabled: bool,
    cancel: Arc<AtomicBool>,
}

impl<S: PersistentStore, R: MetadataReader> MetadataWorker<S, R> {
    pub fn new(reader: Arc<R>, cache: Arc<MetadataCache<S>>, files: Vec<String>, use_extended: bool) -> Self {
        MetadataWorker {
            reader,
            cache,
            files,
            use_extended,
            batch_enabled: true,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_batching(mut self, enabled: bool) -> Self {
        self.batch_enabled = enabled;
        self
    }

    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn run(&self, callbacks: &WorkerCallbacks) -> WorkerResult {
        let total = self.files.len();
        let total_bytes: u64 = self
            .files
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok().map(|m| m.len()))
            .sum();

        let mut processed_bytes = 0u64;
        let mut processed = 0usize;
        let mut errors = Vec::new();
        let mut pending: Vec<(String, Payload, bool, bool)> = Vec::new();
        let mut cancelled = false;

        for (i, path) in self.files.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }

            let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

            match self.reader.read_metadata(path) {
                Ok(payload) => {
                    let previous_extended = self
                        .cache
                        .get_entry(path)
                        .ok()
                        .flatten()
                        .map(|e| e.kind.is_extended())
                        .unwrap_or(false);
                    let payload_extended_flag = matches!(
                        payload.get(EXTENDED_FLAG_KEY),
                        Some(MetadataValue::Boolean(true))
                    );
                    let effective_extended = previous_extended || self.use_extended || payload_extended_flag;

                    if self.batch_enabled {
                        pending.push((path.clone(), payload, effective_extended, false));
                        if pending.len() >= BATCH_FLUSH_SIZE {
                            self.flush(&mut pending, &mut errors);
                        }
                    } else if let Err(e) = self.cache.set(path, &payload, effective_extended, false) {
                        errors.push((path.clone(), e.to_string()));
                    }

                    processed += 1;
                    if let Some(cb) = &callbacks.on_file_loaded {
                        cb(path);
                    }
                }
                Err(e) => errors.push((path.clone(), e.to_string())),
            }

            processed_bytes += file_size;
            if let Some(cb) = &callbacks.on_progress {
                cb(i + 1, total);
            }
            if let Some(cb) = &callbacks.on_size_progress {
                cb(processed_bytes, total_bytes);
            }
        }

        // Cancellation still flushes whatever is queued so nothing already read is lost.
        self.flush(&mut pending, &mut errors);

        if cancelled {
            warn!(processed, total, "metadata worker cancelled");
        } else {
            info!(processed, total, errors = errors.len(), "metadata worker finished");
        }

        WorkerResult { processed, total, errors, cancelled }
    }

    /// Writes each pending entry directly; a failure on one entry does not block the
    /// rest, which is the worker's fallback-to-direct-write behavior on flush failure.
    fn flush(&self, pending: &mut Vec<(String, Payload, bool, bool)>, errors: &mut Vec<(String, String)>) {
        for (path, payload, extended, modified) in pending.drain(..) {
            if let Err(e) = self.cache.set(&path, &payload, extended, modified) {
                errors.push((path, e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use oncutf_persistence::{ConnectionOwner, OncutfRedbStore};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct FakeReader {
        answers: Mutex<std::collections::HashMap<String, Payload>>,
    }

    impl MetadataReader for FakeReader {
        fn read_metadata(&self, path: &str) -> Result<Payload, ReaderError> {
            self.answers
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| ReaderError::Probe(format!("no fixture for {path}")))
        }
    }

    fn cache() -> (Arc<MetadataCache<OncutfRedbStore>>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("oncutf_data.db")).unwrap();
        let store = Arc::new(OncutfRedbStore::new(path));
        (Arc::new(MetadataCache::new(store, ConnectionOwner::default())), dir)
    }

    #[test]
    fn worker_loads_all_files_and_reports_progress() {
        let (cache, dir) = cache();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        std::fs::write(&a, b"aa").unwrap();
        std::fs::write(&b, b"bbbb").unwrap();

        let mut answers = std::collections::HashMap::new();
        let mut pa = Payload::new();
        pa.insert("EXIF:Orientation".into(), "1".into());
        answers.insert(a.to_str().unwrap().to_string(), pa);
        let mut pb = Payload::new();
        pb.insert("EXIF:Orientation".into(), "6".into());
        answers.insert(b.to_str().unwrap().to_string(), pb);

        let reader = Arc::new(FakeReader { answers: Mutex::new(answers) });
        let files = vec![a.to_str().unwrap().to_string(), b.to_str().unwrap().to_string()];
        let worker = MetadataWorker::new(reader, cache.clone(), files.clone(), false);

        let progress_calls = Arc::new(AtomicUsize::new(0));
        let pc = progress_calls.clone();
        let callbacks = WorkerCallbacks {
            on_progress: Some(Box::new(move |_, _| {
                pc.fetch_add(1, Ordering::Relaxed);
            })),
            ..Default::default()
        };

        let result = worker.run(&callbacks);
        assert_eq!(result.processed, 2);
        assert!(result.errors.is_empty());
        assert_eq!(progress_calls.load(Ordering::Relaxed), 2);

        assert!(cache.has(&files[0]).unwrap());
        assert!(cache.has(&files[1]).unwrap());
    }

    #[test]
    fn worker_records_reader_errors_without_aborting() {
        let (cache, dir) = cache();
        let a = dir.path().join("a.jpg");
        std::fs::write(&a, b"a").unwrap();
        let missing = dir.path().join("missing.jpg").to_str().unwrap().to_string();

        let reader = Arc::new(FakeReader { answers: Mutex::new(std::collections::HashMap::new()) });
        let files = vec![missing.clone(), a.to_str().unwrap().to_string()];
        let worker = MetadataWorker::new(reader, cache, files, false);

        let result = worker.run(&WorkerCallbacks::default());
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn cancellation_stops_processing_early() {
        let (cache, dir) = cache();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();

        let mut answers = std::collections::HashMap::new();
        answers.insert(a.to_str().unwrap().to_string(), Payload::new());
        answers.insert(b.to_str().unwrap().to_string(), Payload::new());
        let reader = Arc::new(FakeReader { answers: Mutex::new(answers) });
        let files = vec![a.to_str().unwrap().to_string(), b.to_str().unwrap().to_string()];
        let worker = MetadataWorker::new(reader, cache, files, false);

        worker.cancel();
        let result = worker.run(&WorkerCallbacks::default());
        assert!(result.cancelled);
        assert_eq!(result.processed, 0);
    }
}
