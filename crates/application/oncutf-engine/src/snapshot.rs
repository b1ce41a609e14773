//! Snapshot manager (C8, §4.8): periodic and shutdown backups of the store file, with
//! filename-pattern rotation. Scheduling uses the same small `Scheduler::schedule`
//! abstraction called for in the design notes (§9), not a UI timer.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info};

const BACKUP_SUFFIX: &str = ".bak";

#[derive(Debug, Clone)]
pub struct SnapshotStatus {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub keep_count: u32,
    pub backup_count: usize,
    pub last_backup: Option<Utf8PathBuf>,
}

/// Consolidates repeated schedule calls under the same id, runs on its own thread.
/// Used here only for the periodic backup tick.
struct Scheduler {
    stop: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    fn new() -> Self {
        Scheduler { stop: Arc::new(AtomicBool::new(false)), handle: Mutex::new(None) }
    }

    fn schedule(&self, after: Duration, tick: impl Fn() + Send + 'static) {
        self.cancel();
        self.stop.store(false, Ordering::SeqCst);
        let stop = self.stop.clone();
        let handle = std::thread::Builder::new()
            .name("oncutf-snapshot-scheduler".to_string())
            .spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    std::thread::sleep(after);
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                    tick();
                }
            })
            .expect("spawn snapshot scheduler thread");
        *self.handle.lock().unwrap() = Some(handle);
    }

    fn cancel(&self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

pub struct SnapshotManager {
    store_path: Utf8PathBuf,
    keep_count: AtomicU32,
    interval_seconds: AtomicU64,
    periodic_enabled: AtomicBool,
    scheduler: Scheduler,
    on_backup_completed: Mutex<Option<Box<dyn Fn(&Utf8Path) + Send + Sync>>>,
    on_backup_failed: Mutex<Option<Box<dyn Fn(&str) + Send + Sync>>>,
}

impl SnapshotManager {
    pub fn new(store_path: Utf8PathBuf) -> Arc<Self> {
        Arc::new(SnapshotManager {
            store_path,
            keep_count: AtomicU32::new(5),
            interval_seconds: AtomicU64::new(3600),
            periodic_enabled: AtomicBool::new(false),
            scheduler: Scheduler::new(),
            on_backup_completed: Mutex::new(None),
            on_backup_failed: Mutex::new(None),
        })
    }

    pub fn on_backup_completed(&self, f: impl Fn(&Utf8Path) + Send + Sync + 'static) {
        *self.on_backup_completed.lock().unwrap() = Some(Box::new(f));
    }

    pub fn on_backup_failed(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_backup_failed.lock().unwrap() = Some(Box::new(f));
    }

    pub fn set_count(&self, n: u32) {
        self.keep_count.store(n.max(1), Ordering::SeqCst);
    }

    pub fn set_interval(&self, seconds: u64) {
        self.interval_seconds.store(seconds, Ordering::SeqCst);
    }

    pub fn enable_periodic(&self, enabled: bool) {
        self.periodic_enabled.store(enabled, Ordering::SeqCst);
    }

    /// No-op if a periodic tick is already running; idempotent (§4.8).
    pub fn start_periodic(self: &Arc<Self>) {
        if !self.periodic_enabled.load(Ordering::SeqCst) {
            return;
        }
        let me = self.clone();
        let interval = Duration::from_secs(self.interval_seconds.load(Ordering::SeqCst).max(1));
        self.scheduler.schedule(interval, move || {
            let _ = me.create("periodic");
        });
    }

    pub fn stop_periodic(&self) {
        self.scheduler.cancel();
    }

    pub fn backup_on_shutdown(&self) -> Option<Utf8PathBuf> {
        self.create("shutdown").ok().flatten()
    }

    /// Copies the store file to `<stem>_YYYYMMDD_HHMMSS.db.bak` in the same
    /// directory, then rotates old backups down to `keep_count`. No-op if the store
    /// file does not exist yet.
    pub fn create(&self, reason: &str) -> Result<Option<Utf8PathBuf>, std::io::Error> {
        if !self.store_path.exists() {
            return Ok(None);
        }

        let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let stem = self.store_path.file_stem().unwrap_or("oncutf_data");
        let dir = self.store_path.parent().unwrap_or_else(|| Utf8Path::new("."));

        // The stamp has only second resolution; disambiguate backups taken within the
        // same second with a counter suffix rather than silently overwriting one.
        let mut backup_path = dir.join(format!("{stem}_{stamp}.db{BACKUP_SUFFIX}"));
        let mut suffix = 2;
        while backup_path.exists() {
            backup_path = dir.join(format!("{stem}_{stamp}_{suffix}.db{BACKUP_SUFFIX}"));
            suffix += 1;
        }

        match std::fs::copy(&self.store_path, &backup_path) {
            Ok(_) => {
                info!(reason, path = %backup_path, "wrote snapshot backup");
                if let Some(cb) = self.on_backup_completed.lock().unwrap().as_ref() {
                    cb(&backup_path);
                }
                self.rotate();
                Ok(Some(backup_path))
            }
            Err(e) => {
                error!(reason, error = %e, "snapshot backup failed");
                if let Some(cb) = self.on_backup_failed.lock().unwrap().as_ref() {
                    cb(&e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Newest-first list of existing backup files for this store.
    pub fn list_backups(&self) -> Vec<Utf8PathBuf> {
        let mut entries = self.backups_by_mtime();
        entries.reverse();
        entries.into_iter().map(|(_, path)| path).collect()
    }

    pub fn status(&self) -> SnapshotStatus {
        SnapshotStatus {
            enabled: self.periodic_enabled.load(Ordering::SeqCst),
            interval_seconds: self.interval_seconds.load(Ordering::SeqCst),
            keep_count: self.keep_count.load(Ordering::SeqCst),
            backup_count: self.list_backups().len(),
            last_backup: self.list_backups().into_iter().next(),
        }
    }

    /// Drops the oldest backups beyond `keep_count` without writing a new one first,
    /// for callers that want to apply a lowered `keep_count` immediately.
    pub fn rotate_now(&self) {
        self.rotate();
    }

    /// Drops the oldest backups beyond `keep_count`. Rotation errors are logged and
    /// never block a freshly-written backup.
    fn rotate(&self) {
        let keep = self.keep_count.load(Ordering::SeqCst) as usize;
        let entries = self.backups_by_mtime();
        if entries.len() <= keep {
            return;
        }
        for (_, path) in entries.into_iter().take(entries.len() - keep) {
            if let Err(e) = std::fs::remove_file(&path) {
                error!(path = %path, error = %e, "failed to rotate old snapshot backup");
            }
        }
    }

    /// Oldest-first `(mtime, path)` pairs for this store's backups. Ties on `mtime`
    /// (common on filesystems with coarse timestamp resolution) are broken by
    /// filename, which already sorts chronologically thanks to the `YYYYMMDD_HHMMSS`
    /// stamp.
    fn backups_by_mtime(&self) -> Vec<(std::time::SystemTime, Utf8PathBuf)> {
        let dir = self.store_path.parent().unwrap_or_else(|| Utf8Path::new("."));
        let stem = self.store_path.file_stem().unwrap_or("oncutf_data").to_string();
        let mut entries: Vec<(std::time::SystemTime, Utf8PathBuf)> = Vec::new();

        let Ok(read_dir) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        for entry in read_dir.flatten() {
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else { continue };
            let name = path.file_name().unwrap_or_default();
            if !name.starts_with(&format!("{stem}_")) || !name.ends_with(&format!(".db{BACKUP_SUFFIX}")) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else { continue };
            let Ok(mtime) = metadata.modified() else { continue };
            entries.push((mtime, path));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_is_a_no_op_when_store_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("oncutf_data.db")).unwrap();
        let manager = SnapshotManager::new(path);
        assert_eq!(manager.create("test").unwrap(), None);
    }

    #[test]
    fn create_writes_a_backup_next_to_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("oncutf_data.db")).unwrap();
        std::fs::write(&path, b"fake db contents").unwrap();

        let manager = SnapshotManager::new(path);
        let backup = manager.create("test").unwrap().unwrap();
        assert!(backup.exists());
        assert!(backup.as_str().ends_with(".db.bak"));
        assert_eq!(manager.list_backups().len(), 1);
    }

    #[test]
    fn rotation_keeps_only_the_configured_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("oncutf_data.db")).unwrap();
        std::fs::write(&path, b"v1").unwrap();

        let manager = SnapshotManager::new(path);
        manager.set_count(2);
        for _ in 0..4 {
            manager.create("test").unwrap();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(manager.list_backups().len(), 2);
    }

    #[test]
    fn status_reports_current_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("oncutf_data.db")).unwrap();
        let manager = SnapshotManager::new(path);
        manager.set_interval(120);
        manager.enable_periodic(true);
        let status = manager.status();
        assert!(status.enabled);
        assert_eq!(status.interval_seconds, 120);
    }
}
