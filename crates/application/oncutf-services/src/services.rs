//! Composition root (C10, §4.10): owns every shared handle this core's front ends
//! need, replacing the original's module-level global singletons
//! (`get_database_manager()`, `get_persistent_metadata_cache()`, etc.) with one
//! struct constructed once at startup and handed out by reference.

use std::sync::Arc;

use camino::Utf8PathBuf;
use oncutf_cache::{FileStatusFacade, HashCache, MetadataCache};
use oncutf_config::Config;
use oncutf_engine::{RenameEngine, RenameHistory, SnapshotManager};
use oncutf_persistence::{ConnectionOwner, OncutfRedbStore};

/// Shared, `Arc`-backed handles to every component a front end (the CLI in
/// `oncutf-cli`, or a future UI) needs to drive this core. Built once at process
/// startup from a resolved [`Config`] and passed by reference from there on;
/// nothing here is reached for through a lazily-initialized global.
pub struct CoreServices {
    pub store: Arc<OncutfRedbStore>,
    pub metadata_cache: Arc<MetadataCache<OncutfRedbStore>>,
    pub hash_cache: Arc<HashCache<OncutfRedbStore>>,
    pub rename_engine: Arc<RenameEngine<OncutfRedbStore>>,
    pub history: Arc<RenameHistory<OncutfRedbStore>>,
    pub snapshots: Arc<SnapshotManager>,
    pub status: Arc<FileStatusFacade<OncutfRedbStore>>,
    pub config: Config,
}

impl CoreServices {
    /// Wires every component together from a resolved configuration. The store
    /// path's parent directories are created up front so the first redb open
    /// doesn't fail on a missing data directory.
    pub fn bootstrap(config: Config) -> anyhow::Result<Self> {
        if let Some(parent) = config.store_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Arc::new(OncutfRedbStore::new(config.store_path.clone()));
        let owner = ConnectionOwner::new("core-services");

        let metadata_cache =
            Arc::new(MetadataCache::with_capacity(store.clone(), owner.clone(), config.metadata_hot_capacity));
        let hash_cache = Arc::new(HashCache::with_capacity(store.clone(), owner.clone(), config.hash_hot_capacity));
        let rename_engine = Arc::new(RenameEngine::new(metadata_cache.clone(), hash_cache.clone()));
        let history = Arc::new(RenameHistory::new(store.clone(), owner));
        let status = Arc::new(FileStatusFacade::new(metadata_cache.clone(), hash_cache.clone()));

        let snapshots = SnapshotManager::new(config.store_path.clone());
        snapshots.set_count(config.snapshot_keep_count);
        snapshots.set_interval(config.snapshot_interval_seconds);
        if config.snapshot_enabled {
            snapshots.enable_periodic(true);
            snapshots.start_periodic();
        }

        Ok(CoreServices { store, metadata_cache, hash_cache, rename_engine, history, snapshots, status, config })
    }

    pub fn store_path(&self) -> &Utf8PathBuf {
        &self.config.store_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.store_path = Utf8PathBuf::from_path_buf(dir.join("oncutf_data.db")).unwrap();
        config
    }

    #[test]
    fn bootstrap_creates_a_usable_store_and_engine() {
        let dir = tempfile::tempdir().unwrap();
        let services = CoreServices::bootstrap(test_config(dir.path())).unwrap();

        services.rename_engine.select_files(vec!["/t/a.jpg".to_string()]);
        let result = services.rename_engine.preview(&[], &oncutf_engine::PostTransform::default());
        assert_eq!(result.name_pairs.len(), 1);
    }

    #[test]
    fn bootstrap_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("deeper");
        let services = CoreServices::bootstrap(test_config(&nested)).unwrap();
        assert!(services.store_path().parent().unwrap().exists());
    }
}
