//! Layered configuration (§4.11): built-in defaults, overridden by a TOML file,
//! overridden again by `ONCUTF_`-prefixed environment variables.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const ENV_PREFIX: &str = "ONCUTF_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: Utf8PathBuf, #[source] source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: Utf8PathBuf, #[source] source: toml::de::Error },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the redb store file.
    pub store_path: Utf8PathBuf,
    /// Max entries in `MetadataCache`'s hot map.
    pub metadata_hot_capacity: usize,
    /// Max entries in `HashCache`'s hot map.
    pub hash_hot_capacity: usize,
    /// `extended` flag passed to `MetadataWorker` when none is given explicitly.
    pub use_extended_metadata: bool,
    /// Hash algorithm name used when none is given explicitly.
    pub hash_algorithm: String,
    /// Default batch size `BatchProcessor` falls back to before its own heuristic runs.
    pub batch_default_size: usize,
    /// Upper bound on `BatchProcessor`'s worker count.
    pub batch_max_workers: usize,
    /// Enables `BatchProcessor`'s adaptive batch-size sizing.
    pub batch_smart_mode: bool,
    /// Preview result memoization window, in milliseconds.
    pub preview_cache_ttl_ms: u64,
    /// Lowercase extensions the preview engine considers; empty means all.
    pub allowed_extensions: Vec<String>,
    pub snapshot_enabled: bool,
    pub snapshot_interval_seconds: u64,
    pub snapshot_keep_count: u32,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_path: default_store_path(),
            metadata_hot_capacity: 2048,
            hash_hot_capacity: 2048,
            use_extended_metadata: false,
            hash_algorithm: "CRC32".to_string(),
            batch_default_size: 100,
            batch_max_workers: 8,
            batch_smart_mode: true,
            preview_cache_ttl_ms: 100,
            allowed_extensions: Vec::new(),
            snapshot_enabled: false,
            snapshot_interval_seconds: 3600,
            snapshot_keep_count: 5,
            log_filter: "info".to_string(),
        }
    }
}

/// `$USER_DATA/oncutf/oncutf_data.db`, via the platform data directory
/// (`directories::ProjectDirs`'s `data_dir()` for a qualifier-less project).
fn default_store_path() -> Utf8PathBuf {
    let base = directories::ProjectDirs::from("", "", "oncutf")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    Utf8PathBuf::from_path_buf(base.join("oncutf_data.db")).unwrap_or_else(|_| Utf8PathBuf::from("oncutf_data.db"))
}

/// Partial override set read from a TOML file; every field optional so a file may
/// override only what it needs to.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    store_path: Option<Utf8PathBuf>,
    metadata_hot_capacity: Option<usize>,
    hash_hot_capacity: Option<usize>,
    use_extended_metadata: Option<bool>,
    hash_algorithm: Option<String>,
    batch_default_size: Option<usize>,
    batch_max_workers: Option<usize>,
    batch_smart_mode: Option<bool>,
    preview_cache_ttl_ms: Option<u64>,
    allowed_extensions: Option<Vec<String>>,
    snapshot_enabled: Option<bool>,
    snapshot_interval_seconds: Option<u64>,
    snapshot_keep_count: Option<u32>,
    log_filter: Option<String>,
}

impl Config {
    /// Loads defaults, then a TOML file at `path` if it exists, then
    /// `ONCUTF_*`-prefixed environment variables, in increasing precedence.
    pub fn load(path: Option<&Utf8PathBuf>, env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = path {
            if path.exists() {
                let text = std::fs::read_to_string(path)
                    .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
                let file: ConfigFile =
                    toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
                config.apply_file(file);
            }
        }

        config.apply_env(env)?;
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.store_path {
            self.store_path = v;
        }
        if let Some(v) = file.metadata_hot_capacity {
            self.metadata_hot_capacity = v;
        }
        if let Some(v) = file.hash_hot_capacity {
            self.hash_hot_capacity = v;
        }
        if let Some(v) = file.use_extended_metadata {
            self.use_extended_metadata = v;
        }
        if let Some(v) = file.hash_algorithm {
            self.hash_algorithm = v;
        }
        if let Some(v) = file.batch_default_size {
            self.batch_default_size = v;
        }
        if let Some(v) = file.batch_max_workers {
            self.batch_max_workers = v;
        }
        if let Some(v) = file.batch_smart_mode {
            self.batch_smart_mode = v;
        }
        if let Some(v) = file.preview_cache_ttl_ms {
            self.preview_cache_ttl_ms = v;
        }
        if let Some(v) = file.allowed_extensions {
            self.allowed_extensions = v;
        }
        if let Some(v) = file.snapshot_enabled {
            self.snapshot_enabled = v;
        }
        if let Some(v) = file.snapshot_interval_seconds {
            self.snapshot_interval_seconds = v;
        }
        if let Some(v) = file.snapshot_keep_count {
            self.snapshot_keep_count = v;
        }
        if let Some(v) = file.log_filter {
            self.log_filter = v;
        }
    }

    fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(v) = env.get(&env_key("STORE_PATH")) {
            self.store_path = Utf8PathBuf::from(v);
        }
        if let Some(v) = env.get(&env_key("METADATA_HOT_CAPACITY")) {
            self.metadata_hot_capacity = parse_env(v, "METADATA_HOT_CAPACITY")?;
        }
        if let Some(v) = env.get(&env_key("HASH_HOT_CAPACITY")) {
            self.hash_hot_capacity = parse_env(v, "HASH_HOT_CAPACITY")?;
        }
        if let Some(v) = env.get(&env_key("USE_EXTENDED_METADATA")) {
            self.use_extended_metadata = parse_env(v, "USE_EXTENDED_METADATA")?;
        }
        if let Some(v) = env.get(&env_key("HASH_ALGORITHM")) {
            self.hash_algorithm = v.clone();
        }
        if let Some(v) = env.get(&env_key("BATCH_DEFAULT_SIZE")) {
            self.batch_default_size = parse_env(v, "BATCH_DEFAULT_SIZE")?;
        }
        if let Some(v) = env.get(&env_key("BATCH_MAX_WORKERS")) {
            self.batch_max_workers = parse_env(v, "BATCH_MAX_WORKERS")?;
        }
        if let Some(v) = env.get(&env_key("BATCH_SMART_MODE")) {
            self.batch_smart_mode = parse_env(v, "BATCH_SMART_MODE")?;
        }
        if let Some(v) = env.get(&env_key("PREVIEW_CACHE_TTL_MS")) {
            self.preview_cache_ttl_ms = parse_env(v, "PREVIEW_CACHE_TTL_MS")?;
        }
        if let Some(v) = env.get(&env_key("ALLOWED_EXTENSIONS")) {
            self.allowed_extensions = v.split(',').map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()).collect();
        }
        if let Some(v) = env.get(&env_key("SNAPSHOT_ENABLED")) {
            self.snapshot_enabled = parse_env(v, "SNAPSHOT_ENABLED")?;
        }
        if let Some(v) = env.get(&env_key("SNAPSHOT_INTERVAL_SECONDS")) {
            self.snapshot_interval_seconds = parse_env(v, "SNAPSHOT_INTERVAL_SECONDS")?;
        }
        if let Some(v) = env.get(&env_key("SNAPSHOT_KEEP_COUNT")) {
            self.snapshot_keep_count = parse_env(v, "SNAPSHOT_KEEP_COUNT")?;
        }
        if let Some(v) = env.get(&env_key("LOG_FILTER")) {
            self.log_filter = v.clone();
        }
        Ok(())
    }
}

fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

fn parse_env<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key: key.to_string(), value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_used_with_no_file_or_env() {
        let config = Config::load(None, &HashMap::new()).unwrap();
        assert_eq!(config.hash_algorithm, "CRC32");
        assert_eq!(config.metadata_hot_capacity, 2048);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("oncutf.toml")).unwrap();
        std::fs::write(&path, "metadata_hot_capacity = 4096\nlog_filter = \"debug\"\n").unwrap();

        let config = Config::load(Some(&path), &HashMap::new()).unwrap();
        assert_eq!(config.metadata_hot_capacity, 4096);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.hash_algorithm, "CRC32");
    }

    #[test]
    fn env_overrides_file_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("oncutf.toml")).unwrap();
        std::fs::write(&path, "metadata_hot_capacity = 4096\n").unwrap();

        let mut env = HashMap::new();
        env.insert("ONCUTF_METADATA_HOT_CAPACITY".to_string(), "8192".to_string());

        let config = Config::load(Some(&path), &env).unwrap();
        assert_eq!(config.metadata_hot_capacity, 8192);
    }

    #[test]
    fn invalid_env_value_is_a_config_error() {
        let mut env = HashMap::new();
        env.insert("ONCUTF_METADATA_HOT_CAPACITY".to_string(), "not-a-number".to_string());
        assert!(Config::load(None, &env).is_err());
    }

    #[test]
    fn allowed_extensions_env_is_comma_separated_and_lowercased() {
        let mut env = HashMap::new();
        env.insert("ONCUTF_ALLOWED_EXTENSIONS".to_string(), "JPG, png,.raw".to_string());
        let config = Config::load(None, &env).unwrap();
        assert_eq!(config.allowed_extensions, vec!["jpg", "png", ".raw"]);
    }
}
