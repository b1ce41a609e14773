//! Preview sub-engine (§4.4.2): runs the module chain and post-transform over every
//! selected file with no filesystem interaction, producing a [`PreviewResult`].

use camino::Utf8Path;
use oncutf_cache::{HashCache, MetadataCache};
use oncutf_core::{canonical_json, filename::is_valid_filename_text, NamePair, PreviewResult, DEFAULT_HASH_ALGORITHM};
use oncutf_persistence::PersistentStore;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::modules::{ModuleCategory, ModuleContext, RenameModule};
use crate::post_transform::PostTransform;

const PREVIEW_CACHE_TTL: Duration = Duration::from_millis(100);

const MISSING_HASH_SENTINEL: &str = "missing_hash";
const MISSING_METADATA_SENTINEL: &str = "missing_metadata";

struct CacheEntry {
    key: u64,
    at: Instant,
    result: PreviewResult,
}

fn cache_key(files: &[String], modules: &[Box<dyn RenameModule>], post_transform: &PostTransform) -> u64 {
    let modules_json: Vec<_> = modules.iter().map(|m| m.config_json()).collect();
    let mut hasher = DefaultHasher::new();
    files.hash(&mut hasher);
    canonical_json(&modules_json).hash(&mut hasher);
    canonical_json(post_transform).hash(&mut hasher);
    hasher.finish()
}

/// Splits a filename into `(basename, extension)`, where `extension` includes the
/// leading dot (or is empty for extensionless files).
fn split_name(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => (&filename[..idx], &filename[idx..]),
        _ => (filename, ""),
    }
}

pub struct PreviewEngine<S: PersistentStore> {
    metadata_cache: std::sync::Arc<MetadataCache<S>>,
    hash_cache: std::sync::Arc<HashCache<S>>,
    memo: Mutex<Option<CacheEntry>>,
}

impl<S: PersistentStore> PreviewEngine<S> {
    pub fn new(metadata_cache: std::sync::Arc<MetadataCache<S>>, hash_cache: std::sync::Arc<HashCache<S>>) -> Self {
        PreviewEngine { metadata_cache, hash_cache, memo: Mutex::new(None) }
    }

    pub fn generate_preview(
        &self,
        files: &[String],
        modules: &[Box<dyn RenameModule>],
        post_transform: &PostTransform,
    ) -> PreviewResult {
        let key = cache_key(files, modules, post_transform);
        {
            let memo = self.memo.lock().unwrap();
            if let Some(entry) = memo.as_ref() {
                if entry.key == key && entry.at.elapsed() < PREVIEW_CACHE_TTL {
                    return entry.result.clone();
                }
            }
        }

        let mut pairs = Vec::with_capacity(files.len());
        let mut errors = Vec::new();

        for (index, file) in files.iter().enumerate() {
            let old_filename = Utf8Path::new(file.as_str())
                .file_name()
                .unwrap_or(file.as_str())
                .to_string();
            let (basename, extension) = split_name(&old_filename);

            let hash_value = self.hash_cache.get_hash(file, DEFAULT_HASH_ALGORITHM).unwrap_or(None);
            let metadata = self.metadata_cache.get(file).unwrap_or(None);
            let has_metadata = metadata.is_some();
            let has_hash = hash_value.is_some();

            let context = ModuleContext {
                file_path: file,
                has_hash,
                hash_value: hash_value.as_deref(),
                has_metadata,
                metadata: metadata.as_ref(),
            };

            let mut name = basename.to_string();
            for module in modules {
                name = match module.category() {
                    ModuleCategory::Hash if !has_hash => MISSING_HASH_SENTINEL.to_string(),
                    ModuleCategory::MetadataKeys if !has_metadata => MISSING_METADATA_SENTINEL.to_string(),
                    _ => module.apply(&name, index, &context),
                };
            }

            if post_transform.is_effective() {
                name = post_transform.apply(&name);
            }

            let candidate = format!("{name}{extension}");
            if is_valid_filename_text(&candidate) {
                pairs.push(NamePair { old_name: old_filename, new_name: candidate });
            } else {
                errors.push(format!("invalid filename produced for {old_filename}: {candidate}"));
                pairs.push(NamePair { old_name: old_filename.clone(), new_name: old_filename });
            }
        }

        let result = PreviewResult::new(pairs, errors);
        *self.memo.lock().unwrap() = Some(CacheEntry { key, at: Instant::now(), result: result.clone() });
        result
    }
}
