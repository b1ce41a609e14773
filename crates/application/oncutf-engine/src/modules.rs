//! Rename modules: the pure `(file, index, context) -> new basename` chain the
//! preview engine runs over every selected file (§4.4.2, Glossary "Module").
//!
//! Per the REDESIGN FLAGS note on "module reload / drag-ordered module list": a
//! preview call builds a fresh `Vec<Box<dyn RenameModule>>` from scratch every time.
//! No module holds a reference to another, and none hold mutable state between calls.

use oncutf_core::Payload;
use serde_json::Value as Json;

/// Controls when a module falls back to a sentinel name instead of running its normal
/// transform (§4.4.2, O4): `Hash` modules need a resolved content hash, `MetadataKeys`
/// modules need a metadata payload to read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleCategory {
    Hash,
    MetadataKeys,
    Other,
}

/// Everything a module needs to decide its output for one file, assembled fresh by
/// the preview engine for every file in every preview call.
pub struct ModuleContext<'a> {
    pub file_path: &'a str,
    pub has_hash: bool,
    pub hash_value: Option<&'a str>,
    pub has_metadata: bool,
    pub metadata: Option<&'a Payload>,
}

/// One step in the rename preview chain. Implementations must be pure: the same
/// `(basename, index, context)` always produces the same output, and applying a
/// module must not mutate anything the next module in the chain can observe.
pub trait RenameModule: Send + Sync {
    /// `category() != Other` tells the preview engine to substitute the matching
    /// sentinel name (`"missing_hash"` / `"missing_metadata"`) instead of calling
    /// [`apply`](Self::apply) when the context reports the data isn't available.
    fn category(&self) -> ModuleCategory {
        ModuleCategory::Other
    }

    /// Transforms `basename` (the current name with no extension) into the next
    /// basename in the chain. `index` is the file's position in the batch, zero-based.
    fn apply(&self, basename: &str, index: usize, context: &ModuleContext) -> String;

    /// Opaque config snapshot, persisted verbatim in `modules_json` and folded into
    /// the preview-cache key; the store and cache never interpret its contents.
    fn config_json(&self) -> Json;
}

/// Substitutes a fixed piece of text, optionally only for the part of the basename
/// matched by `find` (a plain substring, not a pattern language).
pub struct TextModule {
    pub find: Option<String>,
    pub replace: String,
}

impl RenameModule for TextModule {
    fn apply(&self, basename: &str, _index: usize, _context: &ModuleContext) -> String {
        match &self.find {
            Some(find) if !find.is_empty() => basename.replace(find.as_str(), &self.replace),
            _ => self.replace.clone(),
        }
    }

    fn config_json(&self) -> Json {
        serde_json::json!({"kind": "text", "find": self.find, "replace": self.replace})
    }
}

/// Appends a zero-padded sequential counter starting at `start`, stepping by `step`.
pub struct CounterModule {
    pub start: i64,
    pub step: i64,
    pub padding: usize,
    pub separator: String,
}

impl RenameModule for CounterModule {
    fn apply(&self, basename: &str, index: usize, _context: &ModuleContext) -> String {
        let value = self.start + self.step * index as i64;
        format!("{basename}{}{:0width$}", self.separator, value, width = self.padding)
    }

    fn config_json(&self) -> Json {
        serde_json::json!({
            "kind": "counter",
            "start": self.start,
            "step": self.step,
            "padding": self.padding,
            "separator": self.separator,
        })
    }
}

/// Inserts a metadata value looked up by dotted key (e.g. `"EXIF:DateTimeOriginal"`).
/// Category `MetadataKeys`: the preview engine substitutes `"missing_metadata"` for
/// files with no metadata record at all, rather than calling `apply`.
pub struct MetadataFieldModule {
    pub key: String,
    pub separator: String,
}

impl RenameModule for MetadataFieldModule {
    fn category(&self) -> ModuleCategory {
        ModuleCategory::MetadataKeys
    }

    fn apply(&self, basename: &str, _index: usize, context: &ModuleContext) -> String {
        let value = context
            .metadata
            .and_then(|m| m.get(&self.key))
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if value.is_empty() {
            basename.to_string()
        } else {
            format!("{basename}{}{value}", self.separator)
        }
    }

    fn config_json(&self) -> Json {
        serde_json::json!({"kind": "metadata_field", "key": self.key, "separator": self.separator})
    }
}

/// Inserts the file's content hash. Category `Hash`: the preview engine substitutes
/// `"missing_hash"` when the context reports no hash is on record.
pub struct HashFieldModule {
    pub separator: String,
}

impl RenameModule for HashFieldModule {
    fn category(&self) -> ModuleCategory {
        ModuleCategory::Hash
    }

    fn apply(&self, basename: &str, _index: usize, context: &ModuleContext) -> String {
        match context.hash_value {
            Some(hash) => format!("{basename}{}{hash}", self.separator),
            None => basename.to_string(),
        }
    }

    fn config_json(&self) -> Json {
        serde_json::json!({"kind": "hash_field", "separator": self.separator})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(file_path: &'a str) -> ModuleContext<'a> {
        ModuleContext { file_path, has_hash: false, hash_value: None, has_metadata: false, metadata: None }
    }

    #[test]
    fn text_module_replaces_a_substring() {
        let m = TextModule { find: Some("vacation".into()), replace: "trip".into() };
        assert_eq!(m.apply("vacation_photo", 0, &ctx("x")), "trip_photo");
    }

    #[test]
    fn text_module_with_no_find_is_a_full_replace() {
        let m = TextModule { find: None, replace: "renamed".into() };
        assert_eq!(m.apply("anything", 0, &ctx("x")), "renamed");
    }

    #[test]
    fn counter_module_pads_and_steps() {
        let m = CounterModule { start: 1, step: 1, padding: 3, separator: "_".into() };
        assert_eq!(m.apply("img", 0, &ctx("x")), "img_001");
        assert_eq!(m.apply("img", 4, &ctx("x")), "img_005");
    }

    #[test]
    fn hash_field_module_appends_context_hash() {
        let m = HashFieldModule { separator: "_".into() };
        let context = ModuleContext { file_path: "x", has_hash: true, hash_value: Some("deadbeef"), has_metadata: false, metadata: None };
        assert_eq!(m.apply("img", 0, &context), "img_deadbeef");
    }

    #[test]
    fn metadata_field_module_reads_by_dotted_key() {
        let mut payload = Payload::new();
        payload.insert("EXIF:Model".into(), "XT-4".into());
        let context = ModuleContext { file_path: "x", has_hash: false, hash_value: None, has_metadata: true, metadata: Some(&payload) };
        let m = MetadataFieldModule { key: "EXIF:Model".into(), separator: "-".into() };
        assert_eq!(m.apply("img", 0, &context), "img-XT-4");
    }
}
