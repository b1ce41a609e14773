//! Execution sub-engine (§4.4.4): performs the actual filesystem renames for a
//! validated preview. Never touches the persistent store itself — recording history
//! is the caller's job (`RenameHistory::record_batch`).

use camino::Utf8Path;
use oncutf_core::{ConflictResolution, ExecutionItem, ExecutionResult};
use oncutf_infra::rename_with_case_guard;

/// Asks the caller how to resolve a filename collision with an existing on-disk file.
/// A narrow trait seam in place of a back-pointer into UI code (§9, §4.10).
pub trait ConflictCallback: Send + Sync {
    fn resolve(&self, old_name: &str, new_name: &str) -> ConflictResolution;
}

/// Re-checks filename safety right before a rename is attempted, in case the caller
/// wants a stricter policy than the validation stage already applied.
pub trait FilenameValidator: Send + Sync {
    fn validate(&self, basename: &str) -> bool;
}

#[derive(Default)]
pub struct ExecutionEngine;

impl ExecutionEngine {
    pub fn new() -> Self {
        ExecutionEngine
    }

    /// `files[i]` (a full path) is renamed in place to `new_names[i]` (a basename in
    /// the same directory). Stops early only on `ConflictResolution::Cancel`; every
    /// other outcome (skip, skip-all, overwrite, error) continues to the next item.
    pub fn execute(
        &self,
        files: &[String],
        new_names: &[String],
        conflict_callback: Option<&dyn ConflictCallback>,
        validator: Option<&dyn FilenameValidator>,
    ) -> ExecutionResult {
        let mut items = Vec::with_capacity(files.len());
        let mut skip_all = false;
        let pairs: Vec<(&String, &String)> = files.iter().zip(new_names.iter()).collect();

        for (index, (old_path, new_name)) in pairs.iter().copied().enumerate() {
            let old = Utf8Path::new(old_path.as_str());
            let dir = old.parent().unwrap_or_else(|| Utf8Path::new("."));
            let new_path = dir.join(new_name);
            let old_filename = old.file_name().unwrap_or(old_path.as_str());

            let mut item = ExecutionItem {
                old_path: old_path.clone(),
                new_path: new_path.to_string(),
                success: false,
                error_message: None,
                skip_reason: None,
                is_conflict: false,
                conflict_resolved: None,
            };

            if skip_all {
                item.skip_reason = Some("skip_all".to_string());
                items.push(item);
                continue;
            }

            if let Some(v) = validator {
                if !v.validate(new_name) {
                    item.error_message = Some(format!("invalid filename: {new_name}"));
                    items.push(item);
                    continue;
                }
            }

            if new_path.exists() && new_path.as_str() != old.as_str() {
                item.is_conflict = true;
                let resolution = conflict_callback
                    .map(|cb| cb.resolve(old_filename, new_name))
                    .unwrap_or(ConflictResolution::Skip);
                item.conflict_resolved = Some(resolution);

                match resolution {
                    ConflictResolution::Skip => {
                        item.skip_reason = Some("conflict: target already exists".to_string());
                        items.push(item);
                        continue;
                    }
                    ConflictResolution::SkipAll => {
                        item.skip_reason = Some("conflict: target already exists".to_string());
                        skip_all = true;
                        items.push(item);
                        continue;
                    }
                    ConflictResolution::Cancel => {
                        item.skip_reason = Some("cancelled".to_string());
                        items.push(item);
                        for (remaining_old, remaining_new) in &pairs[index + 1..] {
                            let remaining_dir =
                                Utf8Path::new(remaining_old.as_str()).parent().unwrap_or_else(|| Utf8Path::new("."));
                            items.push(ExecutionItem {
                                old_path: (*remaining_old).clone(),
                                new_path: remaining_dir.join(remaining_new.as_str()).to_string(),
                                success: false,
                                error_message: None,
                                skip_reason: None,
                                is_conflict: false,
                                conflict_resolved: None,
                            });
                        }
                        break;
                    }
                    ConflictResolution::Overwrite => {}
                }
            }

            match rename_with_case_guard(old.as_std_path(), new_path.as_std_path()) {
                Ok(()) => item.success = true,
                Err(e) => item.error_message = Some(e.to_string()),
            }
            items.push(item);
        }

        ExecutionResult::from_items(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysOverwrite;
    impl ConflictCallback for AlwaysOverwrite {
        fn resolve(&self, _old_name: &str, _new_name: &str) -> ConflictResolution {
            ConflictResolution::Overwrite
        }
    }

    #[test]
    fn renames_files_with_no_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        std::fs::write(&a, b"hi").unwrap();

        let engine = ExecutionEngine::new();
        let files = vec![a.to_str().unwrap().to_string()];
        let new_names = vec!["b.txt".to_string()];
        let result = engine.execute(&files, &new_names, None, None);

        assert_eq!(result.success_count, 1);
        assert!(dir.path().join("b.txt").exists());
        assert!(!a.exists());
    }

    #[test]
    fn default_skip_on_conflict_with_no_callback() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, b"hi").unwrap();
        std::fs::write(&b, b"existing").unwrap();

        let engine = ExecutionEngine::new();
        let files = vec![a.to_str().unwrap().to_string()];
        let new_names = vec!["b.txt".to_string()];
        let result = engine.execute(&files, &new_names, None, None);

        assert_eq!(result.skipped_count, 1);
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "existing");
        assert!(a.exists());
    }

    #[test]
    fn overwrite_resolution_replaces_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, b"new").unwrap();
        std::fs::write(&b, b"old").unwrap();

        let engine = ExecutionEngine::new();
        let files = vec![a.to_str().unwrap().to_string()];
        let new_names = vec!["b.txt".to_string()];
        let callback = AlwaysOverwrite;
        let result = engine.execute(&files, &new_names, Some(&callback), None);

        assert_eq!(result.success_count, 1);
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "new");
    }

    #[test]
    fn cancel_stops_remaining_items() {
        struct CancelAll;
        impl ConflictCallback for CancelAll {
            fn resolve(&self, _old_name: &str, _new_name: &str) -> ConflictResolution {
                ConflictResolution::Cancel
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        let c = dir.path().join("c.txt");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"existing").unwrap();
        std::fs::write(&c, b"c").unwrap();

        let engine = ExecutionEngine::new();
        let files = vec![a.to_str().unwrap().to_string(), c.to_str().unwrap().to_string()];
        let new_names = vec!["b.txt".to_string(), "d.txt".to_string()];
        let callback = CancelAll;
        let result = engine.execute(&files, &new_names, Some(&callback), None);

        assert_eq!(result.items.len(), 2);
        assert!(result.items[0].is_conflict);
        assert!(!result.items[1].is_conflict);
        assert!(!result.items[1].success);
        assert!(c.exists());
        assert!(!dir.path().join("d.txt").exists());
    }
}
