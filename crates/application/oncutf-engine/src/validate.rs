//! Validation sub-engine (§4.4.3): flags duplicate, unchanged and filesystem-unsafe
//! names in a preview's name pairs, independent of any filesystem state.

use oncutf_core::{filename::is_valid_filename_text, NamePair, ValidationItem, ValidationResult};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const VALIDATION_CACHE_TTL: Duration = Duration::from_millis(100);

struct CacheEntry {
    key: u64,
    at: Instant,
    result: ValidationResult,
}

fn cache_key(pairs: &[NamePair]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for pair in pairs {
        pair.old_name.hash(&mut hasher);
        pair.new_name.hash(&mut hasher);
    }
    hasher.finish()
}

#[derive(Default)]
pub struct ValidationEngine {
    memo: Mutex<Option<CacheEntry>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        ValidationEngine::default()
    }

    /// `is_duplicate` is false for a name pair's first occurrence of `new_name` and
    /// true for every repeat (§4.4.3); `duplicates` collects the distinct repeated
    /// names, not one entry per repeat.
    pub fn validate_preview(&self, pairs: &[NamePair]) -> ValidationResult {
        let key = cache_key(pairs);
        {
            let memo = self.memo.lock().unwrap();
            if let Some(entry) = memo.as_ref() {
                if entry.key == key && entry.at.elapsed() < VALIDATION_CACHE_TTL {
                    return entry.result.clone();
                }
            }
        }

        let mut seen = HashSet::new();
        let items: Vec<ValidationItem> = pairs
            .iter()
            .map(|pair| {
                let is_valid = is_valid_filename_text(&pair.new_name);
                let is_unchanged = pair.old_name == pair.new_name;
                let is_duplicate = !seen.insert(pair.new_name.clone());
                let error_message = if !is_valid {
                    Some(format!("unsafe filename: {}", pair.new_name))
                } else {
                    None
                };
                ValidationItem {
                    old_name: pair.old_name.clone(),
                    new_name: pair.new_name.clone(),
                    is_valid,
                    is_duplicate,
                    is_unchanged,
                    error_message,
                }
            })
            .collect();

        let result = ValidationResult::from_items(items);
        *self.memo.lock().unwrap() = Some(CacheEntry { key, at: Instant::now(), result: result.clone() });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(old: &str, new: &str) -> NamePair {
        NamePair { old_name: old.into(), new_name: new.into() }
    }

    #[test]
    fn first_occurrence_is_not_a_duplicate() {
        let engine = ValidationEngine::new();
        let pairs = vec![pair("a.txt", "same.txt"), pair("b.txt", "same.txt")];
        let result = engine.validate_preview(&pairs);
        assert!(!result.items[0].is_duplicate);
        assert!(result.items[1].is_duplicate);
        assert_eq!(result.duplicates, std::collections::BTreeSet::from(["same.txt".to_string()]));
    }

    #[test]
    fn unchanged_pair_is_flagged() {
        let engine = ValidationEngine::new();
        let result = engine.validate_preview(&[pair("a.txt", "a.txt")]);
        assert!(result.items[0].is_unchanged);
        assert!(!result.has_errors);
    }

    #[test]
    fn unsafe_filename_is_invalid_with_a_message() {
        let engine = ValidationEngine::new();
        let result = engine.validate_preview(&[pair("a.txt", "bad:name.txt")]);
        assert!(!result.items[0].is_valid);
        assert!(result.items[0].error_message.is_some());
        assert!(result.has_errors);
    }
}
