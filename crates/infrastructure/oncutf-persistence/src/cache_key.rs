//! Composite key encodings for the tables that need more than a scalar key.
//!
//! redb tables take a single typed key, so a (path_id, algorithm) or (operation_id,
//! path_id) pair is flattened into bytes with a separator that can't appear inside the
//! first component, the same trick the scan cache used for `(mod_name, rel_path)`.

pub const KEY_SEPARATOR: u8 = 0;

/// `hashes` table key: `path_id` big-endian bytes + separator + `algorithm`. Fixing the
/// path_id to 8 bytes up front means `prefix_for_path` is a valid byte-prefix regardless
/// of what the algorithm name sorts as.
#[derive(Debug, Clone, Copy)]
pub struct HashKey<'a> {
    pub path_id: i64,
    pub algorithm: &'a str,
}

impl<'a> HashKey<'a> {
    pub fn new(path_id: i64, algorithm: &'a str) -> Self {
        Self { path_id, algorithm }
    }

    pub fn prefix_for_path(path_id: i64) -> Vec<u8> {
        let mut prefix = path_id.to_be_bytes().to_vec();
        prefix.push(KEY_SEPARATOR);
        prefix
    }

    pub fn to_bytes(self) -> Vec<u8> {
        let mut key = Self::prefix_for_path(self.path_id);
        key.extend_from_slice(self.algorithm.as_bytes());
        key
    }

    pub fn algorithm_from_prefixed_key<'k>(prefix: &[u8], full_key: &'k [u8]) -> Option<&'k str> {
        let rest = full_key.strip_prefix(prefix)?;
        std::str::from_utf8(rest).ok()
    }
}

/// `rename_history` table key: `operation_id` bytes + separator + `path_id` big-endian
/// bytes. Entries sharing an operation form a contiguous byte-prefix range (I5).
#[derive(Debug, Clone, Copy)]
pub struct RenameKey<'a> {
    pub operation_id: &'a str,
    pub path_id: i64,
}

impl<'a> RenameKey<'a> {
    pub fn new(operation_id: &'a str, path_id: i64) -> Self {
        Self { operation_id, path_id }
    }

    pub fn prefix_for_operation(operation_id: &str) -> Vec<u8> {
        let mut prefix = operation_id.as_bytes().to_vec();
        prefix.push(KEY_SEPARATOR);
        prefix
    }

    pub fn to_bytes(self) -> Vec<u8> {
        let mut key = Self::prefix_for_operation(self.operation_id);
        key.extend_from_slice(&self.path_id.to_be_bytes());
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_key_prefix_matches_only_same_path() {
        let a = HashKey::new(7, "CRC32").to_bytes();
        let b = HashKey::new(8, "CRC32").to_bytes();
        let prefix = HashKey::prefix_for_path(7);
        assert!(a.starts_with(&prefix));
        assert!(!b.starts_with(&prefix));
    }

    #[test]
    fn rename_key_groups_by_operation() {
        let prefix = RenameKey::prefix_for_operation("op-1");
        assert!(RenameKey::new("op-1", 1).to_bytes().starts_with(&prefix));
        assert!(!RenameKey::new("op-10", 1).to_bytes().starts_with(&prefix));
    }
}
