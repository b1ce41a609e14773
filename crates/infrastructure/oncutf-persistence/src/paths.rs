//! Store-identity canonicalization glue (I1): every lookup key used by the redb
//! tables goes through `oncutf_core::path::canonicalize` so two different spellings of
//! the same file never produce two rows.

use oncutf_core::path::canonicalize;

pub fn canonical_key(file_path: &str) -> String {
    canonicalize(file_path).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_file_different_spelling_same_key() {
        assert_eq!(canonical_key("/tmp/a/../a/file.txt"), canonical_key("/tmp/a/file.txt"));
    }
}
