pub mod crc32;
pub mod rename_fs;

// Re-exports for convenience
pub use crc32::{hash_file_crc32, HashError, CRC32_ALGORITHM};
pub use rename_fs::{case_only_safe_rename, rename_with_case_guard, robust_rename};
