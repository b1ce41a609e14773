//! Filesystem rename primitives for the execution sub-engine (§4.4.4).
//!
//! `robust_rename` is the synchronous counterpart of this codebase's async
//! `io_utils::robust_rename`: same bounded exponential backoff, blocking instead of
//! awaiting because the rename engine's execution stage runs on a plain worker thread,
//! not inside a tokio runtime.

use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 8;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const MAX_BACKOFF: Duration = Duration::from_millis(2000);

/// Renames `from` to `to`, retrying transient I/O errors with capped exponential
/// backoff so a single transient failure is not mistaken for a permanent one.
pub fn robust_rename(from: &Path, to: &Path) -> std::io::Result<()> {
    let mut attempt = 0u32;
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match std::fs::rename(from, to) {
            Ok(()) => return Ok(()),
            Err(e) => {
                attempt += 1;
                if attempt >= MAX_ATTEMPTS {
                    return Err(e);
                }
                sleep(backoff);
                backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
            }
        }
    }
}

/// Renames `from` to `to` when the two basenames differ only by letter case, working
/// around case-insensitive-but-case-preserving filesystems (Windows, default macOS)
/// where `rename("Foo.txt", "foo.txt")` would otherwise be a no-op: goes through a
/// unique temporary sibling first.
pub fn case_only_safe_rename(from: &Path, to: &Path) -> std::io::Result<()> {
    let parent = to.parent().unwrap_or_else(|| Path::new("."));
    let temp_name = format!(
        ".{}.oncutf-tmp-{}",
        to.file_name().and_then(|n| n.to_str()).unwrap_or("rename"),
        std::process::id()
    );
    let temp_path = parent.join(temp_name);

    robust_rename(from, &temp_path)?;
    match robust_rename(&temp_path, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            // best-effort: restore the original name so the file isn't left under the temp name
            let _ = std::fs::rename(&temp_path, from);
            Err(e)
        }
    }
}

/// Renames `from` to `to`, automatically taking the case-only-safe two-step path when
/// the basenames are case-insensitively equal but case-sensitively different.
pub fn rename_with_case_guard(from: &Path, to: &Path) -> std::io::Result<()> {
    let old_name = from.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let new_name = to.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if oncutf_core::filename::is_case_only_change(old_name, new_name) {
        case_only_safe_rename(from, to)
    } else {
        robust_rename(from, to)
    }
}
