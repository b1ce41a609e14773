//! Filename-level safety checks and the case-only-rename helper (§4.4.3, §4.4.4, Glossary).

/// Characters illegal (or awkward) across the common target filesystems: NTFS's
/// reserved set plus the ASCII control range. POSIX filesystems are more permissive,
/// but the preview engine is meant to produce one name that is safe everywhere the
/// renamed file might travel.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_WINDOWS_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// `is_valid := filename_safety_check(basename(new))` (§4.4.3).
pub fn is_valid_filename_text(basename: &str) -> bool {
    if basename.is_empty() {
        return false;
    }
    if basename.chars().any(|c| ILLEGAL_CHARS.contains(&c) || c.is_control()) {
        return false;
    }
    if basename.ends_with('.') || basename.ends_with(' ') {
        return false;
    }
    let upper = basename.to_ascii_uppercase();
    if RESERVED_WINDOWS_NAMES.contains(&upper.as_str()) {
        return false;
    }
    true
}

/// Glossary: "Case-only-safe rename" — old and new basenames differ only in letter case.
pub fn is_case_only_change(old: &str, new: &str) -> bool {
    old != new && old.eq_ignore_ascii_case(new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(is_valid_filename_text("vacation_photo.jpg"));
    }

    #[test]
    fn rejects_illegal_characters() {
        assert!(!is_valid_filename_text("bad:name.txt"));
        assert!(!is_valid_filename_text("bad/name.txt"));
    }

    #[test]
    fn rejects_trailing_dot_or_space() {
        assert!(!is_valid_filename_text("trailing."));
        assert!(!is_valid_filename_text("trailing "));
    }

    #[test]
    fn rejects_reserved_windows_device_names() {
        assert!(!is_valid_filename_text("CON"));
        assert!(!is_valid_filename_text("com1"));
    }

    #[test]
    fn rejects_empty() {
        assert!(!is_valid_filename_text(""));
    }

    #[test]
    fn case_only_change_detection() {
        assert!(is_case_only_change("Report.txt", "report.txt"));
        assert!(!is_case_only_change("report.txt", "report.txt"));
        assert!(!is_case_only_change("report.txt", "summary.txt"));
    }
}
