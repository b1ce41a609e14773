//! Metadata field validators (§4.4.5).

/// The rotation values a camera/EXIF reader can actually produce. Anything else is
/// treated as an untrusted or corrupt reading rather than coerced to the nearest value.
const VALID_ROTATIONS: &[i64] = &[0, 90, 180, 270];

/// `validate_rotation`: accepts an EXIF-style rotation in degrees, tolerating the
/// common string encoding (`"90"`) as well as a bare integer.
pub fn validate_rotation(raw: &str) -> Result<i64, String> {
    let trimmed = raw.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| format!("rotation is not an integer: {raw:?}"))?;
    let normalized = ((value % 360) + 360) % 360;
    if VALID_ROTATIONS.contains(&normalized) {
        Ok(normalized)
    } else {
        Err(format!("unsupported rotation value: {value}"))
    }
}
