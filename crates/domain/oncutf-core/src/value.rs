//! The opaque, dynamically-shaped metadata payload.
//!
//! The original stores metadata as a plain Python dict of arbitrary JSON-ish values.
//! Re-expressed here as a tagged value enum plus a `BTreeMap` (not `HashMap`) so that
//! canonical-JSON-equivalent serialization — used for preview cache keys — is
//! deterministic across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Integer(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Boolean(v)
    }
}

/// Dotted-key metadata, e.g. `"EXIF:Orientation" -> "1"`.
pub type Payload = BTreeMap<String, MetadataValue>;

/// Reserved synthetic keys that never reach storage as real keys (I3); they are
/// reified as struct fields and synthesized into a flat [`Payload`] only at the
/// boundary where a caller expects one (§4.2, §9).
pub const EXTENDED_FLAG_KEY: &str = "__extended__";
pub const MODIFIED_FLAG_KEY: &str = "__modified__";

/// Removes the two synthetic flag keys from a payload, returning their values if present.
/// Used before anything is written to the store (I3).
pub fn strip_flags(payload: &mut Payload) -> (Option<bool>, Option<bool>) {
    let extended = payload.remove(EXTENDED_FLAG_KEY).and_then(as_bool);
    let modified = payload.remove(MODIFIED_FLAG_KEY).and_then(as_bool);
    (extended, modified)
}

fn as_bool(v: MetadataValue) -> Option<bool> {
    match v {
        MetadataValue::Boolean(b) => Some(b),
        _ => None,
    }
}

/// Synthesizes `__extended__`/`__modified__` into a copy of `payload` at the boundary
/// where a flat map is expected (§4.2's `get`, §9's "dunder flag keys" note).
pub fn with_synthesized_flags(payload: &Payload, extended: bool, modified: bool) -> Payload {
    let mut out = payload.clone();
    if extended {
        out.insert(EXTENDED_FLAG_KEY.to_string(), MetadataValue::Boolean(true));
    }
    if modified {
        out.insert(MODIFIED_FLAG_KEY.to_string(), MetadataValue::Boolean(true));
    }
    out
}

/// Canonical-ordered JSON text, used for preview cache keys (`canonical_json` in §4.4.2).
/// `BTreeMap` already serializes keys in sorted order, so this is just `serde_json`.
pub fn canonical_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
