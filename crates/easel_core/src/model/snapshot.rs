//! Persisted snapshot mapping and its version tag.
//!
//! # Responsibility
//! - Name the opaque mapping a slice is persisted as.
//! - Read and write the `_version` tag without touching other fields.

use serde_json::{Map, Value};

/// Key of the schema version tag inside a persisted snapshot.
pub const VERSION_KEY: &str = "_version";

/// Persisted copy of one slice: field name to JSON value.
pub type Snapshot = Map<String, Value>;

/// Version tag as found in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionTag {
    /// No `_version` key, or an explicit `null`.
    Missing,
    /// `_version` present but not a positive integer that fits `u32`.
    Malformed,
    Version(u32),
}

impl VersionTag {
    /// Returns the numeric version when the tag is well formed.
    pub fn version(self) -> Option<u32> {
        match self {
            Self::Version(version) => Some(version),
            Self::Missing | Self::Malformed => None,
        }
    }
}

/// Reads the `_version` tag of `snapshot`.
pub fn read_version(snapshot: &Snapshot) -> VersionTag {
    match snapshot.get(VERSION_KEY) {
        None | Some(Value::Null) => VersionTag::Missing,
        Some(Value::Number(number)) => number
            .as_u64()
            .filter(|version| *version >= 1)
            .and_then(|version| u32::try_from(version).ok())
            .map_or(VersionTag::Malformed, VersionTag::Version),
        Some(_) => VersionTag::Malformed,
    }
}

/// Sets the `_version` tag of `snapshot`, replacing any previous value.
pub fn write_version(snapshot: &mut Snapshot, version: u32) {
    snapshot.insert(VERSION_KEY.to_string(), Value::from(version));
}

/// Unwraps a JSON value into a snapshot; `None` when it is not an object.
pub fn snapshot_from_value(value: Value) -> Option<Snapshot> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
