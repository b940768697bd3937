//! Persisted-state data model shared by every slice.
//!
//! # Invariants
//! - A snapshot is an opaque field mapping; only `_version` is interpreted.

pub mod snapshot;
