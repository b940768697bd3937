//! Repository layer for persisted slice snapshots.
//!
//! # Invariants
//! - SQL stays behind [`snapshot_repo::SnapshotRepository`].
//! - Payloads that are not JSON objects surface as `InvalidData`, never as
//!   partially parsed snapshots.

pub mod snapshot_repo;
