//! Use-case services over slice persistence.
//!
//! # Invariants
//! - Services never bypass the slice migrator or denylist.
//! - Services remain storage-agnostic.

pub mod persist_service;
