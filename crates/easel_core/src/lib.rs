//! Core state logic for the easel canvas editor.
//! Owns slice state, persisted-snapshot migration and snapshot storage.

pub mod config;
pub mod db;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod repo;
pub mod service;
pub mod slice;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, flush_logging, init_logging, logging_status, LoggingError};
pub use migrate::{MigrationReport, MigrationStep, MigrationTable, MigrationTableError, Migrator};
pub use model::snapshot::{Snapshot, VersionTag, VERSION_KEY};
pub use repo::snapshot_repo::{
    RepoError, RepoResult, SnapshotRepository, SqliteSnapshotRepository, StoredSnapshot,
};
pub use service::persist_service::PersistenceService;
pub use slice::canvas_settings::{CanvasSettingsCommand, CanvasSettingsState, RgbaColor};
pub use slice::ui::{TabName, UiCommand, UiState, UI_STATE_VERSION};
pub use slice::{dehydrate, hydrate, migrate_snapshot, Slice};
pub use store::{AppCommand, AppStore, Selector, SelectorStats, SliceStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
