//! Snapshot repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Store one JSON snapshot per slice name, replacing on save.
//! - Mirror the snapshot's `_version` tag into `schema_version`.

use crate::db::DbError;
use crate::migrate::MigrationTableError;
use crate::model::snapshot::{read_version, snapshot_from_value, Snapshot};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidSliceName(String),
    InvalidData(String),
    Serialization(serde_json::Error),
    Migration(MigrationTableError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidSliceName(name) => write!(f, "invalid slice name `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted snapshot: {message}"),
            Self::Serialization(err) => write!(f, "snapshot serialization failed: {err}"),
            Self::Migration(err) => write!(f, "invalid migration table: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Migration(err) => Some(err),
            Self::InvalidSliceName(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<MigrationTableError> for RepoError {
    fn from(value: MigrationTableError) -> Self {
        Self::Migration(value)
    }
}

/// One stored snapshot row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub slice: String,
    pub payload: Snapshot,
    /// `_version` of the payload when it was saved, if it had one.
    pub schema_version: Option<u32>,
    /// Unix epoch milliseconds of the last save.
    pub updated_at: i64,
}

/// Persistence contract for slice snapshots.
pub trait SnapshotRepository {
    fn load_snapshot(&self, slice: &str) -> RepoResult<Option<StoredSnapshot>>;
    /// Inserts or replaces the snapshot stored under `slice`.
    fn save_snapshot(&self, slice: &str, payload: &Snapshot) -> RepoResult<()>;
    /// Returns whether a snapshot existed.
    fn delete_snapshot(&self, slice: &str) -> RepoResult<bool>;
    fn list_slices(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn load_snapshot(&self, slice: &str) -> RepoResult<Option<StoredSnapshot>> {
        let slice = normalize_slice_name(slice)?;
        let row = self
            .conn
            .query_row(
                "SELECT payload, schema_version, updated_at
                 FROM slice_snapshots
                 WHERE slice = ?1;",
                [slice],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<i64>>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((payload_text, schema_version, updated_at)) = row else {
            return Ok(None);
        };

        let value = serde_json::from_str(&payload_text).map_err(|err| {
            RepoError::InvalidData(format!("slice `{slice}` payload is not valid JSON: {err}"))
        })?;
        let payload = snapshot_from_value(value).ok_or_else(|| {
            RepoError::InvalidData(format!("slice `{slice}` payload is not a JSON object"))
        })?;
        // Mirror column only; the payload's own `_version` stays authoritative.
        let schema_version = schema_version.and_then(|raw| match u32::try_from(raw) {
            Ok(version) => Some(version),
            Err(_) => {
                warn!(
                    "event=snapshot_load module=repo status=degraded slice={} schema_version={}",
                    slice, raw
                );
                None
            }
        });

        Ok(Some(StoredSnapshot {
            slice: slice.to_string(),
            payload,
            schema_version,
            updated_at,
        }))
    }

    fn save_snapshot(&self, slice: &str, payload: &Snapshot) -> RepoResult<()> {
        let slice = normalize_slice_name(slice)?;
        let payload_text = serde_json::to_string(payload)?;
        let schema_version = read_version(payload).version();

        self.conn.execute(
            "INSERT INTO slice_snapshots (slice, payload, schema_version, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT(slice) DO UPDATE SET
                payload = excluded.payload,
                schema_version = excluded.schema_version,
                updated_at = excluded.updated_at;",
            params![slice, payload_text, schema_version],
        )?;
        Ok(())
    }

    fn delete_snapshot(&self, slice: &str) -> RepoResult<bool> {
        let slice = normalize_slice_name(slice)?;
        let changed = self
            .conn
            .execute("DELETE FROM slice_snapshots WHERE slice = ?1;", [slice])?;
        Ok(changed > 0)
    }

    fn list_slices(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT slice FROM slice_snapshots ORDER BY slice ASC;")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

fn normalize_slice_name(slice: &str) -> RepoResult<&str> {
    let trimmed = slice.trim();
    if trimmed.is_empty() || trimmed.len() != slice.len() {
        return Err(RepoError::InvalidSliceName(slice.to_string()));
    }
    Ok(trimmed)
}
