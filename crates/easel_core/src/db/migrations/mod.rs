//! Storage schema migration registry.
//!
//! # Invariants
//! - `version` values start at 1 and increase by one.
//! - All pending migrations run inside one transaction.
//! - A database newer than [`latest_version`] is never touched.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_slice_snapshots.sql"),
}];

/// Returns the latest storage schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is newer than this build.
/// - `Migration` naming the first step that failed; nothing is committed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let latest = latest_version();

    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            found,
            supported: latest,
        });
    }
    if found == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().skip_while(|m| m.version <= found) {
        if let Err(source) = run_step(&tx, migration) {
            error!(
                "event=db_migrate module=db status=error from_version={} failed_version={} error={}",
                found, migration.version, source
            );
            return Err(DbError::Migration {
                version: migration.version,
                source,
            });
        }
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        found, latest
    );
    Ok(())
}

fn run_step(tx: &Transaction<'_>, migration: &Migration) -> rusqlite::Result<()> {
    tx.execute_batch(migration.sql)?;
    tx.pragma_update(None, "user_version", migration.version)
}
