//! State slices and their persisted form.
//!
//! # Responsibility
//! - Define what every slice provides: initial state, reducer, migrator,
//!   persistence denylist.
//! - Convert between typed slice state and persisted snapshots.
//!
//! # Invariants
//! - Denylisted fields are never written to a snapshot and never read back.
//! - Hydration always yields a valid state; persisted values that do not fit
//!   the current schema fall back to initial values.
//! - Unknown snapshot fields are ignored by hydration.

use crate::migrate::{MigrationReport, Migrator};
use crate::model::snapshot::{Snapshot, VERSION_KEY};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

pub mod canvas_settings;
pub mod ui;

/// One independently persisted region of application state.
pub trait Slice: Clone + Debug + PartialEq + Serialize + DeserializeOwned {
    /// Typed mutation accepted by [`Slice::reduce`].
    type Command: Clone + Debug + Serialize + DeserializeOwned;

    /// Stable storage key of the slice.
    const NAME: &'static str;
    const MIGRATOR: Migrator;
    /// Fields excluded from persistence.
    const PERSIST_DENYLIST: &'static [&'static str];

    fn initial() -> Self;

    /// Applies `command` in place. Last write wins.
    fn reduce(&mut self, command: Self::Command);
}

/// Runs the slice migrator over `snapshot` and logs the outcome.
pub fn migrate_snapshot<S: Slice>(snapshot: Snapshot) -> (Snapshot, MigrationReport) {
    let (migrated, report) = S::MIGRATOR.run(snapshot);

    if report.future_version {
        warn!(
            "event=slice_migrate module=slice status=passthrough slice={} found_version={:?} current_version={:?}",
            S::NAME,
            report.final_version,
            S::MIGRATOR.current_version()
        );
    } else if report.changed() {
        info!(
            "event=slice_migrate module=slice status=ok slice={} found={:?} steps={:?} to_version={:?}",
            S::NAME,
            report.found,
            report.applied,
            report.final_version
        );
    } else {
        debug!(
            "event=slice_migrate module=slice status=noop slice={}",
            S::NAME
        );
    }

    (migrated, report)
}

/// Serializes `state` into its persisted snapshot, minus denylisted fields.
pub fn dehydrate<S: Slice>(state: &S) -> serde_json::Result<Snapshot> {
    match serde_json::to_value(state)? {
        Value::Object(mut snapshot) => {
            for field in S::PERSIST_DENYLIST {
                snapshot.remove(*field);
            }
            Ok(snapshot)
        }
        other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
            "slice `{}` serialized to a non-object value: {other}",
            S::NAME
        ))),
    }
}

/// Migrates `snapshot` and merges it over the initial state.
pub fn hydrate<S: Slice>(snapshot: Snapshot) -> S {
    let (migrated, _) = migrate_snapshot::<S>(snapshot);
    merge_over_initial(&migrated)
}

/// Overlays snapshot fields onto the initial state one by one.
///
/// A field is kept only if the state still deserializes with it, so one bad
/// value never discards its valid siblings.
pub fn merge_over_initial<S: Slice>(snapshot: &Snapshot) -> S {
    let initial = S::initial();
    let mut accepted = match serde_json::to_value(&initial) {
        Ok(Value::Object(map)) => map,
        _ => return initial,
    };
    let mut state = initial;

    for (field, value) in snapshot {
        if S::PERSIST_DENYLIST.contains(&field.as_str()) {
            continue;
        }
        if !accepted.contains_key(field) {
            if field != VERSION_KEY {
                debug!(
                    "event=slice_hydrate module=slice status=skip slice={} field={} reason=unknown_field",
                    S::NAME,
                    field
                );
            }
            continue;
        }

        let previous = accepted.insert(field.clone(), value.clone());
        match serde_json::from_value::<S>(Value::Object(accepted.clone())) {
            Ok(next) => state = next,
            Err(err) => {
                warn!(
                    "event=slice_hydrate module=slice status=fallback slice={} field={} error={}",
                    S::NAME,
                    field,
                    err
                );
                if let Some(previous) = previous {
                    accepted.insert(field.clone(), previous);
                }
            }
        }
    }

    state
}
