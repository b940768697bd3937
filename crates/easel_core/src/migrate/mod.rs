//! Versioned snapshot migration.
//!
//! # Responsibility
//! - Describe a slice's upgrade path as an ordered table of steps.
//! - Drive a snapshot of any known version up to the current version.
//!
//! # Invariants
//! - Step `from_version` values start at 1 and are contiguous; the last step
//!   ends at `current_version`.
//! - A snapshot without a usable tag is treated as version 1.
//! - Each step runs at most once per call, in order.
//! - Migrating an already-current snapshot leaves it unchanged.
//! - Tags newer than `current_version` pass through untouched.
//! - Fields no step mentions are preserved.

use crate::model::snapshot::{read_version, write_version, Snapshot, VersionTag};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Version assigned to snapshots that carry no usable tag.
pub const BASELINE_VERSION: u32 = 1;

/// Upgrade applied to a snapshot tagged `from_version`.
///
/// The driver bumps the tag afterwards; steps only patch fields.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    pub from_version: u32,
    pub apply: fn(&mut Snapshot),
}

/// Ordered upgrade path ending at `current_version`.
#[derive(Debug, Clone, Copy)]
pub struct MigrationTable {
    current_version: u32,
    steps: &'static [MigrationStep],
}

/// How a slice upgrades persisted snapshots.
#[derive(Debug, Clone, Copy)]
pub enum Migrator {
    /// Un-versioned slice: snapshots are returned as given.
    Identity,
    Versioned(MigrationTable),
}

/// What one migration run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Tag as found before migrating.
    pub found: VersionTag,
    /// `from_version` of every step applied, in order.
    pub applied: Vec<u32>,
    /// Tag after migrating; `None` for identity migrators.
    pub final_version: Option<u32>,
    /// Tag was newer than the current version and left as is.
    pub future_version: bool,
}

impl MigrationReport {
    /// Whether the baseline tag had to be assigned.
    pub fn tag_defaulted(&self) -> bool {
        matches!(self.found, VersionTag::Missing | VersionTag::Malformed)
    }

    /// Whether the snapshot changed at all.
    pub fn changed(&self) -> bool {
        !self.applied.is_empty() || (self.tag_defaulted() && self.final_version.is_some())
    }
}

/// Structural problems in a [`MigrationTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationTableError {
    ZeroCurrentVersion,
    UnexpectedStep { expected: u32, found: u32 },
    Incomplete { reaches: u32, current_version: u32 },
}

impl Display for MigrationTableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroCurrentVersion => write!(f, "current version must be at least 1"),
            Self::UnexpectedStep { expected, found } => write!(
                f,
                "migration step from version {found} found where version {expected} was expected"
            ),
            Self::Incomplete {
                reaches,
                current_version,
            } => write!(
                f,
                "migration steps reach version {reaches} but current version is {current_version}"
            ),
        }
    }
}

impl Error for MigrationTableError {}

impl MigrationTable {
    pub const fn new(current_version: u32, steps: &'static [MigrationStep]) -> Self {
        Self {
            current_version,
            steps,
        }
    }

    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    pub fn steps(&self) -> &'static [MigrationStep] {
        self.steps
    }

    /// Checks that steps form one contiguous path from 1 to current.
    pub fn validate(&self) -> Result<(), MigrationTableError> {
        if self.current_version == 0 {
            return Err(MigrationTableError::ZeroCurrentVersion);
        }

        let mut expected = BASELINE_VERSION;
        for step in self.steps {
            if step.from_version != expected {
                return Err(MigrationTableError::UnexpectedStep {
                    expected,
                    found: step.from_version,
                });
            }
            expected += 1;
        }

        if expected != self.current_version {
            return Err(MigrationTableError::Incomplete {
                reaches: expected,
                current_version: self.current_version,
            });
        }
        Ok(())
    }

    /// Runs the staircase over `snapshot`.
    pub fn migrate(&self, mut snapshot: Snapshot) -> (Snapshot, MigrationReport) {
        let found = read_version(&snapshot);
        let mut version = found.version().unwrap_or(BASELINE_VERSION);

        if version > self.current_version {
            let report = MigrationReport {
                found,
                applied: Vec::new(),
                final_version: Some(version),
                future_version: true,
            };
            return (snapshot, report);
        }

        if found.version().is_none() {
            write_version(&mut snapshot, version);
        }

        let mut applied = Vec::new();
        for step in self.steps {
            if step.from_version != version {
                continue;
            }
            (step.apply)(&mut snapshot);
            version = step.from_version + 1;
            write_version(&mut snapshot, version);
            applied.push(step.from_version);
        }

        let report = MigrationReport {
            found,
            applied,
            final_version: Some(version),
            future_version: false,
        };
        (snapshot, report)
    }
}

impl Migrator {
    /// Current version tag, or `None` for un-versioned slices.
    pub fn current_version(&self) -> Option<u32> {
        match self {
            Self::Identity => None,
            Self::Versioned(table) => Some(table.current_version()),
        }
    }

    pub fn validate(&self) -> Result<(), MigrationTableError> {
        match self {
            Self::Identity => Ok(()),
            Self::Versioned(table) => table.validate(),
        }
    }

    /// Migrates `snapshot` and reports what changed.
    pub fn run(&self, snapshot: Snapshot) -> (Snapshot, MigrationReport) {
        match self {
            Self::Identity => {
                let report = MigrationReport {
                    found: read_version(&snapshot),
                    applied: Vec::new(),
                    final_version: None,
                    future_version: false,
                };
                (snapshot, report)
            }
            Self::Versioned(table) => table.migrate(snapshot),
        }
    }

    /// Migrates `snapshot`, discarding the report.
    pub fn migrate(&self, snapshot: Snapshot) -> Snapshot {
        self.run(snapshot).0
    }
}

#[cfg(test)]
mod tests {
    use super::{MigrationStep, MigrationTable, MigrationTableError, Migrator};
    use crate::model::snapshot::{snapshot_from_value, Snapshot, VersionTag};
    use serde_json::{json, Value};

    fn push_trail(snapshot: &mut Snapshot, marker: &str) {
        let trail = snapshot
            .entry("trail")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = trail {
            items.push(Value::from(marker));
        }
    }

    fn step_one(snapshot: &mut Snapshot) {
        push_trail(snapshot, "1->2");
    }

    fn step_two(snapshot: &mut Snapshot) {
        push_trail(snapshot, "2->3");
    }

    fn step_three(snapshot: &mut Snapshot) {
        push_trail(snapshot, "3->4");
    }

    const STEPS: &[MigrationStep] = &[
        MigrationStep {
            from_version: 1,
            apply: step_one,
        },
        MigrationStep {
            from_version: 2,
            apply: step_two,
        },
        MigrationStep {
            from_version: 3,
            apply: step_three,
        },
    ];
    const TABLE: MigrationTable = MigrationTable::new(4, STEPS);

    fn snapshot(value: Value) -> Snapshot {
        snapshot_from_value(value).unwrap()
    }

    #[test]
    fn steps_cascade_in_order_from_baseline() {
        let (migrated, report) = TABLE.migrate(snapshot(json!({})));
        assert_eq!(migrated["_version"], json!(4));
        assert_eq!(migrated["trail"], json!(["1->2", "2->3", "3->4"]));
        assert_eq!(report.found, VersionTag::Missing);
        assert_eq!(report.applied, vec![1, 2, 3]);
        assert!(report.tag_defaulted());
    }

    #[test]
    fn intermediate_version_only_runs_remaining_steps() {
        let (migrated, report) = TABLE.migrate(snapshot(json!({ "_version": 3 })));
        assert_eq!(migrated["trail"], json!(["3->4"]));
        assert_eq!(report.applied, vec![3]);
        assert_eq!(report.final_version, Some(4));
    }

    #[test]
    fn current_version_is_untouched() {
        let input = snapshot(json!({ "_version": 4, "kept": "yes" }));
        let (migrated, report) = TABLE.migrate(input.clone());
        assert_eq!(migrated, input);
        assert!(!report.changed());
    }

    #[test]
    fn future_version_passes_through() {
        let input = snapshot(json!({ "_version": 9, "field": 1 }));
        let (migrated, report) = TABLE.migrate(input.clone());
        assert_eq!(migrated, input);
        assert!(report.future_version);
        assert_eq!(report.final_version, Some(9));
    }

    #[test]
    fn malformed_tag_is_replaced_by_baseline_then_migrated() {
        let (migrated, report) = TABLE.migrate(snapshot(json!({ "_version": "two" })));
        assert_eq!(migrated["_version"], json!(4));
        assert_eq!(report.found, VersionTag::Malformed);
        assert_eq!(report.applied.len(), 3);
    }

    #[test]
    fn identity_migrator_returns_input() {
        let input = snapshot(json!({ "a": 1, "_version": 7 }));
        let (migrated, report) = Migrator::Identity.run(input.clone());
        assert_eq!(migrated, input);
        assert_eq!(report.final_version, None);
        assert!(!report.changed());
    }

    #[test]
    fn validate_accepts_contiguous_table() {
        assert_eq!(TABLE.validate(), Ok(()));
        assert_eq!(MigrationTable::new(1, &[]).validate(), Ok(()));
    }

    #[test]
    fn validate_reports_gaps_and_short_tables() {
        const GAPPED: &[MigrationStep] = &[
            MigrationStep {
                from_version: 1,
                apply: step_one,
            },
            MigrationStep {
                from_version: 3,
                apply: step_three,
            },
        ];
        assert_eq!(
            MigrationTable::new(4, GAPPED).validate(),
            Err(MigrationTableError::UnexpectedStep {
                expected: 2,
                found: 3
            })
        );
        assert_eq!(
            MigrationTable::new(5, STEPS).validate(),
            Err(MigrationTableError::Incomplete {
                reaches: 4,
                current_version: 5
            })
        );
        assert_eq!(
            MigrationTable::new(0, &[]).validate(),
            Err(MigrationTableError::ZeroCurrentVersion)
        );
    }
}
