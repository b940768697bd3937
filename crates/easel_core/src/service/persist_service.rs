//! Load/save orchestration for slice state.
//!
//! # Responsibility
//! - Turn stored snapshots into live state: migrate, then hydrate.
//! - Turn live state into stored snapshots: dehydrate, then save.
//!
//! # Invariants
//! - Loading never fails because of bad persisted content; it falls back to
//!   initial state and logs. Storage errors still propagate.
//! - A slice with an invalid migration table is never loaded.

use crate::repo::snapshot_repo::{RepoError, RepoResult, SnapshotRepository};
use crate::slice::canvas_settings::CanvasSettingsState;
use crate::slice::ui::UiState;
use crate::slice::{dehydrate, hydrate, Slice};
use crate::store::AppStore;
use log::{info, warn};

/// Persistence use-cases backed by any [`SnapshotRepository`].
pub struct PersistenceService<R: SnapshotRepository> {
    repo: R,
}

impl<R: SnapshotRepository> PersistenceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Loads slice `S`, migrating and hydrating any stored snapshot.
    ///
    /// Returns the initial state when nothing usable is stored.
    pub fn load_slice<S: Slice>(&self) -> RepoResult<S> {
        S::MIGRATOR.validate()?;

        let stored = match self.repo.load_snapshot(S::NAME) {
            Ok(stored) => stored,
            Err(RepoError::InvalidData(message)) => {
                warn!(
                    "event=slice_load module=service status=fallback slice={} reason=invalid_payload error={}",
                    S::NAME,
                    message
                );
                None
            }
            Err(err) => return Err(err),
        };

        let Some(stored) = stored else {
            info!(
                "event=slice_load module=service status=ok slice={} source=initial",
                S::NAME
            );
            return Ok(S::initial());
        };

        let state = hydrate::<S>(stored.payload);
        info!(
            "event=slice_load module=service status=ok slice={} source=snapshot stored_version={:?}",
            S::NAME,
            stored.schema_version
        );
        Ok(state)
    }

    /// Persists `state`, replacing any previous snapshot of the slice.
    pub fn save_slice<S: Slice>(&self, state: &S) -> RepoResult<()> {
        let snapshot = dehydrate(state)?;
        self.repo.save_snapshot(S::NAME, &snapshot)?;
        info!(
            "event=slice_save module=service status=ok slice={} fields={}",
            S::NAME,
            snapshot.len()
        );
        Ok(())
    }

    /// Drops the stored snapshot of slice `S`; returns whether one existed.
    pub fn reset_slice<S: Slice>(&self) -> RepoResult<bool> {
        let existed = self.repo.delete_snapshot(S::NAME)?;
        info!(
            "event=slice_reset module=service status=ok slice={} existed={}",
            S::NAME,
            existed
        );
        Ok(existed)
    }

    /// Loads every slice into a fresh [`AppStore`].
    pub fn load_app_store(&self) -> RepoResult<AppStore> {
        let canvas_settings = self.load_slice::<CanvasSettingsState>()?;
        let ui = self.load_slice::<UiState>()?;
        Ok(AppStore::from_states(canvas_settings, ui))
    }

    pub fn save_app_store(&self, store: &AppStore) -> RepoResult<()> {
        self.save_slice::<CanvasSettingsState>(store.canvas_settings())?;
        self.save_slice::<UiState>(store.ui())?;
        Ok(())
    }
}
