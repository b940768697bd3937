//! Owned state containers updated through typed commands.
//!
//! # Responsibility
//! - Hold each slice behind an `Arc` and replace it on every update.
//! - Route application-level commands to the owning slice.
//!
//! # Invariants
//! - Every dispatched command installs a new `Arc`; earlier references keep
//!   observing the old state.
//! - Commands are applied one at a time, in call order.

use crate::slice::canvas_settings::{CanvasSettingsCommand, CanvasSettingsState};
use crate::slice::ui::{UiCommand, UiState};
use crate::slice::Slice;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod selector;

pub use selector::{Selector, SelectorStats};

/// Container for one slice.
#[derive(Debug, Clone)]
pub struct SliceStore<S: Slice> {
    state: Arc<S>,
    revision: u64,
}

impl<S: Slice> SliceStore<S> {
    /// Creates a store holding the slice's initial state.
    pub fn new() -> Self {
        Self::with_state(S::initial())
    }

    pub fn with_state(state: S) -> Self {
        Self {
            state: Arc::new(state),
            revision: 0,
        }
    }

    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    /// Number of updates applied since creation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Applies `command` to a copy of the state and installs the result.
    pub fn dispatch(&mut self, command: S::Command) {
        debug!(
            "event=store_dispatch module=store slice={} revision={} command={:?}",
            S::NAME,
            self.revision + 1,
            command
        );
        let mut next = S::clone(&self.state);
        next.reduce(command);
        self.install(next);
    }

    /// Replaces the whole state, e.g. after hydration.
    pub fn replace(&mut self, state: S) {
        debug!(
            "event=store_replace module=store slice={} revision={}",
            S::NAME,
            self.revision + 1
        );
        self.install(state);
    }

    fn install(&mut self, state: S) {
        self.state = Arc::new(state);
        self.revision += 1;
    }
}

impl<S: Slice> Default for SliceStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Command addressed to one slice of the application store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "slice", content = "command", rename_all = "camelCase")]
pub enum AppCommand {
    CanvasSettings(CanvasSettingsCommand),
    Ui(UiCommand),
}

impl From<CanvasSettingsCommand> for AppCommand {
    fn from(value: CanvasSettingsCommand) -> Self {
        Self::CanvasSettings(value)
    }
}

impl From<UiCommand> for AppCommand {
    fn from(value: UiCommand) -> Self {
        Self::Ui(value)
    }
}

/// Both slices of the editor state.
#[derive(Debug, Clone, Default)]
pub struct AppStore {
    canvas_settings: SliceStore<CanvasSettingsState>,
    ui: SliceStore<UiState>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_states(canvas_settings: CanvasSettingsState, ui: UiState) -> Self {
        Self {
            canvas_settings: SliceStore::with_state(canvas_settings),
            ui: SliceStore::with_state(ui),
        }
    }

    pub fn canvas_settings(&self) -> &Arc<CanvasSettingsState> {
        self.canvas_settings.state()
    }

    pub fn ui(&self) -> &Arc<UiState> {
        self.ui.state()
    }

    pub fn dispatch(&mut self, command: impl Into<AppCommand>) {
        match command.into() {
            AppCommand::CanvasSettings(command) => self.canvas_settings.dispatch(command),
            AppCommand::Ui(command) => self.ui.dispatch(command),
        }
    }
}
