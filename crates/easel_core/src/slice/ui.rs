//! UI layout slice: active tab, panel visibility, accordion/expander flags.
//!
//! # Invariants
//! - Persisted snapshots carry `_version`; current is [`UI_STATE_VERSION`].
//! - `shouldShowImageDetails` is never persisted.
//! - Accordion and expander maps hold only open ids; a missing id is closed.

use super::Slice;
use crate::migrate::{MigrationStep, MigrationTable, Migrator};
use crate::model::snapshot::Snapshot;
use crate::store::Selector;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub const UI_STATE_VERSION: u32 = 3;

/// Top-level workspace tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabName {
    Generation,
    Canvas,
    Upscaling,
    Workflows,
    Models,
    Queue,
}

impl TabName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Canvas => "canvas",
            Self::Upscaling => "upscaling",
            Self::Workflows => "workflows",
            Self::Models => "models",
            Self::Queue => "queue",
        }
    }
}

impl Display for TabName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    #[serde(rename = "_version")]
    pub version: u32,
    pub active_tab: TabName,
    pub should_show_image_details: bool,
    pub should_show_progress_in_viewer: bool,
    pub should_show_left_panel: bool,
    pub should_show_right_panel: bool,
    pub accordions: BTreeMap<String, bool>,
    pub expanders: BTreeMap<String, bool>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            version: UI_STATE_VERSION,
            active_tab: TabName::Canvas,
            should_show_image_details: false,
            should_show_progress_in_viewer: true,
            should_show_left_panel: true,
            should_show_right_panel: true,
            accordions: BTreeMap::new(),
            expanders: BTreeMap::new(),
        }
    }
}

/// Mutations of [`UiState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum UiCommand {
    SetActiveTab(TabName),
    SetShouldShowImageDetails(bool),
    ToggleImageDetails,
    SetShouldShowProgressInViewer(bool),
    ToggleProgressInViewer,
    SetLeftPanelVisible(bool),
    ToggleLeftPanel,
    SetRightPanelVisible(bool),
    ToggleRightPanel,
    SetAccordionOpen { id: String, open: bool },
    ToggleAccordion(String),
    SetExpanderOpen { id: String, open: bool },
    ToggleExpander(String),
}

fn force_generation_tab(snapshot: &mut Snapshot) {
    snapshot.insert(
        "activeTab".to_string(),
        Value::from(TabName::Generation.as_str()),
    );
}

fn force_canvas_tab(snapshot: &mut Snapshot) {
    snapshot.insert(
        "activeTab".to_string(),
        Value::from(TabName::Canvas.as_str()),
    );
}

const UI_MIGRATION_STEPS: &[MigrationStep] = &[
    MigrationStep {
        from_version: 1,
        apply: force_generation_tab,
    },
    MigrationStep {
        from_version: 2,
        apply: force_canvas_tab,
    },
];

pub const UI_MIGRATIONS: MigrationTable =
    MigrationTable::new(UI_STATE_VERSION, UI_MIGRATION_STEPS);

impl Slice for UiState {
    type Command = UiCommand;

    const NAME: &'static str = "ui";
    const MIGRATOR: Migrator = Migrator::Versioned(UI_MIGRATIONS);
    const PERSIST_DENYLIST: &'static [&'static str] = &["shouldShowImageDetails"];

    fn initial() -> Self {
        Self::default()
    }

    fn reduce(&mut self, command: UiCommand) {
        match command {
            UiCommand::SetActiveTab(tab) => self.active_tab = tab,
            UiCommand::SetShouldShowImageDetails(show) => self.should_show_image_details = show,
            UiCommand::ToggleImageDetails => {
                self.should_show_image_details = !self.should_show_image_details;
            }
            UiCommand::SetShouldShowProgressInViewer(show) => {
                self.should_show_progress_in_viewer = show;
            }
            UiCommand::ToggleProgressInViewer => {
                self.should_show_progress_in_viewer = !self.should_show_progress_in_viewer;
            }
            UiCommand::SetLeftPanelVisible(visible) => self.should_show_left_panel = visible,
            UiCommand::ToggleLeftPanel => self.should_show_left_panel = !self.should_show_left_panel,
            UiCommand::SetRightPanelVisible(visible) => self.should_show_right_panel = visible,
            UiCommand::ToggleRightPanel => {
                self.should_show_right_panel = !self.should_show_right_panel;
            }
            UiCommand::SetAccordionOpen { id, open } => set_flag(&mut self.accordions, id, open),
            UiCommand::ToggleAccordion(id) => toggle_flag(&mut self.accordions, id),
            UiCommand::SetExpanderOpen { id, open } => set_flag(&mut self.expanders, id, open),
            UiCommand::ToggleExpander(id) => toggle_flag(&mut self.expanders, id),
        }
    }
}

fn set_flag(flags: &mut BTreeMap<String, bool>, id: String, open: bool) {
    if open {
        flags.insert(id, true);
    } else {
        flags.remove(&id);
    }
}

fn toggle_flag(flags: &mut BTreeMap<String, bool>, id: String) {
    let open = flags.get(&id).copied().unwrap_or(false);
    set_flag(flags, id, !open);
}

/// Visibility of the side panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelVisibility {
    pub left: bool,
    pub right: bool,
}

pub fn select_active_tab(state: &UiState) -> TabName {
    state.active_tab
}

pub fn select_should_show_image_details(state: &UiState) -> bool {
    state.should_show_image_details
}

pub fn select_should_show_progress_in_viewer(state: &UiState) -> bool {
    state.should_show_progress_in_viewer
}

pub fn select_is_accordion_open(state: &UiState, id: &str) -> bool {
    state.accordions.get(id).copied().unwrap_or(false)
}

pub fn select_is_expander_open(state: &UiState, id: &str) -> bool {
    state.expanders.get(id).copied().unwrap_or(false)
}

/// Ids of open accordions, sorted.
pub fn select_open_accordions(state: &UiState) -> Vec<String> {
    open_ids(&state.accordions)
}

/// Ids of open expanders, sorted.
pub fn select_open_expanders(state: &UiState) -> Vec<String> {
    open_ids(&state.expanders)
}

pub fn select_panel_visibility(state: &UiState) -> PanelVisibility {
    PanelVisibility {
        left: state.should_show_left_panel,
        right: state.should_show_right_panel,
    }
}

pub fn open_accordions_selector() -> Selector<UiState, Vec<String>> {
    Selector::new(select_open_accordions)
}

pub fn open_expanders_selector() -> Selector<UiState, Vec<String>> {
    Selector::new(select_open_expanders)
}

pub fn panel_visibility_selector() -> Selector<UiState, PanelVisibility> {
    Selector::new(select_panel_visibility)
}

fn open_ids(flags: &BTreeMap<String, bool>) -> Vec<String> {
    flags
        .iter()
        .filter(|(_, open)| **open)
        .map(|(id, _)| id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{select_is_accordion_open, select_open_accordions, TabName, UiCommand, UiState};
    use crate::slice::Slice;
    use serde_json::json;

    #[test]
    fn toggle_accordion_opens_missing_id() {
        let mut state = UiState::initial();
        state.reduce(UiCommand::ToggleAccordion("advanced".to_string()));
        assert!(select_is_accordion_open(&state, "advanced"));
        assert!(!select_is_accordion_open(&state, "other"));
    }

    #[test]
    fn closing_an_id_drops_its_entry() {
        let mut state = UiState::initial();
        state.reduce(UiCommand::ToggleExpander("x".to_string()));
        state.reduce(UiCommand::ToggleExpander("x".to_string()));
        state.reduce(UiCommand::SetAccordionOpen {
            id: "y".to_string(),
            open: false,
        });
        assert!(state.expanders.is_empty());
        assert!(state.accordions.is_empty());
    }

    #[test]
    fn open_accordions_are_sorted_and_exclude_closed() {
        let mut state = UiState::initial();
        for (id, open) in [("zeta", true), ("alpha", true), ("mid", false)] {
            state.reduce(UiCommand::SetAccordionOpen {
                id: id.to_string(),
                open,
            });
        }
        assert_eq!(select_open_accordions(&state), vec!["alpha", "zeta"]);
    }

    #[test]
    fn tab_names_serialize_as_lowercase_strings() {
        assert_eq!(serde_json::to_value(TabName::Upscaling).unwrap(), json!("upscaling"));
        let value = serde_json::to_value(UiState::initial()).unwrap();
        assert_eq!(value["_version"], json!(3));
        assert_eq!(value["activeTab"], json!("canvas"));
    }

    #[test]
    fn struct_commands_deserialize_from_json() {
        let command: UiCommand = serde_json::from_value(json!({
            "type": "setExpanderOpen",
            "value": { "id": "seed", "open": true }
        }))
        .unwrap();
        assert_eq!(
            command,
            UiCommand::SetExpanderOpen {
                id: "seed".to_string(),
                open: true
            }
        );
    }
}
