//! Canvas editing settings slice.
//!
//! # Invariants
//! - Tool widths are at least 1.
//! - Color channels are 0-255; alpha is within `0.0..=1.0`.
//! - The slice is un-versioned: migration is the identity.

use super::Slice;
use crate::migrate::Migrator;
use crate::store::Selector;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub const MIN_TOOL_WIDTH: u32 = 1;

/// Four-channel draw color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(deserialize_with = "deserialize_alpha")]
    pub a: f32,
}

impl RgbaColor {
    /// Builds a color, clamping alpha into `0.0..=1.0` (NaN becomes opaque).
    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        let a = if a.is_nan() { 1.0 } else { a.clamp(0.0, 1.0) };
        Self { r, g, b, a }
    }

    /// CSS `rgba()` notation.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Default for RgbaColor {
    fn default() -> Self {
        Self::new(31, 160, 224, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSettingsState {
    pub show_hud: bool,
    pub clip_to_bbox: bool,
    pub dynamic_grid: bool,
    pub snap_to_grid: bool,
    pub rule_of_thirds: bool,
    #[serde(deserialize_with = "deserialize_tool_width")]
    pub brush_width: u32,
    #[serde(deserialize_with = "deserialize_tool_width")]
    pub eraser_width: u32,
    pub color: RgbaColor,
    pub invert_scroll_for_tool_width: bool,
    pub auto_save: bool,
    pub send_to_canvas: bool,
    pub pressure_sensitivity: bool,
    pub preserve_mask: bool,
    pub isolated_staging_preview: bool,
    pub isolated_filtering_preview: bool,
    pub show_progress_on_canvas: bool,
    pub bbox_overlay: bool,
    pub auto_process: bool,
    pub output_only_masked_regions: bool,
}

impl Default for CanvasSettingsState {
    fn default() -> Self {
        Self {
            show_hud: true,
            clip_to_bbox: false,
            dynamic_grid: false,
            snap_to_grid: true,
            rule_of_thirds: false,
            brush_width: 50,
            eraser_width: 50,
            color: RgbaColor::default(),
            invert_scroll_for_tool_width: false,
            auto_save: false,
            send_to_canvas: false,
            pressure_sensitivity: true,
            preserve_mask: false,
            isolated_staging_preview: true,
            isolated_filtering_preview: true,
            show_progress_on_canvas: true,
            bbox_overlay: false,
            auto_process: true,
            output_only_masked_regions: true,
        }
    }
}

/// Mutations of [`CanvasSettingsState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CanvasSettingsCommand {
    /// Widths below [`MIN_TOOL_WIDTH`] are raised to it.
    SetBrushWidth(u32),
    SetEraserWidth(u32),
    SetColor(RgbaColor),
    SetAutoSave(bool),
    ToggleHud,
    ToggleClipToBbox,
    ToggleDynamicGrid,
    ToggleSnapToGrid,
    ToggleRuleOfThirds,
    ToggleInvertScrollForToolWidth,
    ToggleAutoSave,
    ToggleSendToCanvas,
    TogglePressureSensitivity,
    TogglePreserveMask,
    ToggleIsolatedStagingPreview,
    ToggleIsolatedFilteringPreview,
    ToggleShowProgressOnCanvas,
    ToggleBboxOverlay,
    ToggleAutoProcess,
    ToggleOutputOnlyMaskedRegions,
}

impl CanvasSettingsCommand {
    /// Every boolean toggle command.
    pub const TOGGLES: &'static [CanvasSettingsCommand] = &[
        Self::ToggleHud,
        Self::ToggleClipToBbox,
        Self::ToggleDynamicGrid,
        Self::ToggleSnapToGrid,
        Self::ToggleRuleOfThirds,
        Self::ToggleInvertScrollForToolWidth,
        Self::ToggleAutoSave,
        Self::ToggleSendToCanvas,
        Self::TogglePressureSensitivity,
        Self::TogglePreserveMask,
        Self::ToggleIsolatedStagingPreview,
        Self::ToggleIsolatedFilteringPreview,
        Self::ToggleShowProgressOnCanvas,
        Self::ToggleBboxOverlay,
        Self::ToggleAutoProcess,
        Self::ToggleOutputOnlyMaskedRegions,
    ];
}

impl Slice for CanvasSettingsState {
    type Command = CanvasSettingsCommand;

    const NAME: &'static str = "canvasSettings";
    const MIGRATOR: Migrator = Migrator::Identity;
    const PERSIST_DENYLIST: &'static [&'static str] = &[];

    fn initial() -> Self {
        Self::default()
    }

    fn reduce(&mut self, command: CanvasSettingsCommand) {
        match command {
            CanvasSettingsCommand::SetBrushWidth(width) => {
                self.brush_width = width.max(MIN_TOOL_WIDTH);
            }
            CanvasSettingsCommand::SetEraserWidth(width) => {
                self.eraser_width = width.max(MIN_TOOL_WIDTH);
            }
            CanvasSettingsCommand::SetColor(color) => {
                self.color = RgbaColor::new(color.r, color.g, color.b, color.a);
            }
            CanvasSettingsCommand::SetAutoSave(enabled) => self.auto_save = enabled,
            CanvasSettingsCommand::ToggleHud => self.show_hud = !self.show_hud,
            CanvasSettingsCommand::ToggleClipToBbox => self.clip_to_bbox = !self.clip_to_bbox,
            CanvasSettingsCommand::ToggleDynamicGrid => self.dynamic_grid = !self.dynamic_grid,
            CanvasSettingsCommand::ToggleSnapToGrid => self.snap_to_grid = !self.snap_to_grid,
            CanvasSettingsCommand::ToggleRuleOfThirds => {
                self.rule_of_thirds = !self.rule_of_thirds;
            }
            CanvasSettingsCommand::ToggleInvertScrollForToolWidth => {
                self.invert_scroll_for_tool_width = !self.invert_scroll_for_tool_width;
            }
            CanvasSettingsCommand::ToggleAutoSave => self.auto_save = !self.auto_save,
            CanvasSettingsCommand::ToggleSendToCanvas => {
                self.send_to_canvas = !self.send_to_canvas;
            }
            CanvasSettingsCommand::TogglePressureSensitivity => {
                self.pressure_sensitivity = !self.pressure_sensitivity;
            }
            CanvasSettingsCommand::TogglePreserveMask => self.preserve_mask = !self.preserve_mask,
            CanvasSettingsCommand::ToggleIsolatedStagingPreview => {
                self.isolated_staging_preview = !self.isolated_staging_preview;
            }
            CanvasSettingsCommand::ToggleIsolatedFilteringPreview => {
                self.isolated_filtering_preview = !self.isolated_filtering_preview;
            }
            CanvasSettingsCommand::ToggleShowProgressOnCanvas => {
                self.show_progress_on_canvas = !self.show_progress_on_canvas;
            }
            CanvasSettingsCommand::ToggleBboxOverlay => self.bbox_overlay = !self.bbox_overlay,
            CanvasSettingsCommand::ToggleAutoProcess => self.auto_process = !self.auto_process,
            CanvasSettingsCommand::ToggleOutputOnlyMaskedRegions => {
                self.output_only_masked_regions = !self.output_only_masked_regions;
            }
        }
    }
}

/// Brush and eraser widths, read together by tool cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolWidths {
    pub brush: u32,
    pub eraser: u32,
}

pub fn select_brush_width(state: &CanvasSettingsState) -> u32 {
    state.brush_width
}

pub fn select_eraser_width(state: &CanvasSettingsState) -> u32 {
    state.eraser_width
}

pub fn select_color(state: &CanvasSettingsState) -> RgbaColor {
    state.color
}

pub fn select_auto_save(state: &CanvasSettingsState) -> bool {
    state.auto_save
}

pub fn select_snap_to_grid(state: &CanvasSettingsState) -> bool {
    state.snap_to_grid
}

pub fn select_dynamic_grid(state: &CanvasSettingsState) -> bool {
    state.dynamic_grid
}

pub fn select_show_hud(state: &CanvasSettingsState) -> bool {
    state.show_hud
}

pub fn select_tool_widths(state: &CanvasSettingsState) -> ToolWidths {
    ToolWidths {
        brush: state.brush_width,
        eraser: state.eraser_width,
    }
}

pub fn select_color_css(state: &CanvasSettingsState) -> String {
    state.color.to_css()
}

/// Memoized [`select_tool_widths`].
pub fn tool_widths_selector() -> Selector<CanvasSettingsState, ToolWidths> {
    Selector::new(select_tool_widths)
}

/// Memoized [`select_color_css`].
pub fn color_css_selector() -> Selector<CanvasSettingsState, String> {
    Selector::new(select_color_css)
}

fn deserialize_alpha<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let alpha = f32::deserialize(deserializer)?;
    if (0.0..=1.0).contains(&alpha) {
        Ok(alpha)
    } else {
        Err(D::Error::custom(format!(
            "alpha {alpha} is outside 0.0..=1.0"
        )))
    }
}

fn deserialize_tool_width<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let width = u32::deserialize(deserializer)?;
    if width >= MIN_TOOL_WIDTH {
        Ok(width)
    } else {
        Err(D::Error::custom(format!(
            "tool width {width} is below {MIN_TOOL_WIDTH}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{CanvasSettingsCommand, CanvasSettingsState, RgbaColor};
    use crate::slice::Slice;
    use serde_json::json;

    #[test]
    fn widths_are_clamped_to_minimum() {
        let mut state = CanvasSettingsState::initial();
        state.reduce(CanvasSettingsCommand::SetBrushWidth(0));
        state.reduce(CanvasSettingsCommand::SetEraserWidth(12));
        assert_eq!(state.brush_width, 1);
        assert_eq!(state.eraser_width, 12);
    }

    #[test]
    fn set_color_clamps_alpha() {
        let mut state = CanvasSettingsState::initial();
        state.reduce(CanvasSettingsCommand::SetColor(RgbaColor {
            r: 1,
            g: 2,
            b: 3,
            a: 4.0,
        }));
        assert_eq!(state.color, RgbaColor::new(1, 2, 3, 1.0));
    }

    #[test]
    fn color_rejects_out_of_range_channels() {
        let red_overflow = json!({"r": 256, "g": 0, "b": 0, "a": 1.0});
        let alpha_overflow = json!({"r": 0, "g": 0, "b": 0, "a": 1.5});
        assert!(serde_json::from_value::<RgbaColor>(red_overflow).is_err());
        assert!(serde_json::from_value::<RgbaColor>(alpha_overflow).is_err());
        let color: RgbaColor =
            serde_json::from_value(json!({"r": 10, "g": 20, "b": 30, "a": 0.5})).unwrap();
        assert_eq!(color.to_css(), "rgba(10, 20, 30, 0.5)");
    }

    #[test]
    fn commands_use_adjacent_tagging() {
        let command: CanvasSettingsCommand =
            serde_json::from_value(json!({"type": "setBrushWidth", "value": 8})).unwrap();
        assert_eq!(command, CanvasSettingsCommand::SetBrushWidth(8));
        let toggle: CanvasSettingsCommand =
            serde_json::from_value(json!({"type": "toggleHud"})).unwrap();
        assert_eq!(toggle, CanvasSettingsCommand::ToggleHud);
    }

    #[test]
    fn serialized_keys_are_camel_case() {
        let value = serde_json::to_value(CanvasSettingsState::initial()).unwrap();
        assert_eq!(value["brushWidth"], json!(50));
        assert_eq!(value["invertScrollForToolWidth"], json!(false));
        assert!(value.get("_version").is_none());
    }
}
