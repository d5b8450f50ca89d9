//! Map configuration.
//!
//! Every visual and gameplay constant lives here. The configuration is read
//! from an optional JSON file; any field left out keeps its default, and an
//! unreadable file falls back to defaults entirely.

use crate::data::normalize_country_id;
use eframe::egui::Color32;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors that can occur while reading a configuration file.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// The file could not be read.
    Io(String),
    /// The file contents were not valid configuration JSON.
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Projection selection and fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionConfig {
    /// Projection name (unknown names fall back to the default projection)
    pub name: String,
    /// Padding in pixels kept between the fitted map and the viewport edge
    pub fit_padding: f32,
    /// Preferred geometry collection inside the topology document
    pub preferred_collection: String,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            name: "naturalEarth1".to_string(),
            fit_padding: 16.0,
            preferred_collection: "countries".to_string(),
        }
    }
}

/// Zoom limits, step sizes and drag handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Multiplicative step used by the zoom buttons
    pub button_step: f32,
    /// Multiplicative step used per wheel/trackpad event
    pub wheel_step: f32,
    /// How far (px) zoomed content may be panned past the viewport edge
    pub pan_padding: f32,
    /// Pointer movement (px) before a press turns into a drag
    pub drag_threshold: f32,
    /// How long after a drag a click is ignored
    pub click_suppress_ms: u64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_zoom: 1.0,
            max_zoom: 8.0,
            button_step: 1.2,
            wheel_step: 1.12,
            pan_padding: 40.0,
            drag_threshold: 4.0,
            click_suppress_ms: 250,
        }
    }
}

/// Colors and sizes for every rendered layer.
///
/// Colors are hex strings (`#rrggbb` or `#rrggbbaa`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    pub background: String,
    pub land_fill: String,
    pub land_stroke: String,
    pub coastline_color: String,
    pub coastline_width: f32,
    pub border_color: String,
    pub border_width: f32,
    pub found_fill: String,
    pub found_stroke: String,
    pub found_stroke_width: f32,
    pub highlight_stroke: String,
    pub highlight_stroke_width: f32,

    pub circle_min_radius: f32,
    pub circle_max_radius: f32,
    pub circle_opacity: f32,

    pub label_font_size: f32,
    pub label_color: String,
    pub label_halo_color: String,
    pub label_halo_width: f32,

    /// Capital markers appear once zoom reaches this level
    pub capital_zoom_threshold: f32,
    pub capital_font_size: f32,
    pub capital_dot_radius: f32,
    pub capital_halo_width: f32,
    pub capital_color: String,

    pub badge_radius: f32,
    pub badge_gap: f32,
    pub badge_stroke_width: f32,
    pub badge_stroke_color: String,

    /// Highlight colors, assigned to letters in insertion order
    pub palette: Vec<String>,
}

/// Default highlight palette.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6",
    "#bfef45", "#fabed4",
];

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background: "#0f1626".to_string(),
            land_fill: "#2a3347".to_string(),
            land_stroke: "#3a4560".to_string(),
            coastline_color: "#8aa0c8".to_string(),
            coastline_width: 0.8,
            border_color: "#56627e".to_string(),
            border_width: 0.5,
            found_fill: "#2e8b57".to_string(),
            found_stroke: "#e8ffe8".to_string(),
            found_stroke_width: 1.2,
            highlight_stroke: "#10141f".to_string(),
            highlight_stroke_width: 0.6,

            circle_min_radius: 4.0,
            circle_max_radius: 28.0,
            circle_opacity: 0.45,

            label_font_size: 12.0,
            label_color: "#f4f6fb".to_string(),
            label_halo_color: "#0f1626".to_string(),
            label_halo_width: 2.0,

            capital_zoom_threshold: 3.0,
            capital_font_size: 10.0,
            capital_dot_radius: 2.5,
            capital_halo_width: 1.5,
            capital_color: "#ffd166".to_string(),

            badge_radius: 11.0,
            badge_gap: 4.0,
            badge_stroke_width: 1.5,
            badge_stroke_color: "#f4f6fb".to_string(),

            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Round timing and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Countdown length in seconds
    pub round_seconds: u32,
    /// Upper bound on how many countries a round asks for
    pub max_targets: usize,
    pub correct_score: u32,
    pub streak_bonus: u32,
    pub wrong_penalty: u32,
    /// Points per remaining second awarded on a win
    pub time_bonus_per_second: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_seconds: 60,
            max_targets: 10,
            correct_score: 10,
            streak_bonus: 2,
            wrong_penalty: 5,
            time_bonus_per_second: 1,
        }
    }
}

/// Countries left off the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExclusionConfig {
    /// Excluded country ids (normalized before comparison)
    pub ids: Vec<String>,
    /// Excluded country names (case-insensitive)
    pub names: Vec<String>,
    /// Append built-in polygons for small territories the topology lacks
    pub include_fallback_territories: bool,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            ids: vec!["010".to_string()],
            names: vec!["Antarctica".to_string()],
            include_fallback_territories: true,
        }
    }
}

impl ExclusionConfig {
    /// Returns true if a country with this id or name is excluded.
    pub fn excludes(&self, id: &str, name: &str) -> bool {
        let id = normalize_country_id(id);
        let name = normalize_name(name);
        self.ids.iter().any(|x| normalize_country_id(x) == id)
            || self.names.iter().any(|x| normalize_name(x) == name)
    }

    /// Order-independent serialized form, used as part of the geometry cache key.
    pub fn signature(&self) -> String {
        let mut ids: Vec<String> = self.ids.iter().map(|x| normalize_country_id(x)).collect();
        ids.sort();
        ids.dedup();
        let mut names: Vec<String> = self.names.iter().map(|x| normalize_name(x)).collect();
        names.sort();
        names.dedup();
        format!(
            "ids={};names={};fallback={}",
            ids.join(","),
            names.join(","),
            self.include_fallback_territories
        )
    }
}

/// Case-folded name shared by matching and the cache signature.
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    pub projection: ProjectionConfig,
    pub zoom: ZoomConfig,
    pub style: StyleConfig,
    pub game: GameConfig,
    pub exclusions: ExclusionConfig,
}

impl MapConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&json)
    }

    /// Loads the config file, falling back to defaults if it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_path(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }
}

/// Parses a hex color, logging and returning `fallback` if it is malformed.
pub fn parse_color(hex: &str, fallback: Color32) -> Color32 {
    match Color32::from_hex(hex.trim()) {
        Ok(color) => color,
        Err(e) => {
            log::warn!("Invalid color {:?} ({:?}), using fallback", hex, e);
            fallback
        }
    }
}

/// Parses the highlight palette, skipping malformed entries.
///
/// An empty result falls back to [`DEFAULT_PALETTE`].
pub fn parse_palette(entries: &[String]) -> Vec<Color32> {
    let palette: Vec<Color32> = entries
        .iter()
        .filter_map(|hex| match Color32::from_hex(hex.trim()) {
            Ok(color) => Some(color),
            Err(e) => {
                log::warn!("Skipping invalid palette color {:?} ({:?})", hex, e);
                None
            }
        })
        .collect();

    if palette.is_empty() {
        DEFAULT_PALETTE
            .iter()
            .filter_map(|hex| Color32::from_hex(hex).ok())
            .collect()
    } else {
        palette
    }
}
