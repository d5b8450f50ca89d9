//! Style configuration resolved to egui colors and strokes.

use crate::config::{parse_color, StyleConfig};
use eframe::egui::{Color32, Stroke};

/// [`StyleConfig`] with colors parsed once.
///
/// Sizes are in screen pixels; the pipeline converts them to view space
/// where they must stay constant under zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub background: Color32,
    pub land_fill: Color32,
    pub land_stroke: Stroke,
    pub coastline: Stroke,
    pub border: Stroke,
    pub found_fill: Color32,
    pub found_stroke: Stroke,
    pub highlight_stroke: Stroke,

    pub circle_min_radius: f32,
    pub circle_max_radius: f32,
    pub circle_opacity: f32,

    pub label_font_size: f32,
    pub label_color: Color32,
    pub label_halo: Stroke,

    pub capital_zoom_threshold: f32,
    pub capital_font_size: f32,
    pub capital_dot_radius: f32,
    pub capital_halo_width: f32,
    pub capital_color: Color32,

    pub badge_radius: f32,
    pub badge_gap: f32,
    pub badge_stroke: Stroke,
}

impl ResolvedStyle {
    pub fn from_config(config: &StyleConfig) -> Self {
        let label_halo_color = parse_color(&config.label_halo_color, Color32::BLACK);
        Self {
            background: parse_color(&config.background, Color32::from_rgb(15, 22, 38)),
            land_fill: parse_color(&config.land_fill, Color32::DARK_GRAY),
            land_stroke: Stroke::new(
                config.border_width,
                parse_color(&config.land_stroke, Color32::GRAY),
            ),
            coastline: Stroke::new(
                config.coastline_width,
                parse_color(&config.coastline_color, Color32::LIGHT_BLUE),
            ),
            border: Stroke::new(
                config.border_width,
                parse_color(&config.border_color, Color32::GRAY),
            ),
            found_fill: parse_color(&config.found_fill, Color32::DARK_GREEN),
            found_stroke: Stroke::new(
                config.found_stroke_width,
                parse_color(&config.found_stroke, Color32::WHITE),
            ),
            highlight_stroke: Stroke::new(
                config.highlight_stroke_width,
                parse_color(&config.highlight_stroke, Color32::BLACK),
            ),

            circle_min_radius: config.circle_min_radius.min(config.circle_max_radius),
            circle_max_radius: config.circle_max_radius.max(config.circle_min_radius),
            circle_opacity: config.circle_opacity.clamp(0.0, 1.0),

            label_font_size: config.label_font_size,
            label_color: parse_color(&config.label_color, Color32::WHITE),
            label_halo: Stroke::new(config.label_halo_width, label_halo_color),

            capital_zoom_threshold: config.capital_zoom_threshold,
            capital_font_size: config.capital_font_size,
            capital_dot_radius: config.capital_dot_radius,
            capital_halo_width: config.capital_halo_width,
            capital_color: parse_color(&config.capital_color, Color32::GOLD),

            badge_radius: config.badge_radius,
            badge_gap: config.badge_gap,
            badge_stroke: Stroke::new(
                config.badge_stroke_width,
                parse_color(&config.badge_stroke_color, Color32::WHITE),
            ),
        }
    }

    pub fn label_halo_color(&self) -> Color32 {
        self.label_halo.color
    }
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self::from_config(&StyleConfig::default())
    }
}
