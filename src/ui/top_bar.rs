//! Top bar UI: letter toggles, view controls and best score.

use crate::state::MapSession;
use eframe::egui::{self, Color32, RichText};

/// Returns true if the session changed.
pub fn render_top_bar(ctx: &egui::Context, session: &mut MapSession) -> bool {
    let mut changed = false;

    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.label(
                    RichText::new("World Outline Map")
                        .strong()
                        .size(16.0)
                        .color(Color32::WHITE),
                );

                ui.separator();

                for letter in 'a'..='z' {
                    let active = session.highlight.color_for(letter);
                    let mut text = RichText::new(letter.to_ascii_uppercase().to_string())
                        .monospace()
                        .size(12.0);
                    if let Some(color) = active {
                        text = text.color(Color32::BLACK).background_color(color);
                    }
                    if ui
                        .add(egui::Button::new(text).small().selected(active.is_some()))
                        .clicked()
                    {
                        changed |= session.highlight.toggle_initial(&letter.to_string());
                    }
                }

                if ui.small_button("Clear").clicked() {
                    changed |= session.highlight.clear_highlights();
                }

                ui.separator();

                if ui.small_button("+").on_hover_text("Zoom in").clicked() {
                    changed |= session.view.zoom_in();
                }
                if ui.small_button("−").on_hover_text("Zoom out").clicked() {
                    changed |= session.view.zoom_out();
                }
                if ui.small_button("Reset").on_hover_text("Reset view").clicked() {
                    changed |= session.view.reset();
                }
                ui.label(
                    RichText::new(format!("{:.1}x", session.view.zoom()))
                        .size(12.0)
                        .color(Color32::GRAY),
                );

                ui.separator();

                ui.label(
                    RichText::new(format!("Best: {}", session.best_score.value()))
                        .size(13.0)
                        .color(Color32::GRAY),
                );
            });
        });

    changed
}
