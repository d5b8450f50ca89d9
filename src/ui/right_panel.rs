//! Right panel UI: game controls and the highlighted-country summary.

use crate::geo::CountryGeometry;
use crate::render::SummaryEntry;
use crate::state::{MapSession, RoundStatus};
use eframe::egui::{self, Color32, RichText, ScrollArea};
use rand::Rng;
use web_time::Instant;

/// Returns true if the session changed.
pub fn render_right_panel<R: Rng + ?Sized>(
    ctx: &egui::Context,
    session: &mut MapSession,
    geometry: Option<&CountryGeometry>,
    summary: &[SummaryEntry],
    rng: &mut R,
) -> bool {
    let mut changed = false;

    egui::SidePanel::right("right_panel")
        .resizable(true)
        .default_width(240.0)
        .min_width(180.0)
        .max_width(360.0)
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Find the country");
                ui.separator();

                changed |= render_game_section(ui, session, geometry, rng);
                ui.add_space(5.0);

                render_summary_section(ui, summary);
            });
        });

    changed
}

fn render_game_section<R: Rng + ?Sized>(
    ui: &mut egui::Ui,
    session: &mut MapSession,
    geometry: Option<&CountryGeometry>,
    rng: &mut R,
) -> bool {
    let mut changed = false;
    let round = session.game.round();
    let status = round.status;

    egui::Grid::new("game_status")
        .num_columns(2)
        .spacing([8.0, 2.0])
        .show(ui, |ui| {
            ui.label("Status:");
            ui.label(RichText::new(status.label()).strong());
            ui.end_row();

            if let Some(letter) = round.target_letter {
                ui.label("Letter:");
                ui.label(RichText::new(letter.to_ascii_uppercase().to_string()).strong());
                ui.end_row();

                ui.label("Found:");
                ui.label(format!("{} / {}", round.found_count(), round.required_count));
                ui.end_row();
            }

            ui.label("Score:");
            ui.label(round.score.to_string());
            ui.end_row();

            ui.label("Streak:");
            ui.label(format!("{} (best {})", round.streak, round.best_streak));
            ui.end_row();

            ui.label("Time:");
            let time_color = if status == RoundStatus::Running && round.time_remaining <= 10 {
                Color32::from_rgb(230, 90, 90)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(format!("{}s", round.time_remaining)).color(time_color));
            ui.end_row();
        });

    if !round.message.is_empty() {
        ui.label(RichText::new(&round.message).italics());
    }

    ui.horizontal(|ui| {
        let can_start = geometry.is_some() && status != RoundStatus::Running;
        if ui
            .add_enabled(can_start, egui::Button::new("Start round"))
            .clicked()
        {
            if let Some(geometry) = geometry {
                changed |= session.start_round(geometry, Instant::now(), rng);
            }
        }
        if ui.button("Reset").clicked() {
            changed |= session.reset_round();
        }
    });

    changed
}

fn render_summary_section(ui: &mut egui::Ui, summary: &[SummaryEntry]) {
    egui::CollapsingHeader::new(RichText::new(format!("Highlighted ({})", summary.len())).strong())
        .default_open(true)
        .show(ui, |ui| {
            if summary.is_empty() {
                ui.label(
                    RichText::new("Press a letter to highlight countries")
                        .size(11.0)
                        .color(Color32::GRAY),
                );
                return;
            }

            for entry in summary {
                ui.horizontal(|ui| {
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                    ui.painter().circle_filled(rect.center(), 5.0, entry.color);
                    let mut name = RichText::new(&entry.display_text);
                    if entry.found {
                        name = name.strong();
                    }
                    ui.label(name);
                });
                ui.indent(&entry.id, |ui| {
                    let small = |text: String| RichText::new(text).size(11.0).color(Color32::GRAY);
                    if let Some(native_name) = &entry.native_name {
                        ui.label(small(native_name.clone()).italics());
                    }
                    ui.label(small(format!("Population: {}", entry.population)));
                    if let Some(capital) = &entry.capital {
                        ui.label(small(format!("Capital: {}", capital)));
                    }
                    if let Some(leader) = &entry.leader {
                        let response = ui.label(small(format!("Leader: {}", leader)));
                        if let Some(source) = &entry.leader_source {
                            response.on_hover_text(format!("Source: {}", source));
                        }
                    }
                });
            }
        });
}
