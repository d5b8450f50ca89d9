//! The eframe application: owns loaded data, the geometry cache, the
//! session and the render scheduler, and drives them once per frame.

use crate::config::MapConfig;
use crate::data::ReferenceData;
use crate::geo::{CountryGeometry, GeometryCache, MapDataError, Topology};
use crate::render::{build_draw_list, DrawList, RenderInput, RenderScheduler, ResolvedStyle};
use crate::state::MapSession;
use crate::storage::ScoreStore;
use crate::ui;
use eframe::egui::{self, Color32, Key, RichText, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use web_time::{Instant, SystemTime, UNIX_EPOCH};

/// Input documents for one map.
pub struct MapData {
    pub topology: Topology,
    pub reference: ReferenceData,
    pub config: MapConfig,
}

impl MapData {
    /// Parses the input documents.
    ///
    /// The topology is required. An unreadable reference dataset or config
    /// only degrades the map: it renders without reference data or with
    /// default settings.
    pub fn from_sources(
        topology_json: &str,
        reference_json: Option<&str>,
        config_json: Option<&str>,
    ) -> Result<Self, MapDataError> {
        let topology = Topology::from_json_str(topology_json)?;

        let reference = match reference_json.map(ReferenceData::from_json_str) {
            Some(Ok(reference)) => reference,
            Some(Err(e)) => {
                log::warn!("{}; continuing without reference data", e);
                ReferenceData::new()
            }
            None => {
                log::warn!("No reference data available");
                ReferenceData::new()
            }
        };

        let config = match config_json.map(MapConfig::from_json_str) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                log::warn!("{}; using defaults", e);
                MapConfig::default()
            }
            None => MapConfig::default(),
        };

        Ok(Self {
            topology,
            reference,
            config,
        })
    }
}

/// Running state of a loaded map.
struct MapState {
    data: MapData,
    style: ResolvedStyle,
    cache: GeometryCache,
    geometry: Option<Arc<CountryGeometry>>,
    session: MapSession,
    scheduler: RenderScheduler,
    draw_list: Option<DrawList>,
    rng: StdRng,
    /// Geometry build failure, shown instead of the map
    geometry_error: Option<String>,
}

/// Main application.
pub struct MapApp {
    /// Loaded map, or the message explaining why loading failed
    state: Result<MapState, String>,
}

impl MapApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        data: Result<MapData, String>,
        store: Box<dyn ScoreStore>,
    ) -> Self {
        ui::install_badge_loaders(&cc.egui_ctx);

        let state = data.map(|data| {
            let session = MapSession::new(&data.config, Vec2::ZERO, store);
            let mut scheduler = RenderScheduler::new();
            scheduler.request_render();
            MapState {
                style: ResolvedStyle::from_config(&data.config.style),
                cache: GeometryCache::new(),
                geometry: None,
                session,
                scheduler,
                draw_list: None,
                rng: StdRng::seed_from_u64(seed_from_clock()),
                geometry_error: None,
                data,
            }
        });

        if let Err(e) = &state {
            log::warn!("Starting without a map: {}", e);
        }

        Self { state }
    }
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = match &mut self.state {
            Ok(state) => state,
            Err(message) => {
                render_load_error(ctx, message);
                return;
            }
        };

        let now = Instant::now();
        if state.session.poll_timer(now) {
            state.scheduler.request_render();
        }

        if handle_keyboard(ctx, &mut state.session) {
            state.scheduler.request_render();
        }

        if ui::render_top_bar(ctx, &mut state.session) {
            state.scheduler.request_render();
        }

        let summary = state
            .draw_list
            .as_ref()
            .map(|l| l.summary.clone())
            .unwrap_or_default();
        if ui::render_right_panel(
            ctx,
            &mut state.session,
            state.geometry.as_deref(),
            &summary,
            &mut state.rng,
        ) {
            state.scheduler.request_render();
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| render_map(ctx, ui, state));

        if state.scheduler.is_pending() {
            ctx.request_repaint();
        } else if let Some(wait) = state.session.game.timer().until_next(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}

fn render_map(ctx: &egui::Context, ui: &mut egui::Ui, state: &mut MapState) {
    let (response, painter) = ui::allocate_canvas(ui);
    let rect = response.rect;
    // Whole pixels, so sub-pixel layout jitter does not rebuild the geometry.
    let size = Vec2::new(rect.width().round(), rect.height().round());
    if size.x < 1.0 || size.y < 1.0 {
        return;
    }

    if state.session.view.set_viewport(size) {
        state.scheduler.request_render();
    }

    match state
        .cache
        .get_geometry(&state.data.topology, size.x, size.y, &state.data.config)
    {
        Ok(geometry) => {
            let replaced = state
                .geometry
                .as_ref()
                .is_none_or(|current| !Arc::ptr_eq(current, &geometry));
            if replaced {
                state.geometry = Some(geometry);
                state.geometry_error = None;
                state.scheduler.request_render();
            }
        }
        Err(e) => {
            state.geometry = None;
            state.geometry_error = Some(e.to_string());
        }
    }

    if let Some(message) = &state.geometry_error {
        render_error_text(ui, rect, message);
        return;
    }
    let Some(geometry) = state.geometry.clone() else {
        return;
    };

    if state.scheduler.take_pending() || state.draw_list.is_none() {
        let list = build_draw_list(&RenderInput {
            geometry: &geometry,
            reference: &state.data.reference,
            transform: state.session.view.transform(),
            highlight: &state.session.highlight,
            round: state.session.game.round(),
            style: &state.style,
        });
        log::debug!("Rebuilt draw list: {} commands", list.command_count());
        state.draw_list = Some(list);
    }

    if let Some(list) = &state.draw_list {
        ui::paint_draw_list(ctx, &painter, rect, list);
    }

    if ui::handle_canvas_input(&response, rect, &mut state.session, Some(&geometry)) {
        state.scheduler.request_render();
    }
}

/// Letters toggle highlights, Escape clears them.
fn handle_keyboard(ctx: &egui::Context, session: &mut MapSession) -> bool {
    if ctx.wants_keyboard_input() {
        return false;
    }

    let (text, escape) = ctx.input(|i| {
        let text: Vec<String> = i
            .events
            .iter()
            .filter_map(|e| match e {
                egui::Event::Text(t) => Some(t.to_lowercase()),
                _ => None,
            })
            .collect();
        (text, i.key_pressed(Key::Escape))
    });

    let mut changed = false;
    for t in text {
        changed |= session.highlight.toggle_initial(&t);
    }
    if escape {
        changed |= session.highlight.clear_highlights();
    }
    changed
}

fn render_error_text(ui: &mut egui::Ui, rect: egui::Rect, message: &str) {
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        message,
        egui::FontId::proportional(16.0),
        Color32::from_rgb(230, 90, 90),
    );
}

fn render_load_error(ctx: &egui::Context, message: &str) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            ui.label(
                RichText::new("The map could not be loaded")
                    .strong()
                    .size(20.0)
                    .color(Color32::from_rgb(230, 90, 90)),
            );
            ui.add_space(8.0);
            ui.label(RichText::new(message).size(14.0).color(Color32::GRAY));
        });
    });
}
