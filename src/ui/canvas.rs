//! Central canvas: paints the draw list and routes pointer input.

use crate::geo::CountryGeometry;
use crate::render::{DrawCommand, DrawList};
use crate::state::{MapSession, ViewTransform};
use eframe::egui::{
    self, epaint::Vertex, load::SizeHint, load::TexturePoll, Align2, Color32, FontId, Mesh,
    Painter, Pos2, Rect, Sense, Shape, Stroke, TextureOptions, Vec2,
};
use std::f32::consts::TAU;
use web_time::Instant;

/// Segments used to approximate circular badge images.
const BADGE_SEGMENTS: usize = 32;

/// Installs the loaders leader badges fetch and decode their photos with.
pub fn install_badge_loaders(ctx: &egui::Context) {
    egui_extras::install_image_loaders(ctx);
}

/// Maps view-space draw commands onto the canvas rect.
struct ScreenMapper {
    origin: Pos2,
    transform: ViewTransform,
}

impl ScreenMapper {
    fn pos(&self, p: Pos2) -> Pos2 {
        self.origin + self.transform.apply(p).to_vec2()
    }

    fn len(&self, l: f32) -> f32 {
        l * self.transform.zoom
    }

    fn stroke(&self, s: Stroke) -> Stroke {
        Stroke::new(self.len(s.width), s.color)
    }

    fn rect(&self, r: Rect) -> Rect {
        Rect::from_min_max(self.pos(r.min), self.pos(r.max))
    }
}

/// Allocates the map canvas; returns its rect and response so the caller
/// can size the geometry before painting.
pub fn allocate_canvas(ui: &mut egui::Ui) -> (egui::Response, Painter) {
    let available_size = ui.available_size();
    ui.allocate_painter(available_size, Sense::click_and_drag())
}

/// Paints a draw list into the canvas rect.
pub fn paint_draw_list(ctx: &egui::Context, painter: &Painter, rect: Rect, list: &DrawList) {
    let mapper = ScreenMapper {
        origin: rect.min,
        transform: list.transform,
    };
    let geometry = list.geometry.as_ref();

    for (_, command) in list.commands() {
        match command {
            DrawCommand::Background { color } => {
                painter.rect_filled(rect, 0.0, *color);
            }
            DrawCommand::Coastline { stroke } => {
                paint_lines(painter, rect, &mapper, &geometry.coastline, *stroke);
            }
            DrawCommand::Borders { stroke } => {
                paint_lines(painter, rect, &mapper, &geometry.borders, *stroke);
            }
            DrawCommand::FillCountry {
                index,
                fill,
                stroke,
            } => {
                paint_country(painter, rect, &mapper, geometry, *index, *fill, *stroke);
            }
            DrawCommand::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                painter.circle(
                    mapper.pos(*center),
                    mapper.len(*radius),
                    *fill,
                    mapper.stroke(*stroke),
                );
            }
            DrawCommand::Text {
                pos,
                text,
                font_size,
                color,
                halo,
                anchor,
            } => {
                paint_text(
                    painter,
                    mapper.pos(*pos),
                    text,
                    mapper.len(*font_size),
                    *color,
                    mapper.stroke(*halo),
                    *anchor,
                );
            }
            DrawCommand::Badge {
                center,
                radius,
                image_url,
                stroke,
                fallback,
            } => {
                paint_badge(
                    ctx,
                    painter,
                    mapper.pos(*center),
                    mapper.len(*radius),
                    image_url,
                    mapper.stroke(*stroke),
                    fallback,
                );
            }
        }
    }
}

fn paint_lines(
    painter: &Painter,
    clip: Rect,
    mapper: &ScreenMapper,
    lines: &[Vec<Pos2>],
    stroke: Stroke,
) {
    let stroke = mapper.stroke(stroke);
    for line in lines {
        let points: Vec<Pos2> = line.iter().map(|p| mapper.pos(*p)).collect();
        let bounds = Rect::from_points(&points);
        if !clip.intersects(bounds) {
            continue;
        }
        painter.add(Shape::line(points, stroke));
    }
}

fn paint_country(
    painter: &Painter,
    clip: Rect,
    mapper: &ScreenMapper,
    geometry: &CountryGeometry,
    index: usize,
    fill: Color32,
    stroke: Stroke,
) {
    let Some(country) = geometry.countries.get(index) else {
        return;
    };
    // Skip countries entirely off-screen
    if !clip.intersects(mapper.rect(country.bounds)) {
        return;
    }

    let mut mesh = Mesh::default();
    mesh.vertices.extend(country.fill.vertices.iter().map(|p| Vertex {
        pos: mapper.pos(*p),
        uv: egui::epaint::WHITE_UV,
        color: fill,
    }));
    mesh.indices.extend_from_slice(&country.fill.indices);
    painter.add(Shape::mesh(mesh));

    let stroke = mapper.stroke(stroke);
    if stroke.width <= 0.0 {
        return;
    }
    for polygon in &country.polygons {
        let rings = std::iter::once(&polygon.exterior).chain(polygon.holes.iter());
        for ring in rings {
            let points: Vec<Pos2> = ring.iter().map(|p| mapper.pos(*p)).collect();
            painter.add(Shape::closed_line(points, stroke));
        }
    }
}

/// Text with an outline drawn by offsetting copies in the halo color.
fn paint_text(
    painter: &Painter,
    pos: Pos2,
    text: &str,
    font_size: f32,
    color: Color32,
    halo: Stroke,
    anchor: Align2,
) {
    let font = FontId::proportional(font_size.max(1.0));
    if halo.width > 0.0 {
        for i in 0..8 {
            let angle = i as f32 * TAU / 8.0;
            let offset = Vec2::angled(angle) * halo.width;
            painter.text(pos + offset, anchor, text, font.clone(), halo.color);
        }
    }
    painter.text(pos, anchor, text, font, color);
}

fn paint_badge(
    ctx: &egui::Context,
    painter: &Painter,
    center: Pos2,
    radius: f32,
    image_url: &str,
    stroke: Stroke,
    fallback: &str,
) {
    let texture = ctx.try_load_texture(image_url, TextureOptions::LINEAR, SizeHint::default());

    match texture {
        Ok(TexturePoll::Ready { texture }) => {
            // Fan mesh with circular UVs clips the photo to the badge.
            let mut mesh = Mesh::with_texture(texture.id);
            mesh.vertices.push(Vertex {
                pos: center,
                uv: Pos2::new(0.5, 0.5),
                color: Color32::WHITE,
            });
            for i in 0..=BADGE_SEGMENTS {
                let dir = Vec2::angled(i as f32 * TAU / BADGE_SEGMENTS as f32);
                mesh.vertices.push(Vertex {
                    pos: center + dir * radius,
                    uv: Pos2::new(0.5 + dir.x * 0.5, 0.5 + dir.y * 0.5),
                    color: Color32::WHITE,
                });
            }
            for i in 1..=BADGE_SEGMENTS as u32 {
                mesh.add_triangle(0, i, i + 1);
            }
            painter.add(Shape::mesh(mesh));
        }
        Ok(TexturePoll::Pending { .. }) | Err(_) => {
            painter.circle_filled(center, radius, Color32::from_gray(60));
            painter.text(
                center,
                Align2::CENTER_CENTER,
                fallback,
                FontId::proportional((radius * 0.9).max(1.0)),
                Color32::WHITE,
            );
        }
    }

    painter.circle_stroke(center, radius, stroke);
}

/// Routes wheel, drag, click and double-click input to the session.
///
/// Returns true if anything changed that needs a re-render.
pub fn handle_canvas_input(
    response: &egui::Response,
    rect: Rect,
    session: &mut MapSession,
    geometry: Option<&CountryGeometry>,
) -> bool {
    let ctx = &response.ctx;
    let now = Instant::now();
    let mut changed = false;

    // Wheel zoom around the pointer. egui reports scrolling up as positive y.
    if response.hovered() {
        let scroll = ctx.input(|i| i.raw_scroll_delta);
        if scroll.y != 0.0 {
            if let Some(pointer) = response.hover_pos() {
                changed |= session
                    .view
                    .wheel_zoom(-scroll.y, (pointer - rect.min).to_pos2());
            }
        }
    }

    // Drag to pan, once past the gesture threshold
    if let Some(pointer) = response.interact_pointer_pos() {
        if ctx.input(|i| i.pointer.primary_down()) {
            if !session.drag.is_pressed() {
                session.drag.press(pointer);
            }
            if let Some(delta) = session.drag.move_to(pointer, now) {
                changed |= session.view.pan_by(delta);
            }
        }
    }
    if session.drag.is_pressed() && ctx.input(|i| i.pointer.any_released()) {
        session.drag.release(now);
    }

    if response.double_clicked() {
        changed |= session.view.reset();
    } else if response.clicked() && !session.drag.should_suppress_click(now) {
        if let (Some(pointer), Some(geometry)) = (response.interact_pointer_pos(), geometry) {
            let view_pos = session
                .view
                .transform()
                .invert((pointer - rect.min).to_pos2());
            if let Some(country) = geometry.country_at(view_pos) {
                log::debug!("Clicked {} ({})", country.name, country.id);
                changed |= session.click_country(country);
            }
        }
    }

    if let Some(hover) = response.hover_pos() {
        if let Some(geometry) = geometry {
            let view_pos = session
                .view
                .transform()
                .invert((hover - rect.min).to_pos2());
            if let Some(country) = geometry.country_at(view_pos) {
                if !session.game.round().is_running() {
                    response.clone().on_hover_text(country.name.as_str());
                }
            }
        }
    }

    changed
}
