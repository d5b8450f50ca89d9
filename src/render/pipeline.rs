//! Composes geometry and session state into a [`DrawList`].
//!
//! `build_draw_list` is a pure function of its inputs; it never mutates
//! state and is cheap relative to the geometry rebuild it sits on top of.

use super::draw::{DrawCommand, DrawList, LayerKind};
use super::style::ResolvedStyle;
use super::summary::{sort_summary, SummaryEntry};
use crate::data::{thumbnail_url, CountryReferenceRecord, ReferenceData};
use crate::geo::{CountryGeometry, CountryShape};
use crate::state::{GameRound, HighlightState, ViewTransform};
use eframe::egui::{Align2, Color32, Pos2, Stroke};
use std::sync::Arc;

/// Average glyph width as a fraction of the font size, for label layout.
const GLYPH_WIDTH_FACTOR: f32 = 0.6;
/// Thumbnails are requested at this multiple of their on-screen size.
const THUMBNAIL_OVERSAMPLE: f32 = 2.0;
const THUMBNAIL_STEP: u32 = 32;
const THUMBNAIL_MAX: u32 = 512;

pub struct RenderInput<'a> {
    pub geometry: &'a Arc<CountryGeometry>,
    pub reference: &'a ReferenceData,
    pub transform: ViewTransform,
    pub highlight: &'a HighlightState,
    pub round: &'a GameRound,
    pub style: &'a ResolvedStyle,
}

/// A country that gets a circle, label and summary entry.
struct Marked<'a> {
    shape: &'a CountryShape,
    record: Option<&'a CountryReferenceRecord>,
    highlight: Option<Color32>,
    found: bool,
}

impl Marked<'_> {
    fn display_name(&self) -> &str {
        if !self.shape.name.is_empty() {
            return &self.shape.name;
        }
        self.record
            .and_then(|r| r.name.as_deref())
            .unwrap_or(&self.shape.id)
    }

    fn label_text(&self) -> String {
        match self.record.and_then(|r| r.flag.as_deref()) {
            Some(flag) => format!("{} {}", flag, self.display_name()),
            None => self.display_name().to_string(),
        }
    }
}

pub fn build_draw_list(input: &RenderInput) -> DrawList {
    let geometry = input.geometry;
    let style = input.style;
    let zoom = input.transform.zoom.max(f32::MIN_POSITIVE);
    let mut list = DrawList::new(input.transform, Arc::clone(geometry));

    list.push(
        LayerKind::Background,
        DrawCommand::Background {
            color: style.background,
        },
    );
    list.push(
        LayerKind::Linework,
        DrawCommand::Coastline {
            stroke: screen_stroke(style.coastline, zoom),
        },
    );
    list.push(
        LayerKind::Linework,
        DrawCommand::Borders {
            stroke: screen_stroke(style.border, zoom),
        },
    );

    let mut marked: Vec<Marked> = Vec::new();

    for (index, shape) in geometry.countries.iter().enumerate() {
        let found = input.round.is_found(&shape.id);
        let highlight = shape.initial.and_then(|c| input.highlight.color_for(c));

        let (fill, stroke) = if found {
            (style.found_fill, style.found_stroke)
        } else if let Some(color) = highlight {
            (color, style.highlight_stroke)
        } else {
            (style.land_fill, style.land_stroke)
        };
        list.push(
            LayerKind::CountryFills,
            DrawCommand::FillCountry {
                index,
                fill,
                stroke: screen_stroke(stroke, zoom),
            },
        );

        if found || highlight.is_some() {
            marked.push(Marked {
                shape,
                record: input.reference.get(&shape.id),
                highlight,
                found,
            });
        }
    }

    if zoom >= style.capital_zoom_threshold {
        push_capitals(&mut list, geometry, &marked, style, zoom);
    }
    push_circles(&mut list, &marked, style);
    push_badges_and_labels(&mut list, &marked, style, zoom);

    list.summary = summarize(&marked);
    list
}

/// Keeps a stroke's on-screen width constant under zoom.
fn screen_stroke(stroke: Stroke, zoom: f32) -> Stroke {
    Stroke::new(stroke.width / zoom, stroke.color)
}

fn push_capitals(
    list: &mut DrawList,
    geometry: &CountryGeometry,
    marked: &[Marked],
    style: &ResolvedStyle,
    zoom: f32,
) {
    for m in marked {
        let Some(capital) = m.record.and_then(|r| r.capital.as_ref()) else {
            continue;
        };
        let Some(pos) = capital
            .location
            .and_then(|loc| geometry.project(loc.x, loc.y))
        else {
            continue;
        };

        let dot_radius = style.capital_dot_radius / zoom;
        let halo = Stroke::new(style.capital_halo_width / zoom, style.label_halo_color());
        list.push(
            LayerKind::Capitals,
            DrawCommand::Circle {
                center: pos,
                radius: dot_radius,
                fill: style.capital_color,
                stroke: halo,
            },
        );
        list.push(
            LayerKind::Capitals,
            DrawCommand::Text {
                pos: Pos2::new(pos.x + dot_radius * 2.0, pos.y),
                text: capital.name.clone(),
                font_size: style.capital_font_size / zoom,
                color: style.capital_color,
                halo,
                anchor: Align2::LEFT_CENTER,
            },
        );
    }
}

/// Circle radius for a log-population within `domain`.
///
/// Equal domain bounds give the middle of the radius range.
pub fn circle_radius(value: f64, domain: (f64, f64), range: (f32, f32)) -> f32 {
    let (lo, hi) = domain;
    if (hi - lo).abs() < f64::EPSILON {
        return (range.0 + range.1) / 2.0;
    }
    let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0) as f32;
    range.0 + t * (range.1 - range.0)
}

fn push_circles(list: &mut DrawList, marked: &[Marked], style: &ResolvedStyle) {
    let sized: Vec<(Pos2, Color32, f64)> = marked
        .iter()
        .filter_map(|m| {
            let color = m.highlight?;
            let centroid = m.shape.centroid?;
            let population = m.record?.population?;
            (population > 0).then(|| (centroid, color, (population as f64).log10()))
        })
        .collect();

    let Some(domain) = sized.iter().map(|s| s.2).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    }) else {
        return;
    };

    for (centroid, color, value) in sized {
        let radius = circle_radius(
            value,
            domain,
            (style.circle_min_radius, style.circle_max_radius),
        );
        list.push(
            LayerKind::Circles,
            DrawCommand::Circle {
                center: centroid,
                radius,
                fill: color.gamma_multiply(style.circle_opacity),
                stroke: Stroke::new(1.0, color),
            },
        );
    }
}

/// Thumbnail width for a badge of `radius` view units at `zoom`.
pub fn thumbnail_width(radius: f32, zoom: f32) -> u32 {
    let pixels = (radius * 2.0 * zoom * THUMBNAIL_OVERSAMPLE).max(1.0).ceil() as u32;
    let stepped = pixels.div_ceil(THUMBNAIL_STEP) * THUMBNAIL_STEP;
    stepped.min(THUMBNAIL_MAX)
}

fn push_badges_and_labels(
    list: &mut DrawList,
    marked: &[Marked],
    style: &ResolvedStyle,
    zoom: f32,
) {
    let font_size = style.label_font_size / zoom;
    let halo = screen_stroke(style.label_halo, zoom);

    for m in marked {
        let Some(centroid) = m.shape.centroid else {
            continue;
        };
        let text = m.label_text();

        if m.highlight.is_some() {
            let image = m
                .record
                .and_then(|r| r.leader.as_ref())
                .and_then(|leader| leader.image_url.as_ref().map(|url| (leader, url)));
            if let Some((leader, url)) = image {
                let label_width = text.chars().count() as f32 * font_size * GLYPH_WIDTH_FACTOR;
                let radius = style.badge_radius;
                let center = Pos2::new(
                    centroid.x - label_width / 2.0 - style.badge_gap / zoom - radius,
                    centroid.y,
                );
                list.push(
                    LayerKind::LeaderBadges,
                    DrawCommand::Badge {
                        center,
                        radius,
                        image_url: thumbnail_url(url, thumbnail_width(radius, zoom)).to_string(),
                        stroke: screen_stroke(style.badge_stroke, zoom),
                        fallback: initials(&leader.name),
                    },
                );
            }
        }

        list.push(
            LayerKind::Labels,
            DrawCommand::Text {
                pos: centroid,
                text,
                font_size,
                color: style.label_color,
                halo,
                anchor: Align2::CENTER_CENTER,
            },
        );
    }
}

/// Up to two uppercase initials of a person's name.
fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(|c| c.to_uppercase())
        .take(2)
        .collect()
}

fn summarize(marked: &[Marked]) -> Vec<SummaryEntry> {
    let mut entries: Vec<SummaryEntry> = marked
        .iter()
        .filter_map(|m| {
            let color = m.highlight?;
            Some(SummaryEntry {
                id: m.shape.id.clone(),
                name: m.display_name().to_string(),
                display_text: m.label_text(),
                color,
                population: m
                    .record
                    .map(|r| r.population_text())
                    .unwrap_or_else(|| "N/A".to_string()),
                native_name: m.record.and_then(|r| r.native_name.clone()),
                leader: m.record.and_then(|r| r.leader_text()),
                leader_source: m
                    .record
                    .and_then(|r| r.leader.as_ref())
                    .and_then(|l| l.source.clone()),
                capital: m
                    .record
                    .and_then(|r| r.capital.as_ref())
                    .map(|c| c.name.clone()),
                found: m.found,
            })
        })
        .collect();
    sort_summary(&mut entries);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::data::{Capital, Leader};
    use crate::geo::topology::tests::TWO_SQUARES;
    use crate::geo::Topology;
    use eframe::egui::vec2;
    use geo_types::Coord;
    use pretty_assertions::assert_eq;
    use url::Url;

    struct Fixture {
        geometry: Arc<CountryGeometry>,
        reference: ReferenceData,
        highlight: HighlightState,
        round: GameRound,
        style: ResolvedStyle,
    }

    impl Fixture {
        fn new() -> Self {
            let mut config = MapConfig::default();
            config.projection.name = "equirectangular".to_string();
            config.projection.fit_padding = 0.0;
            config.exclusions.include_fallback_territories = false;
            let topology = Topology::from_json_str(TWO_SQUARES).unwrap();
            let geometry =
                Arc::new(CountryGeometry::build(&topology, 200.0, 100.0, &config).unwrap());

            let mut reference = ReferenceData::new();
            reference.insert(
                "004",
                CountryReferenceRecord {
                    flag: Some("🏳".to_string()),
                    population: Some(1_000),
                    year: Some("2023".to_string()),
                    native_name: Some("Alfa".to_string()),
                    capital: Some(Capital {
                        name: "Alphaville".to_string(),
                        location: Some(Coord { x: 0.5, y: 0.5 }),
                    }),
                    leader: Some(Leader {
                        name: "Ada Lovelace".to_string(),
                        role: None,
                        image_url: Url::parse(
                            "https://upload.wikimedia.org/ada.jpg?width=48",
                        )
                        .ok(),
                        source: Some("wikidata".to_string()),
                    }),
                    ..CountryReferenceRecord::default()
                },
            );
            reference.insert(
                "008",
                CountryReferenceRecord {
                    population: Some(1_000_000),
                    ..CountryReferenceRecord::default()
                },
            );

            Self {
                geometry,
                reference,
                highlight: HighlightState::new(vec![Color32::RED, Color32::BLUE]),
                round: GameRound::default(),
                style: ResolvedStyle::default(),
            }
        }

        fn build(&self, zoom: f32) -> DrawList {
            build_draw_list(&RenderInput {
                geometry: &self.geometry,
                reference: &self.reference,
                transform: ViewTransform {
                    zoom,
                    pan: vec2(0.0, 0.0),
                },
                highlight: &self.highlight,
                round: &self.round,
                style: &self.style,
            })
        }
    }

    fn fill_of(list: &DrawList, index: usize) -> Color32 {
        list.layer(LayerKind::CountryFills)
            .iter()
            .find_map(|c| match c {
                DrawCommand::FillCountry { index: i, fill, .. } if *i == index => Some(*fill),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_layers_are_in_fixed_order() {
        let list = Fixture::new().build(1.0);
        let kinds: Vec<LayerKind> = list.layers.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, LayerKind::ORDER.to_vec());
        assert!(LayerKind::Linework < LayerKind::CountryFills);
        assert!(LayerKind::LeaderBadges < LayerKind::Labels);
    }

    #[test]
    fn test_fill_precedence() {
        let mut f = Fixture::new();
        f.highlight.add_initial("a");
        f.highlight.add_initial("b");
        f.round.found_ids.insert("008".to_string());
        let list = f.build(1.0);

        assert_eq!(fill_of(&list, 0), Color32::RED);
        // Found overrides the highlight.
        assert_eq!(fill_of(&list, 1), f.style.found_fill);

        let plain = Fixture::new().build(1.0);
        assert_eq!(fill_of(&plain, 0), f.style.land_fill);
    }

    #[test]
    fn test_nothing_highlighted_draws_no_markers() {
        let list = Fixture::new().build(4.0);
        assert!(list.layer(LayerKind::Circles).is_empty());
        assert!(list.layer(LayerKind::Labels).is_empty());
        assert!(list.layer(LayerKind::Capitals).is_empty());
        assert!(list.summary.is_empty());
    }

    #[test]
    fn test_circles_scale_with_log_population() {
        let mut f = Fixture::new();
        f.highlight.add_initial("a");
        f.highlight.add_initial("b");
        let list = f.build(1.0);
        let radii: Vec<f32> = list
            .layer(LayerKind::Circles)
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Circle { radius, .. } => Some(*radius),
                _ => None,
            })
            .collect();
        assert_eq!(radii, vec![f.style.circle_min_radius, f.style.circle_max_radius]);
    }

    #[test]
    fn test_circles_need_highlight_and_population() {
        let circle_centers = |list: &DrawList| -> Vec<Pos2> {
            list.layer(LayerKind::Circles)
                .iter()
                .filter_map(|c| match c {
                    DrawCommand::Circle { center, .. } => Some(*center),
                    _ => None,
                })
                .collect()
        };
        let centroid = |f: &Fixture, id: &str| f.geometry.country(id).unwrap().centroid.unwrap();

        // Beta is highlighted but has no population.
        let mut f = Fixture::new();
        f.reference.insert("008", CountryReferenceRecord::default());
        f.highlight.add_initial("a");
        f.highlight.add_initial("b");
        assert_eq!(circle_centers(&f.build(1.0)), vec![centroid(&f, "004")]);

        // No record at all.
        let mut f = Fixture::new();
        f.reference = ReferenceData::new();
        f.highlight.add_initial("b");
        assert!(circle_centers(&f.build(1.0)).is_empty());

        // Alpha is found but not highlighted.
        let mut f = Fixture::new();
        f.round.found_ids.insert("004".to_string());
        f.highlight.add_initial("b");
        assert_eq!(circle_centers(&f.build(1.0)), vec![centroid(&f, "008")]);
    }

    #[test]
    fn test_equal_populations_use_midpoint() {
        assert_eq!(circle_radius(3.0, (3.0, 3.0), (4.0, 28.0)), 16.0);
        assert_eq!(circle_radius(4.5, (3.0, 6.0), (4.0, 28.0)), 16.0);

        let mut f = Fixture::new();
        f.highlight.add_initial("a");
        let list = f.build(1.0);
        match list.layer(LayerKind::Circles) {
            [DrawCommand::Circle { radius, .. }] => assert_eq!(*radius, 16.0),
            other => panic!("unexpected circles: {:?}", other),
        }
    }

    #[test]
    fn test_capitals_only_above_threshold() {
        let mut f = Fixture::new();
        f.highlight.add_initial("a");
        assert!(f.build(1.0).layer(LayerKind::Capitals).is_empty());

        let zoom = f.style.capital_zoom_threshold * 2.0;
        let list = f.build(zoom);
        let capitals = list.layer(LayerKind::Capitals);
        assert_eq!(capitals.len(), 2);
        match &capitals[1] {
            DrawCommand::Text {
                text, font_size, halo, ..
            } => {
                assert_eq!(text, "Alphaville");
                assert!((font_size * zoom - f.style.capital_font_size).abs() < 1e-4);
                assert!((halo.width * zoom - f.style.capital_halo_width).abs() < 1e-4);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        match &capitals[0] {
            DrawCommand::Circle { radius, .. } => {
                assert!((radius * zoom - f.style.capital_dot_radius).abs() < 1e-4);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_badge_left_of_label_with_zoomed_thumbnail() {
        let mut f = Fixture::new();
        f.highlight.add_initial("a");
        let list = f.build(1.0);

        let (center, url, fallback) = match list.layer(LayerKind::LeaderBadges) {
            [DrawCommand::Badge {
                center,
                image_url,
                fallback,
                ..
            }] => (*center, image_url.clone(), fallback.clone()),
            other => panic!("unexpected badges: {:?}", other),
        };
        let label_pos = match list.layer(LayerKind::Labels) {
            [DrawCommand::Text { pos, text, .. }] => {
                assert_eq!(text, "🏳 Alpha");
                *pos
            }
            other => panic!("unexpected labels: {:?}", other),
        };
        assert!(center.x < label_pos.x);
        assert_eq!(fallback, "AL");
        assert!(url.ends_with("width=64"), "{}", url);

        let zoomed = f.build(4.0);
        match zoomed.layer(LayerKind::LeaderBadges) {
            [DrawCommand::Badge { image_url, .. }] => {
                assert!(image_url.ends_with("width=192"), "{}", image_url)
            }
            other => panic!("unexpected badges: {:?}", other),
        }
    }

    #[test]
    fn test_thumbnail_width_buckets() {
        assert_eq!(thumbnail_width(11.0, 1.0), 64);
        assert_eq!(thumbnail_width(11.0, 4.0), 192);
        assert_eq!(thumbnail_width(11.0, 100.0), 512);
        assert_eq!(thumbnail_width(0.0, 1.0), 32);
    }

    #[test]
    fn test_summary_lists_highlighted_countries() {
        let mut f = Fixture::new();
        f.highlight.add_initial("b");
        f.highlight.add_initial("a");
        let list = f.build(1.0);
        let names: Vec<&str> = list.summary.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        assert_eq!(list.summary[0].population, "1,000 (2023)");
        assert_eq!(list.summary[0].native_name.as_deref(), Some("Alfa"));
        assert_eq!(list.summary[0].capital.as_deref(), Some("Alphaville"));
        assert_eq!(list.summary[0].leader.as_deref(), Some("Ada Lovelace"));
        assert_eq!(list.summary[0].leader_source.as_deref(), Some("wikidata"));
        assert_eq!(list.summary[0].color, Color32::BLUE);
        assert_eq!(list.summary[1].population, "1,000,000");
        assert_eq!(list.summary[1].leader, None);
        assert_eq!(list.summary[1].native_name, None);
    }

    #[test]
    fn test_linework_keeps_screen_width() {
        let f = Fixture::new();
        let list = f.build(2.0);
        match &list.layer(LayerKind::Linework)[0] {
            DrawCommand::Coastline { stroke } => {
                assert!((stroke.width * 2.0 - f.style.coastline.width).abs() < 1e-5)
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
