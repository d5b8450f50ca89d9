//! Draw instructions produced by the render pipeline.
//!
//! Positions and sizes are in view space (the unzoomed, projected map). The
//! surface applies [`DrawList::transform`] when painting: positions map
//! through `pan + zoom * p` and sizes scale by `zoom`.

use super::summary::SummaryEntry;
use crate::geo::CountryGeometry;
use crate::state::ViewTransform;
use eframe::egui::{Align2, Color32, Pos2, Stroke};
use std::sync::Arc;

/// Visual layers, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    Background,
    Linework,
    CountryFills,
    Capitals,
    Circles,
    LeaderBadges,
    Labels,
}

impl LayerKind {
    /// Paint order.
    pub const ORDER: [LayerKind; 7] = [
        LayerKind::Background,
        LayerKind::Linework,
        LayerKind::CountryFills,
        LayerKind::Capitals,
        LayerKind::Circles,
        LayerKind::LeaderBadges,
        LayerKind::Labels,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole surface
    Background { color: Color32 },
    /// Every coastline arc of the geometry
    Coastline { stroke: Stroke },
    /// Every border arc of the geometry
    Borders { stroke: Stroke },
    /// Country at `index` in the geometry's country list
    FillCountry {
        index: usize,
        fill: Color32,
        stroke: Stroke,
    },
    Circle {
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: Stroke,
    },
    Text {
        pos: Pos2,
        text: String,
        font_size: f32,
        color: Color32,
        /// Outline drawn behind the text for legibility
        halo: Stroke,
        anchor: Align2,
    },
    /// Circular leader photo; `fallback` is shown until the image loads
    Badge {
        center: Pos2,
        radius: f32,
        image_url: String,
        stroke: Stroke,
        fallback: String,
    },
}

#[derive(Debug, Clone)]
pub struct DrawLayer {
    pub kind: LayerKind,
    pub commands: Vec<DrawCommand>,
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone)]
pub struct DrawList {
    pub transform: ViewTransform,
    pub geometry: Arc<CountryGeometry>,
    /// One entry per [`LayerKind`], in [`LayerKind::ORDER`]
    pub layers: Vec<DrawLayer>,
    /// Highlighted countries, sorted by name
    pub summary: Vec<SummaryEntry>,
}

impl DrawList {
    pub fn new(transform: ViewTransform, geometry: Arc<CountryGeometry>) -> Self {
        Self {
            transform,
            geometry,
            layers: LayerKind::ORDER
                .iter()
                .map(|kind| DrawLayer {
                    kind: *kind,
                    commands: Vec::new(),
                })
                .collect(),
            summary: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: LayerKind, command: DrawCommand) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.kind == kind) {
            layer.commands.push(command);
        }
    }

    pub fn layer(&self, kind: LayerKind) -> &[DrawCommand] {
        self.layers
            .iter()
            .find(|l| l.kind == kind)
            .map(|l| l.commands.as_slice())
            .unwrap_or(&[])
    }

    /// All commands in paint order.
    pub fn commands(&self) -> impl Iterator<Item = (LayerKind, &DrawCommand)> {
        self.layers
            .iter()
            .flat_map(|l| l.commands.iter().map(move |c| (l.kind, c)))
    }

    pub fn command_count(&self) -> usize {
        self.layers.iter().map(|l| l.commands.len()).sum()
    }
}
