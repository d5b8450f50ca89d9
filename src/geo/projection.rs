//! Map projection and coordinate transformation.
//!
//! Converts geographic coordinates (lon/lat, degrees) to positions in the
//! map's view space. A projection is fitted to the viewport once per
//! geometry rebuild; zoom and pan are applied afterwards by the view
//! transform, not here.

use eframe::egui::{Pos2, Rect};
use geo_types::{Coord, MultiPolygon};
use std::f64::consts::FRAC_PI_4;

/// Latitude beyond which Mercator output is treated as unrepresentable.
const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// Supported world projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProjectionKind {
    /// Natural Earth I pseudo-cylindrical projection
    #[default]
    NaturalEarth1,
    /// Equal Earth equal-area projection
    EqualEarth,
    /// Plate carrée
    Equirectangular,
    /// Spherical Mercator (undefined at the poles)
    Mercator,
}

impl ProjectionKind {
    /// Looks up a projection by name, falling back to the default.
    pub fn from_name(name: &str) -> Self {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "naturalearth1" | "naturalearth" | "natural-earth" => Self::NaturalEarth1,
            "equalearth" | "equal-earth" => Self::EqualEarth,
            "equirectangular" | "platecarree" => Self::Equirectangular,
            "mercator" => Self::Mercator,
            _ => {
                log::debug!("Unknown projection {:?}, using default", name);
                Self::default()
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NaturalEarth1 => "naturalEarth1",
            Self::EqualEarth => "equalEarth",
            Self::Equirectangular => "equirectangular",
            Self::Mercator => "mercator",
        }
    }

    pub fn all() -> &'static [ProjectionKind] {
        &[
            Self::NaturalEarth1,
            Self::EqualEarth,
            Self::Equirectangular,
            Self::Mercator,
        ]
    }

    /// Unscaled projection of (lambda, phi) in radians, y pointing north.
    fn raw(&self, lambda: f64, phi: f64) -> (f64, f64) {
        match self {
            Self::NaturalEarth1 => {
                let phi2 = phi * phi;
                let phi4 = phi2 * phi2;
                let x_scale = 0.8707 - 0.131979 * phi2
                    + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4));
                let y_scale = 1.007226
                    + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4));
                (lambda * x_scale, phi * y_scale)
            }
            Self::EqualEarth => {
                const A1: f64 = 1.340264;
                const A2: f64 = -0.081106;
                const A3: f64 = 0.000893;
                const A4: f64 = 0.003796;
                let m = 3f64.sqrt() / 2.0;
                let l = (m * phi.sin()).asin();
                let l2 = l * l;
                let l6 = l2 * l2 * l2;
                (
                    lambda * l.cos() / (m * (A1 + 3.0 * A2 * l2 + l6 * (7.0 * A3 + 9.0 * A4 * l2))),
                    l * (A1 + A2 * l2 + l6 * (A3 + A4 * l2)),
                )
            }
            Self::Equirectangular => (lambda, phi),
            Self::Mercator if phi.abs() > MERCATOR_MAX_LAT.to_radians() => (lambda, f64::NAN),
            Self::Mercator => (lambda, (FRAC_PI_4 + phi / 2.0).tan().ln()),
        }
    }

    /// Unscaled projection with y flipped to point down, or `None` if the
    /// point cannot be represented.
    fn raw_screen(&self, coord: Coord<f64>) -> Option<(f64, f64)> {
        let (x, y) = self.raw(coord.x.to_radians(), coord.y.to_radians());
        (x.is_finite() && y.is_finite()).then_some((x, -y))
    }
}

/// A projection with a scale and translation fitted to a viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    kind: ProjectionKind,
    scale: f64,
    translate: (f64, f64),
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(ProjectionKind::default())
    }
}

impl Projection {
    pub fn new(kind: ProjectionKind) -> Self {
        Self {
            kind,
            scale: 150.0,
            translate: (480.0, 250.0),
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::new(ProjectionKind::from_name(name))
    }

    /// Converts geographic coordinates (lon, lat) to a view-space position.
    ///
    /// Returns `None` for points the projection cannot represent.
    pub fn project(&self, coord: Coord<f64>) -> Option<Pos2> {
        let (x, y) = self.kind.raw_screen(coord)?;
        let px = self.translate.0 + self.scale * x;
        let py = self.translate.1 + self.scale * y;
        (px.is_finite() && py.is_finite()).then(|| Pos2::new(px as f32, py as f32))
    }

    /// Sets scale and translation so that `shapes` fill `extent`, centred.
    ///
    /// The projection is modified in place. Nothing changes if no shape has a
    /// representable vertex.
    pub fn fit_extent<'a>(
        &mut self,
        extent: Rect,
        shapes: impl IntoIterator<Item = &'a MultiPolygon<f64>>,
    ) {
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);

        for shape in shapes {
            for polygon in &shape.0 {
                let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
                for coord in rings.flat_map(|ring| ring.0.iter()) {
                    if let Some((x, y)) = self.kind.raw_screen(*coord) {
                        min = (min.0.min(x), min.1.min(y));
                        max = (max.0.max(x), max.1.max(y));
                    }
                }
            }
        }

        if !min.0.is_finite() || !max.0.is_finite() {
            log::debug!("fit_extent: no projectable geometry, keeping projection");
            return;
        }

        let width = extent.width() as f64;
        let height = extent.height() as f64;
        let dx = max.0 - min.0;
        let dy = max.1 - min.1;

        let k = match (dx > 0.0, dy > 0.0) {
            (true, true) => (width / dx).min(height / dy),
            (true, false) => width / dx,
            (false, true) => height / dy,
            (false, false) => self.scale,
        };

        self.scale = k;
        self.translate = (
            extent.min.x as f64 + (width - k * (max.0 + min.0)) / 2.0,
            extent.min.y as f64 + (height - k * (max.1 + min.1)) / 2.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;
    use geo_types::polygon;

    fn world() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: -180.0, y: -60.0),
            (x: 180.0, y: -60.0),
            (x: 180.0, y: 80.0),
            (x: -180.0, y: 80.0),
        ]])
    }

    #[test]
    fn test_unknown_name_falls_back_to_default() {
        assert_eq!(ProjectionKind::from_name("gnomonic"), ProjectionKind::NaturalEarth1);
        assert_eq!(ProjectionKind::from_name("Mercator"), ProjectionKind::Mercator);
        assert_eq!(ProjectionKind::from_name("equalEarth"), ProjectionKind::EqualEarth);
    }

    #[test]
    fn test_names_round_trip() {
        for kind in ProjectionKind::all() {
            assert_eq!(ProjectionKind::from_name(kind.name()), *kind);
        }
    }

    #[test]
    fn test_fit_extent_fills_extent() {
        let extent = Rect::from_min_max(pos2(10.0, 10.0), pos2(790.0, 590.0));
        for kind in ProjectionKind::all() {
            let mut projection = Projection::new(*kind);
            let shape = world();
            projection.fit_extent(extent, [&shape]);

            let corners = [(-180.0, -60.0), (180.0, -60.0), (180.0, 80.0), (-180.0, 80.0)];
            let points: Vec<Pos2> = corners
                .iter()
                .map(|&(x, y)| projection.project(Coord { x, y }).unwrap())
                .collect();

            for p in &points {
                assert!(p.x >= 9.9 && p.x <= 790.1, "{:?} x out of extent: {:?}", kind, p);
                assert!(p.y >= 9.9 && p.y <= 590.1, "{:?} y out of extent: {:?}", kind, p);
            }

            // The limiting axis touches both edges.
            let min_x = points.iter().map(|p| p.x).fold(f32::MAX, f32::min);
            let max_x = points.iter().map(|p| p.x).fold(f32::MIN, f32::max);
            let min_y = points.iter().map(|p| p.y).fold(f32::MAX, f32::min);
            let max_y = points.iter().map(|p| p.y).fold(f32::MIN, f32::max);
            let touches_x = (min_x - 10.0).abs() < 0.5 && (max_x - 790.0).abs() < 0.5;
            let touches_y = (min_y - 10.0).abs() < 0.5 && (max_y - 590.0).abs() < 0.5;
            assert!(touches_x || touches_y, "{:?} does not fill extent", kind);
        }
    }

    #[test]
    fn test_north_is_up() {
        let mut projection = Projection::default();
        let shape = world();
        projection.fit_extent(Rect::from_min_max(pos2(0.0, 0.0), pos2(800.0, 600.0)), [&shape]);
        let north = projection.project(Coord { x: 0.0, y: 60.0 }).unwrap();
        let south = projection.project(Coord { x: 0.0, y: -30.0 }).unwrap();
        assert!(north.y < south.y);
        let east = projection.project(Coord { x: 90.0, y: 0.0 }).unwrap();
        assert!(east.x > north.x);
    }

    #[test]
    fn test_mercator_pole_is_unrepresentable() {
        let projection = Projection::new(ProjectionKind::Mercator);
        assert!(projection.project(Coord { x: 0.0, y: 90.0 }).is_none());
        assert!(projection.project(Coord { x: 0.0, y: 45.0 }).is_some());
    }

    #[test]
    fn test_fit_extent_without_geometry_keeps_projection() {
        let mut projection = Projection::default();
        let before = projection.clone();
        let empty = MultiPolygon::<f64>(vec![]);
        projection.fit_extent(Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0)), [&empty]);
        assert_eq!(projection, before);
    }
}
