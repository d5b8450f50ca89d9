//! Projected country geometry and its cache.
//!
//! Fitting the projection, extracting coastline/border meshes and
//! triangulating fills are the expensive steps of drawing the map. They only
//! depend on the topology, the viewport size, the exclusion list and the
//! projection settings, so the result is built once per distinct
//! [`GeometryKey`] and shared behind an `Arc` until one of those changes.

use super::projection::{Projection, ProjectionKind};
use super::territories::FALLBACK_TERRITORIES;
use super::topology::{MapDataError, MeshFilter, TopoGeometry, Topology};
use crate::config::MapConfig;
use crate::data::initial_of;
use earcutr::earcut;
use eframe::egui::{pos2, Pos2, Rect, Vec2};
use geo_types::{Coord, LineString, MultiPolygon};
use std::sync::Arc;

/// Everything the projected geometry depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    /// Content signature of the topology document
    pub topology_signature: u64,
    pub collection: String,
    /// Viewport width and height as `f32` bits
    pub viewport: (u32, u32),
    /// Order-independent serialized exclusion list
    pub exclusions: String,
    pub projection: ProjectionKind,
    /// Fit padding as `f32` bits
    pub fit_padding: u32,
}

impl GeometryKey {
    pub fn new(topology: &Topology, width: f32, height: f32, config: &MapConfig) -> Self {
        Self {
            topology_signature: topology.signature(),
            collection: config.projection.preferred_collection.clone(),
            viewport: (width.to_bits(), height.to_bits()),
            exclusions: config.exclusions.signature(),
            projection: ProjectionKind::from_name(&config.projection.name),
            fit_padding: config.projection.fit_padding.to_bits(),
        }
    }
}

/// One projected polygon: an exterior ring followed by its holes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPolygon {
    pub exterior: Vec<Pos2>,
    pub holes: Vec<Vec<Pos2>>,
}

impl ProjectedPolygon {
    fn rings(&self) -> impl Iterator<Item = &[Pos2]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(|h| h.as_slice()))
    }
}

/// Triangulated fill of a country in view space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillMesh {
    pub vertices: Vec<Pos2>,
    /// Triangle list, three indices per triangle
    pub indices: Vec<u32>,
}

impl FillMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A visible country, projected into view space.
#[derive(Debug, Clone)]
pub struct CountryShape {
    /// Normalized country id
    pub id: String,
    pub name: String,
    /// Lowercase initial the country is grouped under
    pub initial: Option<char>,
    pub polygons: Vec<ProjectedPolygon>,
    pub fill: FillMesh,
    /// Area-weighted centroid, used to anchor labels and circles
    pub centroid: Option<Pos2>,
    pub bounds: Rect,
    /// True for built-in stand-ins of territories missing from the topology
    pub synthetic: bool,
}

impl CountryShape {
    /// Even-odd containment test over all rings.
    pub fn contains(&self, point: Pos2) -> bool {
        if !self.bounds.contains(point) {
            return false;
        }
        let crossings = self
            .polygons
            .iter()
            .flat_map(|p| p.rings())
            .filter(|ring| ring_contains(ring, point))
            .count();
        crossings % 2 == 1
    }
}

/// Projected geometry for one (topology, viewport, exclusions, projection).
#[derive(Debug, Clone)]
pub struct CountryGeometry {
    /// Visible countries in draw order
    pub countries: Vec<CountryShape>,
    /// Arcs owned by a single visible country
    pub coastline: Vec<Vec<Pos2>>,
    /// Arcs shared by two visible countries
    pub borders: Vec<Vec<Pos2>>,
    /// Projection fitted to the viewport
    pub projection: Projection,
    pub viewport: Vec2,
}

/// Country feature before projection.
struct SourceFeature<'a> {
    id: String,
    name: String,
    shape: MultiPolygon<f64>,
    topo: Option<&'a TopoGeometry>,
}

impl CountryGeometry {
    /// Projects the primary collection of `topology` into a `width` x `height`
    /// viewport.
    pub fn build(
        topology: &Topology,
        width: f32,
        height: f32,
        config: &MapConfig,
    ) -> Result<Self, MapDataError> {
        let (collection, geometries) =
            topology.primary_collection(&config.projection.preferred_collection)?;

        let mut features: Vec<SourceFeature> = geometries
            .iter()
            .map(|g| SourceFeature {
                id: g.id.clone(),
                name: g.name.clone(),
                shape: topology.to_multi_polygon(g),
                topo: Some(g),
            })
            .collect();

        if config.exclusions.include_fallback_territories {
            for territory in FALLBACK_TERRITORIES.iter() {
                if geometries.iter().any(|g| territory.matches(&g.id, &g.name)) {
                    continue;
                }
                features.push(SourceFeature {
                    id: territory.id.to_string(),
                    name: territory.name.to_string(),
                    shape: territory.shape(),
                    topo: None,
                });
            }
        }

        features.retain(|f| !config.exclusions.excludes(&f.id, &f.name));

        let padding = config.projection.fit_padding.max(0.0);
        let extent = Rect::from_min_max(
            pos2(padding, padding),
            pos2(
                (width - padding).max(padding),
                (height - padding).max(padding),
            ),
        );
        let mut projection = Projection::from_name(&config.projection.name);
        projection.fit_extent(extent, features.iter().map(|f| &f.shape));

        let visible_topo: Vec<&TopoGeometry> = features.iter().filter_map(|f| f.topo).collect();
        let mut coastline = project_lines(
            &projection,
            &topology.mesh(&visible_topo, MeshFilter::Exterior),
        );
        let borders = project_lines(
            &projection,
            &topology.mesh(&visible_topo, MeshFilter::Interior),
        );

        let mut countries = Vec::with_capacity(features.len());
        for feature in &features {
            let Some(shape) = project_country(&projection, feature) else {
                log::debug!("Skipping {:?}: nothing projectable", feature.name);
                continue;
            };
            if shape.synthetic {
                coastline.extend(shape.polygons.iter().map(|p| closed(&p.exterior)));
            }
            countries.push(shape);
        }

        log::info!(
            "Built geometry for {} countries from {:?} at {}x{} ({} coastline arcs, {} border arcs)",
            countries.len(),
            collection,
            width,
            height,
            coastline.len(),
            borders.len()
        );

        Ok(Self {
            countries,
            coastline,
            borders,
            projection,
            viewport: Vec2::new(width, height),
        })
    }

    pub fn country(&self, id: &str) -> Option<&CountryShape> {
        self.countries.iter().find(|c| c.id == id)
    }

    /// Topmost visible country containing a view-space point.
    pub fn country_at(&self, point: Pos2) -> Option<&CountryShape> {
        self.countries.iter().rev().find(|c| c.contains(point))
    }

    /// Projects a geographic position with the fitted projection.
    pub fn project(&self, lon: f64, lat: f64) -> Option<Pos2> {
        self.projection.project(Coord { x: lon, y: lat })
    }
}

fn project_ring(projection: &Projection, ring: &LineString<f64>) -> Vec<Pos2> {
    let mut points: Vec<Pos2> = ring.0.iter().filter_map(|c| projection.project(*c)).collect();
    drop_closing_duplicate(&mut points);
    points
}

fn project_lines(projection: &Projection, lines: &[LineString<f64>]) -> Vec<Vec<Pos2>> {
    lines
        .iter()
        .map(|line| line.0.iter().filter_map(|c| projection.project(*c)).collect::<Vec<_>>())
        .filter(|points| points.len() >= 2)
        .collect()
}

fn project_country(projection: &Projection, feature: &SourceFeature) -> Option<CountryShape> {
    let polygons: Vec<ProjectedPolygon> = feature
        .shape
        .0
        .iter()
        .filter_map(|polygon| {
            let exterior = project_ring(projection, polygon.exterior());
            if exterior.len() < 3 {
                return None;
            }
            let holes = polygon
                .interiors()
                .iter()
                .map(|ring| project_ring(projection, ring))
                .filter(|ring| ring.len() >= 3)
                .collect();
            Some(ProjectedPolygon { exterior, holes })
        })
        .collect();

    if polygons.is_empty() {
        return None;
    }

    let bounds = polygons
        .iter()
        .flat_map(|p| p.exterior.iter())
        .fold(Rect::NOTHING, |rect, p| rect.union(Rect::from_min_max(*p, *p)));

    Some(CountryShape {
        id: feature.id.clone(),
        name: feature.name.clone(),
        initial: initial_of(&feature.name),
        fill: triangulate(&polygons),
        centroid: centroid(&polygons),
        bounds,
        polygons,
        synthetic: feature.topo.is_none(),
    })
}

fn drop_closing_duplicate(points: &mut Vec<Pos2>) {
    if points.len() >= 2 {
        let first = points[0];
        if let Some(last) = points.last() {
            if (first.x - last.x).abs() < 1e-6 && (first.y - last.y).abs() < 1e-6 {
                points.pop();
            }
        }
    }
}

fn closed(ring: &[Pos2]) -> Vec<Pos2> {
    let mut out = ring.to_vec();
    if let Some(first) = ring.first() {
        out.push(*first);
    }
    out
}

/// Triangulates every polygon into a single mesh.
fn triangulate(polygons: &[ProjectedPolygon]) -> FillMesh {
    let mut mesh = FillMesh::default();

    for polygon in polygons {
        let mut coords: Vec<f64> = Vec::new();
        let mut hole_indices: Vec<usize> = Vec::new();
        let mut vertices: Vec<Pos2> = Vec::new();

        for (ring_index, ring) in polygon.rings().enumerate() {
            if ring_index > 0 {
                hole_indices.push(vertices.len());
            }
            for p in ring {
                coords.push(p.x as f64);
                coords.push(p.y as f64);
                vertices.push(*p);
            }
        }

        let indices = match earcut(&coords, &hole_indices, 2) {
            Ok(ix) => ix,
            Err(e) => {
                log::debug!("Triangulation failed: {:?}", e);
                continue;
            }
        };

        let offset = mesh.vertices.len() as u32;
        mesh.indices.extend(indices.into_iter().map(|i| offset + i as u32));
        mesh.vertices.extend(vertices);
    }

    mesh
}

/// Signed area and area-weighted centroid sum of a ring.
fn ring_moments(ring: &[Pos2]) -> (f64, f64, f64) {
    let mut area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        let (ax, ay, bx, by) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
        let cross = ax * by - bx * ay;
        area += cross;
        cx += (ax + bx) * cross;
        cy += (ay + by) * cross;
    }
    (area / 2.0, cx, cy)
}

/// Area-weighted centroid; holes subtract. Falls back to the vertex average
/// for degenerate shapes.
fn centroid(polygons: &[ProjectedPolygon]) -> Option<Pos2> {
    let mut total_area = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;

    for polygon in polygons {
        for (ring_index, ring) in polygon.rings().enumerate() {
            let (area, cx, cy) = ring_moments(ring);
            if area == 0.0 {
                continue;
            }
            // Moments are signed by winding; normalize so the exterior adds and holes subtract.
            let role = if ring_index == 0 { 1.0 } else { -1.0 };
            let sign = role * area.signum();
            total_area += sign * area;
            sum_x += sign * cx / 6.0;
            sum_y += sign * cy / 6.0;
        }
    }

    if total_area.abs() > 1e-9 {
        let c = pos2((sum_x / total_area) as f32, (sum_y / total_area) as f32);
        if c.x.is_finite() && c.y.is_finite() {
            return Some(c);
        }
    }

    let points: Vec<&Pos2> = polygons.iter().flat_map(|p| p.exterior.iter()).collect();
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let sum = points.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
    Some((sum / n).to_pos2())
}

fn ring_contains(ring: &[Pos2], point: Pos2) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Single-entry memo of the last built geometry.
#[derive(Default)]
pub struct GeometryCache {
    entry: Option<(GeometryKey, Arc<CountryGeometry>)>,
    recomputations: usize,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns geometry for the inputs, rebuilding only when the key changed.
    pub fn get_geometry(
        &mut self,
        topology: &Topology,
        width: f32,
        height: f32,
        config: &MapConfig,
    ) -> Result<Arc<CountryGeometry>, MapDataError> {
        let key = GeometryKey::new(topology, width, height, config);

        if let Some((cached_key, geometry)) = &self.entry {
            if *cached_key == key {
                log::debug!("Geometry cache hit");
                return Ok(Arc::clone(geometry));
            }
        }

        log::info!("Geometry cache miss, rebuilding for {}x{}", width, height);
        let geometry = Arc::new(CountryGeometry::build(topology, width, height, config)?);
        self.recomputations += 1;
        self.entry = Some((key, Arc::clone(&geometry)));
        Ok(geometry)
    }

    /// Number of rebuilds so far.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}
