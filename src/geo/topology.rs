//! Boundary topology loading.
//!
//! Country boundaries arrive as a TopoJSON document: polygons reference
//! shared arcs by index instead of repeating coordinates, which is what
//! lets us tell coastline (arcs owned by one country) from land borders
//! (arcs shared by two countries).

use crate::data::normalize_json_id;
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Errors raised while loading map input data.
#[derive(Debug, Clone, PartialEq)]
pub enum MapDataError {
    /// The document is not valid JSON or has an unexpected shape.
    Parse(String),
    /// The document parsed but is not a `Topology`.
    NotATopology,
    /// The topology has no geometry collection to draw.
    NoGeometryCollections,
    /// A geometry references an arc that does not exist.
    InvalidArcIndex(i64),
    /// The reference dataset could not be parsed.
    Reference(String),
}

impl std::fmt::Display for MapDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapDataError::Parse(msg) => write!(f, "Failed to parse topology: {}", msg),
            MapDataError::NotATopology => write!(f, "Document is not a Topology"),
            MapDataError::NoGeometryCollections => {
                write!(f, "Topology contains no geometry collections")
            }
            MapDataError::InvalidArcIndex(index) => {
                write!(f, "Geometry references missing arc {}", index)
            }
            MapDataError::Reference(msg) => {
                write!(f, "Failed to parse reference data: {}", msg)
            }
        }
    }
}

impl std::error::Error for MapDataError {}

#[derive(Deserialize)]
struct RawTopology {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    transform: Option<RawTransform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    objects: BTreeMap<String, RawObject>,
}

#[derive(Deserialize)]
struct RawTransform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Deserialize)]
struct RawObject {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    geometries: Vec<RawObject>,
    #[serde(default)]
    arcs: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
}

/// Arc references for one polygon: exterior ring first, then holes.
pub type ArcRings = Vec<Vec<i64>>;

/// A country geometry whose rings are expressed as arc references.
#[derive(Debug, Clone, PartialEq)]
pub struct TopoGeometry {
    /// Normalized country id (empty if the feature has none)
    pub id: String,
    /// Display name from `properties.name` (empty if absent)
    pub name: String,
    /// Polygons, each a list of rings, each a list of arc references
    pub polygons: Vec<ArcRings>,
}

/// Which shared edges [`Topology::mesh`] should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFilter {
    /// Arcs with a single owning geometry (the outer coastline).
    Exterior,
    /// Arcs shared by two different geometries (land borders).
    Interior,
}

/// A decoded topology.
#[derive(Debug, Clone)]
pub struct Topology {
    /// Hash of the source document, used in place of object identity
    signature: u64,
    /// Arcs in absolute (lon, lat) coordinates
    arcs: Vec<Vec<Coord<f64>>>,
    /// Geometry collections by object name
    collections: BTreeMap<String, Vec<TopoGeometry>>,
}

impl Topology {
    /// Parses a TopoJSON document.
    pub fn from_json_str(json: &str) -> Result<Self, MapDataError> {
        let raw: RawTopology =
            serde_json::from_str(json).map_err(|e| MapDataError::Parse(e.to_string()))?;

        if raw.kind != "Topology" {
            return Err(MapDataError::NotATopology);
        }

        let arcs = decode_arcs(&raw.arcs, raw.transform.as_ref());

        let mut collections = BTreeMap::new();
        for (name, object) in raw.objects {
            if object.kind.as_deref() != Some("GeometryCollection") {
                continue;
            }
            let mut geometries = Vec::with_capacity(object.geometries.len());
            for geometry in &object.geometries {
                if let Some(decoded) = decode_geometry(geometry, arcs.len())? {
                    geometries.push(decoded);
                }
            }
            collections.insert(name, geometries);
        }

        let mut hasher = DefaultHasher::new();
        json.hash(&mut hasher);
        let signature = hasher.finish();

        log::info!(
            "Loaded topology: {} arcs, collections {:?}",
            arcs.len(),
            collections.keys().collect::<Vec<_>>()
        );

        Ok(Self {
            signature,
            arcs,
            collections,
        })
    }

    /// Content signature of the source document.
    pub fn signature(&self) -> u64 {
        self.signature
    }

    /// Returns the preferred collection, or the first one available.
    pub fn primary_collection(
        &self,
        preferred: &str,
    ) -> Result<(&str, &[TopoGeometry]), MapDataError> {
        if let Some((name, geometries)) = self.collections.get_key_value(preferred) {
            return Ok((name.as_str(), geometries.as_slice()));
        }
        self.collections
            .iter()
            .next()
            .map(|(name, geometries)| (name.as_str(), geometries.as_slice()))
            .ok_or(MapDataError::NoGeometryCollections)
    }

    /// Resolves a single arc reference; negative references are reversed.
    fn arc(&self, reference: i64) -> (&[Coord<f64>], bool) {
        // Indices were validated on load.
        let coords = self
            .arcs
            .get(arc_index(reference))
            .map(|a| a.as_slice())
            .unwrap_or(&[]);
        (coords, reference < 0)
    }

    /// Stitches a ring of arc references into a coordinate ring.
    pub fn ring_coords(&self, ring: &[i64]) -> Vec<Coord<f64>> {
        let mut out: Vec<Coord<f64>> = Vec::new();
        for &reference in ring {
            let (coords, reversed) = self.arc(reference);
            let mut points: Vec<Coord<f64>> = coords.to_vec();
            if reversed {
                points.reverse();
            }
            // Consecutive arcs share their joining point.
            let skip = usize::from(!out.is_empty());
            out.extend(points.into_iter().skip(skip));
        }
        out
    }

    /// Converts a geometry into a lon/lat multipolygon.
    pub fn to_multi_polygon(&self, geometry: &TopoGeometry) -> MultiPolygon<f64> {
        let polygons = geometry
            .polygons
            .iter()
            .filter_map(|rings| {
                let mut rings = rings.iter().map(|ring| self.ring_coords(ring));
                let exterior = rings.next()?;
                if exterior.len() < 3 {
                    return None;
                }
                let interiors: Vec<LineString<f64>> = rings
                    .filter(|ring| ring.len() >= 3)
                    .map(LineString::from)
                    .collect();
                Some(Polygon::new(LineString::from(exterior), interiors))
            })
            .collect();
        MultiPolygon(polygons)
    }

    /// Extracts shared-edge linework for a set of geometries.
    ///
    /// Each arc is attributed to the geometries referencing it, in order.
    /// [`MeshFilter::Exterior`] keeps arcs whose first and last owner are the
    /// same geometry, [`MeshFilter::Interior`] keeps arcs whose owners differ.
    /// Geometries left out of `geometries` do not own anything, so an arc
    /// shared with an omitted country becomes exterior.
    pub fn mesh(&self, geometries: &[&TopoGeometry], filter: MeshFilter) -> Vec<LineString<f64>> {
        let mut owners: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (geometry_index, geometry) in geometries.iter().enumerate() {
            for reference in geometry.polygons.iter().flatten().flatten() {
                let entry = owners.entry(arc_index(*reference)).or_default();
                if entry.last() != Some(&geometry_index) {
                    entry.push(geometry_index);
                }
            }
        }

        owners
            .into_iter()
            .filter(|(_, owners)| {
                let first = owners.first();
                let last = owners.last();
                match filter {
                    MeshFilter::Exterior => first == last,
                    MeshFilter::Interior => first != last,
                }
            })
            .filter_map(|(arc_index, _)| {
                let coords = self.arcs.get(arc_index)?;
                (coords.len() >= 2).then(|| LineString::from(coords.clone()))
            })
            .collect()
    }
}

/// Arc index of a reference; `~i` refers to arc `i` traversed backwards.
fn arc_index(reference: i64) -> usize {
    if reference < 0 {
        (!reference) as usize
    } else {
        reference as usize
    }
}

fn decode_arcs(raw: &[Vec<Vec<f64>>], transform: Option<&RawTransform>) -> Vec<Vec<Coord<f64>>> {
    raw.iter()
        .map(|arc| {
            let points = arc.iter().filter(|p| p.len() >= 2);
            match transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    points
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            Coord {
                                x: x * t.scale[0] + t.translate[0],
                                y: y * t.scale[1] + t.translate[1],
                            }
                        })
                        .collect()
                }
                None => points.map(|p| Coord { x: p[0], y: p[1] }).collect(),
            }
        })
        .collect()
}

fn decode_geometry(
    object: &RawObject,
    arc_count: usize,
) -> Result<Option<TopoGeometry>, MapDataError> {
    let polygons: Vec<ArcRings> = match (object.kind.as_deref(), object.arcs.as_ref()) {
        (Some("Polygon"), Some(arcs)) => vec![parse_rings(arcs)?],
        (Some("MultiPolygon"), Some(Value::Array(polys))) => polys
            .iter()
            .map(parse_rings)
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Ok(None),
    };

    for reference in polygons.iter().flatten().flatten() {
        if arc_index(*reference) >= arc_count {
            return Err(MapDataError::InvalidArcIndex(*reference));
        }
    }

    let id = object
        .id
        .as_ref()
        .and_then(normalize_json_id)
        .unwrap_or_default();
    let name = object
        .properties
        .as_ref()
        .and_then(|p| p.get("name"))
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    Ok(Some(TopoGeometry { id, name, polygons }))
}

fn parse_rings(value: &Value) -> Result<ArcRings, MapDataError> {
    let Value::Array(rings) = value else {
        return Err(MapDataError::Parse("polygon arcs must be an array".into()));
    };
    rings
        .iter()
        .map(|ring| {
            let Value::Array(refs) = ring else {
                return Err(MapDataError::Parse("ring arcs must be an array".into()));
            };
            refs.iter()
                .map(|r| {
                    r.as_i64().ok_or_else(|| {
                        MapDataError::Parse("arc reference must be an integer".into())
                    })
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two unit squares sharing the edge x = 1, plus a point layer.
    pub(crate) const TWO_SQUARES: &str = r#"{
        "type": "Topology",
        "arcs": [
            [[1, 0], [1, 1]],
            [[1, 1], [0, 1], [0, 0], [1, 0]],
            [[1, 0], [2, 0], [2, 1], [1, 1]]
        ],
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "id": 4, "arcs": [[0, 1]], "properties": {"name": "Alpha"}},
                    {"type": "Polygon", "id": "8", "arcs": [[2, -1]], "properties": {"name": "Beta"}},
                    {"type": null}
                ]
            },
            "land": {"type": "GeometryCollection", "geometries": []}
        }
    }"#;

    #[test]
    fn test_parses_geometries() {
        let topology = Topology::from_json_str(TWO_SQUARES).unwrap();
        let (name, geometries) = topology.primary_collection("countries").unwrap();
        assert_eq!(name, "countries");
        assert_eq!(geometries.len(), 2);
        assert_eq!(geometries[0].id, "004");
        assert_eq!(geometries[1].id, "008");
        assert_eq!(geometries[1].name, "Beta");
    }

    #[test]
    fn test_primary_collection_falls_back_to_first() {
        let topology = Topology::from_json_str(TWO_SQUARES).unwrap();
        let (name, _) = topology.primary_collection("missing").unwrap();
        assert_eq!(name, "countries");
    }

    #[test]
    fn test_no_collections_is_an_error() {
        let topology =
            Topology::from_json_str(r#"{"type": "Topology", "arcs": [], "objects": {}}"#).unwrap();
        assert_eq!(
            topology.primary_collection("countries").unwrap_err(),
            MapDataError::NoGeometryCollections
        );
    }

    #[test]
    fn test_rejects_non_topology() {
        assert_eq!(
            Topology::from_json_str(r#"{"type": "FeatureCollection"}"#).unwrap_err(),
            MapDataError::NotATopology
        );
        assert!(matches!(
            Topology::from_json_str("nope"),
            Err(MapDataError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_missing_arc() {
        let json = r#"{
            "type": "Topology",
            "arcs": [[[0, 0], [1, 1]]],
            "objects": {"c": {"type": "GeometryCollection", "geometries": [
                {"type": "Polygon", "arcs": [[0, 3]]}
            ]}}
        }"#;
        assert_eq!(
            Topology::from_json_str(json).unwrap_err(),
            MapDataError::InvalidArcIndex(3)
        );
    }

    #[test]
    fn test_ring_stitching_reverses_negative_arcs() {
        let topology = Topology::from_json_str(TWO_SQUARES).unwrap();
        let ring = topology.ring_coords(&[2, -1]);
        let expected: Vec<Coord<f64>> = [(1., 0.), (2., 0.), (2., 1.), (1., 1.), (1., 0.)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect();
        assert_eq!(ring, expected);
    }

    #[test]
    fn test_quantized_arcs_are_delta_decoded() {
        let json = r#"{
            "type": "Topology",
            "transform": {"scale": [0.5, 2.0], "translate": [10.0, -5.0]},
            "arcs": [[[2, 1], [2, 0], [0, 3]]],
            "objects": {}
        }"#;
        let topology = Topology::from_json_str(json).unwrap();
        let ring = topology.ring_coords(&[0]);
        assert_eq!(
            ring,
            vec![
                Coord { x: 11.0, y: -3.0 },
                Coord { x: 12.0, y: -3.0 },
                Coord { x: 12.0, y: 3.0 },
            ]
        );
    }

    #[test]
    fn test_mesh_separates_coastline_from_borders() {
        let topology = Topology::from_json_str(TWO_SQUARES).unwrap();
        let (_, geometries) = topology.primary_collection("countries").unwrap();
        let all: Vec<&TopoGeometry> = geometries.iter().collect();

        let borders = topology.mesh(&all, MeshFilter::Interior);
        assert_eq!(borders.len(), 1);
        assert_eq!(borders[0].0.len(), 2);

        let coastline = topology.mesh(&all, MeshFilter::Exterior);
        assert_eq!(coastline.len(), 2);

        // Dropping Beta turns the shared edge into coastline.
        let alpha_only = vec![&geometries[0]];
        assert!(topology.mesh(&alpha_only, MeshFilter::Interior).is_empty());
        assert_eq!(topology.mesh(&alpha_only, MeshFilter::Exterior).len(), 2);
    }

    #[test]
    fn test_signature_tracks_content() {
        let a = Topology::from_json_str(TWO_SQUARES).unwrap();
        let b = Topology::from_json_str(TWO_SQUARES).unwrap();
        assert_eq!(a.signature(), b.signature());
        let c = Topology::from_json_str(r#"{"type": "Topology", "objects": {}}"#).unwrap();
        assert_ne!(a.signature(), c.signature());
    }
}
