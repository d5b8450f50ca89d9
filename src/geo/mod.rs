//! Map geometry: topology decoding, projections and the projected
//! country geometry cache.
//!
//! - `topology`: TopoJSON parsing, arc stitching and shared-edge meshes
//! - `projection`: named world projections fitted to a viewport
//! - `territories`: stand-in outlines for small territories
//! - `geometry`: view-space country shapes, cached per viewport

mod geometry;
mod projection;
mod territories;
pub(crate) mod topology;

pub use geometry::{
    CountryGeometry, CountryShape, FillMesh, GeometryCache, GeometryKey, ProjectedPolygon,
};
pub use projection::{Projection, ProjectionKind};
pub use territories::{FallbackTerritory, FALLBACK_TERRITORIES};
pub use topology::{MapDataError, MeshFilter, TopoGeometry, Topology};
