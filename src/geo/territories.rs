//! Built-in outlines for small territories.
//!
//! Low-resolution world topologies routinely drop island states and
//! micro-states entirely, which would make them impossible to find in the
//! game. These stand-ins are small regular polygons at each territory's real
//! location and are only used when the topology has no matching feature.

use geo_types::{Coord, LineString, MultiPolygon, Polygon};

/// A small territory that may be missing from the topology.
#[derive(Debug, Clone, Copy)]
pub struct FallbackTerritory {
    /// ISO 3166 numeric id
    pub id: &'static str,
    pub name: &'static str,
    pub lon: f64,
    pub lat: f64,
    /// Stand-in polygon radius in degrees
    pub radius_deg: f64,
}

const fn territory(
    id: &'static str,
    name: &'static str,
    lon: f64,
    lat: f64,
    radius_deg: f64,
) -> FallbackTerritory {
    FallbackTerritory {
        id,
        name,
        lon,
        lat,
        radius_deg,
    }
}

pub const FALLBACK_TERRITORIES: [FallbackTerritory; 12] = [
    territory("702", "Singapore", 103.82, 1.35, 0.25),
    territory("048", "Bahrain", 50.55, 26.07, 0.25),
    territory("470", "Malta", 14.45, 35.9, 0.2),
    territory("480", "Mauritius", 57.55, -20.3, 0.3),
    territory("462", "Maldives", 73.5, 3.2, 0.3),
    territory("020", "Andorra", 1.6, 42.55, 0.12),
    territory("438", "Liechtenstein", 9.55, 47.16, 0.1),
    territory("492", "Monaco", 7.42, 43.74, 0.08),
    territory("674", "San Marino", 12.46, 43.94, 0.08),
    territory("052", "Barbados", -59.55, 13.19, 0.2),
    territory("690", "Seychelles", 55.45, -4.68, 0.25),
    territory("308", "Grenada", -61.68, 12.12, 0.15),
];

const SIDES: usize = 8;

impl FallbackTerritory {
    /// Octagon around the territory's location.
    pub fn shape(&self) -> MultiPolygon<f64> {
        let ring: Vec<Coord<f64>> = (0..SIDES)
            .map(|i| {
                let angle = (i as f64) * std::f64::consts::TAU / SIDES as f64;
                Coord {
                    x: self.lon + self.radius_deg * angle.cos(),
                    y: self.lat + self.radius_deg * angle.sin(),
                }
            })
            .collect();
        MultiPolygon(vec![Polygon::new(LineString::from(ring), vec![])])
    }

    /// True if an existing feature already represents this territory.
    pub fn matches(&self, id: &str, name: &str) -> bool {
        id == self.id || name.trim().eq_ignore_ascii_case(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_is_closed_around_location() {
        let singapore = FALLBACK_TERRITORIES[0];
        let shape = singapore.shape();
        assert_eq!(shape.0.len(), 1);
        let exterior = shape.0[0].exterior();
        // Polygon::new closes the ring.
        assert_eq!(exterior.0.len(), SIDES + 1);
        assert_eq!(exterior.0.first(), exterior.0.last());
        for c in &exterior.0 {
            let d = ((c.x - singapore.lon).powi(2) + (c.y - singapore.lat).powi(2)).sqrt();
            assert!((d - singapore.radius_deg).abs() < 1e-9);
        }
    }

    #[test]
    fn test_matches_by_id_or_name() {
        let malta = FALLBACK_TERRITORIES[2];
        assert!(malta.matches("470", ""));
        assert!(malta.matches("", "malta"));
        assert!(!malta.matches("380", "Italy"));
    }
}
