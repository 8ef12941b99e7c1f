//! Region-of-interest geometry as stored on disk (GeoJSON geometry objects)

use serde::{Deserialize, Serialize};

/// A GeoJSON `Polygon` or `MultiPolygon` geometry.
///
/// Rings are lists of `[x, y]` positions; the first ring of a polygon is its
/// exterior, any further rings are holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegionShape {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl RegionShape {
    /// Axis-aligned rectangle, handy for tests and synthetic regions
    #[must_use]
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::Polygon {
            coordinates: vec![vec![
                [min_x, min_y],
                [max_x, min_y],
                [max_x, max_y],
                [min_x, max_y],
                [min_x, min_y],
            ]],
        }
    }

    /// Polygons as lists of rings
    #[must_use]
    pub fn polygons(&self) -> Vec<&Vec<Vec<[f64; 2]>>> {
        match self {
            Self::Polygon { coordinates } => vec![coordinates],
            Self::MultiPolygon { coordinates } => coordinates.iter().collect(),
        }
    }
}
