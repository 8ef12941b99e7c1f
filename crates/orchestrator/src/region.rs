//! Region table: layer index and region-of-interest polygon for every section of a stack

use crate::error::{FilterError, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use section_match_common::RegionShape;
use section_match_storage::{RegionStore, StorageError, TileService};
use std::collections::HashMap;
use tracing::{debug, info};

/// A section's trusted area in its world coordinate frame
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPolygon {
    shape: MultiPolygon<f64>,
}

fn ring(section_id: &str, positions: &[[f64; 2]]) -> Result<LineString<f64>> {
    let invalid = |reason: String| FilterError::InvalidRegion {
        section_id: section_id.to_string(),
        reason,
    };
    if positions.iter().flatten().any(|v| !v.is_finite()) {
        return Err(invalid("ring has non-finite coordinates".to_string()));
    }
    let mut distinct = positions.len();
    if positions.len() > 1 && positions.first() == positions.last() {
        distinct -= 1;
    }
    if distinct < 3 {
        return Err(invalid(format!("ring has {distinct} distinct positions, need 3")));
    }
    Ok(LineString::from(
        positions
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect::<Vec<_>>(),
    ))
}

impl RegionPolygon {
    /// Convert a stored GeoJSON geometry, validating every ring
    pub fn from_shape(section_id: &str, shape: &RegionShape) -> Result<Self> {
        let mut polygons = Vec::new();
        for rings in shape.polygons() {
            let (exterior, holes) = rings.split_first().ok_or_else(|| FilterError::InvalidRegion {
                section_id: section_id.to_string(),
                reason: "polygon without exterior ring".to_string(),
            })?;
            let holes = holes
                .iter()
                .map(|h| ring(section_id, h))
                .collect::<Result<Vec<_>>>()?;
            polygons.push(Polygon::new(ring(section_id, exterior)?, holes));
        }
        if polygons.is_empty() {
            return Err(FilterError::InvalidRegion {
                section_id: section_id.to_string(),
                reason: "geometry has no polygons".to_string(),
            });
        }
        Ok(Self {
            shape: MultiPolygon::new(polygons),
        })
    }

    #[must_use]
    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }
}

/// Per-section layer index and region, built once per run and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    z_lookup: HashMap<String, u32>,
    regions: HashMap<String, RegionPolygon>,
}

impl RegionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, section_id: impl Into<String>, z: u32, region: RegionPolygon) {
        let section_id = section_id.into();
        self.z_lookup.insert(section_id.clone(), z);
        self.regions.insert(section_id, region);
    }

    /// Layer index of a section
    pub fn z(&self, section_id: &str) -> Result<u32> {
        self.z_lookup
            .get(section_id)
            .copied()
            .ok_or_else(|| FilterError::MissingResource {
                section_id: section_id.to_string(),
                detail: "section is not part of the stack".to_string(),
            })
    }

    /// Region of a section
    pub fn region(&self, section_id: &str) -> Result<&RegionPolygon> {
        self.regions
            .get(section_id)
            .ok_or_else(|| FilterError::MissingResource {
                section_id: section_id.to_string(),
                detail: "no region loaded for section".to_string(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The companion section id -> layer index mapping
    #[must_use]
    pub fn z_lookup(&self) -> &HashMap<String, u32> {
        &self.z_lookup
    }
}

/// Load the layer index and region of every section in `stack`.
///
/// A section without a region resource fails the whole build.
pub fn build_region_table(
    tiles: &dyn TileService,
    regions: &dyn RegionStore,
    stack: &str,
) -> Result<RegionTable> {
    let sections = tiles.sections(stack)?;
    info!("Loading regions for {} sections of {}", sections.len(), stack);

    let mut table = RegionTable::new();
    for section in sections {
        let shape = regions
            .region_for_z(stack, section.z)
            .map_err(|e| match e {
                StorageError::NotFound(what) => FilterError::MissingResource {
                    section_id: section.section_id.clone(),
                    detail: format!("z={} ({what})", section.z),
                },
                other => FilterError::ServiceCall(other),
            })?;
        let polygon = RegionPolygon::from_shape(&section.section_id, &shape)?;
        debug!(
            "Section {} z={} region with {} polygon(s)",
            section.section_id,
            section.z,
            polygon.shape().0.len()
        );
        table.insert(section.section_id, section.z, polygon);
    }
    Ok(table)
}
