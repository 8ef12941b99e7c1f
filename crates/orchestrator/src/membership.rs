//! Point-in-region membership
//!
//! Membership uses the DE-9IM "within" predicate: a point lying exactly on a
//! polygon edge or vertex is outside. Tiles meeting at a region seam therefore
//! never both claim a boundary point.

use crate::region::RegionPolygon;
use geo::{Coord, Point, Within};

/// True if `point` lies strictly inside `region` (not on its boundary, not in a hole)
#[must_use]
pub fn is_inside(point: Coord<f64>, region: &RegionPolygon) -> bool {
    Point::from(point).is_within(region.shape())
}

/// Same-length mask of which world points lie inside the region
#[must_use]
pub fn inside_mask(points: &[Coord<f64>], region: &RegionPolygon) -> Vec<bool> {
    points.iter().map(|&p| is_inside(p, region)).collect()
}
