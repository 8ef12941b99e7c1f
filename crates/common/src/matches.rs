//! Point correspondences between two tiles
//!
//! The wire layout is column-major: `p` and `q` are `[[x0, x1, ..], [y0, y1, ..]]`
//! and `w` holds one weight per point pair. Index `i` of all five arrays
//! describes the same pair.

use crate::{DataError, Result};
use geo::Coord;
use serde::{Deserialize, Serialize};

/// Column-major point list: one array of x values, one array of y values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointColumns(pub Vec<f64>, pub Vec<f64>);

impl PointColumns {
    pub fn from_coords<I>(coords: I) -> Self
    where
        I: IntoIterator<Item = Coord<f64>>,
    {
        let (xs, ys) = coords.into_iter().map(|c| (c.x, c.y)).unzip();
        Self(xs, ys)
    }

    /// Number of complete (x, y) pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len().min(self.1.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.0.len() == self.1.len()
    }

    #[must_use]
    pub fn coords(&self) -> Vec<Coord<f64>> {
        self.0
            .iter()
            .zip(&self.1)
            .map(|(&x, &y)| Coord { x, y })
            .collect()
    }

    /// Keep the points whose mask entry is true, in their original order
    #[must_use]
    pub fn select(&self, mask: &[bool]) -> Self {
        let (xs, ys) = self
            .0
            .iter()
            .zip(&self.1)
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|((&x, &y), _)| (x, y))
            .unzip();
        Self(xs, ys)
    }
}

/// The paired points and weights of one correspondence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchPoints {
    /// Points on the origin tile, tile-local coordinates
    pub p: PointColumns,
    /// Points on the destination tile, tile-local coordinates
    pub q: PointColumns,
    /// One weight per point pair
    pub w: Vec<f64>,
}

impl MatchPoints {
    /// Number of point pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.w.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.w.is_empty()
    }

    #[must_use]
    pub fn is_aligned(&self) -> bool {
        let n = self.w.len();
        self.p.is_aligned() && self.q.is_aligned() && self.p.len() == n && self.q.len() == n
    }

    /// Keep the point pairs and weights whose mask entry is true.
    ///
    /// The caller guarantees `mask.len() == self.len()`.
    #[must_use]
    pub fn select(&self, mask: &[bool]) -> Self {
        Self {
            p: self.p.select(mask),
            q: self.q.select(mask),
            w: self
                .w
                .iter()
                .zip(mask)
                .filter(|&(_, &keep)| keep)
                .map(|(&w, _)| w)
                .collect(),
        }
    }
}

/// A set of point pairs linking a tile in one section to a tile in another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correspondence {
    /// Origin section (group) id
    pub p_group_id: String,
    /// Destination section (group) id
    pub q_group_id: String,
    /// Origin tile id
    pub p_id: String,
    /// Destination tile id
    pub q_id: String,
    pub matches: MatchPoints,
}

impl Correspondence {
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Check that `p`, `q` and `w` describe the same number of point pairs
    pub fn validate(&self) -> Result<()> {
        if self.matches.is_aligned() {
            return Ok(());
        }
        let m = &self.matches;
        Err(DataError::Misaligned {
            p_id: self.p_id.clone(),
            q_id: self.q_id.clone(),
            detail: format!(
                "p has {}x{}, q has {}x{}, w has {}",
                m.p.0.len(),
                m.p.1.len(),
                m.q.0.len(),
                m.q.1.len(),
                m.w.len()
            ),
        })
    }

    /// Same identity (groups and tiles) with a different set of points
    #[must_use]
    pub fn with_matches(&self, matches: MatchPoints) -> Self {
        Self {
            p_group_id: self.p_group_id.clone(),
            q_group_id: self.q_group_id.clone(),
            p_id: self.p_id.clone(),
            q_id: self.q_id.clone(),
            matches,
        }
    }
}
