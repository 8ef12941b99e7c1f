//! Tile specs and the transform chains that map tile-local to section coordinates

use crate::DataError;
use geo::Coord;
use serde::{Deserialize, Serialize};

/// A single coordinate transform of a tile's chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LeafTransform", into = "LeafTransform")]
pub enum TransformSpec {
    /// `x' = m00 x + m01 y + m02`, `y' = m10 x + m11 y + m12`
    Affine {
        m00: f64,
        m10: f64,
        m01: f64,
        m11: f64,
        m02: f64,
        m12: f64,
    },
    Translation { dx: f64, dy: f64 },
}

const AFFINE_CLASS: &str = "mpicbg.trakem2.transform.AffineModel2D";
const TRANSLATION_CLASS: &str = "mpicbg.trakem2.transform.TranslationModel2D";

impl TransformSpec {
    #[must_use]
    pub fn apply(&self, c: Coord<f64>) -> Coord<f64> {
        match *self {
            Self::Affine {
                m00,
                m10,
                m01,
                m11,
                m02,
                m12,
            } => Coord {
                x: m00 * c.x + m01 * c.y + m02,
                y: m10 * c.x + m11 * c.y + m12,
            },
            Self::Translation { dx, dy } => Coord {
                x: c.x + dx,
                y: c.y + dy,
            },
        }
    }
}

/// Serialized leaf form: a model class name and its whitespace separated parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeafTransform {
    class_name: String,
    data_string: String,
}

fn parse_params(class_name: &str, data: &str, expected: usize) -> Result<Vec<f64>, DataError> {
    let params = data
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DataError::InvalidTransformData {
            class_name: class_name.to_string(),
            detail: e.to_string(),
        })?;
    if params.len() != expected {
        return Err(DataError::InvalidTransformData {
            class_name: class_name.to_string(),
            detail: format!("expected {expected} values, got {}", params.len()),
        });
    }
    Ok(params)
}

impl TryFrom<LeafTransform> for TransformSpec {
    type Error = DataError;

    fn try_from(leaf: LeafTransform) -> Result<Self, Self::Error> {
        let name = leaf.class_name.as_str();
        if name.ends_with("AffineModel2D") {
            let v = parse_params(name, &leaf.data_string, 6)?;
            Ok(Self::Affine {
                m00: v[0],
                m10: v[1],
                m01: v[2],
                m11: v[3],
                m02: v[4],
                m12: v[5],
            })
        } else if name.ends_with("TranslationModel2D") {
            let v = parse_params(name, &leaf.data_string, 2)?;
            Ok(Self::Translation { dx: v[0], dy: v[1] })
        } else {
            Err(DataError::UnsupportedTransform(leaf.class_name))
        }
    }
}

impl From<TransformSpec> for LeafTransform {
    fn from(spec: TransformSpec) -> Self {
        match spec {
            TransformSpec::Affine {
                m00,
                m10,
                m01,
                m11,
                m02,
                m12,
            } => Self {
                class_name: AFFINE_CLASS.to_string(),
                data_string: format!("{m00} {m10} {m01} {m11} {m02} {m12}"),
            },
            TransformSpec::Translation { dx, dy } => Self {
                class_name: TRANSLATION_CLASS.to_string(),
                data_string: format!("{dx} {dy}"),
            },
        }
    }
}

/// Ordered list of transforms, applied first to last
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformChain(pub Vec<TransformSpec>);

impl TransformChain {
    #[must_use]
    pub fn apply(&self, c: Coord<f64>) -> Coord<f64> {
        self.0.iter().fold(c, |acc, t| t.apply(acc))
    }

    #[must_use]
    pub fn apply_all(&self, coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
        coords.iter().map(|&c| self.apply(c)).collect()
    }
}

/// A tile's identity, its layer and the chain mapping its pixels into the section frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSpec {
    pub tile_id: String,
    /// Layer index of the section the tile belongs to
    pub z: u32,
    #[serde(default)]
    pub transforms: TransformChain,
}

impl TileSpec {
    pub fn new(tile_id: impl Into<String>, z: u32, transforms: Vec<TransformSpec>) -> Self {
        Self {
            tile_id: tile_id.into(),
            z,
            transforms: TransformChain(transforms),
        }
    }
}
