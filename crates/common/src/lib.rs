//! Shared data model for section match filtering
//!
//! Point correspondences, tile specs with their transform chains, section
//! descriptors and region geometries as they travel between the match store,
//! the tile service and the filtering engine.

use thiserror::Error;

pub mod matches;
pub mod region;
pub mod section;
pub mod tile;

pub use geo::Coord;
pub use matches::{Correspondence, MatchPoints, PointColumns};
pub use region::RegionShape;
pub use section::SectionData;
pub use tile::{TileSpec, TransformChain, TransformSpec};

/// Data model errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    #[error("Misaligned correspondence {p_id} -> {q_id}: {detail}")]
    Misaligned {
        p_id: String,
        q_id: String,
        detail: String,
    },

    #[error("Unsupported transform class: {0}")]
    UnsupportedTransform(String),

    #[error("Invalid transform data for {class_name}: {detail}")]
    InvalidTransformData { class_name: String, detail: String },
}

/// Result type for data model operations
pub type Result<T> = std::result::Result<T, DataError>;
