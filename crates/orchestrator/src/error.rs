//! Error types for the filtering engine

use section_match_common::DataError;
use section_match_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    /// A section has no region resource; there is no default region
    #[error("Missing region for section {section_id}: {detail}")]
    MissingResource { section_id: String, detail: String },

    /// A correspondence names a tile that is not in the fetched specs of its layer
    #[error("Tile {tile_id} not found in layer z={z} of stack {stack}")]
    TileLookup {
        stack: String,
        tile_id: String,
        z: u32,
    },

    #[error("Service call failed: {0}")]
    ServiceCall(#[from] StorageError),

    #[error("Invalid region for section {section_id}: {reason}")]
    InvalidRegion { section_id: String, reason: String },

    #[error("Malformed correspondence: {0}")]
    MalformedCorrespondence(#[from] DataError),

    #[error("Mask has {mask} entries but correspondence has {points} points")]
    MaskLength { mask: usize, points: usize },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;
