//! Collaborator contracts for section match filtering
//!
//! The filtering engine talks to three external services:
//! - **Match store**: point correspondences grouped into named collections
//! - **Tile service**: section layer indices, tile specs and local-to-world
//!   coordinate mapping for a stack
//! - **Region store**: one region-of-interest geometry per section layer
//!
//! Each is a synchronous, thread-safe trait so the engine can call it from
//! any worker of its pool. Two families of implementations live here:
//! in-memory stores ([`memory`]) and directory-backed stores ([`directory`])
//! that read and write the JSON layouts of a project on disk.
//!
//! # Example
//!
//! ```rust,no_run
//! use section_match_storage::{DirectoryProject, MatchStore, TileService};
//!
//! fn main() -> section_match_storage::StorageResult<()> {
//!     let project = DirectoryProject::new("/data/project");
//!
//!     let sections = project.sections("ALIGNED_STACK")?;
//!     let groups = project.origin_group_ids("raw_matches")?;
//!     println!("{} sections, {} origin groups", sections.len(), groups.len());
//!
//!     Ok(())
//! }
//! ```

use section_match_common::{Coord, Correspondence, DataError, RegionShape, SectionData, TileSpec};
use thiserror::Error;

pub mod directory;
pub mod memory;

pub use directory::{DirectoryProject, DirectoryRegionStore};
pub use memory::{InMemoryMatchStore, InMemoryRegionStore, InMemoryTileService};

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data in {location}: {source}")]
    InvalidData {
        location: String,
        #[source]
        source: DataError,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Point match storage, organized as collections of correspondences
pub trait MatchStore: Send + Sync {
    /// Distinct origin group ids present in a collection
    fn origin_group_ids(&self, collection: &str) -> StorageResult<Vec<String>>;

    /// All correspondences whose origin group is `p_group_id`
    fn matches_from_group(
        &self,
        collection: &str,
        p_group_id: &str,
    ) -> StorageResult<Vec<Correspondence>>;

    /// Add a batch of correspondences to a collection, returning how many were written
    fn import_matches(&self, collection: &str, matches: &[Correspondence]) -> StorageResult<usize>;
}

/// Stack metadata and coordinate mapping
pub trait TileService: Send + Sync {
    /// Every section of a stack with its layer index
    fn sections(&self, stack: &str) -> StorageResult<Vec<SectionData>>;

    /// Layer index of one section
    fn section_z(&self, stack: &str, section_id: &str) -> StorageResult<u32> {
        self.sections(stack)?
            .into_iter()
            .find(|s| s.section_id == section_id)
            .map(|s| s.z)
            .ok_or_else(|| StorageError::NotFound(format!("section {section_id} in stack {stack}")))
    }

    /// All tile specs of one layer
    fn tile_specs_for_z(&self, stack: &str, z: u32) -> StorageResult<Vec<TileSpec>>;

    /// Map tile-local points to the section's world frame.
    ///
    /// The default applies the tile's transform chain in process.
    fn local_to_world(
        &self,
        _stack: &str,
        points: &[Coord<f64>],
        tile: &TileSpec,
    ) -> StorageResult<Vec<Coord<f64>>> {
        Ok(tile.transforms.apply_all(points))
    }
}

/// Region-of-interest geometries, one per section layer
pub trait RegionStore: Send + Sync {
    /// Region for the section at layer `z`.
    ///
    /// Returns [`StorageError::NotFound`] when no resource exists for that layer.
    fn region_for_z(&self, stack: &str, z: u32) -> StorageResult<RegionShape>;
}
