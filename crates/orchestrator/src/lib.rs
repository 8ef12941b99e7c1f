//! Section Match Filter
//!
//! Filters point correspondences between tiles so that only pairs whose two
//! endpoints fall inside the region of interest of their own section survive.
//!
//! The engine is built from small pieces, leaf first:
//! - [`region`]: section id -> layer index and region polygon, loaded once per run
//! - [`resolve`]: tile-local to world coordinates through a tile's spec
//! - [`membership`]: point-in-region mask
//! - [`mask`]: apply a mask to a correspondence, keeping `p`/`q`/`w` aligned
//! - [`group`]: one full pass over an origin group, ending in a single republish
//! - [`run`]: many groups on a worker pool with per-group error capture
//!
//! # Example
//!
//! ```rust,no_run
//! use section_match_filter::{run_all, FilterTarget, MatchFilter, RunOptions};
//! use section_match_storage::{DirectoryProject, DirectoryRegionStore};
//! use std::sync::Arc;
//!
//! fn main() -> section_match_filter::Result<()> {
//!     let project = Arc::new(DirectoryProject::new("/data/project"));
//!     let target = FilterTarget {
//!         stack: "ALIGNED".to_string(),
//!         source_collection: "raw_matches".to_string(),
//!         target_collection: "cropped_matches".to_string(),
//!     };
//!     let filter = MatchFilter::prepare(
//!         target,
//!         project.clone(),
//!         project,
//!         &DirectoryRegionStore::new("/data/polygons"),
//!     )?;
//!
//!     let summary = run_all(&filter, &RunOptions::default())?;
//!     println!("{} correspondences kept", summary.kept_total());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod group;
pub mod mask;
pub mod membership;
pub mod region;
pub mod resolve;
pub mod run;
pub mod tile_cache;

pub use error::{FilterError, Result};
pub use group::{FilterTarget, GroupReport, MatchFilter};
pub use mask::{combine_masks, mask_correspondence, MaskOutcome};
pub use membership::{inside_mask, is_inside};
pub use region::{build_region_table, RegionPolygon, RegionTable};
pub use resolve::resolve_points;
pub use run::{run_all, run_groups, FailurePolicy, GroupOutcome, RunOptions, RunSummary};
pub use tile_cache::TileCache;
