//! Per-group filtering pass
//!
//! One pass over an origin section group: fetch its candidate correspondences,
//! load the tile specs of every layer they touch, resolve both endpoints of
//! every point pair to world coordinates, keep the pairs inside both regions
//! and republish the survivors as one batch.

use crate::error::Result;
use crate::mask::{combine_masks, mask_correspondence, MaskOutcome};
use crate::membership::inside_mask;
use crate::region::{build_region_table, RegionPolygon, RegionTable};
use crate::resolve::resolve_points;
use crate::tile_cache::TileCache;
use section_match_common::Correspondence;
use section_match_storage::{MatchStore, RegionStore, TileService};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Which stack and collections a run works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTarget {
    pub stack: String,
    /// Collection the candidate correspondences are read from
    pub source_collection: String,
    /// Collection the surviving correspondences are written to
    pub target_collection: String,
}

/// Counts for one filtered group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupReport {
    pub group_id: String,
    /// Correspondences fetched for the group
    pub candidates: usize,
    /// Correspondences with at least one surviving point pair
    pub kept: usize,
    /// Correspondences with no surviving point pair
    pub dropped: usize,
    pub points_in: usize,
    pub points_kept: usize,
    /// Whether a batch was written to the target collection
    pub published: bool,
}

/// The filtering engine for one stack and pair of collections.
///
/// Holds the read-only region table and the shared tile cache; `filter_group`
/// may be called concurrently from several threads.
pub struct MatchFilter {
    target: FilterTarget,
    matches: Arc<dyn MatchStore>,
    tiles: Arc<dyn TileService>,
    regions: Arc<RegionTable>,
    cache: TileCache,
}

impl MatchFilter {
    pub fn new(
        target: FilterTarget,
        matches: Arc<dyn MatchStore>,
        tiles: Arc<dyn TileService>,
        regions: Arc<RegionTable>,
    ) -> Self {
        Self {
            target,
            matches,
            tiles,
            regions,
            cache: TileCache::new(),
        }
    }

    /// Build the region table for `target.stack`, then the filter
    pub fn prepare(
        target: FilterTarget,
        matches: Arc<dyn MatchStore>,
        tiles: Arc<dyn TileService>,
        region_store: &dyn RegionStore,
    ) -> Result<Self> {
        let regions = build_region_table(tiles.as_ref(), region_store, &target.stack)?;
        info!("Region table ready: {} sections", regions.len());
        Ok(Self::new(target, matches, tiles, Arc::new(regions)))
    }

    #[must_use]
    pub fn target(&self) -> &FilterTarget {
        &self.target
    }

    #[must_use]
    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    #[must_use]
    pub fn tile_cache(&self) -> &TileCache {
        &self.cache
    }

    /// Origin groups present in the source collection
    pub fn origin_groups(&self) -> Result<Vec<String>> {
        Ok(self
            .matches
            .origin_group_ids(&self.target.source_collection)?)
    }

    /// Filter every correspondence of one origin group and republish the survivors.
    ///
    /// Any failure aborts the group before anything is written.
    pub fn filter_group(&self, group_id: &str) -> Result<GroupReport> {
        let start = Instant::now();
        let mut report = GroupReport {
            group_id: group_id.to_string(),
            ..GroupReport::default()
        };

        let candidates = self
            .matches
            .matches_from_group(&self.target.source_collection, group_id)?;
        report.candidates = candidates.len();
        if candidates.is_empty() {
            debug!("[GROUP {}] No candidate correspondences", group_id);
            return Ok(report);
        }

        let origin_z = self.regions.z(group_id)?;
        let origin_region = self.regions.region(group_id)?;

        let destinations: BTreeSet<&str> = candidates
            .iter()
            .map(|c| c.q_group_id.as_str())
            .collect();
        let mut layers = BTreeSet::from([origin_z]);
        for destination in &destinations {
            layers.insert(self.regions.z(destination)?);
        }
        for &z in &layers {
            let specs = self.tiles.tile_specs_for_z(&self.target.stack, z)?;
            let count = self.cache.insert_layer(specs);
            debug!("[GROUP {}] Cached {} tiles of layer z={}", group_id, count, z);
        }

        let mut survivors = Vec::with_capacity(candidates.len());
        for corr in candidates {
            report.points_in += corr.len();
            match self.filter_correspondence(corr, origin_z, origin_region)? {
                MaskOutcome::Kept(kept) => {
                    report.points_kept += kept.len();
                    survivors.push(kept);
                }
                MaskOutcome::Dropped => report.dropped += 1,
            }
        }
        report.kept = survivors.len();

        if !survivors.is_empty() {
            self.matches
                .import_matches(&self.target.target_collection, &survivors)?;
            report.published = true;
        }

        info!(
            "[GROUP {}] kept {}/{} correspondences ({}/{} points) in {:.2}s",
            group_id,
            report.kept,
            report.candidates,
            report.points_kept,
            report.points_in,
            start.elapsed().as_secs_f64()
        );
        Ok(report)
    }

    fn filter_correspondence(
        &self,
        corr: Correspondence,
        origin_z: u32,
        origin_region: &RegionPolygon,
    ) -> Result<MaskOutcome> {
        corr.validate()?;
        if corr.is_empty() {
            return Ok(MaskOutcome::Dropped);
        }

        let stack = self.target.stack.as_str();
        let destination_z = self.regions.z(&corr.q_group_id)?;
        let destination_region = self.regions.region(&corr.q_group_id)?;
        let p_tile = self.cache.lookup(stack, &corr.p_id, origin_z)?;
        let q_tile = self.cache.lookup(stack, &corr.q_id, destination_z)?;

        let p_world = resolve_points(self.tiles.as_ref(), stack, &corr.matches.p, &p_tile, origin_z)?;
        let q_world = resolve_points(
            self.tiles.as_ref(),
            stack,
            &corr.matches.q,
            &q_tile,
            destination_z,
        )?;

        let mask = combine_masks(
            &inside_mask(&p_world, origin_region),
            &inside_mask(&q_world, destination_region),
        )?;
        debug!(
            "{} -> {}: {}/{} pairs inside both regions",
            corr.p_id,
            corr.q_id,
            mask.iter().filter(|&&m| m).count(),
            mask.len()
        );
        mask_correspondence(corr, &mask)
    }
}
