//! In-memory collaborators
//!
//! Thread-safe stores backed by hash maps. Useful for tests and for feeding
//! the engine from data already loaded by another component.

use crate::{MatchStore, RegionStore, StorageError, StorageResult, TileService};
use section_match_common::{Correspondence, RegionShape, SectionData, TileSpec};
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

/// Match collections held in memory
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    collections: RwLock<HashMap<String, Vec<Correspondence>>>,
}

impl InMemoryMatchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding of a collection
    #[must_use]
    pub fn with_matches(self, collection: &str, matches: Vec<Correspondence>) -> Self {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default()
            .extend(matches);
        self
    }

    /// Snapshot of a collection, empty if it does not exist
    #[must_use]
    pub fn collection(&self, collection: &str) -> Vec<Correspondence> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

impl MatchStore for InMemoryMatchStore {
    fn origin_group_ids(&self, collection: &str) -> StorageResult<Vec<String>> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let matches = collections
            .get(collection)
            .ok_or_else(|| StorageError::NotFound(format!("match collection {collection}")))?;
        let groups: BTreeSet<&str> = matches.iter().map(|m| m.p_group_id.as_str()).collect();
        Ok(groups.into_iter().map(str::to_string).collect())
    }

    fn matches_from_group(
        &self,
        collection: &str,
        p_group_id: &str,
    ) -> StorageResult<Vec<Correspondence>> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(collections
            .get(collection)
            .map(|matches| {
                matches
                    .iter()
                    .filter(|m| m.p_group_id == p_group_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn import_matches(&self, collection: &str, matches: &[Correspondence]) -> StorageResult<usize> {
        for m in matches {
            m.validate().map_err(|source| StorageError::InvalidData {
                location: format!("import into {collection}"),
                source,
            })?;
        }
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default()
            .extend_from_slice(matches);
        Ok(matches.len())
    }
}

#[derive(Debug, Default, Clone)]
struct StackData {
    sections: Vec<SectionData>,
    tiles: HashMap<u32, Vec<TileSpec>>,
}

/// Stacks held in memory; coordinates are mapped with the tiles' own transform chains
#[derive(Debug, Default)]
pub struct InMemoryTileService {
    stacks: RwLock<HashMap<String, StackData>>,
}

impl InMemoryTileService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a section and its tiles
    #[must_use]
    pub fn with_section(self, stack: &str, section: SectionData, tiles: Vec<TileSpec>) -> Self {
        {
            let mut stacks = self.stacks.write().unwrap_or_else(PoisonError::into_inner);
            let data = stacks.entry(stack.to_string()).or_default();
            data.tiles.entry(section.z).or_default().extend(tiles);
            data.sections.push(section);
        }
        self
    }
}

impl TileService for InMemoryTileService {
    fn sections(&self, stack: &str) -> StorageResult<Vec<SectionData>> {
        self.stacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(stack)
            .map(|data| data.sections.clone())
            .ok_or_else(|| StorageError::NotFound(format!("stack {stack}")))
    }

    fn tile_specs_for_z(&self, stack: &str, z: u32) -> StorageResult<Vec<TileSpec>> {
        let stacks = self.stacks.read().unwrap_or_else(PoisonError::into_inner);
        let data = stacks
            .get(stack)
            .ok_or_else(|| StorageError::NotFound(format!("stack {stack}")))?;
        Ok(data.tiles.get(&z).cloned().unwrap_or_default())
    }
}

/// Region geometries keyed by `(stack, z)`
#[derive(Debug, Default)]
pub struct InMemoryRegionStore {
    regions: RwLock<HashMap<(String, u32), RegionShape>>,
}

impl InMemoryRegionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_region(self, stack: &str, z: u32, shape: RegionShape) -> Self {
        self.regions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((stack.to_string(), z), shape);
        self
    }
}

impl RegionStore for InMemoryRegionStore {
    fn region_for_z(&self, stack: &str, z: u32) -> StorageResult<RegionShape> {
        self.regions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(stack.to_string(), z))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("region for {stack} z={z}")))
    }
}
