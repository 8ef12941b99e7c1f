//! Shared tile spec cache
//!
//! Keyed by tile id. Whole layers are inserted as groups are visited; a tile
//! fetched again overwrites the previous entry (last write wins), which is
//! safe because tile ids are unique within a stack.

use crate::error::{FilterError, Result};
use section_match_common::TileSpec;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct TileCache {
    tiles: RwLock<HashMap<String, Arc<TileSpec>>>,
}

impl TileCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every tile of a layer, returning how many were written
    pub fn insert_layer(&self, tiles: Vec<TileSpec>) -> usize {
        let count = tiles.len();
        let mut cache = self.tiles.write().unwrap_or_else(PoisonError::into_inner);
        for tile in tiles {
            cache.insert(tile.tile_id.clone(), Arc::new(tile));
        }
        count
    }

    /// Tile spec for `tile_id`, which must belong to layer `z`.
    ///
    /// A tile that is absent, or cached from a different layer, cannot be used to
    /// resolve coordinates for `z`.
    pub fn lookup(&self, stack: &str, tile_id: &str, z: u32) -> Result<Arc<TileSpec>> {
        let cache = self.tiles.read().unwrap_or_else(PoisonError::into_inner);
        match cache.get(tile_id) {
            Some(tile) if tile.z == z => Ok(Arc::clone(tile)),
            _ => Err(FilterError::TileLookup {
                stack: stack.to_string(),
                tile_id: tile_id.to_string(),
                z,
            }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
