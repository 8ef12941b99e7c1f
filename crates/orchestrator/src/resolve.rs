//! Coordinate resolution: tile-local points to section world coordinates

use crate::error::{FilterError, Result};
use section_match_common::{Coord, PointColumns, TileSpec};
use section_match_storage::{StorageError, TileService};

/// Map `points` of `tile` into the world frame of layer `z`.
///
/// The tile must belong to layer `z`; mapping through a spec from another layer
/// would silently give wrong coordinates.
pub fn resolve_points(
    service: &dyn TileService,
    stack: &str,
    points: &PointColumns,
    tile: &TileSpec,
    z: u32,
) -> Result<Vec<Coord<f64>>> {
    if tile.z != z {
        return Err(FilterError::TileLookup {
            stack: stack.to_string(),
            tile_id: tile.tile_id.clone(),
            z,
        });
    }

    let local = points.coords();
    let world = service.local_to_world(stack, &local, tile)?;
    if world.len() != local.len() {
        return Err(FilterError::ServiceCall(StorageError::Other(format!(
            "local_to_world returned {} points for {} inputs on tile {}",
            world.len(),
            local.len(),
            tile.tile_id
        ))));
    }
    Ok(world)
}
