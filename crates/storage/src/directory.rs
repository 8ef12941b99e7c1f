//! Directory-backed collaborators
//!
//! A project directory holds stack metadata and match collections as JSON:
//!
//! ```text
//! <root>/stacks/<stack>/sections.json        [SectionData]
//! <root>/stacks/<stack>/tiles/<z>.json       [TileSpec]
//! <root>/matches/<collection>/<group>.json   [Correspondence] with pGroupId == group
//! ```
//!
//! Region resources live in their own directory as `polygon_{z:05}.json`
//! files whose `roi` member is a GeoJSON polygon geometry.

use crate::{MatchStore, RegionStore, StorageError, StorageResult, TileService};
use section_match_common::{Correspondence, RegionShape, SectionData, TileSpec};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<T> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
        _ => StorageError::IoError(e),
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        StorageError::SerializationError(format!("{}: {e}", path.display()))
    })
}

/// Reject names that would escape their directory
fn checked_name<'a>(kind: &str, name: &'a str) -> StorageResult<&'a str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StorageError::Other(format!("invalid {kind} name: {name:?}")));
    }
    Ok(name)
}

/// Stack metadata and match collections stored under one root directory
#[derive(Debug)]
pub struct DirectoryProject {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl DirectoryProject {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stack_dir(&self, stack: &str) -> StorageResult<PathBuf> {
        Ok(self.root.join("stacks").join(checked_name("stack", stack)?))
    }

    fn collection_dir(&self, collection: &str) -> StorageResult<PathBuf> {
        Ok(self
            .root
            .join("matches")
            .join(checked_name("collection", collection)?))
    }

    fn group_file(&self, collection: &str, group: &str) -> StorageResult<PathBuf> {
        Ok(self
            .collection_dir(collection)?
            .join(format!("{}.json", checked_name("group", group)?)))
    }

    fn read_group(&self, path: &Path) -> StorageResult<Vec<Correspondence>> {
        let matches: Vec<Correspondence> = match read_json(path) {
            Ok(matches) => matches,
            Err(StorageError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        for m in &matches {
            m.validate().map_err(|source| StorageError::InvalidData {
                location: path.display().to_string(),
                source,
            })?;
        }
        Ok(matches)
    }
}

impl TileService for DirectoryProject {
    fn sections(&self, stack: &str) -> StorageResult<Vec<SectionData>> {
        read_json(&self.stack_dir(stack)?.join("sections.json"))
    }

    fn tile_specs_for_z(&self, stack: &str, z: u32) -> StorageResult<Vec<TileSpec>> {
        let path = self.stack_dir(stack)?.join("tiles").join(format!("{z}.json"));
        let tiles: Vec<TileSpec> = read_json(&path)?;
        debug!("Loaded {} tile specs from {}", tiles.len(), path.display());
        Ok(tiles)
    }
}

impl MatchStore for DirectoryProject {
    fn origin_group_ids(&self, collection: &str) -> StorageResult<Vec<String>> {
        let dir = self.collection_dir(collection)?;
        let entries = fs::read_dir(&dir).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(format!("match collection {collection}")),
            _ => StorageError::IoError(e),
        })?;

        let mut groups = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    groups.push(stem.to_string());
                }
            }
        }
        groups.sort();
        Ok(groups)
    }

    fn matches_from_group(
        &self,
        collection: &str,
        p_group_id: &str,
    ) -> StorageResult<Vec<Correspondence>> {
        let path = self.group_file(collection, p_group_id)?;
        let mut matches = self.read_group(&path)?;
        matches.retain(|m| m.p_group_id == p_group_id);
        Ok(matches)
    }

    fn import_matches(&self, collection: &str, matches: &[Correspondence]) -> StorageResult<usize> {
        let mut by_group: BTreeMap<&str, Vec<&Correspondence>> = BTreeMap::new();
        for m in matches {
            m.validate().map_err(|source| StorageError::InvalidData {
                location: format!("import into {collection}"),
                source,
            })?;
            by_group.entry(m.p_group_id.as_str()).or_default().push(m);
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        fs::create_dir_all(self.collection_dir(collection)?)?;
        for (group, batch) in by_group {
            let path = self.group_file(collection, group)?;
            let mut existing = self.read_group(&path)?;
            existing.extend(batch.into_iter().cloned());

            // write-then-rename so readers never see a partial file
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, serde_json::to_vec_pretty(&existing)?)?;
            fs::rename(&tmp, &path)?;
            debug!("Wrote {} matches to {}", existing.len(), path.display());
        }
        Ok(matches.len())
    }
}

#[derive(Deserialize)]
struct RegionFile {
    roi: RegionShape,
}

/// Region resources stored as `polygon_{z:05}.json` files in one directory
#[derive(Debug, Clone)]
pub struct DirectoryRegionStore {
    polygon_dir: PathBuf,
}

impl DirectoryRegionStore {
    pub fn new(polygon_dir: impl Into<PathBuf>) -> Self {
        Self {
            polygon_dir: polygon_dir.into(),
        }
    }

    #[must_use]
    pub fn path_for_z(&self, z: u32) -> PathBuf {
        self.polygon_dir.join(format!("polygon_{z:05}.json"))
    }
}

impl RegionStore for DirectoryRegionStore {
    fn region_for_z(&self, _stack: &str, z: u32) -> StorageResult<RegionShape> {
        let file: RegionFile = read_json(&self.path_for_z(z))?;
        Ok(file.roi)
    }
}
