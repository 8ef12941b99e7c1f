//! Section descriptors

use serde::{Deserialize, Serialize};

/// One section (group) of a stack and its layer index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionData {
    pub section_id: String,
    pub z: u32,
}

impl SectionData {
    pub fn new(section_id: impl Into<String>, z: u32) -> Self {
        Self {
            section_id: section_id.into(),
            z,
        }
    }
}
