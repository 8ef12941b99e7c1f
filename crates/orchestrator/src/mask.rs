//! Correspondence masking
//!
//! A point pair survives only when both of its endpoints are inside their
//! section's region. Masking keeps `p`, `q` and `w` index-aligned and keeps the
//! surviving pairs in their original order.

use crate::error::{FilterError, Result};
use section_match_common::Correspondence;

/// Result of masking one correspondence
#[derive(Debug, Clone, PartialEq)]
pub enum MaskOutcome {
    /// At least one point pair survived
    Kept(Correspondence),
    /// No point pair survived; the correspondence must not be republished
    Dropped,
}

impl MaskOutcome {
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }

    #[must_use]
    pub fn into_kept(self) -> Option<Correspondence> {
        match self {
            Self::Kept(corr) => Some(corr),
            Self::Dropped => None,
        }
    }
}

/// Element-wise AND of the origin-side and destination-side masks
pub fn combine_masks(origin: &[bool], destination: &[bool]) -> Result<Vec<bool>> {
    if origin.len() != destination.len() {
        return Err(FilterError::MaskLength {
            mask: destination.len(),
            points: origin.len(),
        });
    }
    Ok(origin
        .iter()
        .zip(destination)
        .map(|(&p, &q)| p && q)
        .collect())
}

/// Keep the point pairs of `corr` whose mask entry is true
pub fn mask_correspondence(corr: Correspondence, mask: &[bool]) -> Result<MaskOutcome> {
    corr.validate()?;
    if mask.len() != corr.len() {
        return Err(FilterError::MaskLength {
            mask: mask.len(),
            points: corr.len(),
        });
    }

    let kept = mask.iter().filter(|&&keep| keep).count();
    if kept == 0 {
        return Ok(MaskOutcome::Dropped);
    }
    if kept == mask.len() {
        return Ok(MaskOutcome::Kept(corr));
    }
    let matches = corr.matches.select(mask);
    Ok(MaskOutcome::Kept(corr.with_matches(matches)))
}
