//! Breakpoint tiers and width-to-tier selection.
//!
//! A [`BreakpointSet`] is the fixed, validated set of pixel widths the cache
//! is allowed to hold variants at. Selection is pure and total: any client
//! width maps to either one tier or the "use the source" sentinel.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("breakpoints must be a non-empty list of positive widths")]
pub struct InvalidBreakpoints;

/// Result of mapping a client width onto the configured tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The smallest configured tier at or above the client width.
    Tier(u32),
    /// The client is wider than every tier; no variant applies.
    Source,
}

/// Configured breakpoint widths, held sorted ascending.
///
/// The configuration file may list tiers in any order; selection always works
/// over the ascending view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointSet {
    tiers: Vec<u32>,
}

impl BreakpointSet {
    /// Build a set from configured widths. Rejects empty lists and zero
    /// widths; duplicates are collapsed.
    ///
    /// # Examples
    /// ```
    /// # use adaptive_images::breakpoints::BreakpointSet;
    /// let set = BreakpointSet::new(vec![1382, 992, 768, 480]).unwrap();
    /// assert_eq!(set.tiers(), &[480, 768, 992, 1382]);
    /// ```
    pub fn new(mut tiers: Vec<u32>) -> Result<Self, InvalidBreakpoints> {
        if tiers.is_empty() || tiers.contains(&0) {
            return Err(InvalidBreakpoints);
        }
        tiers.sort_unstable();
        tiers.dedup();
        Ok(Self { tiers })
    }

    /// Ascending view of the configured tiers.
    pub fn tiers(&self) -> &[u32] {
        &self.tiers
    }

    /// Smallest configured tier.
    pub fn min(&self) -> u32 {
        self.tiers[0]
    }

    /// Largest configured tier.
    pub fn max(&self) -> u32 {
        self.tiers[self.tiers.len() - 1]
    }

    /// Map a client width to the smallest tier at or above it.
    ///
    /// A width exactly equal to a tier selects that tier. A width above the
    /// largest tier returns [`Selection::Source`]; policy (default-raw or
    /// clamp-to-max) is applied by the caller.
    ///
    /// # Examples
    /// ```
    /// # use adaptive_images::breakpoints::{BreakpointSet, Selection};
    /// let set = BreakpointSet::new(vec![480, 768, 992, 1382]).unwrap();
    /// assert_eq!(set.select(600), Selection::Tier(768));
    /// assert_eq!(set.select(2000), Selection::Source);
    /// ```
    pub fn select(&self, width: u32) -> Selection {
        self.tiers
            .iter()
            .copied()
            .find(|&tier| tier >= width)
            .map_or(Selection::Source, Selection::Tier)
    }
}
