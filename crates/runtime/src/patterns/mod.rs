//! Mining patterns: strategies that decide which footprints to hash next.
//!
//! A pattern is immutable; each call to [`MiningPattern::footprints`] returns
//! a fresh cursor over its (usually infinite) sequence.

mod list;
mod spiral;

use std::collections::HashSet;
use std::fmt;

use game_core::{ChunkFootprint, WorldCoords};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::api::{Result, RuntimeError};

pub use list::ListPattern;
pub use spiral::{SpiralPattern, SwissCheesePattern, TowardsCenterPattern};

/// Lazy cursor over a pattern's footprints.
pub type FootprintIter = Box<dyn Iterator<Item = ChunkFootprint> + Send>;

/// Number of leading footprints inspected when a pattern is installed.
pub const PATTERN_PROBE_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum PatternKind {
    Spiral,
    SwissCheese,
    TowardsCenter,
    List,
    Custom,
}

/// Strategy over footprint generation.
pub trait MiningPattern: Send + Sync + fmt::Debug {
    fn kind(&self) -> PatternKind;

    /// Footprints in mining order. `home` is the exploration origin for
    /// patterns without a center of their own.
    fn footprints(&self, home: WorldCoords) -> FootprintIter;
}

/// Rejects patterns whose cursor does not advance.
///
/// The first [`PATTERN_PROBE_LEN`] footprints must exist, be minable, and be
/// pairwise distinct.
pub fn validate_pattern(pattern: &dyn MiningPattern, home: WorldCoords) -> Result<()> {
    let invalid = |reason: String| RuntimeError::InvalidPattern { reason };
    let mut seen = HashSet::with_capacity(PATTERN_PROBE_LEN);

    for (index, footprint) in pattern
        .footprints(home)
        .take(PATTERN_PROBE_LEN)
        .enumerate()
    {
        footprint
            .validate()
            .map_err(|e| invalid(format!("footprint #{index}: {e}")))?;
        if !seen.insert(footprint) {
            return Err(invalid(format!(
                "footprint #{index} ({footprint}) repeats an earlier footprint"
            )));
        }
    }

    if seen.is_empty() {
        return Err(invalid(format!("{} pattern yields no footprints", pattern.kind())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Stuck;

    impl MiningPattern for Stuck {
        fn kind(&self) -> PatternKind {
            PatternKind::Custom
        }

        fn footprints(&self, home: WorldCoords) -> FootprintIter {
            Box::new(std::iter::repeat(ChunkFootprint::containing(home, 16)))
        }
    }

    #[test]
    fn stuck_cursor_is_rejected() {
        let err = validate_pattern(&Stuck, WorldCoords::ORIGIN).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidPattern { .. }));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let err = validate_pattern(&ListPattern::new(vec![]), WorldCoords::ORIGIN).unwrap_err();
        assert!(err.to_string().contains("yields no footprints"));
    }

    #[test]
    fn zero_side_is_rejected() {
        let err = validate_pattern(&SpiralPattern::new(0), WorldCoords::ORIGIN).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidPattern { .. }));
    }

    #[test]
    fn kind_names_round_trip_through_strings() {
        assert_eq!("swiss-cheese".parse::<PatternKind>().unwrap(), PatternKind::SwissCheese);
        assert_eq!(PatternKind::TowardsCenter.to_string(), "towards-center");
        assert!("zigzag".parse::<PatternKind>().is_err());
    }

    #[test]
    fn builtin_patterns_are_valid() {
        let home = WorldCoords::new(5_000, -3_000);
        validate_pattern(&SpiralPattern::new(16), home).unwrap();
        validate_pattern(&SwissCheesePattern::new(16), home).unwrap();
        validate_pattern(&TowardsCenterPattern::new(16), home).unwrap();
    }
}
