//! World coordinates and chunk footprints.

use core::fmt;

use crate::error::FootprintError;

/// A point in the 2D universe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldCoords {
    pub x: i64,
    pub y: i64,
}

impl WorldCoords {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &WorldCoords) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Euclidean distance to the origin.
    pub fn radius(&self) -> f64 {
        self.distance(&Self::ORIGIN)
    }
}

impl fmt::Display for WorldCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Square region of coordinate space that bounds one unit of mining work.
///
/// Covers `bottom_left.x .. bottom_left.x + side_length` on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkFootprint {
    pub bottom_left: WorldCoords,
    pub side_length: u32,
}

impl ChunkFootprint {
    pub const fn new(bottom_left: WorldCoords, side_length: u32) -> Self {
        Self {
            bottom_left,
            side_length,
        }
    }

    /// Footprint of side `side_length` on the aligned grid that contains `coords`.
    pub fn containing(coords: WorldCoords, side_length: u32) -> Self {
        let side = i64::from(side_length.max(1));
        Self::new(
            WorldCoords::new(
                coords.x.div_euclid(side) * side,
                coords.y.div_euclid(side) * side,
            ),
            side_length.max(1),
        )
    }

    /// Checks that the footprint covers a non-empty, representable region.
    pub fn validate(&self) -> Result<(), FootprintError> {
        if self.side_length == 0 {
            return Err(FootprintError::ZeroSide { footprint: *self });
        }
        let side = i64::from(self.side_length);
        if self.bottom_left.x.checked_add(side).is_none()
            || self.bottom_left.y.checked_add(side).is_none()
        {
            return Err(FootprintError::Overflow { footprint: *self });
        }
        Ok(())
    }

    pub fn contains(&self, coords: &WorldCoords) -> bool {
        let side = i64::from(self.side_length);
        coords.x >= self.bottom_left.x
            && coords.x < self.bottom_left.x + side
            && coords.y >= self.bottom_left.y
            && coords.y < self.bottom_left.y + side
    }

    /// Center of the footprint, rounded toward the bottom-left corner.
    pub fn center(&self) -> WorldCoords {
        let half = i64::from(self.side_length / 2);
        WorldCoords::new(self.bottom_left.x + half, self.bottom_left.y + half)
    }

    /// Number of locations hashed when mining this footprint.
    pub fn area(&self) -> u64 {
        u64::from(self.side_length) * u64::from(self.side_length)
    }

    /// Iterates every coordinate row by row, bottom to top.
    pub fn coords(&self) -> impl Iterator<Item = WorldCoords> + '_ {
        let side = i64::from(self.side_length);
        let origin = self.bottom_left;
        (0..side).flat_map(move |dy| {
            (0..side).map(move |dx| WorldCoords::new(origin.x + dx, origin.y + dy))
        })
    }
}

impl fmt::Display for ChunkFootprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.bottom_left, self.side_length)
    }
}
