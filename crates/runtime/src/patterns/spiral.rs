//! Spiral-based patterns.
//!
//! All of them walk square rings of aligned chunks outward from a center
//! chunk; the variants only filter which ring cells are mined.

use game_core::{ChunkFootprint, WorldCoords};

use super::{FootprintIter, MiningPattern, PatternKind};

/// Ring-by-ring walk over chunk offsets around `(0, 0)`.
///
/// Ring `r` holds `8r` cells, visited counter-clockwise starting just above
/// the bottom-right corner.
#[derive(Debug, Clone, Default)]
struct RingWalk {
    ring: i64,
    index: i64,
}

impl Iterator for RingWalk {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.ring == 0 {
            self.ring = 1;
            return Some((0, 0));
        }

        let r = self.ring;
        let side = 2 * r;
        let i = self.index;
        let offset = match i / side {
            0 => (r, -r + 1 + i),
            1 => (r - 1 - (i - side), r),
            2 => (-r, r - 1 - (i - 2 * side)),
            _ => (-r + 1 + (i - 3 * side), -r),
        };

        self.index += 1;
        if self.index == 4 * side {
            self.ring = self.ring.checked_add(1)?;
            self.index = 0;
        }
        Some(offset)
    }
}

/// Aligned chunk grid anchored at the chunk containing `center`.
#[derive(Debug, Clone, Copy)]
struct ChunkGrid {
    origin: (i64, i64),
    side_length: u32,
}

impl ChunkGrid {
    fn around(center: WorldCoords, side_length: u32) -> Self {
        let side = i64::from(side_length.max(1));
        Self {
            origin: (center.x.div_euclid(side), center.y.div_euclid(side)),
            side_length,
        }
    }

    /// Absolute chunk index of an offset from the grid origin.
    fn cell(&self, (dx, dy): (i64, i64)) -> Option<(i64, i64)> {
        Some((self.origin.0.checked_add(dx)?, self.origin.1.checked_add(dy)?))
    }

    fn footprint(&self, (cx, cy): (i64, i64)) -> Option<ChunkFootprint> {
        let side = i64::from(self.side_length);
        Some(ChunkFootprint::new(
            WorldCoords::new(cx.checked_mul(side)?, cy.checked_mul(side)?),
            self.side_length,
        ))
    }

    /// Spiral cursor; stops at the edge of the representable space.
    fn spiral(self, keep: impl Fn((i64, i64)) -> bool + Send + 'static) -> FootprintIter {
        Box::new(
            RingWalk::default()
                .map_while(move |offset| self.cell(offset))
                .filter(move |cell| keep(*cell))
                .map_while(move |cell| self.footprint(cell)),
        )
    }
}

/// Mines every chunk, ring by ring, around a center.
#[derive(Debug, Clone)]
pub struct SpiralPattern {
    center: Option<WorldCoords>,
    side_length: u32,
}

impl SpiralPattern {
    /// Spiral around the home planet.
    pub fn new(side_length: u32) -> Self {
        Self {
            center: None,
            side_length,
        }
    }

    /// Spiral around a fixed point regardless of home.
    pub fn centered(center: WorldCoords, side_length: u32) -> Self {
        Self {
            center: Some(center),
            side_length,
        }
    }
}

impl MiningPattern for SpiralPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::Spiral
    }

    fn footprints(&self, home: WorldCoords) -> FootprintIter {
        ChunkGrid::around(self.center.unwrap_or(home), self.side_length).spiral(|_| true)
    }
}

/// Spiral that mines every other chunk in a checkerboard, covering twice
/// the area per hash at the cost of gaps.
#[derive(Debug, Clone)]
pub struct SwissCheesePattern {
    center: Option<WorldCoords>,
    side_length: u32,
}

impl SwissCheesePattern {
    pub fn new(side_length: u32) -> Self {
        Self {
            center: None,
            side_length,
        }
    }

    pub fn centered(center: WorldCoords, side_length: u32) -> Self {
        Self {
            center: Some(center),
            side_length,
        }
    }
}

impl MiningPattern for SwissCheesePattern {
    fn kind(&self) -> PatternKind {
        PatternKind::SwissCheese
    }

    fn footprints(&self, home: WorldCoords) -> FootprintIter {
        ChunkGrid::around(self.center.unwrap_or(home), self.side_length)
            .spiral(|(cx, cy)| cx.rem_euclid(2) == cy.rem_euclid(2))
    }
}

/// Spiral around home restricted to the half-plane facing the world center.
#[derive(Debug, Clone)]
pub struct TowardsCenterPattern {
    side_length: u32,
}

impl TowardsCenterPattern {
    pub fn new(side_length: u32) -> Self {
        Self { side_length }
    }
}

impl MiningPattern for TowardsCenterPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::TowardsCenter
    }

    fn footprints(&self, home: WorldCoords) -> FootprintIter {
        let grid = ChunkGrid::around(home, self.side_length);
        let center = ChunkGrid::around(WorldCoords::ORIGIN, self.side_length).origin;
        let (hx, hy) = grid.origin;
        // Direction from home toward the center, in chunk units.
        let (tx, ty) = (
            i128::from(center.0) - i128::from(hx),
            i128::from(center.1) - i128::from(hy),
        );
        grid.spiral(move |(cx, cy)| {
            let (dx, dy) = (i128::from(cx) - i128::from(hx), i128::from(cy) - i128::from(hy));
            dx * tx + dy * ty >= 0
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ring_walk_covers_each_ring_exactly_once() {
        let cells: Vec<_> = RingWalk::default().take(1 + 8 + 16 + 24).collect();
        assert_eq!(cells[0], (0, 0));

        let unique: HashSet<_> = cells.iter().copied().collect();
        assert_eq!(unique.len(), cells.len());
        assert!(cells.iter().all(|(x, y)| x.abs() <= 3 && y.abs() <= 3));
        assert_eq!(cells.len(), 49);
    }

    #[test]
    fn ring_walk_steps_between_neighbours() {
        let cells: Vec<_> = RingWalk::default().skip(1).take(8).collect();
        for pair in cells.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!((a.0 - b.0).abs() + (a.1 - b.1).abs(), 1, "{a:?} -> {b:?}");
        }
    }

    #[test]
    fn spiral_starts_at_home_chunk() {
        let home = WorldCoords::new(-5, 37);
        let first = SpiralPattern::new(16).footprints(home).next().unwrap();
        assert_eq!(first, ChunkFootprint::containing(home, 16));
        assert!(first.contains(&home));
    }

    #[test]
    fn centered_spiral_ignores_home() {
        let pattern = SpiralPattern::centered(WorldCoords::new(100, 100), 8);
        let first = pattern.footprints(WorldCoords::ORIGIN).next().unwrap();
        assert_eq!(first.bottom_left, WorldCoords::new(96, 96));
    }

    #[test]
    fn swiss_cheese_never_mines_adjacent_chunks() {
        let footprints: Vec<_> = SwissCheesePattern::new(4)
            .footprints(WorldCoords::ORIGIN)
            .take(40)
            .collect();
        for fp in &footprints {
            let (cx, cy) = (fp.bottom_left.x / 4, fp.bottom_left.y / 4);
            assert_eq!((cx + cy).rem_euclid(2), 0);
        }
    }

    #[test]
    fn towards_center_stays_on_center_side() {
        let home = WorldCoords::new(1_600, 0);
        let footprints: Vec<_> = TowardsCenterPattern::new(16)
            .footprints(home)
            .take(100)
            .collect();
        assert!(footprints.iter().all(|fp| fp.bottom_left.x <= home.x));
        assert!(footprints.iter().any(|fp| fp.bottom_left.x < home.x));
    }

    #[test]
    fn spiral_stops_at_coordinate_edge() {
        let edge = WorldCoords::new(i64::MAX - 3, 0);
        let count = SpiralPattern::new(16).footprints(edge).take(20).count();
        assert!(count < 20);
    }

    #[test]
    fn swiss_cheese_near_coordinate_corner() {
        let corner = WorldCoords::new(i64::MAX - 3, i64::MAX - 3);
        let count = SwissCheesePattern::new(16).footprints(corner).take(20).count();
        assert!(count < 20);
    }
}
