use std::sync::Arc;

use game_core::{ChunkFootprint, WorldCoords};

use super::{FootprintIter, MiningPattern, PatternKind};

/// Finite pattern over an explicit list of footprints, mined in order.
///
/// Useful for scripts that target specific regions.
#[derive(Debug, Clone)]
pub struct ListPattern {
    footprints: Arc<[ChunkFootprint]>,
}

impl ListPattern {
    pub fn new(footprints: Vec<ChunkFootprint>) -> Self {
        Self {
            footprints: footprints.into(),
        }
    }
}

impl MiningPattern for ListPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::List
    }

    fn footprints(&self, _home: WorldCoords) -> FootprintIter {
        let footprints = Arc::clone(&self.footprints);
        Box::new((0..footprints.len()).map(move |i| footprints[i]))
    }
}
