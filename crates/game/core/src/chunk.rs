//! Explored chunks and the hashing work that produces them.

use crate::config::GameConfig;
use crate::coords::{ChunkFootprint, WorldCoords};
use crate::error::FootprintError;
use crate::location::LocationId;
use crate::perlin::perlin;
use crate::planet::PlanetLocation;

/// Result of mining one footprint.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExploredChunkData {
    pub footprint: ChunkFootprint,
    pub planet_locations: Vec<PlanetLocation>,
    /// Perlin value at the footprint center.
    pub perlin: u32,
}

impl ExploredChunkData {
    /// A chunk known to hold no planets.
    pub fn empty(footprint: ChunkFootprint, config: &GameConfig) -> Self {
        Self {
            footprint,
            planet_locations: Vec::new(),
            perlin: perlin(footprint.center(), config),
        }
    }
}

/// Outcome of a mining run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MineOutcome {
    /// Every location was hashed.
    Completed {
        chunk: ExploredChunkData,
        hashes: u64,
    },
    /// The abort signal was observed before the run finished.
    Aborted { hashes: u64 },
}

/// Hashes every location of a footprint.
///
/// Pure and CPU-bound; the runtime runs it on blocking threads.
#[derive(Clone, Debug)]
pub struct ChunkMiner {
    config: GameConfig,
}

impl ChunkMiner {
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Mines `footprint` to completion.
    pub fn mine(&self, footprint: ChunkFootprint) -> Result<ExploredChunkData, FootprintError> {
        match self.mine_until(footprint, || false)? {
            MineOutcome::Completed { chunk, .. } => Ok(chunk),
            MineOutcome::Aborted { .. } => unreachable!("abort signal is constant false"),
        }
    }

    /// Mines `footprint`, polling `should_abort` once per row and once
    /// more before returning.
    pub fn mine_until(
        &self,
        footprint: ChunkFootprint,
        should_abort: impl Fn() -> bool,
    ) -> Result<MineOutcome, FootprintError> {
        footprint.validate()?;

        let side = i64::from(footprint.side_length);
        let origin = footprint.bottom_left;
        let world_radius = self.config.world_radius as f64;
        let mut planet_locations = Vec::new();
        let mut hashes = 0u64;

        for dy in 0..side {
            if should_abort() {
                return Ok(MineOutcome::Aborted { hashes });
            }
            for dx in 0..side {
                let coords = WorldCoords::new(origin.x + dx, origin.y + dy);
                let hash = LocationId::of(coords, self.config.planet_hash_key);
                hashes += 1;
                if hash.is_planet(&self.config) && coords.radius() <= world_radius {
                    planet_locations.push(PlanetLocation::derive(coords, hash, &self.config));
                }
            }
        }

        if should_abort() {
            return Ok(MineOutcome::Aborted { hashes });
        }

        Ok(MineOutcome::Completed {
            chunk: ExploredChunkData {
                footprint,
                planet_locations,
                perlin: perlin(footprint.center(), &self.config),
            },
            hashes,
        })
    }
}
