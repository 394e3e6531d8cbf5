//! Deterministic world rules shared across clients.
//!
//! `game-core` defines how coordinates hash to locations, how planets and
//! space types are derived, and how a chunk footprint is mined. Everything
//! here is pure: the runtime decides where and when the work runs.
pub mod chunk;
pub mod config;
pub mod coords;
pub mod error;
pub mod location;
pub mod perlin;
pub mod planet;

pub use chunk::{ChunkMiner, ExploredChunkData, MineOutcome};
pub use config::GameConfig;
pub use coords::{ChunkFootprint, WorldCoords};
pub use error::{FootprintError, LocationIdError};
pub use location::LocationId;
pub use perlin::perlin;
pub use planet::{PlanetLevel, PlanetLocation, SpaceType, planet_at};
