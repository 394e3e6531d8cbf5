//! Error types raised by the pure domain layer.

use crate::coords::ChunkFootprint;

/// Reasons a footprint cannot be mined or recorded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FootprintError {
    #[error("footprint at {footprint} has zero side length")]
    ZeroSide { footprint: ChunkFootprint },

    #[error("footprint at {footprint} overflows the coordinate space")]
    Overflow { footprint: ChunkFootprint },
}

/// Reasons a hex string cannot be parsed into a location id.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LocationIdError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("location id must be 32 bytes, got {0}")]
    InvalidLength(usize),
}
