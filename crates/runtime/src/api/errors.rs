//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, and the contract
//! client so callers can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use client_blockchain_core::TransportError;
use game_core::{ChunkFootprint, FootprintError, LocationId, WorldCoords};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid mining pattern: {reason}")]
    InvalidPattern { reason: String },

    #[error("exploration requires a home planet")]
    NoHomePlanet,

    #[error("account has not joined the game")]
    NotJoined,

    #[error("account already joined with home {home}")]
    AlreadyJoined { home: WorldCoords },

    #[error("{coords} is not a valid home planet")]
    InvalidHomePlanet { coords: WorldCoords },

    #[error("planet {0} is not a known location")]
    UnknownPlanet(LocationId),

    #[error("upgrade branch {0} does not exist")]
    InvalidUpgradeBranch(u8),

    #[error("miner needs at least one worker, got {requested}")]
    WorkerPoolExhausted { requested: usize },

    #[error("no contract client configured")]
    ContractNotConfigured,

    #[error("chunk {footprint} rejected")]
    InvalidChunk {
        footprint: ChunkFootprint,
        #[source]
        source: FootprintError,
    },

    #[error("transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("transaction was not confirmed within {timeout_ms}ms")]
    ConfirmationTimeout { timeout_ms: u64 },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("runtime is shutting down")]
    ShuttingDown,

    #[error("miner worker command channel closed")]
    CommandChannelClosed,

    #[error("worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
