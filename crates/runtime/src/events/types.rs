//! Event types for different topics.

use client_blockchain_core::{CallKind, TransactionId};
use game_core::{ChunkFootprint, ExploredChunkData};
use serde::{Deserialize, Serialize};

use crate::patterns::PatternKind;

/// Where a newly recorded chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkSource {
    /// Hashed by the local worker pool.
    Mined,
    /// Handed in through `add_new_chunk` (peer, script, import).
    External,
}

/// Events emitted by the exploration scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExplorationEvent {
    /// A footprint was recorded for the first time.
    ChunkExplored {
        chunk: ExploredChunkData,
        source: ChunkSource,
    },

    /// A bulk import finished.
    ChunksImported { count: usize },

    ExploreStarted { pattern: PatternKind },

    ExploreStopped,

    PatternChanged { pattern: PatternKind },

    /// A finite pattern ran out of footprints; exploration stopped.
    PatternExhausted,

    /// The pattern kept yielding known footprints; exploration stopped.
    PatternStalled { skipped: usize },

    MinerCoresChanged { cores: usize },
}

impl ExplorationEvent {
    /// Footprint of a `ChunkExplored` event.
    pub fn explored_footprint(&self) -> Option<ChunkFootprint> {
        match self {
            ExplorationEvent::ChunkExplored { chunk, .. } => Some(chunk.footprint),
            _ => None,
        }
    }
}

/// Local sequence number of a submitted transaction.
pub type TxSequence = u64;

/// Events related to on-chain transaction lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionEvent {
    Queued {
        sequence: TxSequence,
        kind: CallKind,
    },

    /// Submission failed with a retryable error; another attempt follows.
    Retrying {
        sequence: TxSequence,
        attempt: u32,
        error: String,
    },

    Submitted {
        sequence: TxSequence,
        transaction_id: TransactionId,
    },

    Confirmed {
        sequence: TxSequence,
        transaction_id: TransactionId,
        block_number: u64,
    },

    Failed {
        sequence: TxSequence,
        error: String,
    },
}
