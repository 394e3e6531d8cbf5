//! Exploration runtime for the game client.
//!
//! This crate wires together the mining scheduler, the explored-chunk record,
//! and contract submission into a cohesive runtime API. Consumers embed
//! [`Runtime`] to mine the map around their home planet, subscribe to events,
//! and act on discovered planets through [`GameManager`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`patterns`] defines which footprints get mined, and in what order
//! - [`repository`] persists explored chunks across sessions
//! - `workers` keeps background tasks internal to the crate
pub mod account;
pub mod api;
pub mod events;
pub mod explored;
pub mod patterns;
pub mod repository;
pub mod runtime;

mod workers;

pub use account::{AccountState, UnconfirmedMove, UnconfirmedUpgrade};
pub use api::{GameManager, Result, RuntimeError, TxHandle, UPGRADE_BRANCHES};
pub use events::{
    ChunkSource, Event, EventBus, ExplorationEvent, Topic, TransactionEvent, TxSequence,
};
pub use explored::ExploredChunkStore;
pub use patterns::{
    FootprintIter, ListPattern, MiningPattern, PatternKind, SpiralPattern, SwissCheesePattern,
    TowardsCenterPattern, validate_pattern,
};
pub use repository::{
    ChunkRepository, FileChunkRepository, InMemoryChunkRepository, RepositoryError,
};
pub use runtime::{MinerConfig, Runtime, RuntimeBuilder, RuntimeConfig, SubmitterConfig};
pub use workers::{MetricsSnapshot, MinerStatus, MiningMetrics, hardware_parallelism};
