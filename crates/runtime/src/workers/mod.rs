//! Worker tasks that back the runtime.
//!
//! The miner worker schedules chunk hashing on the blocking pool, and the
//! transaction worker drives contract calls to settlement.

mod metrics;
mod miner;
mod submitter;

pub use metrics::{MetricsSnapshot, MiningMetrics};
pub use miner::{MinerCommand, MinerShared, MinerStatus, MinerWorker, hardware_parallelism};
pub use submitter::{SubmitRequest, TransactionWorker};
