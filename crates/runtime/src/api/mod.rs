//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or infrastructure.

pub mod errors;
pub mod manager;
pub mod tx;

pub use errors::{Result, RuntimeError};
pub use manager::{GameManager, UPGRADE_BRANCHES};
pub(crate) use manager::ManagerParts;
pub use tx::TxHandle;
