//! Repository layer for the explored-chunk record.
//!
//! Repositories persist data that grows during play. Derived lookups
//! (planet index, mined set) are rebuilt from them at startup.

mod chunk_log;
mod error;
mod in_memory;
mod traits;

pub use chunk_log::FileChunkRepository;
pub use error::{RepositoryError, Result};
pub use in_memory::InMemoryChunkRepository;
pub use traits::ChunkRepository;
