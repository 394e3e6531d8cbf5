//! In-memory ChunkRepository implementation for tests and local runs.

use std::sync::RwLock;

use game_core::ExploredChunkData;

use crate::repository::{ChunkRepository, RepositoryError, Result};

/// In-memory implementation of ChunkRepository.
#[derive(Default)]
pub struct InMemoryChunkRepository {
    chunks: RwLock<Vec<ExploredChunkData>>,
}

impl InMemoryChunkRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `chunks`.
    pub fn with_chunks(chunks: Vec<ExploredChunkData>) -> Self {
        Self {
            chunks: RwLock::new(chunks),
        }
    }
}

impl ChunkRepository for InMemoryChunkRepository {
    fn load_all(&self) -> Result<Vec<ExploredChunkData>> {
        let chunks = self
            .chunks
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(chunks.clone())
    }

    fn append(&self, chunk: &ExploredChunkData) -> Result<()> {
        let mut chunks = self
            .chunks
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        chunks.push(chunk.clone());
        Ok(())
    }

    fn append_batch(&self, batch: &[ExploredChunkData]) -> Result<()> {
        let mut chunks = self
            .chunks
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        chunks.extend_from_slice(batch);
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let chunks = self
            .chunks
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(chunks.len())
    }
}
