//! Repository contract for the durable "already explored" record.

use game_core::ExploredChunkData;

use super::Result;

/// Durable record of explored chunks.
///
/// Append-only: chunks are never rewritten or removed. The runtime loads
/// the whole record at startup and appends every newly recorded chunk
/// before it becomes visible to queries.
pub trait ChunkRepository: Send + Sync {
    /// Load every stored chunk, oldest first.
    fn load_all(&self) -> Result<Vec<ExploredChunkData>>;

    /// Append a single chunk.
    fn append(&self, chunk: &ExploredChunkData) -> Result<()>;

    /// Append a batch. Either every chunk is stored or none is.
    fn append_batch(&self, chunks: &[ExploredChunkData]) -> Result<()> {
        for chunk in chunks {
            self.append(chunk)?;
        }
        Ok(())
    }

    /// Number of stored chunks.
    fn len(&self) -> Result<usize> {
        Ok(self.load_all()?.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
