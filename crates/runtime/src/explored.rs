//! In-memory "already explored" record shared by the miner and the façade.
//!
//! Reads (is this footprint explored?) run concurrently; every mutation takes
//! the write lock once, so concurrent completions and imports never lose
//! updates. [`ExploredChunkStore::insert`] is the exactly-once gate for
//! chunk notifications.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use game_core::{ChunkFootprint, ExploredChunkData, LocationId, PlanetLocation};

#[derive(Default)]
struct StoreInner {
    chunks: HashMap<ChunkFootprint, ExploredChunkData>,
    /// Footprints promised by an import that has not committed yet.
    reserved: HashMap<ChunkFootprint, usize>,
    planets: HashMap<LocationId, PlanetLocation>,
}

impl StoreInner {
    fn insert(&mut self, chunk: ExploredChunkData) -> bool {
        if self.chunks.contains_key(&chunk.footprint) {
            return false;
        }
        for planet in &chunk.planet_locations {
            self.planets.insert(planet.hash, planet.clone());
        }
        self.chunks.insert(chunk.footprint, chunk);
        true
    }

    fn release(&mut self, footprint: &ChunkFootprint) {
        if let Some(count) = self.reserved.get_mut(footprint) {
            *count -= 1;
            if *count == 0 {
                self.reserved.remove(footprint);
            }
        }
    }
}

/// Concurrent map of explored footprints plus a planet index.
#[derive(Default)]
pub struct ExploredChunkStore {
    inner: RwLock<StoreInner>,
}

impl ExploredChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from previously persisted chunks. Duplicates are ignored.
    pub fn from_chunks(chunks: impl IntoIterator<Item = ExploredChunkData>) -> Self {
        let mut inner = StoreInner::default();
        for chunk in chunks {
            inner.insert(chunk);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    // A panicking writer leaves the maps consistent (every mutation is a
    // single insert/remove), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `footprint` has been recorded.
    pub fn contains(&self, footprint: &ChunkFootprint) -> bool {
        self.read().chunks.contains_key(footprint)
    }

    /// Whether `footprint` is recorded or reserved by a pending import.
    pub fn is_known(&self, footprint: &ChunkFootprint) -> bool {
        let inner = self.read();
        inner.chunks.contains_key(footprint) || inner.reserved.contains_key(footprint)
    }

    /// Records a chunk. Returns `true` only the first time a footprint is seen.
    pub fn insert(&self, chunk: ExploredChunkData) -> bool {
        self.write().insert(chunk)
    }

    /// Marks footprints as about to be recorded so the miner skips them.
    pub fn reserve(&self, footprints: &[ChunkFootprint]) {
        let mut inner = self.write();
        for footprint in footprints {
            *inner.reserved.entry(*footprint).or_insert(0) += 1;
        }
    }

    /// Drops reservations without recording anything.
    pub fn release(&self, footprints: &[ChunkFootprint]) {
        let mut inner = self.write();
        for footprint in footprints {
            inner.release(footprint);
        }
    }

    /// Records `chunks` and drops `reserved` under a single write lock.
    /// Returns how many chunks were new.
    pub fn commit_batch(
        &self,
        chunks: Vec<ExploredChunkData>,
        reserved: &[ChunkFootprint],
    ) -> usize {
        let mut inner = self.write();
        let added = chunks
            .into_iter()
            .map(|chunk| inner.insert(chunk))
            .filter(|added| *added)
            .count();
        for footprint in reserved {
            inner.release(footprint);
        }
        added
    }

    pub fn len(&self) -> usize {
        self.read().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().chunks.is_empty()
    }

    pub fn chunk(&self, footprint: &ChunkFootprint) -> Option<ExploredChunkData> {
        self.read().chunks.get(footprint).cloned()
    }

    /// Snapshot of every recorded chunk, in no particular order.
    pub fn chunks(&self) -> Vec<ExploredChunkData> {
        self.read().chunks.values().cloned().collect()
    }

    pub fn planet(&self, id: &LocationId) -> Option<PlanetLocation> {
        self.read().planets.get(id).cloned()
    }

    pub fn planet_count(&self) -> usize {
        self.read().planets.len()
    }
}
