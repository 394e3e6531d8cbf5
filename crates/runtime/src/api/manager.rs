//! Cloneable façade over the exploration runtime.
//!
//! [`GameManager`] hides channel plumbing. Queries are synchronous reads of
//! cached state (the explored store, the account cache, and the miner's
//! status snapshot); exploration controls round-trip through the miner
//! worker; contract calls are queued on the transaction worker and return a
//! [`TxHandle`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info};

use client_blockchain_core::{
    ArtifactId, ContractCall, ContractClient, EthAddress, TransactionReceipt,
};
use game_core::{
    ChunkFootprint, ExploredChunkData, GameConfig, LocationId, PlanetLevel, PlanetLocation,
    SpaceType, WorldCoords, perlin, planet_at,
};

use super::errors::{Result, RuntimeError};
use super::tx::TxHandle;
use crate::account::{AccountState, PendingTransactions, UnconfirmedMove, UnconfirmedUpgrade};
use crate::events::{ChunkSource, Event, EventBus, ExplorationEvent, TransactionEvent, Topic};
use crate::explored::ExploredChunkStore;
use crate::patterns::MiningPattern;
use crate::repository::ChunkRepository;
use crate::workers::{MetricsSnapshot, MinerCommand, MinerStatus, MiningMetrics, SubmitRequest};

/// Number of upgrade branches a planet offers.
pub const UPGRADE_BRANCHES: u8 = 3;

/// Client-facing handle to the runtime.
#[derive(Clone)]
pub struct GameManager {
    config: Arc<GameConfig>,
    miner_tx: mpsc::Sender<MinerCommand>,
    miner_status: watch::Receiver<MinerStatus>,
    store: Arc<ExploredChunkStore>,
    repository: Option<Arc<dyn ChunkRepository>>,
    metrics: Arc<MiningMetrics>,
    event_bus: EventBus,
    account: Arc<RwLock<AccountState>>,
    pending: Arc<Mutex<PendingTransactions>>,
    contract: Option<Arc<dyn ContractClient>>,
    submit_tx: Option<mpsc::Sender<SubmitRequest>>,
    next_sequence: Arc<AtomicU64>,
}

/// Channels and shared state the runtime hands to a new manager.
pub(crate) struct ManagerParts {
    pub config: GameConfig,
    pub miner_tx: mpsc::Sender<MinerCommand>,
    pub miner_status: watch::Receiver<MinerStatus>,
    pub store: Arc<ExploredChunkStore>,
    pub repository: Option<Arc<dyn ChunkRepository>>,
    pub metrics: Arc<MiningMetrics>,
    pub event_bus: EventBus,
    pub account: AccountState,
    pub pending: Arc<Mutex<PendingTransactions>>,
    pub contract: Option<Arc<dyn ContractClient>>,
    pub submit_tx: Option<mpsc::Sender<SubmitRequest>>,
}

impl GameManager {
    pub(crate) fn new(parts: ManagerParts) -> Self {
        Self {
            config: Arc::new(parts.config),
            miner_tx: parts.miner_tx,
            miner_status: parts.miner_status,
            store: parts.store,
            repository: parts.repository,
            metrics: parts.metrics,
            event_bus: parts.event_bus,
            account: Arc::new(RwLock::new(parts.account)),
            pending: parts.pending,
            contract: parts.contract,
            submit_tx: parts.submit_tx,
            next_sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    // ------------------------------------------------------------------
    // Exploration
    // ------------------------------------------------------------------

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> MinerCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.miner_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Replaces the mining pattern. Running exploration restarts on the new
    /// pattern; unfinished work of the old one is discarded.
    pub async fn set_mining_pattern(&self, pattern: impl MiningPattern + 'static) -> Result<()> {
        let pattern: Arc<dyn MiningPattern> = Arc::new(pattern);
        self.request(|reply| MinerCommand::SetPattern { pattern, reply })
            .await?
    }

    pub fn mining_pattern(&self) -> Option<Arc<dyn MiningPattern>> {
        self.miner_status.borrow().pattern.clone()
    }

    /// Sets the number of concurrent mining jobs. Returns the effective
    /// count after clamping to the hardware ceiling.
    pub async fn set_miner_cores(&self, cores: usize) -> Result<usize> {
        self.request(|reply| MinerCommand::SetCores { cores, reply })
            .await?
    }

    pub fn miner_cores(&self) -> usize {
        self.miner_status.borrow().cores
    }

    pub async fn start_explore(&self) -> Result<()> {
        self.request(|reply| MinerCommand::Start { reply }).await?
    }

    pub async fn stop_explore(&self) -> Result<()> {
        self.request(|reply| MinerCommand::Stop { reply }).await
    }

    pub fn is_exploring(&self) -> bool {
        self.miner_status.borrow().exploring
    }

    /// Footprint of the most recently dispatched job that is still running.
    pub fn currently_exploring_chunk(&self) -> Option<ChunkFootprint> {
        self.miner_status.borrow().current
    }

    /// Receiver that observes every miner status change.
    pub fn miner_status(&self) -> watch::Receiver<MinerStatus> {
        self.miner_status.clone()
    }

    pub fn has_mined_chunk(&self, footprint: &ChunkFootprint) -> bool {
        self.store.contains(footprint)
    }

    /// Records a chunk explored elsewhere so the miner skips it.
    pub fn add_new_chunk(&self, chunk: ExploredChunkData) -> Result<&Self> {
        let footprint = chunk.footprint;
        footprint
            .validate()
            .map_err(|source| RuntimeError::InvalidChunk { footprint, source })?;
        if self.store.contains(&footprint) {
            return Ok(self);
        }

        if let Some(repository) = &self.repository {
            repository.append(&chunk)?;
        }
        if self.store.insert(chunk.clone()) {
            self.event_bus
                .publish(Event::Exploration(ExplorationEvent::ChunkExplored {
                    chunk,
                    source: ChunkSource::External,
                }));
        }
        Ok(self)
    }

    /// Records many chunks at once. Every footprint is reserved before this
    /// returns its future, so the miner never dispatches one of them; the
    /// insert itself runs on the blocking pool. Either every chunk is
    /// recorded or none is.
    pub async fn bulk_add_new_chunks(&self, chunks: Vec<ExploredChunkData>) -> Result<()> {
        for chunk in &chunks {
            let footprint = chunk.footprint;
            footprint
                .validate()
                .map_err(|source| RuntimeError::InvalidChunk { footprint, source })?;
        }

        let footprints: Vec<ChunkFootprint> = chunks.iter().map(|c| c.footprint).collect();
        self.store.reserve(&footprints);

        let store = Arc::clone(&self.store);
        let repository = self.repository.clone();
        let reserved = footprints.clone();
        let joined = tokio::task::spawn_blocking(move || -> Result<usize> {
            let mut seen = HashSet::with_capacity(chunks.len());
            let fresh: Vec<ExploredChunkData> = chunks
                .into_iter()
                .filter(|c| !store.contains(&c.footprint) && seen.insert(c.footprint))
                .collect();

            if let Some(repository) = &repository
                && let Err(e) = repository.append_batch(&fresh)
            {
                store.release(&reserved);
                return Err(e.into());
            }
            Ok(store.commit_batch(fresh, &reserved))
        })
        .await;

        let count = match joined {
            Ok(result) => result?,
            Err(e) => {
                self.store.release(&footprints);
                return Err(RuntimeError::WorkerJoin(e));
            }
        };

        info!("Imported {} new chunks ({} submitted)", count, footprints.len());
        self.event_bus
            .publish(Event::Exploration(ExplorationEvent::ChunksImported { count }));
        Ok(())
    }

    /// Snapshot of every explored chunk.
    pub fn explored_chunks(&self) -> Vec<ExploredChunkData> {
        self.store.chunks()
    }

    pub fn hashes_per_sec(&self) -> f64 {
        self.metrics.hashes_per_sec()
    }

    pub fn mining_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // ------------------------------------------------------------------
    // Cached queries
    // ------------------------------------------------------------------

    fn account_state(&self) -> AccountState {
        *self.account.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn account(&self) -> Option<EthAddress> {
        self.contract.as_ref().map(|client| client.account())
    }

    pub fn contract_address(&self) -> Option<EthAddress> {
        self.contract.as_ref().map(|client| client.contract_address())
    }

    pub fn home_coords(&self) -> Option<WorldCoords> {
        self.account_state().home
    }

    pub fn home_hash(&self) -> Option<LocationId> {
        self.account_state().home_hash
    }

    pub fn has_joined_game(&self) -> bool {
        self.account_state().has_joined()
    }

    pub fn game_config(&self) -> &GameConfig {
        &self.config
    }

    pub fn world_radius(&self) -> u64 {
        self.config.world_radius
    }

    pub fn perlin_thresholds(&self) -> (u32, u32) {
        self.config.perlin_thresholds
    }

    pub fn space_type_from_perlin(&self, perlin: u32) -> SpaceType {
        SpaceType::from_perlin(perlin, self.config.perlin_thresholds)
    }

    /// Perlin value at `coords`.
    pub fn temperature(&self, coords: WorldCoords) -> u32 {
        perlin(coords, &self.config)
    }

    /// Planet at `coords`, derived without consulting explored chunks.
    pub fn planet_with_coords(&self, coords: WorldCoords) -> Option<PlanetLocation> {
        planet_at(coords, &self.config)
    }

    /// Planet found in an explored chunk.
    pub fn planet_with_id(&self, id: &LocationId) -> Option<PlanetLocation> {
        self.store.planet(id)
    }

    pub fn location_of_planet(&self, id: &LocationId) -> Option<WorldCoords> {
        self.store.planet(id).map(|planet| planet.coords)
    }

    pub fn planet_level(&self, id: &LocationId) -> Option<PlanetLevel> {
        self.store.planet(id).map(|planet| planet.level)
    }

    /// Distance between two known planets.
    pub fn distance(&self, from: &LocationId, to: &LocationId) -> Option<f64> {
        let from = self.store.planet(from)?;
        let to = self.store.planet(to)?;
        Some(from.coords.distance(&to.coords))
    }

    pub fn unconfirmed_moves(&self) -> Vec<UnconfirmedMove> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .moves()
    }

    pub fn unconfirmed_upgrades(&self) -> Vec<UnconfirmedUpgrade> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrades()
    }

    // ------------------------------------------------------------------
    // Contract calls
    // ------------------------------------------------------------------

    async fn submit(&self, call: ContractCall) -> Result<TxHandle> {
        let submit_tx = self
            .submit_tx
            .as_ref()
            .ok_or(RuntimeError::ContractNotConfigured)?;

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let kind = call.kind();
        let (reply, receipt_rx) = oneshot::channel();

        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .track(sequence, &call);
        self.event_bus
            .publish(Event::Transaction(TransactionEvent::Queued { sequence, kind }));
        debug!("Queued transaction #{} ({})", sequence, kind);

        let request = SubmitRequest {
            sequence,
            call,
            reply,
        };
        if submit_tx.send(request).await.is_err() {
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .settle(sequence);
            return Err(RuntimeError::CommandChannelClosed);
        }

        Ok(TxHandle::new(sequence, kind, receipt_rx))
    }

    fn require_joined(&self) -> Result<()> {
        if self.has_joined_game() {
            Ok(())
        } else {
            Err(RuntimeError::NotJoined)
        }
    }

    fn require_known(&self, planet: &LocationId) -> Result<()> {
        if self.store.planet(planet).is_some() {
            Ok(())
        } else {
            Err(RuntimeError::UnknownPlanet(*planet))
        }
    }

    /// Claims the planet at `coords` as home and waits for confirmation.
    /// On success the miner explores around it.
    pub async fn join_game(&self, coords: WorldCoords) -> Result<TransactionReceipt> {
        if let Some(home) = self.home_coords() {
            return Err(RuntimeError::AlreadyJoined { home });
        }
        let planet =
            planet_at(coords, &self.config).ok_or(RuntimeError::InvalidHomePlanet { coords })?;

        let receipt = self
            .submit(ContractCall::JoinGame { home: planet.hash })
            .await?
            .wait()
            .await?;

        {
            let mut account = self.account.write().unwrap_or_else(PoisonError::into_inner);
            account.home = Some(coords);
            account.home_hash = Some(planet.hash);
        }
        self.miner_tx
            .send(MinerCommand::SetHome { home: coords })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        info!("Joined game with home {} ({})", coords, planet.hash);
        Ok(receipt)
    }

    pub async fn move_planet(
        &self,
        from: LocationId,
        to: LocationId,
        forces: u64,
        silver: u64,
    ) -> Result<TxHandle> {
        self.require_joined()?;
        self.require_known(&from)?;
        self.require_known(&to)?;
        self.submit(ContractCall::Move {
            from,
            to,
            forces,
            silver,
        })
        .await
    }

    pub async fn upgrade(&self, planet: LocationId, branch: u8) -> Result<TxHandle> {
        self.require_joined()?;
        if branch >= UPGRADE_BRANCHES {
            return Err(RuntimeError::InvalidUpgradeBranch(branch));
        }
        self.require_known(&planet)?;
        self.submit(ContractCall::Upgrade { planet, branch }).await
    }

    pub async fn buy_hat(&self, planet: LocationId) -> Result<TxHandle> {
        self.require_joined()?;
        self.require_known(&planet)?;
        self.submit(ContractCall::BuyHat { planet }).await
    }

    pub async fn find_artifact(&self, planet: LocationId) -> Result<TxHandle> {
        self.require_joined()?;
        self.require_known(&planet)?;
        self.submit(ContractCall::FindArtifact { planet }).await
    }

    pub async fn deposit_artifact(
        &self,
        planet: LocationId,
        artifact: ArtifactId,
    ) -> Result<TxHandle> {
        self.require_joined()?;
        self.require_known(&planet)?;
        self.submit(ContractCall::DepositArtifact { planet, artifact })
            .await
    }

    pub async fn withdraw_artifact(&self, planet: LocationId) -> Result<TxHandle> {
        self.require_joined()?;
        self.require_known(&planet)?;
        self.submit(ContractCall::WithdrawArtifact { planet }).await
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Subscribe to events from a specific topic.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::{Event, ExplorationEvent, Topic};
    ///
    /// let mut rx = manager.subscribe(Topic::Exploration);
    /// while let Ok(Event::Exploration(ExplorationEvent::ChunkExplored { chunk, .. })) =
    ///     rx.recv().await
    /// {
    ///     println!("explored {}", chunk.footprint);
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }
}
