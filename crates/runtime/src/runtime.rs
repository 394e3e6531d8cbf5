//! High-level runtime orchestrator.
//!
//! The runtime owns background workers, wires up command/event channels, and
//! exposes a builder-based API for clients to drive exploration.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use client_blockchain_core::ContractClient;
use game_core::{ChunkMiner, GameConfig, LocationId, WorldCoords};

use crate::account::{AccountState, PendingTransactions};
use crate::api::{GameManager, ManagerParts, Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::explored::ExploredChunkStore;
use crate::repository::ChunkRepository;
use crate::workers::{
    MinerCommand, MinerShared, MinerStatus, MinerWorker, MiningMetrics, TransactionWorker,
    hardware_parallelism,
};

/// Miner worker settings.
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Concurrent mining jobs. Clamped to `[1, available_parallelism]`.
    pub cores: usize,
    /// Consecutive known footprints tolerated in one dispatch before the
    /// pattern is declared stalled.
    pub max_skips_per_dispatch: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            cores: hardware_parallelism(),
            max_skips_per_dispatch: 250_000,
        }
    }
}

/// Transaction worker settings.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    pub queue_size: usize,
    /// Retries after the first attempt, for retryable transport errors only.
    pub max_retries: u32,
    /// Delay before retry `n` is `n * retry_backoff`.
    pub retry_backoff: Duration,
    pub confirmation_poll_interval: Duration,
    pub confirmation_timeout: Duration,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            queue_size: 64,
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
            confirmation_poll_interval: Duration::from_secs(1),
            confirmation_timeout: Duration::from_secs(120),
        }
    }
}

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub game_config: GameConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    pub miner: MinerConfig,
    pub submitter: SubmitterConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            event_buffer_size: 256,
            command_buffer_size: 32,
            miner: MinerConfig::default(),
            submitter: SubmitterConfig::default(),
        }
    }
}

/// Main runtime that owns the background workers.
///
/// [`GameManager`] provides a cloneable façade for clients.
pub struct Runtime {
    manager: GameManager,
    shutdown_tx: watch::Sender<bool>,
    miner_worker_handle: JoinHandle<()>,
    submitter_worker_handle: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable manager for this runtime
    pub fn manager(&self) -> GameManager {
        self.manager.clone()
    }

    /// Subscribe to events from a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.manager.subscribe(topic)
    }

    /// Stop the workers and wait for them to exit.
    ///
    /// Running mining jobs are aborted; their results are discarded.
    pub async fn shutdown(self) -> Result<()> {
        // Workers also exit once every sender is gone, so a send error here
        // only means they already stopped.
        let _ = self.shutdown_tx.send(true);

        self.miner_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        if let Some(handle) = self.submitter_worker_handle {
            handle.await.map_err(RuntimeError::WorkerJoin)?;
        }

        info!("Runtime shut down");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    repository: Option<Arc<dyn ChunkRepository>>,
    contract: Option<Arc<dyn ContractClient>>,
    home: Option<WorldCoords>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            repository: None,
            contract: None,
            home: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override only the game constants
    pub fn game_config(mut self, game_config: GameConfig) -> Self {
        self.config.game_config = game_config;
        self
    }

    /// Durable chunk record. Loaded at build time; every new chunk is
    /// appended to it. Without one, exploration lives in memory only.
    pub fn repository(mut self, repository: impl ChunkRepository + 'static) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    /// Contract client used for joins, moves, and other transactions.
    pub fn contract_client(mut self, client: impl ContractClient + 'static) -> Self {
        self.contract = Some(Arc::new(client));
        self
    }

    /// Home planet of an account that already joined in an earlier session.
    pub fn home(mut self, coords: WorldCoords) -> Self {
        self.home = Some(coords);
        self
    }

    /// Build the runtime and spawn its workers
    pub async fn build(self) -> Result<Runtime> {
        let RuntimeConfig {
            game_config,
            event_buffer_size,
            command_buffer_size,
            miner: miner_config,
            submitter: submitter_config,
        } = self.config;

        let store = match &self.repository {
            Some(repository) => {
                let repository = Arc::clone(repository);
                let chunks = tokio::task::spawn_blocking(move || repository.load_all())
                    .await
                    .map_err(RuntimeError::WorkerJoin)??;
                info!("Loaded {} explored chunks", chunks.len());
                ExploredChunkStore::from_chunks(chunks)
            }
            None => ExploredChunkStore::new(),
        };
        let store = Arc::new(store);

        let event_bus = EventBus::with_capacity(event_buffer_size);
        let metrics = Arc::new(MiningMetrics::new());
        let pending = Arc::new(Mutex::new(PendingTransactions::default()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Miner worker
        let (miner_tx, miner_rx) = mpsc::channel::<MinerCommand>(command_buffer_size.max(1));
        let (status_tx, status_rx) = watch::channel(MinerStatus {
            cores: miner_config.cores.clamp(1, hardware_parallelism()),
            ..MinerStatus::default()
        });
        let miner_worker = MinerWorker::new(
            ChunkMiner::new(game_config.clone()),
            &miner_config,
            MinerShared {
                store: Arc::clone(&store),
                repository: self.repository.clone(),
                event_bus: event_bus.clone(),
                metrics: Arc::clone(&metrics),
            },
            miner_rx,
            status_tx,
            shutdown_rx.clone(),
        );
        let miner_worker_handle = tokio::spawn(async move {
            miner_worker.run().await;
        });

        if let Some(home) = self.home {
            miner_tx
                .send(MinerCommand::SetHome { home })
                .await
                .map_err(|_| RuntimeError::CommandChannelClosed)?;
        }

        // Transaction worker (if a contract client is configured)
        let (submit_tx, submitter_worker_handle) = match &self.contract {
            Some(client) => {
                let (submit_tx, submit_rx) = mpsc::channel(submitter_config.queue_size.max(1));
                let worker = TransactionWorker::new(
                    Arc::clone(client),
                    submitter_config,
                    submit_rx,
                    event_bus.clone(),
                    Arc::clone(&pending),
                    shutdown_rx,
                );
                let handle = tokio::spawn(async move {
                    worker.run().await;
                });
                (Some(submit_tx), Some(handle))
            }
            None => (None, None),
        };

        let account = AccountState {
            home: self.home,
            home_hash: self
                .home
                .map(|coords| LocationId::of(coords, game_config.planet_hash_key)),
        };

        let manager = GameManager::new(ManagerParts {
            config: game_config,
            miner_tx,
            miner_status: status_rx,
            store,
            repository: self.repository,
            metrics,
            event_bus,
            account,
            pending,
            contract: self.contract,
            submit_tx,
        });

        Ok(Runtime {
            manager,
            shutdown_tx,
            miner_worker_handle,
            submitter_worker_handle,
        })
    }
}
