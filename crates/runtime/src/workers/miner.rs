//! Exploration scheduler.
//!
//! [`MinerWorker`] owns the pattern cursor and the set of running jobs. Each
//! job hashes one footprint on the blocking pool and reports back over an
//! unbounded channel; the worker records the result and dispatches the next
//! footprint. Only the worker mutates scheduling state, so commands and
//! completions are serialized by its select loop.

use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use game_core::{
    ChunkFootprint, ChunkMiner, ExploredChunkData, FootprintError, MineOutcome, WorldCoords,
};

use crate::api::{Result, RuntimeError};
use crate::events::{ChunkSource, Event, EventBus, ExplorationEvent};
use crate::explored::ExploredChunkStore;
use crate::patterns::{FootprintIter, MiningPattern, validate_pattern};
use crate::repository::ChunkRepository;
use crate::runtime::MinerConfig;
use crate::workers::MiningMetrics;

/// Upper bound for concurrent jobs on this machine.
pub fn hardware_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Commands accepted by the miner worker.
pub enum MinerCommand {
    SetPattern {
        pattern: Arc<dyn MiningPattern>,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Replies with the effective core count.
    SetCores {
        cores: usize,
        reply: oneshot::Sender<Result<usize>>,
    },
    Start {
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    SetHome {
        home: WorldCoords,
    },
}

/// Scheduler state published after every change.
#[derive(Debug, Clone, Default)]
pub struct MinerStatus {
    pub exploring: bool,
    pub cores: usize,
    pub pattern: Option<Arc<dyn MiningPattern>>,
    /// Footprint of the most recently dispatched job still running.
    pub current: Option<ChunkFootprint>,
    pub in_flight: usize,
}

/// Collaborators the miner shares with the façade.
#[derive(Clone)]
pub struct MinerShared {
    pub store: Arc<ExploredChunkStore>,
    pub repository: Option<Arc<dyn ChunkRepository>>,
    pub event_bus: EventBus,
    pub metrics: Arc<MiningMetrics>,
}

type JobId = u64;

struct Job {
    footprint: ChunkFootprint,
    abort: Arc<AtomicBool>,
}

struct JobOutcome {
    job: JobId,
    footprint: ChunkFootprint,
    result: std::result::Result<MineOutcome, FootprintError>,
    elapsed: Duration,
}

enum NextFootprint {
    Ready(ChunkFootprint),
    Exhausted,
    Stalled(usize),
}

/// Background task that schedules chunk mining.
pub struct MinerWorker {
    miner: Arc<ChunkMiner>,
    max_skips_per_dispatch: usize,
    shared: MinerShared,
    command_rx: mpsc::Receiver<MinerCommand>,
    done_tx: mpsc::UnboundedSender<JobOutcome>,
    done_rx: mpsc::UnboundedReceiver<JobOutcome>,
    status_tx: watch::Sender<MinerStatus>,
    shutdown_rx: watch::Receiver<bool>,

    home: Option<WorldCoords>,
    pattern: Option<Arc<dyn MiningPattern>>,
    cursor: Option<FootprintIter>,
    /// Footprints discarded by a stop, mined before the cursor resumes.
    requeued: VecDeque<ChunkFootprint>,
    exploring: bool,
    cores: usize,
    next_job: JobId,
    in_flight: BTreeMap<JobId, Job>,
}

impl MinerWorker {
    pub fn new(
        miner: ChunkMiner,
        config: &MinerConfig,
        shared: MinerShared,
        command_rx: mpsc::Receiver<MinerCommand>,
        status_tx: watch::Sender<MinerStatus>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let cores = config.cores.clamp(1, hardware_parallelism());
        info!(
            "MinerWorker initialized with {} cores (requested {})",
            cores, config.cores
        );

        Self {
            miner: Arc::new(miner),
            max_skips_per_dispatch: config.max_skips_per_dispatch,
            shared,
            command_rx,
            done_tx,
            done_rx,
            status_tx,
            shutdown_rx,
            home: None,
            pattern: None,
            cursor: None,
            requeued: VecDeque::new(),
            exploring: false,
            cores,
            next_job: 0,
            in_flight: BTreeMap::new(),
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        self.publish_status();
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(outcome) = self.done_rx.recv() => self.handle_outcome(outcome),
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        self.exploring = false;
        self.abort_in_flight();
        self.publish_status();
        info!("MinerWorker stopped");
    }

    fn handle_command(&mut self, cmd: MinerCommand) {
        match cmd {
            MinerCommand::SetPattern { pattern, reply } => {
                let result = self.set_pattern(pattern);
                self.respond(reply, result, "SetPattern");
            }
            MinerCommand::SetCores { cores, reply } => {
                let result = self.set_cores(cores);
                self.respond(reply, result, "SetCores");
            }
            MinerCommand::Start { reply } => {
                let result = self.start();
                self.respond(reply, result, "Start");
            }
            MinerCommand::Stop { reply } => {
                self.stop();
                self.respond(reply, (), "Stop");
            }
            MinerCommand::SetHome { home } => {
                self.set_home(home);
                self.publish_status();
            }
        }
    }

    /// Publishes the new status before replying so callers observe it as
    /// soon as their command returns.
    fn respond<T>(&self, reply: oneshot::Sender<T>, value: T, command: &str) {
        self.publish_status();
        if reply.send(value).is_err() {
            debug!("{} reply channel closed (caller dropped)", command);
        }
    }

    fn set_pattern(&mut self, pattern: Arc<dyn MiningPattern>) -> Result<()> {
        validate_pattern(pattern.as_ref(), self.home.unwrap_or(WorldCoords::ORIGIN))?;

        let was_exploring = self.exploring;
        self.exploring = false;
        let discarded = self.abort_in_flight();
        if !discarded.is_empty() {
            debug!("Discarded {} in-flight footprints", discarded.len());
        }
        self.requeued.clear();
        self.cursor = None;

        info!("Mining pattern set to {}", pattern.kind());
        self.publish(ExplorationEvent::PatternChanged {
            pattern: pattern.kind(),
        });
        self.pattern = Some(pattern);

        if was_exploring {
            self.start()?;
        }
        Ok(())
    }

    fn set_cores(&mut self, requested: usize) -> Result<usize> {
        if requested == 0 {
            return Err(RuntimeError::WorkerPoolExhausted { requested });
        }

        let ceiling = hardware_parallelism();
        let cores = requested.min(ceiling);
        if cores < requested {
            warn!(
                "Requested {} miner cores, clamped to hardware ceiling {}",
                requested, ceiling
            );
        }

        if cores != self.cores {
            info!("Miner cores changed {} -> {}", self.cores, cores);
            self.cores = cores;
            self.publish(ExplorationEvent::MinerCoresChanged { cores });
        }
        // Shrinking withholds dispatch until running jobs drain below the
        // new count; growing fills the new slots now.
        self.dispatch();
        Ok(cores)
    }

    fn start(&mut self) -> Result<()> {
        let home = self.home.ok_or(RuntimeError::NoHomePlanet)?;
        if self.exploring {
            return Ok(());
        }
        let Some(pattern) = self.pattern.clone() else {
            debug!("start_explore ignored: no mining pattern set");
            return Ok(());
        };

        if self.cursor.is_none() {
            self.cursor = Some(Box::new(pattern.footprints(home).fuse()));
        }
        self.exploring = true;
        info!("Exploration started ({} pattern around {})", pattern.kind(), home);
        self.publish(ExplorationEvent::ExploreStarted {
            pattern: pattern.kind(),
        });

        self.dispatch();
        Ok(())
    }

    fn stop(&mut self) {
        let was_exploring = self.exploring;
        self.exploring = false;

        let discarded = self.abort_in_flight();
        for footprint in discarded.into_iter().rev() {
            self.requeued.push_front(footprint);
        }

        if was_exploring {
            info!(
                "Exploration stopped ({} footprints re-queued)",
                self.requeued.len()
            );
            self.publish(ExplorationEvent::ExploreStopped);
        }
    }

    fn set_home(&mut self, home: WorldCoords) {
        if self.home == Some(home) {
            return;
        }
        info!("Exploration home set to {}", home);
        self.home = Some(home);
        // A cursor built around the old home is meaningless now.
        self.cursor = None;
        self.requeued.clear();
    }

    /// Sets the abort flag on every running job and forgets them. Returns
    /// their footprints in dispatch order.
    fn abort_in_flight(&mut self) -> Vec<ChunkFootprint> {
        let jobs = std::mem::take(&mut self.in_flight);
        self.shared.metrics.set_in_flight(0);
        jobs.into_values()
            .map(|job| {
                job.abort.store(true, Ordering::Release);
                job.footprint
            })
            .collect()
    }

    /// Fills idle slots from the re-queue, then the pattern cursor.
    fn dispatch(&mut self) {
        while self.exploring && self.in_flight.len() < self.cores {
            match self.next_footprint() {
                NextFootprint::Ready(footprint) => self.spawn_job(footprint),
                NextFootprint::Exhausted => {
                    if self.in_flight.is_empty() {
                        info!("Mining pattern exhausted; exploration stopped");
                        self.exploring = false;
                        self.publish_status();
                        self.publish(ExplorationEvent::PatternExhausted);
                    }
                    break;
                }
                NextFootprint::Stalled(skipped) => {
                    warn!(
                        "Mining pattern yielded {} known footprints in a row; exploration stopped",
                        skipped
                    );
                    self.exploring = false;
                    self.publish_status();
                    self.publish(ExplorationEvent::PatternStalled { skipped });
                    break;
                }
            }
        }
    }

    fn next_footprint(&mut self) -> NextFootprint {
        let mut skipped = 0;
        loop {
            let candidate = match self.requeued.pop_front() {
                Some(footprint) => footprint,
                None => match self.cursor.as_mut().and_then(Iterator::next) {
                    Some(footprint) => footprint,
                    None => return NextFootprint::Exhausted,
                },
            };

            if self.shared.store.is_known(&candidate) || self.is_running(&candidate) {
                skipped += 1;
                if skipped > self.max_skips_per_dispatch {
                    return NextFootprint::Stalled(skipped);
                }
                continue;
            }
            return NextFootprint::Ready(candidate);
        }
    }

    fn is_running(&self, footprint: &ChunkFootprint) -> bool {
        self.in_flight.values().any(|job| job.footprint == *footprint)
    }

    fn spawn_job(&mut self, footprint: ChunkFootprint) {
        let job = self.next_job;
        self.next_job += 1;

        let abort = Arc::new(AtomicBool::new(false));
        self.in_flight.insert(
            job,
            Job {
                footprint,
                abort: Arc::clone(&abort),
            },
        );
        self.shared.metrics.set_in_flight(self.in_flight.len() as u64);
        debug!(job, %footprint, "Dispatching footprint");

        let miner = Arc::clone(&self.miner);
        let done_tx = self.done_tx.clone();
        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let result = miner.mine_until(footprint, || abort.load(Ordering::Acquire));
            let outcome = JobOutcome {
                job,
                footprint,
                result,
                elapsed: started.elapsed(),
            };
            if done_tx.send(outcome).is_err() {
                debug!(job, "Miner worker gone; dropping job outcome");
            }
        });
    }

    fn handle_outcome(&mut self, outcome: JobOutcome) {
        let JobOutcome {
            job,
            footprint,
            result,
            elapsed,
        } = outcome;
        self.in_flight.remove(&job);
        self.shared.metrics.set_in_flight(self.in_flight.len() as u64);

        match result {
            Ok(MineOutcome::Completed { chunk, hashes }) => {
                debug!(job, %footprint, hashes, ?elapsed, "Footprint mined");
                self.shared.metrics.record_chunk(hashes, elapsed);
                self.record(chunk);
            }
            Ok(MineOutcome::Aborted { hashes }) => {
                debug!(job, %footprint, hashes, "Footprint job aborted");
                self.shared.metrics.record_aborted(hashes);
            }
            Err(e) => {
                error!(job, %footprint, "Footprint cannot be mined: {}", e);
            }
        }

        self.dispatch();
        self.publish_status();
    }

    fn record(&self, chunk: ExploredChunkData) {
        let MinerShared {
            store,
            repository,
            event_bus,
            ..
        } = &self.shared;

        if store.contains(&chunk.footprint) {
            debug!(footprint = %chunk.footprint, "Mined footprint was already recorded");
            return;
        }
        if let Some(repository) = repository
            && let Err(e) = repository.append(&chunk)
        {
            error!(footprint = %chunk.footprint, "Failed to persist mined chunk: {}", e);
        }
        if store.insert(chunk.clone()) {
            event_bus.publish(Event::Exploration(ExplorationEvent::ChunkExplored {
                chunk,
                source: ChunkSource::Mined,
            }));
        }
    }

    fn publish(&self, event: ExplorationEvent) {
        self.shared.event_bus.publish(Event::Exploration(event));
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(MinerStatus {
            exploring: self.exploring,
            cores: self.cores,
            pattern: self.pattern.clone(),
            current: self.in_flight.values().next_back().map(|job| job.footprint),
            in_flight: self.in_flight.len(),
        });
    }
}
