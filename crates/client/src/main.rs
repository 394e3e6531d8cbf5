//! Headless explorer binary.
//!
//! Mines the map around a configured home planet, persists every explored
//! chunk, and logs discoveries until interrupted.
//!
//! ```bash
//! HOME_X=120 HOME_Y=-48 EXPLORER_PATTERN=swiss-cheese cargo run -p explorer-client
//! ```

use anyhow::{Context, Result};
use explorer_client::{ClientConfig, dirs, logging};
use runtime::{
    Event, ExplorationEvent, FileChunkRepository, GameManager, PatternKind, Runtime,
    RuntimeConfig, SpiralPattern, SwissCheesePattern, Topic, TowardsCenterPattern,
};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. Setup logging, so configuration warnings reach the log
    let _log_guard = logging::setup_logging(ClientConfig::session_id_from_env().as_deref())?;

    // 2. Load configuration from environment
    let config = ClientConfig::from_env();

    tracing::info!("Starting explorer");

    let game_config = config.game_config()?;
    let home = config
        .home
        .context("HOME_X and HOME_Y must be set to the home planet coordinates")?;

    let save_dir = config.save_data_dir.clone().unwrap_or_else(dirs::data_dir);
    let repository = FileChunkRepository::open_or_create(&save_dir)
        .with_context(|| format!("Failed to open chunk log in {}", save_dir.display()))?;
    tracing::info!("Chunk log: {}", save_dir.display());

    // 3. Build runtime
    let mut runtime_config = RuntimeConfig {
        game_config,
        ..RuntimeConfig::default()
    };
    if let Some(cores) = config.cores {
        runtime_config.miner.cores = cores;
    }
    let chunk_size = runtime_config.game_config.chunk_side_length;

    let runtime = Runtime::builder()
        .config(runtime_config)
        .repository(repository)
        .home(home)
        .build()
        .await?;
    let manager = runtime.manager();
    tracing::info!(
        "Loaded {} explored chunks, home at {}",
        manager.explored_chunks().len(),
        home
    );

    // 4. Explore until interrupted
    let events = runtime.subscribe(Topic::Exploration);
    set_pattern(&manager, config.pattern, chunk_size).await?;
    manager.start_explore().await?;

    tokio::select! {
        _ = log_events(events) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for ctrl-c")?;
            tracing::info!("Interrupted, stopping exploration");
        }
    }

    manager.stop_explore().await?;
    let metrics = manager.mining_metrics();
    tracing::info!(
        chunks_mined = metrics.chunks_mined,
        chunks_aborted = metrics.chunks_aborted,
        hashes = metrics.hashes,
        peak_in_flight = metrics.peak_in_flight,
        "Mining summary: {:.0} H/s, {:?} per chunk",
        metrics.hashes_per_sec,
        metrics.avg_chunk_time,
    );

    runtime.shutdown().await?;
    tracing::info!("Explorer shut down");

    Ok(())
}

async fn set_pattern(manager: &GameManager, kind: PatternKind, chunk_size: u32) -> Result<()> {
    match kind {
        PatternKind::SwissCheese => {
            manager
                .set_mining_pattern(SwissCheesePattern::new(chunk_size))
                .await?
        }
        PatternKind::TowardsCenter => {
            manager
                .set_mining_pattern(TowardsCenterPattern::new(chunk_size))
                .await?
        }
        _ => manager.set_mining_pattern(SpiralPattern::new(chunk_size)).await?,
    }
    tracing::info!("Mining pattern: {}", kind);
    Ok(())
}

/// Logs exploration events; returns when the event bus closes.
async fn log_events(mut events: tokio::sync::broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(Event::Exploration(event)) => log_exploration_event(&event),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Event log lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn log_exploration_event(event: &ExplorationEvent) {
    match event {
        ExplorationEvent::ChunkExplored { chunk, source } => {
            if chunk.planet_locations.is_empty() {
                tracing::debug!("Explored {} ({:?})", chunk.footprint, source);
            } else {
                tracing::info!(
                    "Explored {} ({:?}): {} planets",
                    chunk.footprint,
                    source,
                    chunk.planet_locations.len()
                );
            }
        }
        ExplorationEvent::PatternExhausted => {
            tracing::info!("Mining pattern exhausted");
        }
        ExplorationEvent::PatternStalled { skipped } => {
            tracing::warn!("Mining pattern stalled after {} known footprints", skipped);
        }
        other => tracing::info!("{:?}", other),
    }
}
