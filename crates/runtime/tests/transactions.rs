//! Contract calls routed through the transaction worker.

use std::time::Duration;

use client_blockchain_core::{
    ArtifactId, CallKind, ContractCall, ContractClient, MockContractClient,
};
use game_core::{
    ChunkFootprint, ChunkMiner, GameConfig, LocationId, PlanetLocation, WorldCoords, planet_at,
};
use runtime::{
    Event, GameManager, Runtime, RuntimeConfig, RuntimeError, SubmitterConfig, Topic,
    TransactionEvent,
};
use tokio::sync::broadcast;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

fn game_config() -> GameConfig {
    GameConfig::new().with_planet_rarity(16)
}

fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        game_config: game_config(),
        submitter: SubmitterConfig {
            queue_size: 8,
            max_retries: 3,
            retry_backoff: Duration::from_millis(5),
            confirmation_poll_interval: Duration::from_millis(5),
            confirmation_timeout: Duration::from_secs(5),
        },
        ..RuntimeConfig::default()
    }
}

async fn start_runtime(client: MockContractClient) -> (Runtime, GameManager) {
    let runtime = Runtime::builder()
        .config(runtime_config())
        .contract_client(client)
        .build()
        .await
        .expect("runtime should build");
    let manager = runtime.manager();
    (runtime, manager)
}

fn home_planet() -> PlanetLocation {
    (0..)
        .map(|x| WorldCoords::new(x, 7))
        .find_map(|coords| planet_at(coords, &game_config()))
        .unwrap()
}

fn empty_space() -> WorldCoords {
    (0..)
        .map(|x| WorldCoords::new(x, 7))
        .find(|coords| planet_at(*coords, &game_config()).is_none())
        .unwrap()
}

/// Records a neighbourhood of chunks and returns two of its planets.
async fn explore_planets(manager: &GameManager) -> (LocationId, LocationId) {
    let miner = ChunkMiner::new(game_config());
    let chunks: Vec<_> = (0..16)
        .map(|i| {
            miner
                .mine(ChunkFootprint::new(WorldCoords::new(i * 8, 64), 8))
                .unwrap()
        })
        .collect();
    manager.bulk_add_new_chunks(chunks.clone()).await.unwrap();

    let mut planets = chunks.iter().flat_map(|c| c.planet_locations.iter());
    let a = planets.next().unwrap().hash;
    let b = planets.next().unwrap().hash;
    (a, b)
}

async fn next_transaction_event(rx: &mut broadcast::Receiver<Event>) -> TransactionEvent {
    loop {
        match timeout(WAIT, rx.recv()).await {
            Ok(Ok(Event::Transaction(event))) => return event,
            Ok(Ok(_)) => continue,
            Ok(Err(e)) => panic!("event bus error: {e}"),
            Err(_) => panic!("no transaction event within {WAIT:?}"),
        }
    }
}

#[tokio::test]
async fn join_game_records_home() {
    let client = MockContractClient::new().confirm_after(2);
    let (runtime, manager) = start_runtime(client.clone()).await;
    let home = home_planet();

    assert!(!manager.has_joined_game());
    let receipt = manager.join_game(home.coords).await.unwrap();

    assert_eq!(receipt.call, ContractCall::JoinGame { home: home.hash });
    assert!(manager.has_joined_game());
    assert_eq!(manager.home_coords(), Some(home.coords));
    assert_eq!(manager.home_hash(), Some(home.hash));
    assert_eq!(manager.account(), Some(client.account()));
    assert_eq!(client.submitted().len(), 1);

    let err = manager.join_game(home.coords).await.unwrap_err();
    assert!(matches!(err, RuntimeError::AlreadyJoined { .. }));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn join_game_rejects_empty_space() {
    let (runtime, manager) = start_runtime(MockContractClient::new()).await;

    let coords = empty_space();
    let err = manager.join_game(coords).await.unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidHomePlanet { coords: c } if c == coords));

    let outside = WorldCoords::new(game_config().world_radius as i64 + 1, 0);
    let err = manager.join_game(outside).await.unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidHomePlanet { .. }));
    assert!(!manager.has_joined_game());

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn commands_require_joined_account() {
    let (runtime, manager) = start_runtime(MockContractClient::new()).await;
    let (a, b) = explore_planets(&manager).await;

    let err = manager.move_planet(a, b, 100, 0).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NotJoined));
    let err = manager.buy_hat(a).await.unwrap_err();
    assert!(matches!(err, RuntimeError::NotJoined));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn commands_require_known_planets() {
    let (runtime, manager) = start_runtime(MockContractClient::new()).await;
    manager.join_game(home_planet().coords).await.unwrap();

    let unknown = LocationId([0xab; 32]);
    let err = manager.find_artifact(unknown).await.unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownPlanet(id) if id == unknown));

    let (a, _) = explore_planets(&manager).await;
    let err = manager.move_planet(a, unknown, 10, 0).await.unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownPlanet(_)));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn move_is_unconfirmed_until_settled() {
    let client = MockContractClient::new().confirm_after(20);
    let (runtime, manager) = start_runtime(client).await;
    manager.join_game(home_planet().coords).await.unwrap();
    let (a, b) = explore_planets(&manager).await;

    let handle = manager.move_planet(a, b, 500, 25).await.unwrap();
    let pending = manager.unconfirmed_moves();
    assert_eq!(pending.len(), 1);
    assert_eq!((pending[0].from, pending[0].to, pending[0].forces), (a, b, 500));
    assert_eq!(handle.kind(), CallKind::Move);

    let receipt = handle.wait().await.unwrap();
    assert!(receipt.block_number > 0);
    assert!(manager.unconfirmed_moves().is_empty());
    assert!(manager.distance(&a, &b).unwrap() > 0.0);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn retryable_submit_failures_are_retried() {
    let client = MockContractClient::new().fail_next_submissions(2);
    let (runtime, manager) = start_runtime(client.clone()).await;
    let mut rx = manager.subscribe(Topic::Transaction);

    manager.join_game(home_planet().coords).await.unwrap();

    let mut attempts = Vec::new();
    loop {
        match next_transaction_event(&mut rx).await {
            TransactionEvent::Retrying { attempt, .. } => attempts.push(attempt),
            TransactionEvent::Confirmed { .. } => break,
            TransactionEvent::Failed { error, .. } => panic!("join failed: {error}"),
            _ => {}
        }
    }
    assert_eq!(attempts, vec![1, 2]);
    assert_eq!(client.submitted().len(), 1);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn retries_are_bounded() {
    let client = MockContractClient::new().fail_next_submissions(10);
    let (runtime, manager) = start_runtime(client).await;

    let err = manager.join_game(home_planet().coords).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Transport(_)));
    assert!(!manager.has_joined_game());

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn reverted_upgrade_reports_failure() {
    let client = MockContractClient::new().revert_on(CallKind::Upgrade);
    let (runtime, manager) = start_runtime(client).await;
    let mut rx = manager.subscribe(Topic::Transaction);
    manager.join_game(home_planet().coords).await.unwrap();
    let (planet, _) = explore_planets(&manager).await;

    let err = manager.upgrade(planet, 3).await.unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidUpgradeBranch(3)));

    let handle = manager.upgrade(planet, 1).await.unwrap();
    let sequence = handle.sequence();
    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, RuntimeError::TransactionFailed { .. }));
    assert!(manager.unconfirmed_upgrades().is_empty());

    loop {
        if let TransactionEvent::Failed { sequence: s, .. } = next_transaction_event(&mut rx).await
            && s == sequence
        {
            break;
        }
    }

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn artifact_calls_are_submitted_in_order() {
    let client = MockContractClient::new();
    let (runtime, manager) = start_runtime(client.clone()).await;
    manager.join_game(home_planet().coords).await.unwrap();
    let (planet, _) = explore_planets(&manager).await;

    let find = manager.find_artifact(planet).await.unwrap();
    let deposit = manager.deposit_artifact(planet, ArtifactId(7)).await.unwrap();
    let withdraw = manager.withdraw_artifact(planet).await.unwrap();
    assert!(find.sequence() < deposit.sequence() && deposit.sequence() < withdraw.sequence());

    find.wait().await.unwrap();
    deposit.wait().await.unwrap();
    withdraw.wait().await.unwrap();

    let kinds: Vec<_> = client.submitted().iter().map(ContractCall::kind).collect();
    assert_eq!(
        kinds,
        vec![
            CallKind::JoinGame,
            CallKind::FindArtifact,
            CallKind::DepositArtifact,
            CallKind::WithdrawArtifact,
        ]
    );

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn commands_without_contract_client_fail() {
    let runtime = Runtime::builder()
        .config(runtime_config())
        .build()
        .await
        .unwrap();
    let manager = runtime.manager();

    let err = manager.join_game(home_planet().coords).await.unwrap_err();
    assert!(matches!(err, RuntimeError::ContractNotConfigured));
    assert!(manager.account().is_none());

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_abandons_unsettled_transactions() {
    let client = MockContractClient::new().confirm_after(u32::MAX);
    let runtime = Runtime::builder()
        .config(RuntimeConfig {
            submitter: SubmitterConfig {
                confirmation_timeout: Duration::from_secs(600),
                ..runtime_config().submitter
            },
            ..runtime_config()
        })
        .contract_client(client)
        .home(home_planet().coords)
        .build()
        .await
        .unwrap();
    let manager = runtime.manager();
    let mut rx = manager.subscribe(Topic::Transaction);
    let (a, b) = explore_planets(&manager).await;

    let in_flight = manager.move_planet(a, b, 100, 0).await.unwrap();
    loop {
        if let TransactionEvent::Submitted { .. } = next_transaction_event(&mut rx).await {
            break;
        }
    }
    let queued = manager.move_planet(b, a, 50, 0).await.unwrap();
    assert_eq!(manager.unconfirmed_moves().len(), 2);

    timeout(Duration::from_secs(2), runtime.shutdown())
        .await
        .expect("shutdown should not wait for confirmation")
        .unwrap();

    assert!(matches!(
        in_flight.wait().await.unwrap_err(),
        RuntimeError::ShuttingDown
    ));
    assert!(matches!(
        queued.wait().await.unwrap_err(),
        RuntimeError::ShuttingDown
    ));
    assert!(manager.unconfirmed_moves().is_empty());
}
