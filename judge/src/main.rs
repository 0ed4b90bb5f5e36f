//! Judge - referee for paper soccer games
//!
//! A long-running process that:
//! 1. Waits for exactly two players to register in the shared store
//! 2. Flips a coin for sides and publishes the kickoff world
//! 3. Judges every action the players write, forfeiting idle turns
//! 4. Publishes the world after each verdict and the winner at the end

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod config;
mod controller;
mod dispatcher;
mod judge;
mod store;
mod timeout;

use crate::config::Config;
use crate::controller::{Controller, WorldPublisher};
use crate::dispatcher::Dispatcher;
use crate::judge::Judge;
use crate::store::{RecordStore, SqliteStore};
use games_paper_soccer::Game;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse and validate configuration
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    match run(config).await {
        Ok(()) => {
            info!("Judge stopped");
            Ok(())
        }
        Err(e) => {
            error!("Judge failed: {:#}", e);
            Err(e)
        }
    }
}

async fn run(config: Config) -> Result<()> {
    info!(
        namespace = %config.namespace,
        board = %format!("{}x{}", config.width, config.height),
        turn_timeout_secs = config.turn_timeout_secs,
        store = %config.store_path,
        "Judge starting"
    );

    let store = SqliteStore::open(&config.store_path, config.owner.as_str(), config.poll_interval())
        .with_context(|| format!("Failed to open store at {}", config.store_path))?;
    let controller = Arc::new(Controller::new(
        Arc::new(store) as Arc<dyn RecordStore>,
        config.namespace.as_str(),
        config.retry_interval(),
        config.register_poll(),
    ));

    // Subscribe before registration completes so no early action is missed
    let (tx, rx) = mpsc::channel(config.queue_capacity);
    controller
        .subscribe_actions(tx)
        .await
        .context("Failed to subscribe to player actions")?;

    let registry = tokio::select! {
        registry = controller.receipt_players() => registry,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received while waiting for players");
            return Ok(());
        }
    };

    let mut rng = match config.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };
    let (player1, player2) = registry.names();
    let game = Game::start(player1, player2, config.width, config.height, &mut rng)
        .context("Failed to set up the board")?;

    let (judge, supervisor) = Judge::start(
        game,
        registry.clone(),
        Arc::clone(&controller) as Arc<dyn WorldPublisher>,
        config.turn_timeout(),
    )
    .await;

    let dispatcher = Dispatcher::new(judge.clone(), registry, rx);
    tokio::select! {
        outcome = dispatcher.run() => match outcome {
            Some(outcome) => info!(
                winner = %outcome.winner.name,
                owner = %outcome.winner_owner,
                result = %outcome.result,
                "Game finished"
            ),
            None => warn!("Game ended without a winner"),
        },
        _ = signal::ctrl_c() => info!("Shutdown signal received, stopping judge..."),
    }

    judge.shutdown();
    let _ = supervisor.await;
    Ok(())
}
