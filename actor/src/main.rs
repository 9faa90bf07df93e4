//! Actor - concurrent self-play runner
//!
//! A batch process that:
//! 1. Loads configuration (config.toml, `ARENA_*` env vars, CLI flags)
//! 2. Plays `num_games` MCTS self-play games concurrently, batching leaf
//!    evaluations through one request coalescer
//! 3. Appends finished games to `<data_dir>/histories.jsonl`
//! 4. Writes run statistics to `<data_dir>/actor_stats.json`

use anyhow::{anyhow, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

mod actor;
mod config;
mod games;
mod replay;
mod stats;

use crate::actor::Actor;
use crate::config::Config;

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
    // Parse configuration
    let config = Config::parse();

    // Validate configuration
    config.validate()?;

    // Initialize tracing
    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    info!(
        env_id = %config.env_id,
        num_games = config.num_games,
        data_dir = %config.data_dir,
        "Starting actor"
    );

    let actor = Actor::new(config)?;

    // Ctrl-C abandons the run; unfinished games are not saved
    let run_result = tokio::select! {
        result = actor.run() => result,
        _ = signal::ctrl_c() => {
            warn!("Shutdown signal received, abandoning self-play run");
            Err(anyhow!("interrupted"))
        }
    };

    match run_result {
        Ok(summary) => {
            info!(
                completed = summary.games_completed,
                failed = summary.games_failed,
                "Actor completed successfully"
            );
            Ok(())
        }
        Err(e) => {
            error!("Actor failed: {}", e);
            Err(e)
        }
    }
}
