//! Configuration for the actor binary
//!
//! Defaults come from the central config (`config.toml` with `ARENA_*`
//! environment overrides, falling back to the embedded defaults).
//! CLI arguments take highest priority.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::games::GameKind;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "actor")]
#[command(about = "Self-play runner with batched leaf evaluation")]
#[command(
    long_about = "Plays self-play games concurrently with MCTS, batching every game's leaf
evaluations through one request coalescer, and appends the finished game
histories to <data_dir>/histories.jsonl.

Configuration is loaded from config.toml with ARENA_* environment variable
overrides. CLI arguments take highest priority."
)]
pub struct Config {
    /// Game to play (tictactoe, connect4)
    #[arg(long, default_value_t = CENTRAL_CONFIG.common.env_id.clone())]
    pub env_id: String,

    /// Directory for histories and run statistics
    #[arg(long, default_value_t = CENTRAL_CONFIG.common.data_dir.clone())]
    pub data_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = CENTRAL_CONFIG.common.log_level.clone())]
    pub log_level: String,

    /// Number of games played concurrently
    #[arg(long, default_value_t = CENTRAL_CONFIG.selfplay.num_games)]
    pub num_games: usize,

    /// MCTS simulations per move
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.num_simulations)]
    pub num_simulations: u32,

    /// PUCT exploration constant
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.c_puct as f32)]
    pub c_puct: f32,

    /// Sampling temperature for early moves (0 for greedy play)
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.temperature as f32)]
    pub temperature: f32,

    /// Moves played with temperature before switching to greedy (0 = never switch)
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.temp_threshold)]
    pub temp_threshold: u32,

    /// Root Dirichlet noise alpha (0 disables noise)
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.dirichlet_alpha as f32)]
    pub dirichlet_alpha: f32,

    /// Share of the root prior replaced by noise
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.dirichlet_weight as f32)]
    pub dirichlet_weight: f32,

    /// Upper bound on the coalescer wait interval in milliseconds
    #[arg(long, default_value_t = CENTRAL_CONFIG.coalescer.max_wait_ms)]
    pub max_wait_ms: u64,

    /// Lower bound on the coalescer wait interval in milliseconds
    #[arg(long, default_value_t = CENTRAL_CONFIG.coalescer.min_wait_ms)]
    pub min_wait_ms: u64,

    /// Share of the last evaluator latency used as the next wait interval
    #[arg(long, default_value_t = CENTRAL_CONFIG.coalescer.wait_fraction)]
    pub wait_fraction: f64,

    /// Fail an evaluation batch after this many milliseconds (0 = no timeout)
    #[arg(long, default_value_t = CENTRAL_CONFIG.coalescer.eval_timeout_ms)]
    pub eval_timeout_ms: u64,

    /// Simulated evaluator latency per batch in milliseconds
    #[arg(long, default_value_t = 0)]
    pub eval_latency_ms: u64,

    /// Abandon a game after this many moves (0 = no limit)
    #[arg(long, default_value_t = CENTRAL_CONFIG.selfplay.max_moves)]
    pub max_moves: u32,

    /// Base RNG seed; game i uses seed + i
    #[arg(long, default_value_t = CENTRAL_CONFIG.selfplay.seed)]
    pub seed: u64,

    /// Log progress every N finished games (0 to disable)
    #[arg(long, default_value_t = CENTRAL_CONFIG.selfplay.log_interval)]
    pub log_interval: u32,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.env_id.is_empty() {
            return Err(anyhow!("env_id cannot be empty"));
        }

        if GameKind::from_env_id(&self.env_id).is_none() {
            return Err(anyhow!(
                "unsupported env_id '{}', expected one of {}",
                self.env_id,
                GameKind::supported().join(", ")
            ));
        }

        if self.num_games == 0 {
            return Err(anyhow!("num_games must be greater than 0"));
        }

        if self.num_simulations == 0 {
            return Err(anyhow!("num_simulations must be greater than 0"));
        }

        if !(self.c_puct.is_finite() && self.c_puct > 0.0) {
            return Err(anyhow!("c_puct must be a positive number"));
        }

        if !(self.temperature.is_finite() && self.temperature >= 0.0) {
            return Err(anyhow!("temperature must be non-negative"));
        }

        if !(self.dirichlet_alpha.is_finite() && self.dirichlet_alpha >= 0.0) {
            return Err(anyhow!("dirichlet_alpha must be non-negative"));
        }

        if !(0.0..=1.0).contains(&self.dirichlet_weight) {
            return Err(anyhow!("dirichlet_weight must be between 0 and 1"));
        }

        if self.min_wait_ms > self.max_wait_ms {
            return Err(anyhow!(
                "min_wait_ms ({}) cannot exceed max_wait_ms ({})",
                self.min_wait_ms,
                self.max_wait_ms
            ));
        }

        if !(self.wait_fraction.is_finite() && self.wait_fraction >= 0.0) {
            return Err(anyhow!("wait_fraction must be non-negative"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    pub fn game(&self) -> Option<GameKind> {
        GameKind::from_env_id(&self.env_id)
    }

    pub fn mcts_config(&self) -> mcts::MctsConfig {
        mcts::MctsConfig::for_training()
            .with_simulations(self.num_simulations)
            .with_c_puct(self.c_puct)
            .with_temperature(self.temperature)
            .with_dirichlet(self.dirichlet_alpha, self.dirichlet_weight)
    }

    pub fn coalescer_config(&self) -> mcts::CoalescerConfig {
        let config = mcts::CoalescerConfig {
            wait_fraction: self.wait_fraction,
            ..mcts::CoalescerConfig::default()
        }
        .with_max_wait(Duration::from_millis(self.max_wait_ms))
        .with_min_wait(Duration::from_millis(self.min_wait_ms));

        match self.eval_timeout_ms {
            0 => config,
            ms => config.with_eval_timeout(Duration::from_millis(ms)),
        }
    }

    pub fn selfplay_config(&self) -> mcts::SelfPlayConfig {
        mcts::SelfPlayConfig {
            mcts: self.mcts_config(),
            coalescer: self.coalescer_config(),
            temp_threshold: self.temp_threshold,
            max_moves: self.max_moves,
            seed: self.seed,
        }
    }

    pub fn eval_latency(&self) -> Duration {
        Duration::from_millis(self.eval_latency_ms)
    }

    /// Where finished game histories are appended
    pub fn histories_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("histories.jsonl")
    }

    pub fn stats_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("actor_stats.json")
    }
}
