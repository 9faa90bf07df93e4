//! Actor statistics tracking and persistence.
//!
//! This module provides statistics tracking for a self-play run, including:
//! - Game counts and outcomes
//! - Game lengths and throughput
//! - Coalescer batching behaviour
//!
//! Stats are written as JSON (by default `<data_dir>/actor_stats.json`) at the
//! end of a run.

use anyhow::{Context, Result};
use mcts::CoalescerStats;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Aggregated run statistics, updated from the game tasks as they finish.
#[derive(Debug)]
pub struct ActorStats {
    /// Games that reached a terminal state
    games_completed: AtomicU32,
    /// Games abandoned with an error
    games_failed: AtomicU32,
    /// Moves across all completed games
    total_moves: AtomicU64,
    /// Games where the first player's reward was positive
    player1_wins: AtomicU32,
    /// Games where the first player's reward was negative
    player2_wins: AtomicU32,
    draws: AtomicU32,
    /// Coalescer counters, recorded once the run ends
    coalescer: Mutex<CoalescerStats>,
    /// Start time for rate calculations
    start_time: Instant,
    /// Path to write stats file
    stats_path: PathBuf,
    env_id: String,
}

/// Serializable stats for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorStatsSnapshot {
    pub env_id: String,
    pub games_completed: u32,
    pub games_failed: u32,
    pub total_moves: u64,
    pub player1_wins: u32,
    pub player2_wins: u32,
    pub draws: u32,
    pub avg_game_length: f64,
    pub games_per_second: f64,
    pub runtime_seconds: f64,
    pub eval_batches: u64,
    pub eval_items: u64,
    pub mean_batch_size: f64,
    pub max_batch_size: usize,
    pub timestamp: u64,
}

impl ActorStats {
    /// Create a tracker that writes its snapshot to `stats_path`.
    pub fn new(stats_path: impl Into<PathBuf>, env_id: &str) -> Self {
        let stats_path = stats_path.into();

        // Ensure data directory exists
        if let Some(dir) = stats_path.parent() {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("Failed to create data directory: {}", e);
            }
        }

        Self {
            games_completed: AtomicU32::new(0),
            games_failed: AtomicU32::new(0),
            total_moves: AtomicU64::new(0),
            player1_wins: AtomicU32::new(0),
            player2_wins: AtomicU32::new(0),
            draws: AtomicU32::new(0),
            coalescer: Mutex::new(CoalescerStats::default()),
            start_time: Instant::now(),
            stats_path,
            env_id: env_id.to_string(),
        }
    }

    /// Record a finished game.
    pub fn record_game(&self, moves: u32, rewards: &[f32]) {
        self.games_completed.fetch_add(1, Ordering::Relaxed);
        self.total_moves.fetch_add(moves as u64, Ordering::Relaxed);

        // Outcome from the first player's perspective
        let reward = rewards.first().copied().unwrap_or(0.0);
        if reward > 0.0 {
            self.player1_wins.fetch_add(1, Ordering::Relaxed);
        } else if reward < 0.0 {
            self.player2_wins.fetch_add(1, Ordering::Relaxed);
        } else {
            self.draws.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_failure(&self) {
        self.games_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalescer(&self, stats: &CoalescerStats) {
        *self
            .coalescer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = stats.clone();
    }

    /// Finished games, successful or not
    pub fn games_finished(&self) -> u32 {
        self.games_completed.load(Ordering::Relaxed) + self.games_failed.load(Ordering::Relaxed)
    }

    /// Get a snapshot of current stats.
    pub fn snapshot(&self) -> ActorStatsSnapshot {
        let games = self.games_completed.load(Ordering::Relaxed);
        let total_moves = self.total_moves.load(Ordering::Relaxed);
        let runtime = self.start_time.elapsed().as_secs_f64();
        let coalescer = self
            .coalescer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        let avg_game_length = if games > 0 {
            total_moves as f64 / games as f64
        } else {
            0.0
        };

        let games_per_second = if runtime > 0.0 {
            games as f64 / runtime
        } else {
            0.0
        };

        ActorStatsSnapshot {
            env_id: self.env_id.clone(),
            games_completed: games,
            games_failed: self.games_failed.load(Ordering::Relaxed),
            total_moves,
            player1_wins: self.player1_wins.load(Ordering::Relaxed),
            player2_wins: self.player2_wins.load(Ordering::Relaxed),
            draws: self.draws.load(Ordering::Relaxed),
            avg_game_length,
            games_per_second,
            runtime_seconds: runtime,
            eval_batches: coalescer.batches,
            eval_items: coalescer.items,
            mean_batch_size: coalescer.mean_batch_size(),
            max_batch_size: coalescer.max_batch_size,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Log the run summary.
    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            env_id = %s.env_id,
            completed = s.games_completed,
            failed = s.games_failed,
            player1_wins = s.player1_wins,
            player2_wins = s.player2_wins,
            draws = s.draws,
            avg_length = format!("{:.1}", s.avg_game_length),
            games_per_sec = format!("{:.2}", s.games_per_second),
            batches = s.eval_batches,
            avg_batch_size = format!("{:.2}", s.mean_batch_size),
            max_batch_size = s.max_batch_size,
            "Self-play summary"
        );
    }

    /// Write stats to JSON file (atomic write-then-rename).
    pub fn write_stats(&self) -> Result<()> {
        let snapshot = self.snapshot();
        let json =
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize actor stats")?;

        // Write to temp file then rename (atomic on most filesystems)
        let temp_path = self.stats_path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create {}", temp_path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;

        if let Err(e) = fs::rename(&temp_path, &self.stats_path) {
            // Try to clean up temp file
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| {
                format!("Failed to rename stats file to {}", self.stats_path.display())
            });
        }

        debug!("Wrote actor stats to {}", self.stats_path.display());
        Ok(())
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }
}
