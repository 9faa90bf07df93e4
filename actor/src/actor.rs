//! Actor implementation: one self-play run against a shared evaluator

use anyhow::{anyhow, Result};
use engine_core::{Action, Game};
use games_connect4::Connect4;
use games_tictactoe::TicTacToe;
use indicatif::{ProgressBar, ProgressStyle};
use mcts::{SelfPlayObserver, SelfPlayOrchestrator, UniformEvaluator};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::games::GameKind;
use crate::replay::HistoryWriter;
use crate::stats::{ActorStats, ActorStatsSnapshot};

/// Feeds finished games into the run stats, the progress bar and the log.
struct RunProgress {
    stats: Arc<ActorStats>,
    bar: Option<ProgressBar>,
    total_games: usize,
    log_interval: u32,
}

impl RunProgress {
    fn new(stats: Arc<ActorStats>, total_games: usize, log_interval: u32) -> Self {
        // Only draw a progress bar when stderr is a TTY
        let bar = std::io::IsTerminal::is_terminal(&std::io::stderr()).then(|| {
            let pb = ProgressBar::new(total_games as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} games ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        });

        Self {
            stats,
            bar,
            total_games,
            log_interval,
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl SelfPlayObserver for RunProgress {
    fn move_played(&self, _game_index: usize, _move_number: u32, _action: Action) {
        if let Some(bar) = &self.bar {
            bar.tick();
        }
    }

    fn game_finished(&self, game_index: usize, moves: u32, rewards: Option<&[f32]>) {
        match rewards {
            Some(rewards) => self.stats.record_game(moves, rewards),
            None => self.stats.record_failure(),
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }

        let finished = self.stats.games_finished();
        if self.log_interval > 0 && finished % self.log_interval == 0 {
            let snapshot = self.stats.snapshot();
            info!(
                finished,
                total = self.total_games,
                last_game = game_index,
                avg_length = format!("{:.1}", snapshot.avg_game_length),
                "Self-play progress"
            );
        }
    }
}

pub struct Actor {
    config: Config,
}

impl Actor {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Play `num_games` games, append them to the replay file and write the
    /// run statistics.
    ///
    /// Fails only if no game completed; individual failures are logged and
    /// counted.
    pub async fn run(&self) -> Result<ActorStatsSnapshot> {
        let kind = self
            .config
            .game()
            .ok_or_else(|| anyhow!("unsupported env_id '{}'", self.config.env_id))?;
        info!(game = %kind, "Selected game");

        match kind {
            GameKind::TicTacToe => self.run_game(TicTacToe::new()).await,
            GameKind::Connect4 => self.run_game(Connect4::new()).await,
        }
    }

    async fn run_game<G>(&self, game: G) -> Result<ActorStatsSnapshot>
    where
        G: Game,
        G::State: Serialize,
    {
        let game = Arc::new(game);
        let evaluator = Arc::new(
            UniformEvaluator::new(game.num_actions()).with_latency(self.config.eval_latency()),
        );
        let stats = Arc::new(ActorStats::new(self.config.stats_path(), game.name()));
        let progress = Arc::new(RunProgress::new(
            stats.clone(),
            self.config.num_games,
            self.config.log_interval,
        ));

        info!(
            env_id = game.name(),
            num_games = self.config.num_games,
            num_simulations = self.config.num_simulations,
            eval_latency_ms = self.config.eval_latency_ms,
            "Actor starting self-play"
        );

        let orchestrator =
            SelfPlayOrchestrator::new(game.clone(), evaluator, self.config.selfplay_config())
                .with_observer(progress.clone());
        let run = orchestrator.run(self.config.num_games).await;
        progress.finish();

        let mut writer = HistoryWriter::open(self.config.histories_path())?;
        writer.write_all(game.name(), &run.histories)?;
        info!(
            games = writer.written(),
            path = %writer.path().display(),
            "Saved game histories"
        );

        stats.record_coalescer(&run.coalescer);
        stats.log_summary();
        match stats.write_stats() {
            Ok(()) => info!(path = %stats.stats_path().display(), "Wrote run statistics"),
            Err(e) => warn!(error = %format!("{e:#}"), "Could not write run statistics"),
        }

        if let Some(failure) = run.failures.first() {
            warn!(
                failed = run.failures.len(),
                first_game = failure.game_index,
                error = %failure.error,
                "Some games did not finish"
            );
            if run.histories.is_empty() {
                return Err(anyhow!(
                    "all {} games failed, first error: {}",
                    run.failures.len(),
                    failure.error
                ));
            }
        }

        Ok(stats.snapshot())
    }
}
