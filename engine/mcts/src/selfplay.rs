//! Concurrent self-play.
//!
//! The [`SelfPlayOrchestrator`] plays many games at once, one Tokio task per
//! game, all feeding leaf evaluations through one shared
//! [`RequestCoalescer`]. Each task owns its [`SearchTree`] and loops
//! plan → act_select → step until the game ends, recording a
//! [`GameHistory`] of visit distributions for training.

use std::sync::Arc;
use std::time::{Duration, Instant};

use engine_core::{Action, EncodedState, Game, GameError, Player};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::coalescer::{
    ActiveCallers, CallerGuard, CoalescerConfig, CoalescerStats, RequestCoalescer,
};
use crate::config::MctsConfig;
use crate::evaluator::Evaluator;
use crate::policy::SelectionMode;
use crate::search::{SearchError, SearchTree};

/// Why a single game did not finish.
#[derive(Debug, Clone, Error)]
pub enum SelfPlayError {
    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Game did not finish within {max_moves} moves")]
    MoveLimit { max_moves: u32 },

    #[error("Game task failed: {0}")]
    TaskFailed(String),
}

/// Self-play settings.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    pub mcts: MctsConfig,
    pub coalescer: CoalescerConfig,
    /// Moves played with temperature sampling before switching to arg-max.
    /// Zero keeps sampling for the whole game.
    pub temp_threshold: u32,
    /// Give up on a game after this many moves; zero means no limit
    pub max_moves: u32,
    /// Game `i` searches with RNG seed `seed + i`
    pub seed: u64,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            mcts: MctsConfig::for_training(),
            coalescer: CoalescerConfig::default(),
            temp_threshold: 15,
            max_moves: 512,
            seed: 42,
        }
    }
}

impl SelfPlayConfig {
    /// Selection mode for the move at `move_number` (0-based).
    pub fn selection_mode(&self, move_number: u32) -> SelectionMode {
        if self.temp_threshold == 0 || move_number < self.temp_threshold {
            SelectionMode::from_temperature(self.mcts.temperature)
        } else {
            SelectionMode::Greedy
        }
    }
}

/// One position of a finished game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry<S> {
    pub state: S,
    pub encoded: EncodedState,
    pub to_play: Player,
    /// Root visit share per action after the search at this position
    pub visit_distribution: Vec<f32>,
    /// Action actually played
    pub action: Action,
}

/// Record of one completed game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameHistory<S> {
    pub game_index: usize,
    pub entries: Vec<HistoryEntry<S>>,
    /// Final rewards, indexed by player
    pub rewards: Vec<f32>,
    pub moves: u32,
}

impl<S> GameHistory<S> {
    /// Final reward from the perspective of the player who moved at `entry`.
    pub fn value_target(&self, entry: &HistoryEntry<S>) -> f32 {
        self.rewards.get(entry.to_play).copied().unwrap_or(0.0)
    }

    /// Index of the player with the highest final reward, or `None` on a tie.
    pub fn winner(&self) -> Option<Player> {
        let best = self.rewards.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut leaders = self.rewards.iter().enumerate().filter(|(_, &r)| r == best);
        match (leaders.next(), leaders.next()) {
            (Some((player, _)), None) => Some(player),
            _ => None,
        }
    }
}

/// A game that was abandoned.
#[derive(Debug, Clone)]
pub struct GameFailure {
    pub game_index: usize,
    pub error: SelfPlayError,
}

/// Result of [`SelfPlayOrchestrator::run`].
#[derive(Debug, Clone)]
pub struct SelfPlayRun<S> {
    /// Completed games, ordered by game index
    pub histories: Vec<GameHistory<S>>,
    pub failures: Vec<GameFailure>,
    /// Coalescer counters at the end of the run
    pub coalescer: CoalescerStats,
    pub elapsed: Duration,
}

impl<S> SelfPlayRun<S> {
    pub fn total_moves(&self) -> u64 {
        self.histories.iter().map(|h| h.moves as u64).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Progress callbacks. All methods default to doing nothing.
pub trait SelfPlayObserver: Send + Sync {
    fn game_started(&self, _game_index: usize) {}

    fn move_played(&self, _game_index: usize, _move_number: u32, _action: Action) {}

    /// `rewards` is `None` when the game failed.
    fn game_finished(&self, _game_index: usize, _moves: u32, _rewards: Option<&[f32]>) {}
}

struct NoopObserver;

impl SelfPlayObserver for NoopObserver {}

/// Aborts every game task still running when dropped, so cancelling
/// [`SelfPlayOrchestrator::run`] also stops its games.
struct GameTasks<T>(Vec<JoinHandle<T>>);

impl<T> Drop for GameTasks<T> {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}

/// Runs batches of self-play games against one evaluator.
pub struct SelfPlayOrchestrator<G: Game> {
    game: Arc<G>,
    evaluator: Arc<dyn Evaluator>,
    config: SelfPlayConfig,
    observer: Arc<dyn SelfPlayObserver>,
}

impl<G: Game> SelfPlayOrchestrator<G> {
    pub fn new(game: Arc<G>, evaluator: Arc<dyn Evaluator>, config: SelfPlayConfig) -> Self {
        Self {
            game,
            evaluator,
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SelfPlayObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &SelfPlayConfig {
        &self.config
    }

    /// Play `games` games concurrently and collect their histories.
    ///
    /// A failing game is reported in [`SelfPlayRun::failures`]; the others
    /// keep going.
    pub async fn run(&self, games: usize) -> SelfPlayRun<G::State> {
        let started = Instant::now();
        let active = ActiveCallers::new(games);
        let coalescer = Arc::new(RequestCoalescer::with_active_callers(
            self.evaluator.clone(),
            self.config
                .coalescer
                .clone()
                .with_initial_target(games.max(1)),
            active.clone(),
        ));

        info!(
            env = self.game.name(),
            games,
            simulations = self.config.mcts.num_simulations,
            "Starting self-play"
        );

        let mut tasks = GameTasks(Vec::with_capacity(games));
        for game_index in 0..games {
            let worker = GameWorker {
                game_index,
                game: self.game.clone(),
                config: self.config.clone(),
                coalescer: coalescer.clone(),
                observer: self.observer.clone(),
                _guard: active.release_on_drop(),
            };
            tasks.0.push(tokio::spawn(worker.play()));
        }

        let mut histories = Vec::with_capacity(games);
        let mut failures = Vec::new();
        for (game_index, task) in tasks.0.iter_mut().enumerate() {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => {
                    self.observer.game_finished(game_index, 0, None);
                    Err(SelfPlayError::TaskFailed(e.to_string()))
                }
            };
            match result {
                Ok(history) => histories.push(history),
                Err(error) => {
                    error!(game = game_index, error = %error, "Self-play game failed");
                    failures.push(GameFailure { game_index, error });
                }
            }
        }

        let stats = coalescer.stats();
        let elapsed = started.elapsed();
        info!(
            completed = histories.len(),
            failed = failures.len(),
            batches = stats.batches,
            mean_batch = stats.mean_batch_size(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Self-play finished"
        );

        SelfPlayRun {
            histories,
            failures,
            coalescer: stats,
            elapsed,
        }
    }
}

/// Everything one game task owns.
struct GameWorker<G: Game> {
    game_index: usize,
    game: Arc<G>,
    config: SelfPlayConfig,
    coalescer: Arc<RequestCoalescer>,
    observer: Arc<dyn SelfPlayObserver>,
    /// Released when the task ends, successful or not
    _guard: CallerGuard,
}

impl<G: Game> GameWorker<G> {
    async fn play(self) -> Result<GameHistory<G::State>, SelfPlayError> {
        self.observer.game_started(self.game_index);
        let result = self.play_to_end().await;

        match &result {
            Ok(history) => {
                info!(
                    game = self.game_index,
                    moves = history.moves,
                    rewards = ?history.rewards,
                    "Game finished"
                );
                self.observer
                    .game_finished(self.game_index, history.moves, Some(&history.rewards));
            }
            Err(_) => self.observer.game_finished(self.game_index, 0, None),
        }
        result
    }

    async fn play_to_end(&self) -> Result<GameHistory<G::State>, SelfPlayError> {
        let seed = self.config.seed.wrapping_add(self.game_index as u64);
        let mut tree = SearchTree::with_seed(self.game.clone(), self.config.mcts.clone(), seed);
        let mut state = self.game.init();
        let mut entries = Vec::new();
        let mut moves = 0u32;

        loop {
            if self.config.max_moves > 0 && moves >= self.config.max_moves {
                return Err(SelfPlayError::MoveLimit {
                    max_moves: self.config.max_moves,
                });
            }

            tree.plan(self.config.mcts.num_simulations, self.coalescer.as_ref())
                .await?;
            let selection = tree.act_select(self.config.selection_mode(moves))?;

            entries.push(HistoryEntry {
                encoded: self.game.encode(&state),
                to_play: self.game.to_play(&state),
                visit_distribution: selection.distribution,
                action: selection.action,
                state: state.clone(),
            });

            tree.step(selection.action)?;
            let step = self.game.apply(&state, selection.action)?;
            debug_assert_eq!(tree.root_state(), &step.state);

            debug!(
                game = self.game_index,
                move_number = moves,
                action = selection.action,
                "Move played"
            );
            self.observer
                .move_played(self.game_index, moves, selection.action);

            moves += 1;
            state = step.state;
            if step.done {
                return Ok(GameHistory {
                    game_index: self.game_index,
                    entries,
                    rewards: step.rewards,
                    moves,
                });
            }
        }
    }
}
