//! Monte Carlo Tree Search (MCTS) for AlphaZero-style self-play.
//!
//! This crate provides a game-agnostic MCTS implementation that works with any
//! game implementing the `engine-core` [`Game`](engine_core::Game) trait, plus
//! the machinery to run many searches concurrently against one batched
//! evaluator.
//!
//! # Overview
//!
//! Each simulation of a [`SearchTree`] has four phases:
//!
//! 1. **Selection**: walk down the tree by PUCT score until reaching a leaf
//! 2. **Expansion**: add a child for every legal action, with the evaluator's
//!    policy (renormalized over legal actions) as priors
//! 3. **Evaluation**: ask a [`LeafEvaluator`] for the leaf's value, or use the
//!    game's rewards at a terminal state
//! 4. **Backpropagation**: update visit counts and values back to the root,
//!    flipping the sign whenever the player to move changes
//!
//! The tree persists between moves: [`SearchTree::step`] keeps the subtree
//! below the chosen action and discards the rest.
//!
//! # Batching
//!
//! A [`RequestCoalescer`] turns single-leaf requests from many trees into
//! batched [`Evaluator`] calls, adapting its batch size and wait interval to
//! the number of concurrent callers and to the evaluator's latency. The
//! [`SelfPlayOrchestrator`] runs one Tokio task per game against a shared
//! coalescer and collects [`GameHistory`] records.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use games_tictactoe::TicTacToe;
//! use mcts::{MctsConfig, SearchTree, SelectionMode, UniformEvaluator, Unbatched};
//!
//! let game = Arc::new(TicTacToe::new());
//! let mut tree = SearchTree::with_seed(game, MctsConfig::for_evaluation(), 42);
//! let evaluator = Unbatched(UniformEvaluator::new(9));
//!
//! tree.plan(800, &evaluator).await?;
//! let choice = tree.act_select(SelectionMode::Greedy)?;
//! tree.step(choice.action)?;
//! ```

pub mod coalescer;
pub mod config;
pub mod evaluator;
pub mod node;
pub mod policy;
pub mod search;
pub mod selfplay;
pub mod tree;

// Re-export main types
pub use coalescer::{
    ActiveCallers, CallerGuard, CoalescerConfig, CoalescerStats, RequestCoalescer,
};
pub use config::MctsConfig;
pub use evaluator::{
    EvalResult, Evaluator, EvaluatorError, LeafEvaluator, Unbatched, UniformEvaluator,
};
pub use node::{MctsNode, NodeId};
pub use policy::SelectionMode;
pub use search::{legal_priors, ActSelection, SearchError, SearchStats, SearchTree};
pub use selfplay::{
    GameFailure, GameHistory, HistoryEntry, SelfPlayConfig, SelfPlayError, SelfPlayObserver,
    SelfPlayOrchestrator, SelfPlayRun,
};
pub use tree::{MctsTree, TreeStats};
