//! Core traits and types for the game engine
//!
//! This crate provides the fundamental abstractions the search and self-play
//! layers are written against:
//! - `Game`: the game environment trait (pure `init` / `legal_actions` / `apply`)
//! - `StepResult`: the cached outcome of applying an action
//! - `TwoPlayerObs`: a reusable encoder for two-player board games
//! - `game_utils`: reward and legal-mask helpers shared by game crates

pub mod board_game;
pub mod game_utils;
pub mod typed;

// Re-export main types for convenience
pub use board_game::TwoPlayerObs;
pub use typed::{Action, EncodedState, Game, GameError, Player, StepResult};
