//! Shared utilities for two-player game implementations
//!
//! This module provides common functionality used across multiple game implementations
//! to reduce code duplication and ensure consistent behavior.

use crate::typed::{Action, Player};

/// Winner code for a game still in progress
pub const WINNER_NONE: u8 = 0;
/// Winner code for a drawn game
pub const WINNER_DRAW: u8 = 3;

/// Per-player rewards for a two-player zero-sum game.
///
/// # Arguments
/// * `winner` - Winner indicator: 0=ongoing, 1=player1 wins, 2=player2 wins, 3=draw
///
/// # Returns
/// A two-element vector indexed by player (player1 at index 0):
/// `+1.0` for the winner, `-1.0` for the loser, zeros for draws or ongoing games.
///
/// # Example
/// ```
/// use engine_core::game_utils::terminal_rewards;
///
/// assert_eq!(terminal_rewards(1), vec![1.0, -1.0]);
/// assert_eq!(terminal_rewards(2), vec![-1.0, 1.0]);
/// assert_eq!(terminal_rewards(3), vec![0.0, 0.0]);
/// assert_eq!(terminal_rewards(0), vec![0.0, 0.0]);
/// ```
#[inline]
pub fn terminal_rewards(winner: u8) -> Vec<f32> {
    match winner {
        1 => vec![1.0, -1.0],
        2 => vec![-1.0, 1.0],
        _ => vec![0.0, 0.0], // Draw or ongoing
    }
}

/// Convert a board-cell player code (1 or 2) to a [`Player`] index (0 or 1).
#[inline]
pub fn player_index(cell_player: u8) -> Player {
    cell_player.saturating_sub(1) as Player
}

/// The other player's cell code (1 <-> 2).
#[inline]
pub fn opponent(cell_player: u8) -> u8 {
    if cell_player == 1 {
        2
    } else {
        1
    }
}

/// Expand a legal-move bit mask into an ascending list of actions.
///
/// # Example
/// ```
/// use engine_core::game_utils::mask_to_actions;
///
/// assert_eq!(mask_to_actions(0b1010_0001), vec![0, 5, 7]);
/// ```
pub fn mask_to_actions(mask: u64) -> Vec<Action> {
    (0..64u8).filter(|&bit| (mask >> bit) & 1 == 1).collect()
}
