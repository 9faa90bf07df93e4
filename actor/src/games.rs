//! Games the actor can play.

use std::fmt;

/// A supported environment, selected by its `env_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    TicTacToe,
    Connect4,
}

impl GameKind {
    pub const ALL: [GameKind; 2] = [GameKind::TicTacToe, GameKind::Connect4];

    pub fn from_env_id(env_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.env_id() == env_id)
    }

    pub fn env_id(self) -> &'static str {
        match self {
            GameKind::TicTacToe => "tictactoe",
            GameKind::Connect4 => "connect4",
        }
    }

    /// All known env ids, in display order
    pub fn supported() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.env_id()).collect()
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_id())
    }
}
