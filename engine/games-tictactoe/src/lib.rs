//! TicTacToe game implementation for the engine
//!
//! This crate provides a complete reference implementation of TicTacToe
//! demonstrating how to implement the Game trait for the engine framework.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::Game;
//! use games_tictactoe::TicTacToe;
//!
//! let game = TicTacToe::new();
//! let state = game.init();
//! let step = game.apply(&state, 4).unwrap();
//! assert!(!step.done);
//! ```

use engine_core::game_utils::{opponent, player_index, terminal_rewards, WINNER_DRAW, WINNER_NONE};
use engine_core::typed::{Action, EncodedState, Game, GameError, Player, StepResult};
use engine_core::TwoPlayerObs;
use serde::{Deserialize, Serialize};

/// Number of board cells (and actions)
pub const NUM_CELLS: usize = 9;

/// Observation layout: 18 board floats + 9 legal-move floats + 2 player floats
pub type Observation = TwoPlayerObs<18, NUM_CELLS>;

/// Winning positions (rows, columns, diagonals)
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// TicTacToe game state
///
/// Represents the complete state of a TicTacToe game including the board,
/// current player, and winner information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    /// Board representation: 0=empty, 1=X, 2=O
    board: [u8; NUM_CELLS],
    /// Player to move: 1=X, 2=O. Keeps alternating after the game ends, so a
    /// finished game names the side that would have moved next.
    current_player: u8,
    /// Winner: 0=none/ongoing, 1=X, 2=O, 3=draw
    winner: u8,
}

impl State {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [0; NUM_CELLS],
            current_player: 1, // X goes first
            winner: WINNER_NONE,
        }
    }

    /// Board cells: 0=empty, 1=X, 2=O
    pub fn board(&self) -> &[u8; NUM_CELLS] {
        &self.board
    }

    /// Player to move (1=X, 2=O)
    pub fn current_player(&self) -> u8 {
        self.current_player
    }

    /// Winner code (0=ongoing, 1=X, 2=O, 3=draw)
    pub fn winner(&self) -> u8 {
        self.winner
    }

    /// Check if the game is over
    pub fn is_done(&self) -> bool {
        self.winner != WINNER_NONE
    }

    /// Get legal moves (empty positions)
    pub fn legal_moves(&self) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }

        (0..NUM_CELLS as u8)
            .filter(|&pos| self.board[pos as usize] == 0)
            .collect()
    }

    /// Bit-mask representation of legal moves.
    ///
    /// Bits 0-8 correspond to board positions 0-8. When the game is finished
    /// the mask is zeroed.
    pub fn legal_moves_mask(&self) -> u16 {
        if self.is_done() {
            return 0;
        }

        self.board
            .iter()
            .enumerate()
            .fold(0u16, |mask, (idx, cell)| {
                if *cell == 0 {
                    mask | (1u16 << idx)
                } else {
                    mask
                }
            })
    }

    /// Make a move and return the new state
    pub fn make_move(&self, position: u8) -> Result<State, GameError> {
        if self.is_done() {
            return Err(GameError::invalid_action(position, "game is over"));
        }
        if position as usize >= NUM_CELLS {
            return Err(GameError::invalid_action(position, "position out of range"));
        }
        if self.board[position as usize] != 0 {
            return Err(GameError::invalid_action(position, "cell is occupied"));
        }

        let mut new_state = *self;
        new_state.board[position as usize] = self.current_player;
        new_state.winner = Self::check_winner(&new_state.board);
        new_state.current_player = opponent(self.current_player);

        Ok(new_state)
    }

    /// Check for winner on the board
    fn check_winner(board: &[u8; NUM_CELLS]) -> u8 {
        for line in &LINES {
            let [a, b, c] = *line;
            if board[a] != 0 && board[a] == board[b] && board[b] == board[c] {
                return board[a];
            }
        }

        if board.iter().all(|&cell| cell != 0) {
            return WINNER_DRAW;
        }

        WINNER_NONE
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// TicTacToe game implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToe;

impl TicTacToe {
    /// Create a new TicTacToe game
    pub fn new() -> Self {
        Self
    }

    /// Play a sequence of moves from the initial position.
    pub fn play(&self, moves: &[Action]) -> Result<State, GameError> {
        moves
            .iter()
            .try_fold(State::new(), |state, &action| state.make_move(action))
    }
}

impl Game for TicTacToe {
    type State = State;

    fn name(&self) -> &'static str {
        "tictactoe"
    }

    fn num_actions(&self) -> usize {
        NUM_CELLS
    }

    fn init(&self) -> State {
        State::new()
    }

    fn legal_actions(&self, state: &State) -> Vec<Action> {
        state.legal_moves()
    }

    fn apply(&self, state: &State, action: Action) -> Result<StepResult<State>, GameError> {
        let next = state.make_move(action)?;
        Ok(StepResult {
            state: next,
            rewards: terminal_rewards(next.winner),
            done: next.is_done(),
        })
    }

    fn to_play(&self, state: &State) -> Player {
        player_index(state.current_player)
    }

    fn encode(&self, state: &State) -> EncodedState {
        Observation::from_board(
            &state.board,
            state.legal_moves_mask() as u64,
            state.current_player,
        )
        .to_encoded()
    }
}
