//! Connect 4 game implementation for the engine
//!
//! Connect 4 is a two-player connection game where players drop colored discs
//! into a 7-column, 6-row vertically suspended grid. The objective is to be
//! the first to form a horizontal, vertical, or diagonal line of four discs.
//!
//! # Board Layout
//!
//! The board is stored in row-major order, with row 0 at the bottom:
//! ```text
//! Row 5: [35][36][37][38][39][40][41]  <- Top
//! Row 4: [28][29][30][31][32][33][34]
//! Row 3: [21][22][23][24][25][26][27]
//! Row 2: [14][15][16][17][18][19][20]
//! Row 1: [ 7][ 8][ 9][10][11][12][13]
//! Row 0: [ 0][ 1][ 2][ 3][ 4][ 5][ 6]  <- Bottom
//!         Col 0  1  2  3  4  5  6
//! ```
//!
//! # Usage
//!
//! ```rust
//! use engine_core::Game;
//! use games_connect4::Connect4;
//!
//! let game = Connect4::new();
//! let step = game.apply(&game.init(), 3).unwrap();
//! assert_eq!(game.legal_actions(&step.state).len(), 7);
//! ```

use engine_core::game_utils::{opponent, player_index, terminal_rewards, WINNER_DRAW, WINNER_NONE};
use engine_core::typed::{Action, EncodedState, Game, GameError, Player, StepResult};
use engine_core::TwoPlayerObs;
use serde::{Deserialize, Serialize};

/// Board dimensions
pub const COLS: usize = 7;
pub const ROWS: usize = 6;
pub const BOARD_SIZE: usize = COLS * ROWS; // 42

/// Observation layout: 84 board floats + 7 legal-move floats + 2 player floats
pub type Observation = TwoPlayerObs<{ BOARD_SIZE * 2 }, COLS>;

/// Connect4 game state
///
/// Represents the complete state of a Connect4 game including the board,
/// current player, and winner information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    /// Board representation: 0=empty, 1=Red (player 1), 2=Yellow (player 2)
    /// Stored in row-major order with row 0 at the bottom
    #[serde(with = "board_serde")]
    board: [u8; BOARD_SIZE],
    /// Player to move: 1=Red, 2=Yellow. Alternates after the final move too.
    current_player: u8,
    /// Winner: 0=none/ongoing, 1=Red, 2=Yellow, 3=draw
    winner: u8,
    /// Height of each column (0-6 means number of pieces in column)
    column_heights: [u8; COLS],
}

impl State {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [0; BOARD_SIZE],
            current_player: 1, // Red goes first
            winner: WINNER_NONE,
            column_heights: [0; COLS],
        }
    }

    pub fn board(&self) -> &[u8; BOARD_SIZE] {
        &self.board
    }

    pub fn current_player(&self) -> u8 {
        self.current_player
    }

    pub fn winner(&self) -> u8 {
        self.winner
    }

    /// Number of discs in `col`
    pub fn column_height(&self, col: usize) -> u8 {
        self.column_heights[col]
    }

    /// Check if the game is over
    pub fn is_done(&self) -> bool {
        self.winner != WINNER_NONE
    }

    /// Get legal moves (columns that are not full)
    pub fn legal_moves(&self) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }

        (0..COLS as u8)
            .filter(|&col| self.column_heights[col as usize] < ROWS as u8)
            .collect()
    }

    /// Bit-mask representation of legal moves.
    ///
    /// Bits 0-6 correspond to columns 0-6. A bit set to 1 indicates the
    /// column is not full and a piece can be dropped there.
    pub fn legal_moves_mask(&self) -> u8 {
        if self.is_done() {
            return 0;
        }

        self.column_heights
            .iter()
            .enumerate()
            .fold(0u8, |mask, (col, &height)| {
                if height < ROWS as u8 {
                    mask | (1u8 << col)
                } else {
                    mask
                }
            })
    }

    /// Convert column and row to board index
    #[inline]
    pub fn pos(col: usize, row: usize) -> usize {
        row * COLS + col
    }

    /// Drop a piece in the given column and return the new state
    pub fn drop_piece(&self, column: u8) -> Result<State, GameError> {
        let col = column as usize;

        if self.is_done() {
            return Err(GameError::invalid_action(column, "game is over"));
        }
        if col >= COLS {
            return Err(GameError::invalid_action(column, "column out of range"));
        }
        if self.column_heights[col] >= ROWS as u8 {
            return Err(GameError::invalid_action(column, "column is full"));
        }

        let mut new_state = self.clone();
        let row = self.column_heights[col] as usize;

        new_state.board[Self::pos(col, row)] = self.current_player;
        new_state.column_heights[col] += 1;
        new_state.winner = new_state.check_winner_at(col, row);
        new_state.current_player = opponent(self.current_player);

        Ok(new_state)
    }

    /// Check if the piece at (col, row) creates a winning line
    fn check_winner_at(&self, col: usize, row: usize) -> u8 {
        let player = self.board[Self::pos(col, row)];
        if player == 0 {
            return WINNER_NONE;
        }

        // Direction vectors: horizontal, vertical, diagonal /, diagonal \
        let directions: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

        for (dc, dr) in directions {
            let count = 1
                + self.run_length(col, row, dc, dr, player)
                + self.run_length(col, row, -dc, -dr, player);
            if count >= 4 {
                return player;
            }
        }

        if self.column_heights.iter().all(|&h| h >= ROWS as u8) {
            return WINNER_DRAW;
        }

        WINNER_NONE
    }

    /// Consecutive `player` discs starting one step from (col, row)
    fn run_length(&self, col: usize, row: usize, dc: i32, dr: i32, player: u8) -> usize {
        let mut count = 0;
        let (mut c, mut r) = (col as i32 + dc, row as i32 + dr);
        while c >= 0 && c < COLS as i32 && r >= 0 && r < ROWS as i32 {
            if self.board[Self::pos(c as usize, r as usize)] != player {
                break;
            }
            count += 1;
            c += dc;
            r += dr;
        }
        count
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Serde only derives fixed arrays up to 32 elements; the board goes over
/// the wire as a plain sequence.
mod board_serde {
    use super::BOARD_SIZE;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(board: &[u8; BOARD_SIZE], s: S) -> Result<S::Ok, S::Error> {
        board.as_slice().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; BOARD_SIZE], D::Error> {
        let cells = Vec::<u8>::deserialize(d)?;
        let len = cells.len();
        cells
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"42 board cells"))
    }
}

/// Connect4 game implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct Connect4;

impl Connect4 {
    /// Create a new Connect4 game
    pub fn new() -> Self {
        Self
    }

    /// Play a sequence of column drops from the initial position.
    pub fn play(&self, moves: &[Action]) -> Result<State, GameError> {
        moves
            .iter()
            .try_fold(State::new(), |state, &col| state.drop_piece(col))
    }
}

impl Game for Connect4 {
    type State = State;

    fn name(&self) -> &'static str {
        "connect4"
    }

    fn num_actions(&self) -> usize {
        COLS
    }

    fn init(&self) -> State {
        State::new()
    }

    fn legal_actions(&self, state: &State) -> Vec<Action> {
        state.legal_moves()
    }

    fn apply(&self, state: &State, action: Action) -> Result<StepResult<State>, GameError> {
        let next = state.drop_piece(action)?;
        let rewards = terminal_rewards(next.winner);
        let done = next.is_done();
        Ok(StepResult {
            state: next,
            rewards,
            done,
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
