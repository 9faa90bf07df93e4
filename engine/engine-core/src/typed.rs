//! Typed Game trait providing the environment interface for search
//!
//! Games are stateless rule books: every method is a pure function of its
//! arguments. State values are owned by the caller (search tree nodes,
//! self-play loops), so a single game instance can be shared across any
//! number of concurrently running games.

use thiserror::Error;

/// Discrete action index (board position, column, ...).
pub type Action = u8;

/// Player index, used to address the `rewards` vector of a [`StepResult`].
pub type Player = usize;

/// Evaluator input produced by [`Game::encode`]. Opaque to the search.
pub type EncodedState = Vec<f32>;

/// Errors returned by game environments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("Invalid action {action}: {reason}")]
    InvalidAction { action: Action, reason: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl GameError {
    pub fn invalid_action(action: Action, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            action,
            reason: reason.into(),
        }
    }
}

/// Outcome of applying one action to a state.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult<S> {
    /// The resulting state
    pub state: S,

    /// Reward for each player, indexed by [`Player`].
    /// All zeros until the game ends.
    pub rewards: Vec<f32>,

    /// Whether the resulting state is terminal
    pub done: bool,
}

impl<S> StepResult<S> {
    /// Non-terminal result with zero rewards.
    pub fn ongoing(state: S, num_players: usize) -> Self {
        Self {
            state,
            rewards: vec![0.0; num_players],
            done: false,
        }
    }

    /// Reward for a single player (0.0 if the index is out of range).
    pub fn reward_for(&self, player: Player) -> f32 {
        self.rewards.get(player).copied().unwrap_or(0.0)
    }
}

/// Main trait for game implementations
///
/// # Contract
///
/// * `init`, `legal_actions`, `apply`, `to_play` and `encode` are deterministic
///   and free of side effects.
/// * `apply` fails with [`GameError::InvalidAction`] for any action not in
///   `legal_actions(state)`; a terminal state has no legal actions.
/// * `to_play` is defined for terminal states as well: it names the player who
///   would move next, which is the perspective terminal rewards are read from.
pub trait Game: Send + Sync + std::fmt::Debug + 'static {
    /// Game state type - should be cheap to clone
    type State: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static;

    /// Stable environment identifier (e.g. "tictactoe")
    fn name(&self) -> &'static str;

    /// Size of the action space; every action is in `0..num_actions()`.
    fn num_actions(&self) -> usize;

    /// Number of players (length of every rewards vector).
    fn num_players(&self) -> usize {
        2
    }

    /// Initial position
    fn init(&self) -> Self::State;

    /// Legal actions at `state`, in ascending order. Empty for terminal states.
    fn legal_actions(&self, state: &Self::State) -> Vec<Action>;

    /// Apply `action` to `state`, returning the successor and its rewards.
    fn apply(
        &self,
        state: &Self::State,
        action: Action,
    ) -> Result<StepResult<Self::State>, GameError>;

    /// Player to move at `state`
    fn to_play(&self, state: &Self::State) -> Player;

    /// Encode `state` as evaluator input
    fn encode(&self, state: &Self::State) -> EncodedState;

    /// Whether `action` is legal at `state`.
    fn is_legal(&self, state: &Self::State, action: Action) -> bool {
        self.legal_actions(state).contains(&action)
    }
}
