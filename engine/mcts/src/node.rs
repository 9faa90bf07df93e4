//! MCTS tree node representation.
//!
//! Each node represents a game state reached by taking an action from the parent.
//! Nodes store visit statistics used for PUCT selection and policy improvement.

use engine_core::{Action, Player, StepResult};

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the MCTS tree.
///
/// `value_sum` accumulates values from the perspective of `player`, the
/// player to move at this node's state.
#[derive(Debug, Clone)]
pub struct MctsNode<S> {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Action that led to this node from parent (None for root)
    pub action: Option<Action>,

    /// Game state at this node
    pub state: S,

    /// Per-player rewards reported by the step that produced this state
    pub rewards: Vec<f32>,

    /// Whether this is a terminal state (game over)
    pub done: bool,

    /// Player to move at `state`
    pub player: Player,

    /// Number of times this node has been visited
    pub visit_count: u32,

    /// Sum of values backpropagated through this node.
    /// Q(s,a) = value_sum / visit_count
    pub value_sum: f32,

    /// Prior probability from the policy network.
    /// P(s,a) - probability of selecting action `a` from parent state.
    pub prior: f32,

    /// Children: Vec of (action, NodeId) pairs in legal-action order.
    /// Empty until node is expanded.
    pub children: Vec<(Action, NodeId)>,
}

impl<S> MctsNode<S> {
    /// Create a new root node from a step result.
    pub fn new_root(step: StepResult<S>, player: Player) -> Self {
        Self::new_child(NodeId::NONE, None, 1.0, step, player)
    }

    /// Create a new child node.
    pub fn new_child(
        parent: NodeId,
        action: Option<Action>,
        prior: f32,
        step: StepResult<S>,
        player: Player,
    ) -> Self {
        Self {
            parent,
            action,
            state: step.state,
            rewards: step.rewards,
            done: step.done,
            player,
            visit_count: 0,
            value_sum: 0.0,
            prior,
            children: Vec::new(),
        }
    }

    /// Calculate mean value Q(s,a) = value_sum / visit_count.
    /// Returns 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f32
        }
    }

    /// Value of a terminal node for the player to move there.
    #[inline]
    pub fn terminal_value(&self) -> f32 {
        self.rewards.get(self.player).copied().unwrap_or(0.0)
    }

    /// PUCT score for selecting this node from a parent whose player to move
    /// is `parent_player`.
    ///
    /// score = sign * Q + c_puct * P * sqrt(N_parent) / (1 + N)
    ///
    /// `sign` is +1 when the same player moves at parent and child and -1
    /// otherwise, so Q is always read from the parent's point of view.
    ///
    /// Takes pre-computed sqrt(parent_visits) to avoid redundant sqrt calls
    /// when comparing multiple children.
    #[inline]
    pub fn ucb_score(&self, parent_player: Player, parent_visits_sqrt: f32, c_puct: f32) -> f32 {
        let sign = if self.player == parent_player {
            1.0
        } else {
            -1.0
        };
        let q = sign * self.mean_value();
        let u = c_puct * self.prior * parent_visits_sqrt / (1.0 + self.visit_count as f32);
        q + u
    }

    /// Check if this node has been expanded (has children).
    #[inline]
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    /// Check if this is a leaf node (not expanded or terminal).
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.done || !self.is_expanded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(player: Player) -> MctsNode<u8> {
        MctsNode::new_root(StepResult::ongoing(0, 2), player)
    }

    #[test]
    fn test_node_id_none() {
        assert!(NodeId::NONE.is_none());
        assert!(!NodeId::NONE.is_some());
        assert!(!NodeId(0).is_none());
        assert!(NodeId(0).is_some());
    }

    #[test]
    fn test_new_root() {
        let node = MctsNode::new_root(StepResult::ongoing(7u8, 2), 0);

        assert!(node.parent.is_none());
        assert!(node.action.is_none());
        assert_eq!(node.visit_count, 0);
        assert!((node.prior - 1.0).abs() < 1e-6);
        assert!(!node.done);
        assert!(node.children.is_empty());
        assert_eq!(node.state, 7);
    }

    #[test]
    fn test_mean_value() {
        let mut node = root(0);

        // Unvisited
        assert!((node.mean_value()).abs() < 1e-6);

        // After visits
        node.visit_count = 4;
        node.value_sum = 2.0;
        assert!((node.mean_value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_terminal_value_reads_own_player() {
        let step = StepResult {
            state: 0u8,
            rewards: vec![1.0, -1.0],
            done: true,
        };
        let node = MctsNode::new_child(NodeId(0), Some(2), 0.2, step, 1);
        assert!((node.terminal_value() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ucb_score_opponent_child() {
        let mut node = root(1);
        node.prior = 0.5;
        node.visit_count = 10;
        node.value_sum = 5.0; // Q from child's perspective = 0.5

        let parent_visits_sqrt = (100f32).sqrt();

        // score = -0.5 + 1.0 * 0.5 * 10 / 11 = -0.0455
        let score = node.ucb_score(0, parent_visits_sqrt, 1.0);
        assert!((score - (-0.0455)).abs() < 0.01);
    }

    #[test]
    fn test_ucb_score_same_player_child() {
        let mut node = root(0);
        node.prior = 0.5;
        node.visit_count = 10;
        node.value_sum = 5.0;

        // Same player moves again: Q is not negated
        let score = node.ucb_score(0, 10.0, 1.0);
        assert!((score - 0.9545).abs() < 0.01);
    }

    #[test]
    fn test_is_leaf() {
        let mut node = root(0);

        // Initially a leaf (no children)
        assert!(node.is_leaf());

        // Add a child
        node.children.push((0, NodeId(1)));
        assert!(!node.is_leaf());

        // Terminal nodes are always leaves
        let mut terminal = root(0);
        terminal.done = true;
        terminal.children.push((0, NodeId(1)));
        assert!(terminal.is_leaf());
    }
}
