//! MCTS search implementation.
//!
//! Implements the core MCTS algorithm:
//! 1. Selection: Traverse tree using PUCT to find a leaf
//! 2. Expansion: Add children to the leaf using the evaluator's policy prior
//! 3. Evaluation: Get value estimate from evaluator (or the terminal reward)
//! 4. Backpropagation: Update statistics along the path
//!
//! A [`SearchTree`] persists across moves: after [`SearchTree::step`] the
//! chosen child's subtree and its statistics are reused for the next search.

use std::sync::Arc;

use engine_core::{Action, Game, GameError};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::trace;

use crate::config::MctsConfig;
use crate::evaluator::{EvaluatorError, LeafEvaluator};
use crate::node::{MctsNode, NodeId};
use crate::policy::{self, SelectionMode};
use crate::tree::{MctsTree, TreeStats};

/// Errors that can occur during MCTS search.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Action {action} is not legal at the root")]
    InvalidAction { action: Action },

    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Invalid tree state: {0}")]
    TreeState(String),
}

/// Counters for one call to [`SearchTree::plan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Simulations performed
    pub simulations: u32,
    /// Leaves sent to the evaluator
    pub evaluations: u32,
    /// Simulations that ended on a terminal node
    pub terminal_hits: u32,
}

/// Outcome of [`SearchTree::act_select`].
#[derive(Debug, Clone, PartialEq)]
pub struct ActSelection {
    /// Chosen action
    pub action: Action,
    /// Visit count of every root child, in child order
    pub visit_counts: Vec<(Action, u32)>,
    /// `child visits / root visits`, indexed by action over the full action space
    pub distribution: Vec<f32>,
}

/// Persistent MCTS search tree for one game.
pub struct SearchTree<G: Game> {
    game: Arc<G>,
    config: MctsConfig,
    tree: MctsTree<G::State>,
    rng: ChaCha20Rng,
    root_noised: bool,
}

impl<G: Game> SearchTree<G> {
    /// Create a tree rooted at the game's initial position.
    pub fn new(game: Arc<G>, config: MctsConfig, rng: ChaCha20Rng) -> Self {
        let tree = Self::fresh_tree(&game);
        Self {
            game,
            config,
            tree,
            rng,
            root_noised: false,
        }
    }

    /// Create a tree with a deterministic RNG.
    pub fn with_seed(game: Arc<G>, config: MctsConfig, seed: u64) -> Self {
        Self::new(game, config, ChaCha20Rng::seed_from_u64(seed))
    }

    fn fresh_tree(game: &G) -> MctsTree<G::State> {
        let state = game.init();
        let player = game.to_play(&state);
        let root = MctsNode::new_root(
            engine_core::StepResult::ongoing(state, game.num_players()),
            player,
        );
        MctsTree::new(root)
    }

    /// Discard the whole tree and start again from the initial position.
    pub fn init(&mut self) {
        self.tree = Self::fresh_tree(&self.game);
        self.root_noised = false;
    }

    /// State at the root.
    pub fn root_state(&self) -> &G::State {
        &self.tree.get(self.tree.root()).state
    }

    /// Root node.
    pub fn root(&self) -> &MctsNode<G::State> {
        self.tree.get(self.tree.root())
    }

    /// Whether the root state ends the game.
    pub fn is_terminal(&self) -> bool {
        self.root().done
    }

    /// Get the underlying arena (for inspection/debugging).
    pub fn tree(&self) -> &MctsTree<G::State> {
        &self.tree
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn stats(&self) -> TreeStats {
        self.tree.stats()
    }

    /// Run `iterations` simulations from the current root.
    ///
    /// Statistics accumulate on top of whatever the tree already holds.
    pub async fn plan<L>(
        &mut self,
        iterations: u32,
        evaluator: &L,
    ) -> Result<SearchStats, SearchError>
    where
        L: LeafEvaluator + ?Sized,
    {
        if self.is_terminal() {
            return Err(SearchError::TreeState(
                "cannot search from a terminal root".into(),
            ));
        }

        let mut stats = SearchStats::default();
        self.maybe_add_root_noise();

        for _ in 0..iterations {
            self.simulate(evaluator, &mut stats).await?;
            self.maybe_add_root_noise();
        }

        trace!(
            simulations = stats.simulations,
            evaluations = stats.evaluations,
            terminal_hits = stats.terminal_hits,
            root_visits = self.root().visit_count,
            "Search complete"
        );

        Ok(stats)
    }

    /// Run a single simulation (select -> expand/evaluate -> backpropagate).
    async fn simulate<L>(
        &mut self,
        evaluator: &L,
        stats: &mut SearchStats,
    ) -> Result<(), SearchError>
    where
        L: LeafEvaluator + ?Sized,
    {
        let leaf_id = self.select();

        let value = if self.tree.get(leaf_id).done {
            stats.terminal_hits += 1;
            self.tree.get(leaf_id).terminal_value()
        } else {
            stats.evaluations += 1;
            self.expand(leaf_id, evaluator).await?
        };

        self.tree.backpropagate(leaf_id, value);
        stats.simulations += 1;

        trace!(leaf = leaf_id.0, value, "MCTS simulation complete");
        Ok(())
    }

    /// Select a leaf node by traversing the tree using PUCT.
    fn select(&self) -> NodeId {
        let mut current = self.tree.root();

        while !self.tree.get(current).is_leaf() {
            match self.tree.select_child(current, self.config.c_puct) {
                Some(child_id) => current = child_id,
                None => break,
            }
        }

        current
    }

    /// Expand a non-terminal leaf by adding one child per legal action.
    /// Returns the evaluator's value estimate for the leaf.
    async fn expand<L>(&mut self, node_id: NodeId, evaluator: &L) -> Result<f32, SearchError>
    where
        L: LeafEvaluator + ?Sized,
    {
        let state = self.tree.get(node_id).state.clone();
        let legal = self.game.legal_actions(&state);
        if legal.is_empty() {
            return Err(SearchError::TreeState(
                "non-terminal state has no legal actions".into(),
            ));
        }

        let eval = evaluator.evaluate(self.game.encode(&state)).await?;
        let priors = legal_priors(&eval.policy, &legal);

        // All successors first: a failed apply must not leave a partial expansion
        let children = legal
            .iter()
            .zip(priors)
            .map(|(&action, prior)| {
                let step = self.game.apply(&state, action)?;
                let player = self.game.to_play(&step.state);
                Ok((action, prior, step, player))
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        for (action, prior, step, player) in children {
            self.tree.add_child(node_id, action, prior, step, player);
        }

        Ok(eval.value)
    }

    /// Mix Dirichlet noise into the root priors, once per root.
    fn maybe_add_root_noise(&mut self) {
        if self.root_noised || !self.config.uses_root_noise() {
            return;
        }
        let root_id = self.tree.root();
        let children: Vec<NodeId> = self
            .tree
            .get(root_id)
            .children
            .iter()
            .map(|(_, id)| *id)
            .collect();
        if children.is_empty() {
            return;
        }

        let noise = dirichlet_noise(children.len(), self.config.dirichlet_alpha, &mut self.rng);
        let eps = self.config.dirichlet_epsilon;
        for (child_id, eta) in children.into_iter().zip(noise) {
            let child = self.tree.get_mut(child_id);
            child.prior = (1.0 - eps) * child.prior + eps * eta;
        }
        self.root_noised = true;
    }

    /// Choose a move from the root's visit counts.
    pub fn act_select(&mut self, mode: SelectionMode) -> Result<ActSelection, SearchError> {
        let root = self.root();
        if root.done {
            return Err(SearchError::TreeState(
                "cannot select a move at a terminal root".into(),
            ));
        }
        if !root.is_expanded() {
            return Err(SearchError::TreeState(
                "root has not been searched".into(),
            ));
        }

        let root_visits = root.visit_count;
        let visit_counts = self.tree.root_visit_counts();
        let visits: Vec<u32> = visit_counts.iter().map(|(_, v)| *v).collect();
        let index = policy::select_index(&visits, mode, &mut self.rng).ok_or_else(|| {
            SearchError::TreeState("no child to select".into())
        })?;

        let distribution =
            policy::visit_distribution(&visit_counts, root_visits, self.game.num_actions());

        Ok(ActSelection {
            action: visit_counts[index].0,
            visit_counts,
            distribution,
        })
    }

    /// Advance the root by `action`, keeping the matching subtree if any.
    pub fn step(&mut self, action: Action) -> Result<(), SearchError> {
        let root_id = self.tree.root();
        if !self.game.is_legal(self.root_state(), action) {
            return Err(SearchError::InvalidAction { action });
        }

        match self.tree.child(root_id, action) {
            Some(child_id) => self.tree.reroot(child_id),
            None => {
                let step = self.game.apply(self.root_state(), action)?;
                let player = self.game.to_play(&step.state);
                self.tree = MctsTree::new(MctsNode::new_root(step, player));
            }
        }
        self.root_noised = false;
        Ok(())
    }
}

/// Priors for `legal` taken from `policy` and renormalized to sum to 1.
///
/// Missing, negative and non-finite entries count as zero. If nothing is left,
/// every legal action gets the same prior.
pub fn legal_priors(policy: &[f32], legal: &[Action]) -> Vec<f32> {
    let raw: Vec<f32> = legal
        .iter()
        .map(|&a| {
            policy
                .get(a as usize)
                .copied()
                .filter(|p| p.is_finite() && *p > 0.0)
                .unwrap_or(0.0)
        })
        .collect();

    let total: f32 = raw.iter().sum();
    if total > 0.0 && total.is_finite() {
        raw.into_iter().map(|p| p / total).collect()
    } else {
        vec![1.0 / legal.len() as f32; legal.len()]
    }
}

/// Generate Dirichlet-distributed noise using Gamma variates.
fn dirichlet_noise(n: usize, alpha: f32, rng: &mut ChaCha20Rng) -> Vec<f32> {
    use rand_distr::{Distribution, Gamma};

    let Ok(gamma) = Gamma::new(alpha as f64, 1.0) else {
        return vec![1.0 / n as f32; n];
    };
    let mut samples: Vec<f32> = (0..n).map(|_| gamma.sample(rng) as f32).collect();

    // Normalize
    let sum: f32 = samples.iter().sum();
    if sum > 0.0 {
        for s in &mut samples {
            *s /= sum;
        }
    } else {
        samples.iter_mut().for_each(|s| *s = 1.0 / n as f32);
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{EvalResult, Evaluator, UniformEvaluator, Unbatched};
    use async_trait::async_trait;
    use engine_core::{EncodedState, Player, StepResult};
    use games_connect4::Connect4;
    use games_tictactoe::TicTacToe;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn uniform(game: &impl Game) -> Unbatched<UniformEvaluator> {
        Unbatched(UniformEvaluator::new(game.num_actions()))
    }

    fn ttt_tree(config: MctsConfig) -> SearchTree<TicTacToe> {
        SearchTree::with_seed(Arc::new(TicTacToe::new()), config, 42)
    }

    /// Replay `moves` on the tree itself so the root holds that position.
    fn play_moves<G: Game>(tree: &mut SearchTree<G>, moves: &[Action]) {
        for &m in moves {
            tree.step(m).unwrap();
        }
    }

    #[tokio::test]
    async fn test_plan_basic_search() {
        let mut tree = ttt_tree(MctsConfig::for_testing());
        let evaluator = uniform(&TicTacToe::new());

        let stats = tree.plan(50, &evaluator).await.unwrap();
        assert_eq!(stats.simulations, 50);
        assert_eq!(stats.evaluations + stats.terminal_hits, 50);

        // Root is visited once per simulation; its own expansion is the first
        let root = tree.root();
        assert_eq!(root.visit_count, 50);
        assert_eq!(root.children.len(), 9);
        let child_visits: u32 = tree.tree().root_visit_counts().iter().map(|(_, v)| v).sum();
        assert_eq!(child_visits, 49);

        // Uniform priors over the nine legal moves
        for (_, id) in &root.children {
            assert!((tree.tree().get(*id).prior - 1.0 / 9.0).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_visit_invariants() {
        let mut tree = ttt_tree(MctsConfig::for_testing());
        let evaluator = uniform(&TicTacToe::new());
        tree.plan(300, &evaluator).await.unwrap();

        for node in tree.tree().arena() {
            if node.visit_count == 0 {
                continue;
            }
            let mean = node.value_sum / node.visit_count as f32;
            assert!((node.mean_value() - mean).abs() < 1e-6);
            // Visits at a node cover its own expansion plus every child visit
            if node.is_expanded() {
                let child_sum: u32 = node
                    .children
                    .iter()
                    .map(|(_, id)| tree.tree().get(*id).visit_count)
                    .sum();
                assert_eq!(node.visit_count, child_sum + 1);
            }
        }
    }

    #[tokio::test]
    async fn test_finds_winning_move() {
        // X | X | _
        // O | O | _
        // _ | _ | _
        //
        // X to move; position 2 wins immediately
        let mut tree = ttt_tree(MctsConfig::for_testing());
        play_moves(&mut tree, &[0, 3, 1, 4]);
        let evaluator = uniform(&TicTacToe::new());

        tree.plan(1000, &evaluator).await.unwrap();
        let selection = tree.act_select(SelectionMode::Greedy).unwrap();

        assert_eq!(selection.action, 2, "Should select winning move at position 2");

        let winning = tree.tree().child(tree.tree().root(), 2).unwrap();
        let winning = tree.tree().get(winning);
        assert!(winning.done);
        // Stored from the loser's perspective (O would move next)
        assert!(winning.mean_value() < -0.99);

        // The root value should be positive because we have a winning move
        assert!(tree.root().mean_value() > 0.0);
        assert!(selection.distribution[2] > 0.5);
    }

    #[tokio::test]
    async fn test_self_play_uniform_ttt_is_a_tie() {
        let game = Arc::new(TicTacToe::new());
        let config = MctsConfig::for_testing();
        let evaluator = uniform(&*game);

        // One tree per side; both follow every move
        let mut trees = [
            SearchTree::with_seed(game.clone(), config.clone(), 1),
            SearchTree::with_seed(game.clone(), config.clone(), 2),
        ];
        let mut state = game.init();

        loop {
            let mover = game.to_play(&state);
            trees[mover].plan(4000, &evaluator).await.unwrap();
            let action = trees[mover].act_select(SelectionMode::Greedy).unwrap().action;

            for tree in trees.iter_mut() {
                tree.step(action).unwrap();
            }
            let step = game.apply(&state, action).unwrap();
            state = step.state;
            assert_eq!(trees[0].root_state(), &state);
            assert_eq!(trees[1].root_state(), &state);

            if step.done {
                assert_eq!(step.rewards, vec![0.0, 0.0], "expected a draw, got {state:?}");
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_step_reuses_subtree() {
        let mut tree = ttt_tree(MctsConfig::for_testing());
        let evaluator = uniform(&TicTacToe::new());
        tree.plan(200, &evaluator).await.unwrap();

        let child = tree.tree().child(tree.tree().root(), 4).unwrap();
        let child_visits = tree.tree().get(child).visit_count;
        assert!(child_visits > 0);

        tree.step(4).unwrap();
        assert_eq!(tree.root().visit_count, child_visits);
        assert!(tree.root().parent.is_none());
        assert_eq!(tree.root_state(), &TicTacToe::new().play(&[4]).unwrap());
    }

    #[tokio::test]
    async fn test_step_matches_apply_with_and_without_child() {
        let game = TicTacToe::new();
        let evaluator = uniform(&game);

        // Searched tree: child exists
        let mut searched = ttt_tree(MctsConfig::for_testing());
        searched.plan(20, &evaluator).await.unwrap();
        // Fresh tree: no children yet
        let mut fresh = ttt_tree(MctsConfig::for_testing());

        let expected = game.apply(&game.init(), 6).unwrap().state;
        searched.step(6).unwrap();
        fresh.step(6).unwrap();

        assert_eq!(searched.root_state(), &expected);
        assert_eq!(fresh.root_state(), &expected);
        assert_eq!(fresh.tree().len(), 1);
    }

    #[tokio::test]
    async fn test_step_rejects_illegal_action() {
        let mut tree = ttt_tree(MctsConfig::for_testing());
        tree.step(4).unwrap();

        let err = tree.step(4).unwrap_err();
        assert!(matches!(err, SearchError::InvalidAction { action: 4 }));
        let err = tree.step(9).unwrap_err();
        assert!(matches!(err, SearchError::InvalidAction { action: 9 }));
    }

    #[tokio::test]
    async fn test_terminal_root_errors() {
        let mut tree = ttt_tree(MctsConfig::for_testing());
        play_moves(&mut tree, &[0, 3, 1, 4, 2]);
        assert!(tree.is_terminal());

        let evaluator = uniform(&TicTacToe::new());
        assert!(matches!(
            tree.plan(10, &evaluator).await,
            Err(SearchError::TreeState(_))
        ));
        assert!(matches!(
            tree.act_select(SelectionMode::Greedy),
            Err(SearchError::TreeState(_))
        ));
        assert!(matches!(
            tree.step(5),
            Err(SearchError::InvalidAction { action: 5 })
        ));
    }

    #[tokio::test]
    async fn test_act_select_before_plan_errors() {
        let mut tree = ttt_tree(MctsConfig::for_testing());
        assert!(matches!(
            tree.act_select(SelectionMode::Greedy),
            Err(SearchError::TreeState(_))
        ));
    }

    #[tokio::test]
    async fn test_init_resets_tree() {
        let mut tree = ttt_tree(MctsConfig::for_testing());
        let evaluator = uniform(&TicTacToe::new());
        tree.plan(30, &evaluator).await.unwrap();
        tree.step(0).unwrap();

        tree.init();
        assert_eq!(tree.tree().len(), 1);
        assert_eq!(tree.root().visit_count, 0);
        assert_eq!(tree.root_state(), &TicTacToe::new().init());
    }

    #[tokio::test]
    async fn test_act_select_distribution() {
        let mut tree = ttt_tree(MctsConfig::for_testing());
        let evaluator = uniform(&TicTacToe::new());
        tree.plan(100, &evaluator).await.unwrap();

        let selection = tree
            .act_select(SelectionMode::Proportional { temperature: 1.0 })
            .unwrap();
        assert_eq!(selection.distribution.len(), 9);
        assert_eq!(selection.visit_counts.len(), 9);

        let root_visits = tree.root().visit_count as f32;
        for &(action, visits) in &selection.visit_counts {
            let expected = visits as f32 / root_visits;
            assert!((selection.distribution[action as usize] - expected).abs() < 1e-6);
        }
        let chosen = selection
            .visit_counts
            .iter()
            .find(|(a, _)| *a == selection.action)
            .unwrap();
        assert!(chosen.1 > 0);
    }

    #[tokio::test]
    async fn test_root_noise_changes_priors_once() {
        let config = MctsConfig::for_testing().with_dirichlet(0.3, 0.25);
        let mut tree = ttt_tree(config);
        let evaluator = uniform(&TicTacToe::new());
        tree.plan(1, &evaluator).await.unwrap();

        let priors: Vec<f32> = tree
            .root()
            .children
            .iter()
            .map(|(_, id)| tree.tree().get(*id).prior)
            .collect();
        let sum: f32 = priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(priors.iter().any(|p| (p - 1.0 / 9.0).abs() > 1e-4));

        // More searching on the same root leaves the noised priors alone
        tree.plan(20, &evaluator).await.unwrap();
        let again: Vec<f32> = tree
            .root()
            .children
            .iter()
            .map(|(_, id)| tree.tree().get(*id).prior)
            .collect();
        assert_eq!(priors, again);
    }

    #[test]
    fn test_legal_priors_renormalize() {
        let policy = vec![0.5, 0.1, 0.3, 0.1];
        let priors = legal_priors(&policy, &[0, 2]);
        assert!((priors[0] - 0.625).abs() < 1e-6);
        assert!((priors[1] - 0.375).abs() < 1e-6);
    }

    #[test]
    fn test_legal_priors_uniform_fallback() {
        let priors = legal_priors(&[0.0, 0.0, 1.0], &[0, 1]);
        assert_eq!(priors, vec![0.5, 0.5]);

        // Short or garbage policies fall back too
        let priors = legal_priors(&[f32::NAN], &[0, 3, 5]);
        assert!(priors.iter().all(|p| (p - 1.0 / 3.0).abs() < 1e-6));
    }

    #[test]
    fn test_dirichlet_noise() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let noise = dirichlet_noise(5, 0.3, &mut rng);

        // Should sum to 1.0
        let sum: f32 = noise.iter().sum();
        assert!((sum - 1.0).abs() < 0.01);

        // All values should be non-negative
        for &n in &noise {
            assert!(n >= 0.0);
        }
    }

    /// Puts all policy mass on one column and reports a fixed value.
    struct FavoriteColumn(usize);

    #[async_trait]
    impl Evaluator for FavoriteColumn {
        async fn evaluate_batch(
            &self,
            inputs: Vec<EncodedState>,
        ) -> Result<Vec<EvalResult>, EvaluatorError> {
            Ok(inputs
                .iter()
                .map(|_| {
                    let mut policy = vec![0.0; 7];
                    policy[self.0] = 1.0;
                    EvalResult { policy, value: 0.0 }
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_priors_follow_evaluator_policy() {
        let game = Arc::new(Connect4::new());
        let mut tree = SearchTree::with_seed(game, MctsConfig::for_testing(), 3);
        let evaluator = Unbatched(FavoriteColumn(3));

        tree.plan(40, &evaluator).await.unwrap();
        let selection = tree.act_select(SelectionMode::Greedy).unwrap();
        assert_eq!(selection.action, 3);
        let favorite = tree.tree().child(tree.tree().root(), 3).unwrap();
        assert!((tree.tree().get(favorite).prior - 1.0).abs() < 1e-6);
    }

    struct Failing;

    #[async_trait]
    impl Evaluator for Failing {
        async fn evaluate_batch(
            &self,
            _inputs: Vec<EncodedState>,
        ) -> Result<Vec<EvalResult>, EvaluatorError> {
            Err(EvaluatorError::ModelError("boom".into()))
        }
    }

    #[tokio::test]
    async fn test_evaluator_error_propagates() {
        let mut tree = ttt_tree(MctsConfig::for_testing());
        let err = tree.plan(5, &Unbatched(Failing)).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::Evaluator(EvaluatorError::ModelError(_))
        ));
    }

    /// Tic-tac-toe whose corner move 8 fails to apply while `broken` is set.
    #[derive(Debug)]
    struct FlakyCorner {
        inner: TicTacToe,
        broken: AtomicBool,
    }

    impl Game for FlakyCorner {
        type State = <TicTacToe as Game>::State;

        fn name(&self) -> &'static str {
            "flaky_corner"
        }

        fn num_actions(&self) -> usize {
            self.inner.num_actions()
        }

        fn init(&self) -> Self::State {
            self.inner.init()
        }

        fn legal_actions(&self, state: &Self::State) -> Vec<Action> {
            self.inner.legal_actions(state)
        }

        fn apply(
            &self,
            state: &Self::State,
            action: Action,
        ) -> Result<StepResult<Self::State>, GameError> {
            if action == 8 && self.broken.load(Ordering::SeqCst) {
                return Err(GameError::InvalidState("corner unavailable".into()));
            }
            self.inner.apply(state, action)
        }

        fn to_play(&self, state: &Self::State) -> Player {
            self.inner.to_play(state)
        }

        fn encode(&self, state: &Self::State) -> EncodedState {
            self.inner.encode(state)
        }
    }

    #[tokio::test]
    async fn test_failed_expansion_leaves_node_unexpanded() {
        let game = Arc::new(FlakyCorner {
            inner: TicTacToe::new(),
            broken: AtomicBool::new(true),
        });
        let mut tree = SearchTree::with_seed(game.clone(), MctsConfig::for_testing(), 7);
        let evaluator = uniform(&*game);

        let err = tree.plan(1, &evaluator).await.unwrap_err();
        assert!(matches!(err, SearchError::Game(GameError::InvalidState(_))));
        assert!(tree.root().children.is_empty());
        assert_eq!(tree.tree().len(), 1);

        // Once apply works again the root expands with every legal move
        game.broken.store(false, Ordering::SeqCst);
        tree.plan(10, &evaluator).await.unwrap();
        assert_eq!(tree.root().children.len(), 9);
    }
}
