//! MCTS tree structure with arena allocation.
//!
//! The tree uses arena allocation for efficient node storage and
//! cache-friendly traversal. Nodes are stored in a contiguous Vec
//! and referenced by NodeId indices. Re-rooting compacts the arena down to
//! the new root's subtree, so discarded siblings are freed immediately.

use engine_core::{Action, Player, StepResult};

use crate::node::{MctsNode, NodeId};

/// MCTS tree with arena-based node storage.
#[derive(Debug, Clone)]
pub struct MctsTree<S> {
    /// Arena storing all nodes
    nodes: Vec<MctsNode<S>>,

    /// Root node index (always 0 after initialization or re-rooting)
    root: NodeId,
}

impl<S> MctsTree<S> {
    /// Create a new tree holding only `root`.
    pub fn new(root: MctsNode<S>) -> Self {
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode<S> {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode<S> {
        &mut self.nodes[id.index()]
    }

    /// Allocate a new node and return its ID.
    pub fn allocate(&mut self, node: MctsNode<S>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (should never be true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the arena slice for read access.
    #[inline]
    pub fn arena(&self) -> &[MctsNode<S>] {
        &self.nodes
    }

    /// Child of `node_id` reached by `action`, if it has been created.
    pub fn child(&self, node_id: NodeId, action: Action) -> Option<NodeId> {
        self.get(node_id)
            .children
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, id)| *id)
    }

    /// Select the best child of a node by PUCT score.
    ///
    /// Ties go to the child created first.
    pub fn select_child(&self, node_id: NodeId, c_puct: f32) -> Option<NodeId> {
        let node = self.get(node_id);
        // Pre-compute sqrt once instead of per-child comparison
        let parent_visits_sqrt = (node.visit_count as f32).sqrt();

        let mut best: Option<(NodeId, f32)> = None;
        for &(_, child_id) in &node.children {
            let score = self
                .get(child_id)
                .ucb_score(node.player, parent_visits_sqrt, c_puct);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((child_id, score)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Add a child to a parent node.
    /// Returns the new child's NodeId.
    pub fn add_child(
        &mut self,
        parent_id: NodeId,
        action: Action,
        prior: f32,
        step: StepResult<S>,
        player: Player,
    ) -> NodeId {
        let child = MctsNode::new_child(parent_id, Some(action), prior, step, player);
        let child_id = self.allocate(child);

        self.get_mut(parent_id).children.push((action, child_id));

        child_id
    }

    /// Backpropagate a value from a leaf to the root.
    ///
    /// `value` is from the perspective of the leaf's player. It is negated
    /// whenever the player to move changes between a node and its parent.
    pub fn backpropagate(&mut self, leaf_id: NodeId, value: f32) {
        let mut current_id = leaf_id;
        let mut current_value = value;

        while current_id.is_some() {
            let node = self.get_mut(current_id);
            node.visit_count += 1;
            node.value_sum += current_value;

            let player = node.player;
            let parent = node.parent;
            if parent.is_some() && self.get(parent).player != player {
                current_value = -current_value;
            }

            current_id = parent;
        }
    }

    /// Visit counts of the root's children, in child order.
    pub fn root_visit_counts(&self) -> Vec<(Action, u32)> {
        self.get(self.root)
            .children
            .iter()
            .map(|(action, id)| (*action, self.get(*id).visit_count))
            .collect()
    }

    /// Make `new_root` the root, dropping every node outside its subtree.
    ///
    /// Surviving nodes are renumbered in breadth-first order, so the new root
    /// is always `NodeId(0)`. Statistics of the kept subtree are preserved.
    pub fn reroot(&mut self, new_root: NodeId) {
        if new_root == self.root && self.get(new_root).parent.is_none() {
            return;
        }

        // Breadth-first order of the kept subtree; doubles as the remap table.
        let mut order = vec![new_root];
        let mut i = 0;
        while i < order.len() {
            let id = order[i];
            order.extend(self.get(id).children.iter().map(|(_, child)| *child));
            i += 1;
        }

        let mut remap = vec![NodeId::NONE; self.nodes.len()];
        for (new_index, old_id) in order.iter().enumerate() {
            remap[old_id.index()] = NodeId(new_index as u32);
        }

        let mut old: Vec<Option<MctsNode<S>>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for old_id in order {
            if let Some(mut node) = old[old_id.index()].take() {
                node.parent = if old_id == new_root {
                    NodeId::NONE
                } else {
                    remap[node.parent.index()]
                };
                for (_, child) in node.children.iter_mut() {
                    *child = remap[child.index()];
                }
                nodes.push(node);
            }
        }

        let root = &mut nodes[0];
        root.action = None;
        root.prior = 1.0;

        self.nodes = nodes;
        self.root = NodeId(0);
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.mean_value(),
            max_depth: self.compute_max_depth(self.root, 0),
        }
    }

    fn compute_max_depth(&self, node_id: NodeId, current_depth: u32) -> u32 {
        let node = self.get(node_id);
        if node.children.is_empty() {
            return current_depth;
        }

        node.children
            .iter()
            .map(|(_, id)| self.compute_max_depth(*id, current_depth + 1))
            .max()
            .unwrap_or(current_depth)
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f32,
    pub max_depth: u32,
}
