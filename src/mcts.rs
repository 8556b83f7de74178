//! Monte-Carlo tree search over random rollouts
//!
//! A search runs in two phases. First every legal move of the root is expanded
//! exactly once, in random order, and the new child is scored by
//! `simulations_per_expansion` rollouts. Then `children * simulations_per_expansion`
//! further iterations descend from the root by UCB1 until they reach a node that
//! still has untried moves or no children, roll out from there and add the result
//! to every node on the way back up.
//!
//! Rollout results are always scored for the player to move at the root:
//! `+1` win, `-1` loss, `0` draw.

use std::collections::BTreeMap;

use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::bitboard::{BitBoard, Moves};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MctsConfig {
    /// Rollouts run from every freshly expanded root child
    pub simulations_per_expansion: u32,
    /// Exploration constant `C` of UCB1
    pub exploration: f64,
    /// Seed of the rollout generator, drawn from the OS when `None`
    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            simulations_per_expansion: 500,
            exploration: std::f64::consts::SQRT_2,
            seed: None,
        }
    }
}

impl MctsConfig {
    /// A small, reproducible configuration
    pub fn for_testing() -> Self {
        Self {
            simulations_per_expansion: 50,
            seed: Some(0x00c0_ffee),
            ..Self::default()
        }
    }

    pub fn with_simulations(mut self, simulations_per_expansion: u32) -> Self {
        self.simulations_per_expansion = simulations_per_expansion;
        self
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Index of a node in the tree arena
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct NodeId(usize);

struct Node {
    board: BitBoard,
    // column played to reach this node, `None` for the root
    column: Option<usize>,
    // non-owning link back up the tree
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    visits: u32,
    wins: f64,
    untried: Moves,
}

impl Node {
    fn new(board: BitBoard, column: Option<usize>, parent: Option<NodeId>) -> Self {
        // a won position has no moves left to try
        let untried = if board.is_winning_state() {
            Moves::default()
        } else {
            board.legal_moves()
        };
        Self {
            board,
            column,
            parent,
            children: Vec::new(),
            visits: 0,
            wins: 0.0,
            untried,
        }
    }

    fn win_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins / self.visits as f64
        }
    }
}

/// Search tree owning every node; dropped when a search returns
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    const ROOT: NodeId = NodeId(0);

    fn new(board: BitBoard) -> Self {
        Self {
            nodes: vec![Node::new(board, None, None)],
        }
    }

    fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn add_child(&mut self, parent: NodeId, column: usize, board: BitBoard) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(board, Some(column), Some(parent)));
        self.get_mut(parent).children.push(id);
        id
    }

    fn ucb1(&self, id: NodeId, exploration: f64) -> f64 {
        let node = self.get(id);
        if node.visits == 0 {
            return f64::INFINITY;
        }
        let parent_visits = node.parent.map_or(1, |parent| self.get(parent).visits);
        node.win_rate()
            + exploration * ((parent_visits as f64).ln() / node.visits as f64).sqrt()
    }

    // first child with the highest UCB1 value
    fn select_child(&self, id: NodeId, exploration: f64) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &self.get(id).children {
            let value = self.ucb1(child, exploration);
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((child, value));
            }
        }
        best.map(|(child, _)| child)
    }

    fn backpropagate(&mut self, from: NodeId, result: f64) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visits += 1;
            node.wins += result;
            current = node.parent;
        }
    }
}

/// Per-column outcome of an [`MctsEngine::search`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WinRates {
    rates: BTreeMap<usize, f64>,
    visits: BTreeMap<usize, u32>,
    /// Rollouts run by the search
    pub simulations: u64,
}

impl WinRates {
    /// Mean rollout result of a root move, in `[-1, 1]`
    pub fn get(&self, column: usize) -> Option<f64> {
        self.rates.get(&column).copied()
    }

    pub fn visits(&self, column: usize) -> Option<u32> {
        self.visits.get(&column).copied()
    }

    /// `(column, rate)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.rates.iter().map(|(&column, &rate)| (column, rate))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// The column with the highest rate, the leftmost one on ties
    pub fn best_column(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (column, rate) in self.iter() {
            if best.map_or(true, |(_, best_rate)| rate > best_rate) {
                best = Some((column, rate));
            }
        }
        best.map(|(column, _)| column)
    }
}

/// Monte-Carlo tree search agent
pub struct MctsEngine {
    config: MctsConfig,
    rng: Xoshiro256PlusPlus,
}

impl MctsEngine {
    pub fn new(config: MctsConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            config,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Estimates how well each legal move of `board` does for the player to move
    pub fn search(&mut self, board: &BitBoard) -> WinRates {
        let root_player = board.current_player();
        let per_expansion = self.config.simulations_per_expansion;
        let mut tree = Tree::new(*board);
        let mut simulations = 0u64;

        // expansion: try every root move once
        while !tree.get(Tree::ROOT).untried.is_empty() {
            let root = tree.get_mut(Tree::ROOT);
            let pick = self.rng.random_range(0..root.untried.len());
            let column = root.untried.remove(pick);

            let mut child_board = *board;
            child_board.push_move(column);
            let child = tree.add_child(Tree::ROOT, column, child_board);
            trace!("expanded column {} with {} rollouts", column, per_expansion);

            for _ in 0..per_expansion {
                let result = self.rollout(child_board, root_player);
                tree.backpropagate(child, result);
                simulations += 1;
            }
        }

        // refinement: UCB1 descent through fully tried nodes
        let iterations = tree.get(Tree::ROOT).children.len() as u64 * u64::from(per_expansion);
        for _ in 0..iterations {
            let mut node = Tree::ROOT;
            while tree.get(node).untried.is_empty() {
                match tree.select_child(node, self.config.exploration) {
                    Some(child) => node = child,
                    None => break,
                }
            }
            let result = self.rollout(tree.get(node).board, root_player);
            tree.backpropagate(node, result);
            simulations += 1;
        }

        let root = tree.get(Tree::ROOT);
        let mut win_rates = WinRates {
            simulations,
            ..WinRates::default()
        };
        for &child in &root.children {
            let node = tree.get(child);
            if let Some(column) = node.column {
                win_rates.rates.insert(column, node.win_rate());
                win_rates.visits.insert(column, node.visits);
            }
        }
        debug!(
            "mcts after {} moves: {} children, {} rollouts, best column {:?}",
            board.move_count(),
            root.children.len(),
            simulations,
            win_rates.best_column()
        );
        win_rates
    }

    /// Plays uniformly random moves until the game ends, scoring the result for `player`
    fn rollout(&mut self, mut board: BitBoard, player: usize) -> f64 {
        loop {
            if board.is_winning_state() {
                return if board.last_mover() == player { 1.0 } else { -1.0 };
            }
            if board.is_full() {
                return 0.0;
            }
            let moves = board.legal_moves();
            let pick = self.rng.random_range(0..moves.len());
            if let Some(column) = moves.get(pick) {
                board.push_move(column);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.simulations_per_expansion, 500);
        assert!((config.exploration - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn builder_pattern() {
        let config = MctsConfig::default()
            .with_simulations(10)
            .with_exploration(1.0)
            .with_seed(7);
        assert_eq!(config.simulations_per_expansion, 10);
        assert!((config.exploration - 1.0).abs() < 1e-12);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn unvisited_child_has_infinite_priority() {
        let mut tree = Tree::new(BitBoard::new());
        let visited = tree.add_child(Tree::ROOT, 3, BitBoard::from_slice(&[3]).unwrap());
        let fresh = tree.add_child(Tree::ROOT, 2, BitBoard::from_slice(&[2]).unwrap());
        tree.backpropagate(visited, 1.0);
        assert_eq!(tree.ucb1(fresh, 2f64.sqrt()), f64::INFINITY);
        assert_eq!(tree.select_child(Tree::ROOT, 2f64.sqrt()), Some(fresh));
    }

    #[test]
    fn backpropagation_reaches_root() {
        let mut tree = Tree::new(BitBoard::new());
        let child = tree.add_child(Tree::ROOT, 3, BitBoard::from_slice(&[3]).unwrap());
        let grandchild = tree.add_child(child, 3, BitBoard::from_slice(&[3, 3]).unwrap());
        tree.backpropagate(grandchild, -1.0);
        tree.backpropagate(child, 1.0);
        assert_eq!(tree.get(grandchild).visits, 1);
        assert_eq!(tree.get(child).visits, 2);
        assert_eq!(tree.get(Tree::ROOT).visits, 2);
        assert_eq!(tree.get(Tree::ROOT).wins, 0.0);
    }

    #[test]
    fn won_node_is_terminal() {
        let board = BitBoard::from_slice(&[3, 0, 3, 0, 3, 0, 3]).unwrap();
        let node = Node::new(board, Some(3), None);
        assert!(node.untried.is_empty());
    }

    #[test]
    fn best_column_prefers_leftmost_tie() {
        let mut rates = WinRates::default();
        rates.rates.insert(4, 0.5);
        rates.rates.insert(2, 0.5);
        rates.rates.insert(6, -0.1);
        assert_eq!(rates.best_column(), Some(2));
        assert_eq!(WinRates::default().best_column(), None);
    }
}
