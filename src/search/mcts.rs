//! Monte Carlo Tree Search over a shared, multi-parent DAG keyed by
//! position hash: two different move orders that reach the same position
//! land on the same node and pool their statistics, rather than each
//! growing an isolated subtree.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Board, Color};
use crate::error::SearchError;
use crate::moves::execute::{generate_legal, make_move_basic};
use crate::moves::magic::MagicTables;
use crate::moves::types::Move;
use crate::status::{position_status, GameStatus};

const DEFAULT_EXPLORATION_WEIGHT: f64 = 1.414;
const DEFAULT_DEPTH_PENALTY: f64 = 0.01;
const ROLLOUT_PLY_CAP: u32 = 400;

struct MctsNode {
    fen: String,
    parents: Vec<usize>,
    children: HashMap<Move, usize>,
    untried_moves: Vec<Move>,
    terminal_value: Option<f64>,
    num_visits: u32,
    total_value: f64,
    depth: u32,
}

impl MctsNode {
    fn is_fully_expanded(&self) -> bool {
        self.untried_moves.is_empty()
    }
}

pub struct Mcts<'a> {
    tables: &'a MagicTables,
    arena: Vec<MctsNode>,
    hash_to_index: HashMap<u64, usize>,
    root: usize,
    exploration_weight: f64,
    depth_penalty: f64,
}

/// One entry of the search report: a move available at the root, how many
/// times it (or a transposition into the same node) was visited, and the
/// resulting average value from the root player's perspective.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveStats {
    pub mv: Move,
    pub visits: u32,
    pub average_value: f64,
}

impl<'a> Mcts<'a> {
    pub fn new(board: &Board, tables: &'a MagicTables) -> Result<Self, SearchError> {
        let mut b = board.clone();
        if position_status(&mut b, tables) != GameStatus::InPlay {
            return Err(SearchError::TerminalPosition);
        }

        let mut mcts = Mcts {
            tables,
            arena: Vec::new(),
            hash_to_index: HashMap::new(),
            root: 0,
            exploration_weight: DEFAULT_EXPLORATION_WEIGHT,
            depth_penalty: DEFAULT_DEPTH_PENALTY,
        };
        mcts.root = mcts.get_or_create_node(board.clone(), 0);
        Ok(mcts)
    }

    fn get_or_create_node(&mut self, mut board: Board, depth: u32) -> usize {
        let hash = board.zobrist;
        if let Some(&idx) = self.hash_to_index.get(&hash) {
            return idx;
        }

        let status = position_status(&mut board, self.tables);
        let terminal_value = terminal_value_for_white(status, board.side_to_move);

        let mut untried = Vec::new();
        if terminal_value.is_none() {
            let mut scratch = Vec::new();
            generate_legal(&mut board, self.tables, &mut untried, &mut scratch);
        }

        let node = MctsNode {
            fen: board.to_fen(),
            parents: Vec::new(),
            children: HashMap::new(),
            untried_moves: untried,
            terminal_value,
            num_visits: 0,
            total_value: 0.0,
            depth,
        };

        let idx = self.arena.len();
        self.arena.push(node);
        self.hash_to_index.insert(hash, idx);
        idx
    }

    /// Runs `iterations` selection/expansion/simulation/backpropagation
    /// rounds and returns per-move visit statistics at the root, ordered
    /// by descending visit count (the conventional "robust child" choice,
    /// distinct from the UCB score used for in-tree selection).
    pub fn run(&mut self, iterations: u32) -> Result<Vec<MoveStats>, SearchError> {
        if iterations == 0 {
            return Err(SearchError::EmptyBudget(iterations));
        }

        let mut rng = rand::rng();
        for _ in 0..iterations {
            self.iterate(&mut rng);
        }

        let root = &self.arena[self.root];
        let mut stats: Vec<MoveStats> = root
            .children
            .iter()
            .map(|(&mv, &child_idx)| {
                let child = &self.arena[child_idx];
                let average_value = if child.num_visits == 0 {
                    0.0
                } else {
                    -(child.total_value / child.num_visits as f64)
                };
                MoveStats {
                    mv,
                    visits: child.num_visits,
                    average_value,
                }
            })
            .collect();
        stats.sort_by(|a, b| b.visits.cmp(&a.visits));
        Ok(stats)
    }

    pub fn best_move(&mut self, iterations: u32) -> Result<Option<Move>, SearchError> {
        let stats = self.run(iterations)?;
        Ok(stats.into_iter().next().map(|s| s.mv))
    }

    fn iterate(&mut self, rng: &mut impl Rng) {
        let mut path = vec![self.root];
        let mut current = self.root;

        while self.arena[current].terminal_value.is_none() && self.arena[current].is_fully_expanded() {
            match self.select_child(current) {
                Some(next) => {
                    current = next;
                    path.push(current);
                }
                None => break,
            }
        }

        let (value, sim_depth) = if let Some(v) = self.arena[current].terminal_value {
            (v, self.arena[current].depth)
        } else if !self.arena[current].untried_moves.is_empty() {
            let child = self.expand(current, rng);
            path.push(child);
            self.simulate(child, rng)
        } else {
            self.simulate(current, rng)
        };

        self.backpropagate(*path.last().unwrap(), value, sim_depth);
    }

    fn select_child(&self, idx: usize) -> Option<usize> {
        let node = &self.arena[idx];
        if node.children.is_empty() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for &child_idx in node.children.values() {
            let ucb = self.ucb(child_idx);
            if ucb == f64::INFINITY {
                return Some(child_idx);
            }
            let better = match best {
                Some((_, best_ucb)) => ucb > best_ucb,
                None => true,
            };
            if better {
                best = Some((child_idx, ucb));
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn ucb(&self, idx: usize) -> f64 {
        let node = &self.arena[idx];
        if node.num_visits == 0 {
            return f64::INFINITY;
        }
        let total_parent_visits: u32 = node.parents.iter().map(|&p| self.arena[p].num_visits).sum();
        let exploitation = node.total_value / node.num_visits as f64;
        let exploration = self.exploration_weight
            * ((total_parent_visits.max(1) as f64).ln() / node.num_visits as f64).sqrt();
        let depth_penalty = self.depth_penalty * node.depth as f64;
        exploitation + exploration - depth_penalty
    }

    fn expand(&mut self, idx: usize, rng: &mut impl Rng) -> usize {
        let fen = self.arena[idx].fen.clone();
        let depth = self.arena[idx].depth;
        let mv_index = rng.random_range(0..self.arena[idx].untried_moves.len());
        let mv = self.arena[idx].untried_moves.remove(mv_index);

        let mut board: Board = fen.parse().expect("node fen must be valid");
        make_move_basic(&mut board, mv);

        let child_idx = self.get_or_create_node(board, depth + 1);
        if !self.arena[child_idx].parents.contains(&idx) {
            self.arena[child_idx].parents.push(idx);
        }
        self.arena[idx].children.insert(mv, child_idx);
        child_idx
    }

    fn simulate(&mut self, idx: usize, rng: &mut impl Rng) -> (f64, u32) {
        if let Some(v) = self.arena[idx].terminal_value {
            return (v, self.arena[idx].depth);
        }

        let mut board: Board = self.arena[idx].fen.parse().expect("node fen must be valid");
        let mut depth = self.arena[idx].depth;
        let mut scratch_a = Vec::new();
        let mut scratch_b = Vec::new();

        loop {
            let status = position_status(&mut board, self.tables);
            if let Some(v) = terminal_value_for_white(status, board.side_to_move) {
                return (v, depth);
            }
            if depth - self.arena[idx].depth >= ROLLOUT_PLY_CAP {
                return (0.0, depth);
            }

            scratch_a.clear();
            generate_legal(&mut board, self.tables, &mut scratch_a, &mut scratch_b);
            let mv = *scratch_a
                .choose(rng)
                .expect("non-terminal position always has a legal move");
            make_move_basic(&mut board, mv);
            depth += 1;
        }
    }

    fn backpropagate(&mut self, idx: usize, value: f64, simulation_depth: u32) {
        let node = &mut self.arena[idx];
        node.num_visits += 1;
        node.total_value += value - self.depth_penalty * (simulation_depth as i64 - node.depth as i64) as f64;

        let parents = self.arena[idx].parents.clone();
        for parent in parents {
            self.backpropagate(parent, -value, simulation_depth);
        }
    }
}

/// Terminal value relative to White: `+1.0` if White has won, `-1.0` if
/// Black has won, `0.0` for any drawn classification, `None` if the
/// position is still in play. `mover` is whoever is to move in `status`'s
/// position (the side who, on checkmate, has just been mated).
fn terminal_value_for_white(status: GameStatus, mover: Color) -> Option<f64> {
    match status {
        GameStatus::InPlay => None,
        GameStatus::Checkmate => Some(if mover == Color::White { -1.0 } else { 1.0 }),
        _ => Some(0.0),
    }
}
