//! Forced-mate detection: alternating seeker/defender search over a
//! depth-bounded move tree. On the seeker's ply only checking moves are
//! explored (a non-checking move can never be part of a forced mating
//! sequence); on the defender's ply every legal reply is explored, since
//! the defender is assumed to play the only move that survives.

use crate::board::{Board, Color};
use crate::error::SearchError;
use crate::game::move_to_san;
use crate::moves::execute::{generate_legal, make_move_basic};
use crate::moves::magic::MagicTables;
use crate::moves::square_control::in_check;
use crate::moves::types::Move;
use crate::status::{position_status, GameStatus};

struct MoveNode {
    mv: Move,
    depth: u32,
    player_turn: Color,
    is_checkmate: bool,
    children: Vec<MoveNode>,
}

impl MoveNode {
    /// Aggregates this node's mate status from its children. When this
    /// node's `player_turn` is the seeker, every child must be a forced
    /// mate (the defender picks the reply, so none may escape). Otherwise
    /// a single mating child is enough (the seeker picks the best move).
    fn children_forced_checkmate(&self, seeking_mate_for: Color) -> bool {
        if self.children.is_empty() {
            return self.is_checkmate;
        }
        if seeking_mate_for == self.player_turn {
            self.children.iter().all(|c| c.is_checkmate)
        } else {
            self.children.iter().any(|c| c.is_checkmate)
        }
    }
}

/// A single forced mating sequence, in the order it is actually played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MateLine {
    pub moves: Vec<Move>,
    pub tokens: Vec<String>,
}

impl MateLine {
    pub fn plies_to_mate(&self) -> usize {
        self.moves.len()
    }
}

fn checking_moves(board: &mut Board, tables: &MagicTables) -> Vec<Move> {
    let mut legal = Vec::new();
    let mut scratch = Vec::new();
    generate_legal(board, tables, &mut legal, &mut scratch);

    legal
        .into_iter()
        .filter(|&mv| {
            let mut b = board.clone();
            make_move_basic(&mut b, mv);
            in_check(&b, b.side_to_move, tables)
        })
        .collect()
}

/// Searches for the shortest forced checkmate `seeking_mate_for` can
/// deliver within `max_depth` plies of the reply that follows the first
/// checking move. Returns every line tied for shortest, empty if none
/// exists. `board` must have `seeking_mate_for` to move.
pub fn find_forced_mate(
    board: &Board,
    tables: &MagicTables,
    seeking_mate_for: Color,
    max_depth: u32,
) -> Result<Vec<MateLine>, SearchError> {
    if max_depth == 0 {
        return Err(SearchError::InvalidDepth(max_depth));
    }
    if board.side_to_move != seeking_mate_for {
        return Err(SearchError::TerminalPosition);
    }

    let mut root_board = board.clone();
    let roots_mv = checking_moves(&mut root_board, tables);

    let mut mate_roots = Vec::new();
    for mv in roots_mv {
        let mut b = board.clone();
        make_move_basic(&mut b, mv);
        let mut root = MoveNode {
            mv,
            depth: 0,
            player_turn: b.side_to_move,
            is_checkmate: false,
            children: Vec::new(),
        };
        if search_node(&mut root, &b, tables, seeking_mate_for, max_depth) {
            mate_roots.push(root);
        }
    }

    let mut lines: Vec<MateLine> = mate_roots
        .iter()
        .map(|root| build_mate_line(board, tables, root))
        .collect();

    if let Some(shortest) = lines.iter().map(MateLine::plies_to_mate).min() {
        lines.retain(|l| l.plies_to_mate() == shortest);
    }

    Ok(lines)
}

fn search_node(
    node: &mut MoveNode,
    board_after_move: &Board,
    tables: &MagicTables,
    seeking_mate_for: Color,
    max_depth: u32,
) -> bool {
    if node.depth > max_depth {
        node.is_checkmate = false;
        return false;
    }

    let mut board = board_after_move.clone();
    let status = position_status(&mut board, tables);
    let mover = board.side_to_move;

    if status == GameStatus::Checkmate {
        node.is_checkmate = mover != seeking_mate_for;
        return node.is_checkmate;
    }
    if status != GameStatus::InPlay {
        node.is_checkmate = false;
        return false;
    }

    let candidates = if mover == seeking_mate_for {
        checking_moves(&mut board, tables)
    } else {
        let mut legal = Vec::new();
        let mut scratch = Vec::new();
        generate_legal(&mut board, tables, &mut legal, &mut scratch);
        legal
    };

    if candidates.is_empty() && mover == seeking_mate_for {
        node.is_checkmate = false;
        return false;
    }

    for mv in candidates {
        let mut child_board = board.clone();
        make_move_basic(&mut child_board, mv);
        let mut child = MoveNode {
            mv,
            depth: node.depth + 1,
            player_turn: child_board.side_to_move,
            is_checkmate: false,
            children: Vec::new(),
        };
        search_node(&mut child, &child_board, tables, seeking_mate_for, max_depth);
        node.children.push(child);
    }

    node.is_checkmate = node.children_forced_checkmate(seeking_mate_for);
    node.is_checkmate
}

fn mate_depth(node: &MoveNode) -> u32 {
    match node.children.iter().find(|c| c.is_checkmate) {
        None => node.depth,
        Some(_) => node
            .children
            .iter()
            .filter(|c| c.is_checkmate)
            .map(mate_depth)
            .min()
            .unwrap_or(node.depth),
    }
}

fn collect_shortest_line(node: &MoveNode, out: &mut Vec<Move>) {
    out.push(node.mv);
    if let Some(best_child) = node
        .children
        .iter()
        .filter(|c| c.is_checkmate)
        .min_by_key(|c| mate_depth(c))
    {
        collect_shortest_line(best_child, out);
    }
}

fn build_mate_line(initial_board: &Board, tables: &MagicTables, root: &MoveNode) -> MateLine {
    let mut moves = Vec::new();
    collect_shortest_line(root, &mut moves);

    let mut board = initial_board.clone();
    let mut tokens = Vec::new();
    for &mv in &moves {
        let mut legal = Vec::new();
        let mut scratch = Vec::new();
        generate_legal(&mut board, tables, &mut legal, &mut scratch);
        tokens.push(move_to_san(&mut board.clone(), tables, &legal, mv));
        make_move_basic(&mut board, mv);
    }

    MateLine { moves, tokens }
}
