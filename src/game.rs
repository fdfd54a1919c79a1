//! Owns a `Board` plus the bookkeeping a playable game needs on top of raw
//! position state: move history in algebraic notation, terminal-state
//! classification, and relaxed algebraic move-token parsing.

use crate::board::{Board, Color, Piece};
use crate::error::{MoveError, MovePhase};
use crate::moves::execute::{generate_legal, make_move_basic};
use crate::moves::magic::MagicTables;
use crate::moves::types::Move;
use crate::square::Square;
use crate::status::{GameStatus, position_status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Running,
    Drawn,
    WhiteWins,
    BlackWins,
}

/// One recorded ply: the SAN-ish token produced by `move_to_san` at the
/// time the move was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    pub fullmove_number: u32,
    pub color: Color,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    history: Vec<RecordedMove>,
    outcome: Outcome,
}

impl Game {
    pub fn new() -> Self {
        Game {
            board: Board::new(),
            history: Vec::new(),
            outcome: Outcome::Running,
        }
    }

    pub fn parse_fen(fen: &str) -> Result<Self, crate::error::FenError> {
        let board: Board = fen.parse()?;
        Ok(Game {
            board,
            history: Vec::new(),
            outcome: Outcome::Running,
        })
    }

    pub fn to_fen(&self) -> String {
        self.board.to_fen()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move
    }

    pub fn fullmove_number(&self) -> u32 {
        self.board.fullmove_number
    }

    pub fn current_hash(&self) -> u64 {
        self.board.zobrist
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_terminated(&self) -> bool {
        self.outcome != Outcome::Running
    }

    pub fn is_drawn(&self) -> bool {
        self.outcome == Outcome::Drawn
    }

    pub fn moves_played(&self) -> &[RecordedMove] {
        &self.history
    }

    /// Legal moves in the current position, paired with their SAN-ish
    /// rendering. Empty once the game has terminated.
    pub fn legal_moves(&self, tables: &MagicTables) -> Vec<(Move, String)> {
        let mut board = self.board.clone();
        let mut moves = Vec::new();
        let mut scratch = Vec::new();
        generate_legal(&mut board, tables, &mut moves, &mut scratch);

        moves
            .iter()
            .map(|&mv| {
                let mut b = self.board.clone();
                (mv, move_to_san(&mut b, tables, &moves, mv))
            })
            .collect()
    }

    pub fn status(&self, tables: &MagicTables) -> GameStatus {
        let mut board = self.board.clone();
        position_status(&mut board, tables)
    }

    /// Parses `token` as a relaxed algebraic move, resolves it against the
    /// legal moves in the current position, applies it, appends it to the
    /// move history, and updates the terminal-state classification.
    pub fn apply_move_token(
        &mut self,
        token: &str,
        tables: &MagicTables,
    ) -> Result<Move, MoveError> {
        if self.is_terminated() {
            return Err(MoveError::GameOver {
                phase: MovePhase::Resolve,
            });
        }

        let parsed = parse_move_token(token).ok_or_else(|| MoveError::UnparsableToken {
            token: token.to_string(),
            phase: MovePhase::Parse,
        })?;

        let mut legal = Vec::new();
        let mut scratch = Vec::new();
        generate_legal(&mut self.board, tables, &mut legal, &mut scratch);

        let matches: Vec<Move> = legal
            .iter()
            .copied()
            .filter(|&mv| parsed.matches(&self.board, mv))
            .collect();

        let mv = match matches.as_slice() {
            [] => {
                return Err(MoveError::NotLegal {
                    token: token.to_string(),
                    phase: MovePhase::Resolve,
                });
            }
            [single] => *single,
            _ => {
                return Err(MoveError::Ambiguous {
                    token: token.to_string(),
                    phase: MovePhase::Resolve,
                });
            }
        };

        let san = move_to_san(&mut self.board.clone(), tables, &legal, mv);
        let mover = self.board.side_to_move;
        let fullmove_number = self.board.fullmove_number;

        make_move_basic(&mut self.board, mv);

        self.history.push(RecordedMove {
            fullmove_number,
            color: mover,
            token: san,
        });

        self.outcome = match position_status(&mut self.board, tables) {
            GameStatus::InPlay => Outcome::Running,
            GameStatus::Checkmate => match mover {
                Color::White => Outcome::WhiteWins,
                Color::Black => Outcome::BlackWins,
            },
            _ => Outcome::Drawn,
        };

        Ok(mv)
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
        Piece::Pawn => unreachable!("pawn moves have no piece letter"),
    }
}

fn promo_piece_from_char(c: char) -> Option<Piece> {
    match c.to_ascii_uppercase() {
        'Q' => Some(Piece::Queen),
        'R' => Some(Piece::Rook),
        'B' => Some(Piece::Bishop),
        'N' => Some(Piece::Knight),
        _ => None,
    }
}

/// Renders a legal move as SAN-like text: piece letter, disambiguation only
/// when another legal move of the same piece shares the destination,
/// capture/promotion markers, and a trailing `+`/`#` from the resulting
/// position.
pub fn move_to_san(board: &mut Board, tables: &MagicTables, legal_moves: &[Move], mv: Move) -> String {
    let base = if mv.is_kingside_castle() {
        "O-O".to_string()
    } else if mv.is_queenside_castle() {
        "O-O-O".to_string()
    } else {
        let piece = board
            .piece_type_at(mv.from)
            .expect("move origin must hold a piece");
        let mut s = String::new();

        if piece == Piece::Pawn {
            if mv.is_capture() {
                s.push((b'a' + mv.from.file()) as char);
                s.push('x');
            }
            s.push_str(&mv.to.to_string());
            if let Some(promo) = mv.promotion {
                s.push('=');
                s.push(piece_char(promo));
            }
        } else {
            s.push(piece_char(piece));

            let siblings: Vec<&Move> = legal_moves
                .iter()
                .filter(|m| m.to == mv.to && m.from != mv.from && board.piece_type_at(m.from) == Some(piece))
                .collect();

            if !siblings.is_empty() {
                let same_file = siblings.iter().any(|m| m.from.file() == mv.from.file());
                let same_rank = siblings.iter().any(|m| m.from.rank() == mv.from.rank());
                if !same_file {
                    s.push((b'a' + mv.from.file()) as char);
                } else if !same_rank {
                    s.push((b'1' + mv.from.rank()) as char);
                } else {
                    s.push_str(&mv.from.to_string());
                }
            }

            if mv.is_capture() {
                s.push('x');
            }
            s.push_str(&mv.to.to_string());
        }
        s
    };

    let mut scratch_legal = Vec::new();
    let mut scratch = Vec::new();
    make_move_basic(board, mv);
    let in_check = crate::moves::square_control::in_check(board, board.side_to_move, tables);
    generate_legal(board, tables, &mut scratch_legal, &mut scratch);
    let suffix = if in_check && scratch_legal.is_empty() {
        "#"
    } else if in_check {
        "+"
    } else {
        ""
    };

    format!("{base}{suffix}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParsedToken {
    KingsideCastle,
    QueensideCastle,
    Normal {
        piece: Piece,
        from_file: Option<u8>,
        from_rank: Option<u8>,
        to: Square,
        promotion: Option<Piece>,
    },
}

impl ParsedToken {
    fn matches(&self, board: &Board, mv: Move) -> bool {
        match *self {
            ParsedToken::KingsideCastle => mv.is_kingside_castle(),
            ParsedToken::QueensideCastle => mv.is_queenside_castle(),
            ParsedToken::Normal {
                piece,
                from_file,
                from_rank,
                to,
                promotion,
            } => {
                if mv.to != to {
                    return false;
                }
                if board.piece_type_at(mv.from) != Some(piece) {
                    return false;
                }
                if let Some(file) = from_file {
                    if mv.from.file() != file {
                        return false;
                    }
                }
                if let Some(rank) = from_rank {
                    if mv.from.rank() != rank {
                        return false;
                    }
                }
                mv.promotion == promotion
            }
        }
    }
}

/// Parses a relaxed algebraic move token: disambiguators, captures,
/// castling glyphs (`O-O`/`0-0`), a promotion suffix, and trailing
/// check/mate markers are all accepted; check/mate markers are ignored.
fn parse_move_token(token: &str) -> Option<ParsedToken> {
    let trimmed = token.trim().trim_end_matches(['+', '#']);
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed.replace('0', "O");
    if normalized == "O-O" {
        return Some(ParsedToken::KingsideCastle);
    }
    if normalized == "O-O-O" {
        return Some(ParsedToken::QueensideCastle);
    }

    let (body, promotion) = match trimmed.split_once('=') {
        Some((b, p)) => (b, Some(promo_piece_from_char(p.chars().next()?)?)),
        None => (trimmed, None),
    };

    let mut chars: Vec<char> = body.chars().collect();
    if chars.is_empty() {
        return None;
    }

    let piece = if chars[0].is_ascii_uppercase() && chars[0] != 'O' {
        let p = match chars[0] {
            'N' => Piece::Knight,
            'B' => Piece::Bishop,
            'R' => Piece::Rook,
            'Q' => Piece::Queen,
            'K' => Piece::King,
            _ => return None,
        };
        chars.remove(0);
        p
    } else {
        Piece::Pawn
    };

    chars.retain(|&c| c != 'x');

    if chars.len() < 2 {
        return None;
    }

    let dest_str: String = chars[chars.len() - 2..].iter().collect();
    let to: Square = dest_str.parse().ok()?;

    let disambig = &chars[..chars.len() - 2];
    let (from_file, from_rank) = match disambig.len() {
        0 => (None, None),
        1 => {
            let c = disambig[0];
            if c.is_ascii_digit() {
                (None, Some(c as u8 - b'1'))
            } else if ('a'..='h').contains(&c) {
                (Some(c as u8 - b'a'), None)
            } else {
                return None;
            }
        }
        2 => {
            let file = disambig[0];
            let rank = disambig[1];
            if !('a'..='h').contains(&file) || !rank.is_ascii_digit() {
                return None;
            }
            (Some(file as u8 - b'a'), Some(rank as u8 - b'1'))
        }
        _ => return None,
    };

    Some(ParsedToken::Normal {
        piece,
        from_file,
        from_rank,
        to,
        promotion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::load_magic_tables;

    fn tables() -> MagicTables {
        load_magic_tables()
    }

    #[test]
    fn applies_a_simple_opening() {
        let tables = tables();
        let mut game = Game::new();
        game.apply_move_token("e4", &tables).unwrap();
        game.apply_move_token("e5", &tables).unwrap();
        game.apply_move_token("Nf3", &tables).unwrap();
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(game.moves_played().len(), 3);
    }

    #[test]
    fn rejects_illegal_token() {
        let tables = tables();
        let mut game = Game::new();
        let err = game.apply_move_token("e5", &tables).unwrap_err();
        assert!(matches!(err, MoveError::NotLegal { .. }));
    }

    #[test]
    fn rejects_garbage_token() {
        let tables = tables();
        let mut game = Game::new();
        let err = game.apply_move_token("zz9", &tables).unwrap_err();
        assert!(matches!(err, MoveError::UnparsableToken { .. }));
    }

    #[test]
    fn detects_scholars_mate() {
        let tables = tables();
        let mut game = Game::new();
        for mv in ["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6", "Qxf7#"] {
            game.apply_move_token(mv, &tables).unwrap();
        }
        assert_eq!(game.outcome(), Outcome::WhiteWins);
        assert!(game.is_terminated());
    }

    #[test]
    fn castling_token_applies() {
        let tables = tables();
        let mut game = Game::new();
        for mv in ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"] {
            game.apply_move_token(mv, &tables).unwrap();
        }
        game.apply_move_token("O-O", &tables).unwrap();
        assert!(game.moves_played().last().unwrap().token.starts_with("O-O"));
    }
}
