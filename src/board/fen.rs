//! FEN (Forsyth-Edwards Notation) parsing and emission.

use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{Board, Color, Piece};
use crate::error::FenError;
use crate::square::Square;

impl Board {
    /// Parses `s` as a FEN string and overwrites `self` with the resulting
    /// position. Leaves `self` untouched on error.
    pub fn set_fen(&mut self, s: &str) -> Result<(), FenError> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::WrongFieldCount(fields.len()));
        }

        let mut board = Board::new_empty();
        parse_placement(&mut board, fields[0])?;
        board.side_to_move = parse_side_to_move(fields[1])?;
        board.castling_rights = parse_castling_rights(fields[2])?;
        board.en_passant = parse_en_passant(fields[3])?;
        board.halfmove_clock = fields[4]
            .parse()
            .map_err(|_| FenError::InvalidHalfmoveClock(fields[4].to_string()))?;
        board.fullmove_number = fields[5]
            .parse()
            .map_err(|_| FenError::InvalidFullmoveNumber(fields[5].to_string()))?;

        board.validate()?;
        board.refresh_zobrist();
        board.history.clear();

        *self = board;
        Ok(())
    }

    /// Emits the current position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(64);

        for rank in (0..8).rev() {
            let mut empty_run = 0u8;
            for file in 0..8 {
                let sq = Square::from_rank_file(rank, file);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            out.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        out.push(PC_TO_CHAR[pc_index(piece, color)]);
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                out.push((b'0' + empty_run) as char);
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        let rights = castling_rights_string(self.castling_rights);
        out.push_str(&rights);

        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }

        out.push(' ');
        out.push_str(&self.halfmove_clock.to_string());
        out.push(' ');
        out.push_str(&self.fullmove_number.to_string());

        out
    }
}

#[inline]
fn pc_index(piece: Piece, color: Color) -> usize {
    (color as usize) * 6 + (piece as usize)
}

fn parse_placement(board: &mut Board, field: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidPlacement(field.to_string()));
    }

    for (rank_from_top, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_from_top as u8;
        let mut file: u8 = 0;
        for ch in rank_str.chars() {
            if let Some(digit) = ch.to_digit(10) {
                file += digit as u8;
            } else {
                let (piece, color) = CHAR_TO_PC[ch as usize]
                    .ok_or_else(|| FenError::InvalidPlacement(field.to_string()))?;
                if file >= 8 {
                    return Err(FenError::RankLengthMismatch(rank));
                }
                let sq = Square::from_rank_file(rank, file);
                let bb = board.bb(color, piece) | (1u64 << sq.index());
                board.set_bb(color, piece, bb);
                file += 1;
            }
        }
        if file != 8 {
            return Err(FenError::RankLengthMismatch(rank));
        }
    }
    Ok(())
}

fn parse_side_to_move(field: &str) -> Result<Color, FenError> {
    match field {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(FenError::InvalidSideToMove(field.to_string())),
    }
}

fn parse_castling_rights(field: &str) -> Result<u8, FenError> {
    use super::castle_bits::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};

    if field == "-" {
        return Ok(0);
    }

    let mut rights = 0u8;
    for ch in field.chars() {
        rights |= match ch {
            'K' => CASTLE_WK,
            'Q' => CASTLE_WQ,
            'k' => CASTLE_BK,
            'q' => CASTLE_BQ,
            _ => return Err(FenError::InvalidCastlingRights(field.to_string())),
        };
    }
    Ok(rights)
}

fn parse_en_passant(field: &str) -> Result<Option<Square>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    field
        .parse::<Square>()
        .map(Some)
        .map_err(|_| FenError::InvalidEnPassant(field.to_string()))
}

fn castling_rights_string(rights: u8) -> String {
    use super::castle_bits::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};

    let mut s = String::new();
    if rights & CASTLE_WK != 0 {
        s.push('K');
    }
    if rights & CASTLE_WQ != 0 {
        s.push('Q');
    }
    if rights & CASTLE_BK != 0 {
        s.push('k');
    }
    if rights & CASTLE_BQ != 0 {
        s.push('q');
    }
    if s.is_empty() {
        s.push('-');
    }
    s
}
