//! Typed error taxonomy. Every fallible boundary in this crate returns one
//! of these instead of a bare `String`, so callers can match on *what*
//! went wrong rather than parsing a message.

use thiserror::Error;

/// Structural problems with a `Board`'s piece placement.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BoardError {
    #[error("bitboard `{0}` overlaps with another piece")]
    OverlappingPieces(&'static str),

    #[error("missing {0:?} king")]
    MissingKing(crate::board::Color),

    #[error("{0:?} has {1} kings, expected exactly one")]
    MultipleKings(crate::board::Color, u32),
}

/// FEN parsing failures, one per malformed field.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum FenError {
    #[error("FEN must have 6 space-separated fields, found {0}")]
    WrongFieldCount(usize),

    #[error("invalid piece placement field: {0}")]
    InvalidPlacement(String),

    #[error("rank {0} does not sum to 8 files")]
    RankLengthMismatch(u8),

    #[error("invalid side-to-move field: `{0}`")]
    InvalidSideToMove(String),

    #[error("invalid castling rights field: `{0}`")]
    InvalidCastlingRights(String),

    #[error("invalid en passant field: `{0}`")]
    InvalidEnPassant(String),

    #[error("invalid halfmove clock: `{0}`")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: `{0}`")]
    InvalidFullmoveNumber(String),

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// The pipeline stage a move-application error happened in. A token can
/// fail to parse, parse but fail to resolve against any legal move, or
/// resolve and then fail execution invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    Parse,
    Resolve,
    Execute,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MoveError {
    #[error("[{phase:?}] could not parse move token `{token}`")]
    UnparsableToken { token: String, phase: MovePhase },

    #[error("[{phase:?}] `{token}` does not match any legal move in this position")]
    NotLegal { token: String, phase: MovePhase },

    #[error("[{phase:?}] move token `{token}` is ambiguous between multiple legal moves")]
    Ambiguous { token: String, phase: MovePhase },

    #[error("[{phase:?}] game is already terminated, no moves are legal")]
    GameOver { phase: MovePhase },
}

/// Failures from the search layer (MCTS / forced-mate detector).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SearchError {
    #[error("cannot search from a terminal position")]
    TerminalPosition,

    #[error("search budget (`{0}` iterations) must be greater than zero")]
    EmptyBudget(u32),

    #[error("max depth (`{0}`) must be greater than zero")]
    InvalidDepth(u32),
}
