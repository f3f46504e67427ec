//! Error types for the search engine
//!
//! Fatal configuration and input errors surfaced to the caller. The
//! recoverable search timeout is not an error here; it lives in
//! `time_guard` and never escapes the iterative-deepening driver.

use thiserror::Error;

/// Errors that end a `next_move` call or engine construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The packed cache budget must split evenly into fixed-size entries
    #[error("cache budget of {bytes} bytes is not a positive multiple of the {entry_size}-byte entry size")]
    InvalidCacheSize { bytes: usize, entry_size: usize },

    /// The root position has no legal moves (checkmate or stalemate)
    #[error("no legal moves in the root position")]
    NoLegalMoves,

    /// None of the caller-supplied root moves is legal
    #[error("none of the {requested} requested root moves is legal")]
    NoSearchableMoves { requested: usize },

    /// Depth limit outside what the packed entry can store
    #[error("search depth {depth} is outside 1..={max}")]
    InvalidDepth { depth: u8, max: u8 },
}

/// Errors raised while parsing Forsyth-Edwards Notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 4 to 6 FEN fields, found {0}")]
    FieldCount(usize),

    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),

    #[error("rank {rank} does not describe exactly 8 files")]
    RankWidth { rank: usize },

    #[error("invalid piece character '{0}'")]
    Piece(char),

    #[error("invalid active color '{0}'")]
    ActiveColor(String),

    #[error("invalid character in castling rights: '{0}'")]
    Castling(char),

    #[error("invalid en passant square: {0}")]
    EnPassant(String),

    #[error("invalid move counter '{0}'")]
    Counter(String),

    #[error("each side needs exactly one king")]
    Kings,
}
