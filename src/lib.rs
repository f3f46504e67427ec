//! A configurable chess game-tree search.
//!
//! The search core (`search`) runs iterative-deepening negamax over any board
//! implementing `EngineCore`; `SearchConfig` switches pruning, move ordering,
//! quiescence and transposition-cache behaviour on and off. `Game` is the
//! bundled board implementation.

pub mod chess_move;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod movegen_tables;
pub mod movegeneration;
pub mod moveorder;
pub mod perft;
pub mod position;
pub mod search;
pub mod search_state;
pub mod time_guard;
pub mod transposition;
pub mod utils;
pub mod zobrist;

pub use chess_move::Move;
pub use config::{CacheStrategy, PvSource, SearchConfig, SearchLimits, MAX_DEPTH};
pub use engine::{Engine, EngineCore, MoveGuard, Reporter, SearchReport};
pub use error::{FenError, SearchError};
pub use evaluation::Evaluator;
pub use game::Game;
pub use perft::{perft, Perft};
pub use position::{Color, Piece, PieceKind, Position, START_FEN};
pub use search::{SearchResult, DRAW, INFINITY, MATE};
pub use time_guard::{Countdown, StopFlag, TimeSource, TimedOut, Unbounded};
pub use transposition::{CacheStats, ChainedCache, Entry, NodeType, PackedCache, TranspositionCache};
pub use zobrist::{HashKey, KeyPair, Zobrist, ZobristKeys};
