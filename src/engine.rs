//! The engine facade: the seam between search and board, and the caller's
//! `next_move` entry point.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use log::info;

use crate::chess_move::Move;
use crate::config::{CacheStrategy, SearchConfig, SearchLimits};
use crate::error::SearchError;
use crate::position::{Color, Position};
use crate::search::{self, SearchResult, MATE};
use crate::search_state::SearchState;
use crate::time_guard::{Countdown, TimeSource, Unbounded};
use crate::transposition::{CacheStats, ChainedCache, PackedCache, TranspositionCache};
use crate::utils::Square;
use crate::zobrist::HashKey;

/// Board services the search consumes. The implementor owns the position and
/// its fingerprint and keeps the two in sync on every apply and undo.
pub trait EngineCore {
    type Key: HashKey;

    /// Legal moves for the side to move, in a deterministic order.
    fn generate_moves(&mut self) -> Vec<Move>;

    /// Legal captures for the side to move.
    fn generate_attacking_moves(&mut self) -> Vec<Move>;

    /// Plays `mv`. Pushes one entry onto the undo stack.
    fn apply_move(&mut self, mv: Move);

    /// Reverts the most recent `apply_move`.
    fn undo_last_move(&mut self);

    /// Static score in centipawns from the side to move's point of view.
    fn evaluate_normalized(&self) -> i32;

    /// Squares of pieces attacking `side`'s king.
    fn checks(&self, side: Color) -> Vec<Square>;

    fn side_to_move(&self) -> Color;

    fn fingerprint(&self) -> Self::Key;

    fn position(&self) -> &Position;

    /// Replaces the position and clears the undo stack.
    fn set_position(&mut self, position: Position);
}

/// A move applied for the lifetime of the guard. Dropping it undoes the
/// move, so every exit path (including `?` and panics) restores the board.
pub struct MoveGuard<'a, E: EngineCore + ?Sized> {
    core: &'a mut E,
}

impl<'a, E: EngineCore + ?Sized> MoveGuard<'a, E> {
    pub fn new(core: &'a mut E, mv: Move) -> Self {
        core.apply_move(mv);
        MoveGuard { core }
    }
}

impl<E: EngineCore + ?Sized> Deref for MoveGuard<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.core
    }
}

impl<E: EngineCore + ?Sized> DerefMut for MoveGuard<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        self.core
    }
}

impl<E: EngineCore + ?Sized> Drop for MoveGuard<'_, E> {
    fn drop(&mut self) {
        self.core.undo_last_move();
    }
}

/// Progress report for one completed iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub depth: u8,
    pub score: i32,
    /// `mate N`, `mate -N`, or the score in pawns
    pub score_text: String,
    pub elapsed: Duration,
    pub nodes: u64,
    pub nodes_per_second: u64,
    pub principal_variation: Vec<Move>,
    /// Free-form diagnostics, currently cache load and hit rate
    pub diagnostics: Option<String>,
}

impl SearchReport {
    /// Human-readable score: mate distance in moves, else pawns.
    pub fn format_score(score: i32, depth: u8) -> String {
        if score.abs() >= MATE {
            let remaining = score.abs() - MATE;
            let plies = (depth as i32 - remaining).max(1);
            let moves = (plies + 1) / 2;
            if score > 0 {
                format!("mate {}", moves)
            } else {
                format!("mate -{}", moves)
            }
        } else {
            format!("{:.2}", score as f64 / 100.0)
        }
    }
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "depth {} score {} nodes {} nps {} time {}ms pv",
            self.depth,
            self.score_text,
            self.nodes,
            self.nodes_per_second,
            self.elapsed.as_millis()
        )?;
        for mv in &self.principal_variation {
            write!(f, " {}", mv)?;
        }
        if let Some(diagnostics) = &self.diagnostics {
            write!(f, " ({})", diagnostics)?;
        }
        Ok(())
    }
}

pub type Reporter = Box<dyn FnMut(&SearchReport)>;

/// Owns a board, the search tables and the transposition cache. One search
/// runs at a time; concurrent searches need separate engines.
pub struct Engine<E: EngineCore> {
    core: E,
    state: SearchState,
    cache: Box<dyn TranspositionCache<E::Key>>,
    reporter: Option<Reporter>,
}

impl<E: EngineCore> Engine<E> {
    /// Fails when the packed cache budget does not split into whole entries.
    pub fn new(core: E, config: SearchConfig) -> Result<Self, SearchError> {
        let cache: Box<dyn TranspositionCache<E::Key>> = match config.cache_strategy {
            CacheStrategy::Chained => Box::new(ChainedCache::new(config.cache_bytes)),
            CacheStrategy::Packed => Box::new(PackedCache::<E::Key>::new(config.cache_bytes)?),
        };
        Ok(Engine { core, state: SearchState::new(config), cache, reporter: None })
    }

    pub fn core(&self) -> &E {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut E {
        &mut self.core
    }

    pub fn config(&self) -> &SearchConfig {
        &self.state.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Called once per completed iteration.
    pub fn set_reporter<F>(&mut self, reporter: F)
    where
        F: FnMut(&SearchReport) + 'static,
    {
        self.reporter = Some(Box::new(reporter));
    }

    pub fn clear_reporter(&mut self) {
        self.reporter = None;
    }

    /// Searches `position` and returns the best move of the deepest
    /// completed iteration.
    ///
    /// # Arguments
    ///
    /// * `position` - Root position; replaces the core's current one
    /// * `moves_to_search` - Optional root subset; illegal entries are ignored
    /// * `timeout` - Wall-clock budget, or `None` to search to `limits`
    /// * `limits` - Depth limit
    pub fn next_move(
        &mut self,
        position: &Position,
        moves_to_search: Option<&[Move]>,
        timeout: Option<Duration>,
        limits: SearchLimits,
    ) -> Result<SearchResult, SearchError> {
        match timeout {
            Some(budget) => {
                let mut countdown = Countdown::new(budget);
                self.next_move_with_source(position, moves_to_search, &mut countdown, limits)
            }
            None => self.next_move_with_source(position, moves_to_search, &mut Unbounded, limits),
        }
    }

    /// Like `next_move`, but asks `source` whether to stop.
    pub fn next_move_with_source(
        &mut self,
        position: &Position,
        moves_to_search: Option<&[Move]>,
        source: &mut dyn TimeSource,
        limits: SearchLimits,
    ) -> Result<SearchResult, SearchError> {
        limits.validate()?;
        self.core.set_position(position.clone());
        self.state.reset();

        let result = search::iterative_deepening(
            &mut self.core,
            &mut self.state,
            &mut *self.cache,
            source,
            moves_to_search,
            limits,
            self.reporter.as_mut(),
        )?;

        info!(
            "best move {} score {} depth {} nodes {}",
            result.best_move, result.score, result.depth, result.nodes
        );
        Ok(result)
    }
}
