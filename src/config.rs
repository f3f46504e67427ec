//! Search configuration.
//!
//! One search core is driven by independent switches; the classic search
//! variants (plain negamax, alpha-beta, ordered, quiescent) are presets.

use std::time::Duration;

use clap::ValueEnum;

use crate::error::SearchError;

/// Deepest search the packed cache can record (6-bit depth field).
pub const MAX_DEPTH: u8 = 63;

/// Which transposition cache backs the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheStrategy {
    /// Nested hash maps; exact, unbounded.
    Chained,
    /// Fixed array of 16-byte slots sized from `cache_bytes`.
    Packed,
}

/// Where the reported principal variation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PvSource {
    Table,
    Cache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Alpha-beta bounds; when off every child gets the full window.
    pub pruning: bool,
    /// Master switch for the four ordering heuristics below.
    pub move_ordering: bool,
    pub hash_move: bool,
    pub pv_move: bool,
    pub killer_moves: bool,
    pub history_heuristic: bool,
    /// Capture-only extension at the horizon.
    pub quiescence: bool,
    /// Return Cut entries from the cache before generating moves.
    pub hash_cutoffs: bool,
    pub cache_strategy: CacheStrategy,
    /// Byte budget for the packed cache, nominal capacity for the chained one.
    pub cache_bytes: usize,
    pub pv_source: PvSource,
    /// Longest wall-clock gap between time source queries.
    pub check_interval: Duration,
    /// Nodes between time source queries.
    pub check_nodes: u64,
}

impl SearchConfig {
    /// Plain full-width negamax: every switch off.
    pub fn negamax() -> Self {
        SearchConfig {
            pruning: false,
            move_ordering: false,
            hash_move: false,
            pv_move: false,
            killer_moves: false,
            history_heuristic: false,
            quiescence: false,
            hash_cutoffs: false,
            cache_strategy: CacheStrategy::Chained,
            cache_bytes: 1 << 20,
            pv_source: PvSource::Table,
            check_interval: Duration::from_millis(10),
            check_nodes: 4096,
        }
    }

    pub fn alpha_beta() -> Self {
        SearchConfig { pruning: true, ..Self::negamax() }
    }

    /// Alpha-beta with every ordering heuristic.
    pub fn ordered() -> Self {
        SearchConfig {
            move_ordering: true,
            hash_move: true,
            pv_move: true,
            killer_moves: true,
            history_heuristic: true,
            ..Self::alpha_beta()
        }
    }

    pub fn quiescent() -> Self {
        SearchConfig { quiescence: true, ..Self::ordered() }
    }

    /// Everything on, backed by a 16 MiB packed cache.
    pub fn full() -> Self {
        SearchConfig {
            hash_cutoffs: true,
            cache_strategy: CacheStrategy::Packed,
            cache_bytes: 16 << 20,
            ..Self::quiescent()
        }
    }

    pub fn with_cache(self, cache_strategy: CacheStrategy, cache_bytes: usize) -> Self {
        SearchConfig { cache_strategy, cache_bytes, ..self }
    }

    /// Whether any ordering heuristic is active.
    pub fn orders_moves(&self) -> bool {
        self.move_ordering && (self.hash_move || self.pv_move || self.killer_moves || self.history_heuristic)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig::full()
    }
}

/// Per-call search limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_depth: u8,
}

impl SearchLimits {
    pub fn depth(max_depth: u8) -> Self {
        SearchLimits { max_depth }
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH {
            return Err(SearchError::InvalidDepth { depth: self.max_depth, max: MAX_DEPTH });
        }
        Ok(())
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits { max_depth: MAX_DEPTH }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_build_on_each_other() {
        let negamax = SearchConfig::negamax();
        assert!(!negamax.pruning && !negamax.orders_moves() && !negamax.quiescence);

        let ordered = SearchConfig::ordered();
        assert!(ordered.pruning && ordered.orders_moves() && !ordered.quiescence);

        let full = SearchConfig::default();
        assert!(full.quiescence && full.hash_cutoffs);
        assert_eq!(full.cache_strategy, CacheStrategy::Packed);
        assert_eq!(full.cache_bytes % 16, 0);
    }

    #[test]
    fn ordering_master_switch_gates_heuristics() {
        let config = SearchConfig { move_ordering: false, ..SearchConfig::ordered() };
        assert!(!config.orders_moves());
    }

    #[test]
    fn depth_limits_are_validated() {
        assert!(SearchLimits::depth(1).validate().is_ok());
        assert!(SearchLimits::depth(MAX_DEPTH).validate().is_ok());
        assert_eq!(
            SearchLimits::depth(0).validate(),
            Err(SearchError::InvalidDepth { depth: 0, max: MAX_DEPTH })
        );
        assert!(SearchLimits::depth(64).validate().is_err());
    }
}
