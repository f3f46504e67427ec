//! Auxiliary tables owned by one engine and shared across the iterations of
//! a `next_move` call.

use crate::chess_move::Move;
use crate::config::{SearchConfig, MAX_DEPTH};

const SLOTS: usize = MAX_DEPTH as usize + 1;

/// Most recent quiet move that caused a beta cutoff, per remaining depth.
#[derive(Debug, Clone)]
pub struct KillerTable {
    slots: [Option<Move>; SLOTS],
}

impl Default for KillerTable {
    fn default() -> Self {
        KillerTable { slots: [None; SLOTS] }
    }
}

impl KillerTable {
    pub fn record(&mut self, depth: u8, mv: Move) {
        debug_assert!(mv.is_quiet(), "only quiet moves become killers");
        self.slots[depth as usize] = Some(mv);
    }

    pub fn get(&self, depth: u8) -> Option<Move> {
        self.slots[depth as usize]
    }

    pub fn clear(&mut self) {
        self.slots = [None; SLOTS];
    }
}

/// Cutoff counters indexed by [from][to].
#[derive(Debug, Clone)]
pub struct HistoryTable {
    counters: Vec<u32>,
}

impl Default for HistoryTable {
    fn default() -> Self {
        HistoryTable { counters: vec![0; 64 * 64] }
    }
}

impl HistoryTable {
    fn index(mv: Move) -> usize {
        mv.from() as usize * 64 + mv.to() as usize
    }

    /// Credits a cutoff found with `depth` plies remaining.
    pub fn bump(&mut self, mv: Move, depth: u8) {
        let counter = &mut self.counters[Self::index(mv)];
        *counter = counter.saturating_add(depth as u32 * depth as u32);
    }

    pub fn score(&self, mv: Move) -> u32 {
        self.counters[Self::index(mv)]
    }

    pub fn clear(&mut self) {
        self.counters.fill(0);
    }
}

/// Triangular principal-variation table.
///
/// `lines[ply]` holds the best continuation found from `ply` in the current
/// iteration; `previous` is the root line of the last completed iteration,
/// consulted for ordering.
#[derive(Debug, Clone)]
pub struct PvTable {
    lines: Vec<Vec<Move>>,
    previous: Vec<Move>,
}

impl Default for PvTable {
    fn default() -> Self {
        PvTable { lines: vec![Vec::new(); SLOTS + 1], previous: Vec::new() }
    }
}

impl PvTable {
    /// Keeps the last root line for ordering and empties the table.
    pub fn start_iteration(&mut self) {
        self.previous = self.lines[0].clone();
        for line in self.lines.iter_mut() {
            line.clear();
        }
    }

    pub fn reset(&mut self) {
        self.previous.clear();
        for line in self.lines.iter_mut() {
            line.clear();
        }
    }

    pub fn clear_ply(&mut self, ply: usize) {
        if let Some(line) = self.lines.get_mut(ply) {
            line.clear();
        }
    }

    /// `mv` followed by the child's line becomes the line at `ply`.
    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply >= self.lines.len() {
            return;
        }
        let mut line = std::mem::take(&mut self.lines[ply]);
        line.clear();
        line.push(mv);
        if let Some(child) = self.lines.get(ply + 1) {
            line.extend_from_slice(child);
        }
        self.lines[ply] = line;
    }

    pub fn root_line(&self) -> &[Move] {
        &self.lines[0]
    }

    /// Move the previous iteration played at `ply`.
    pub fn pv_move(&self, ply: usize) -> Option<Move> {
        self.previous.get(ply).copied()
    }
}

/// Everything the search mutates besides the cache.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub config: SearchConfig,
    pub killers: KillerTable,
    pub history: HistoryTable,
    pub pv: PvTable,
}

impl SearchState {
    pub fn new(config: SearchConfig) -> Self {
        SearchState { config, ..Default::default() }
    }

    /// Called at the start of every `next_move`.
    pub fn reset(&mut self) {
        self.killers.clear();
        self.history.clear();
        self.pv.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_grows_by_depth_squared() {
        let mut history = HistoryTable::default();
        let mv = Move::new(12, 28);
        history.bump(mv, 3);
        history.bump(mv, 2);
        assert_eq!(history.score(mv), 13);
        assert_eq!(history.score(Move::new(11, 27)), 0);
        history.clear();
        assert_eq!(history.score(mv), 0);
    }

    #[test]
    fn killers_are_per_depth() {
        let mut killers = KillerTable::default();
        killers.record(4, Move::new(6, 21));
        killers.record(4, Move::new(1, 18));
        assert_eq!(killers.get(4), Some(Move::new(1, 18)));
        assert_eq!(killers.get(3), None);
    }

    #[test]
    fn pv_lines_chain_child_continuations() {
        let mut pv = PvTable::default();
        let (a, b, c) = (Move::new(12, 28), Move::new(52, 36), Move::new(6, 21));
        pv.update(2, c);
        pv.update(1, b);
        pv.update(0, a);
        assert_eq!(pv.root_line(), &[a, b, c]);

        pv.start_iteration();
        assert!(pv.root_line().is_empty());
        assert_eq!(pv.pv_move(1), Some(b));
        assert_eq!(pv.pv_move(3), None);

        pv.reset();
        assert_eq!(pv.pv_move(0), None);
    }

    #[test]
    fn reset_clears_cross_call_state() {
        let mut state = SearchState::new(SearchConfig::ordered());
        state.killers.record(2, Move::new(6, 21));
        state.history.bump(Move::new(6, 21), 2);
        state.reset();
        assert_eq!(state.killers.get(2), None);
        assert_eq!(state.history.score(Move::new(6, 21)), 0);
    }
}
