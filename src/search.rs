//! Iterative-deepening negamax with alpha-beta pruning, quiescence, move
//! ordering and a transposition cache.
//!
//! Every variant is the same core under a different `SearchConfig`. With
//! pruning off each node searches its children with the full window, so the
//! all-off configuration is plain full-width negamax.

use std::time::Instant;

use log::{debug, trace, warn};

use crate::chess_move::Move;
use crate::config::{PvSource, SearchConfig, SearchLimits};
use crate::engine::{EngineCore, MoveGuard, Reporter, SearchReport};
use crate::error::SearchError;
use crate::moveorder::{order_captures, order_moves, OrderingHints};
use crate::search_state::SearchState;
use crate::time_guard::{Sampler, TimeGuard, TimeSource, TimedOut};
use crate::transposition::{Entry, NodeType, TranspositionCache};
use crate::zobrist::HashKey;

/// Base score of a checkmate; the remaining depth is added so shorter mates
/// score higher.
pub const MATE: i32 = 100_000;
/// Bound wider than any reachable score.
pub const INFINITY: i32 = 1_000_000;
pub const DRAW: i32 = 0;

/// Outcome of one completed iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Move,
    /// Centipawns from the side to move's point of view
    pub score: i32,
    pub principal_variation: Vec<Move>,
    /// Root moves in search order with their returned scores. With pruning
    /// on, scores of moves that failed low are upper bounds.
    pub move_scores: Vec<(Move, i32)>,
    /// Depth of the iteration; 0 for a forced move or the timeout fallback
    pub depth: u8,
    /// Nodes visited by this call up to the end of the iteration
    pub nodes: u64,
}

struct Searcher<'a, K: HashKey> {
    config: SearchConfig,
    state: &'a mut SearchState,
    cache: &'a mut dyn TranspositionCache<K>,
    guard: TimeGuard<'a>,
    nodes: u64,
}

/// Runs depths 1..=max_depth and returns the last completed iteration.
pub(crate) fn iterative_deepening<'a, E: EngineCore>(
    core: &mut E,
    state: &'a mut SearchState,
    cache: &'a mut dyn TranspositionCache<E::Key>,
    source: &'a mut dyn TimeSource,
    moves_to_search: Option<&[Move]>,
    limits: SearchLimits,
    mut reporter: Option<&mut Reporter>,
) -> Result<SearchResult, SearchError> {
    let start = Instant::now();

    let legal = core.generate_moves();
    if legal.is_empty() {
        return Err(SearchError::NoLegalMoves);
    }
    let root_moves: Vec<Move> = match moves_to_search {
        Some(subset) => {
            let chosen: Vec<Move> =
                legal.into_iter().filter(|mv| subset.iter().any(|wanted| wanted.matches(mv))).collect();
            if chosen.is_empty() {
                return Err(SearchError::NoSearchableMoves { requested: subset.len() });
            }
            chosen
        }
        None => legal,
    };

    if let &[only] = root_moves.as_slice() {
        let score = -MoveGuard::new(&mut *core, only).evaluate_normalized();
        debug!("single root move {}, no search needed", only);
        return Ok(SearchResult {
            best_move: only,
            score,
            principal_variation: vec![only],
            move_scores: vec![(only, score)],
            depth: 0,
            nodes: 0,
        });
    }

    let config = state.config.clone();
    let sampler = Sampler::new(config.check_interval, config.check_nodes);
    let mut searcher = Searcher { config, state, cache, guard: TimeGuard::new(source, sampler), nodes: 0 };

    let mut completed: Option<SearchResult> = None;
    for depth in 1..=limits.max_depth {
        searcher.state.pv.start_iteration();
        match searcher.search_root(core, &root_moves, depth) {
            Ok(result) => {
                let elapsed = start.elapsed();
                let report = SearchReport {
                    depth,
                    score: result.score,
                    score_text: SearchReport::format_score(result.score, depth),
                    elapsed,
                    nodes: result.nodes,
                    nodes_per_second: result.nodes * 1_000_000 / (elapsed.as_micros() as u64).max(1),
                    principal_variation: result.principal_variation.clone(),
                    diagnostics: Some(searcher.cache.stats().to_string()),
                };
                debug!("{}", report);
                if let Some(report_fn) = reporter.as_deref_mut() {
                    report_fn(&report);
                }

                let mate_found = result.score >= MATE;
                completed = Some(result);
                if mate_found {
                    debug!("forced mate found at depth {}, stopping", depth);
                    break;
                }
            }
            Err(TimedOut) => {
                trace!("depth {} timed out after {} nodes, discarding it", depth, searcher.nodes);
                break;
            }
        }
    }

    match completed {
        Some(result) => Ok(result),
        None => Ok(searcher.fallback(core, &root_moves)),
    }
}

impl<'a, K: HashKey> Searcher<'a, K> {
    /// Counts the node and consults the time guard.
    fn visit(&mut self) -> Result<(), TimedOut> {
        self.nodes += 1;
        self.guard.check()
    }

    fn probes_cache(&self) -> bool {
        self.config.hash_cutoffs || (self.config.orders_moves() && self.config.hash_move)
    }

    fn order(&self, moves: &mut [Move], hash_move: Option<Move>, ply: usize, depth: u8) {
        if !self.config.orders_moves() {
            return;
        }
        let hints = OrderingHints {
            hash_move: hash_move.filter(|_| self.config.hash_move),
            pv_move: if self.config.pv_move { self.state.pv.pv_move(ply) } else { None },
            killer: if self.config.killer_moves { self.state.killers.get(depth) } else { None },
        };
        let history = self.config.history_heuristic.then_some(&self.state.history);
        order_moves(moves, &hints, history);
    }

    fn search_root<E: EngineCore<Key = K>>(
        &mut self,
        core: &mut E,
        root_moves: &[Move],
        depth: u8,
    ) -> Result<SearchResult, TimedOut> {
        let key = core.fingerprint();
        let hash_move = if self.probes_cache() { self.cache.get(key).and_then(|entry| entry.mv) } else { None };
        let mut moves = root_moves.to_vec();
        self.order(&mut moves, hash_move, 0, depth);

        self.state.pv.clear_ply(0);
        let mut alpha = -INFINITY;
        let mut best_move = moves[0];
        let mut best_score = -INFINITY - 1;
        let mut move_scores = Vec::with_capacity(moves.len());

        for mv in moves {
            let child_beta = if self.config.pruning { -alpha } else { INFINITY };
            let score = {
                let mut child = MoveGuard::new(&mut *core, mv);
                -self.negamax(&mut *child, -INFINITY, child_beta, depth - 1, 1)?
            };
            move_scores.push((mv, score));
            if score > best_score {
                best_score = score;
                best_move = mv;
                self.state.pv.update(0, mv);
            }
            alpha = alpha.max(score);
        }

        self.cache.set(key, Entry { node_type: NodeType::Pv, depth, score: best_score, mv: Some(best_move) });

        let principal_variation = match self.config.pv_source {
            PvSource::Table => self.state.pv.root_line().to_vec(),
            PvSource::Cache => self.pv_from_cache(core, depth as usize),
        };

        Ok(SearchResult {
            best_move,
            score: best_score,
            principal_variation,
            move_scores,
            depth,
            nodes: self.nodes,
        })
    }

    fn negamax<E: EngineCore<Key = K>>(
        &mut self,
        core: &mut E,
        alpha: i32,
        beta: i32,
        depth: u8,
        ply: usize,
    ) -> Result<i32, TimedOut> {
        self.visit()?;
        self.state.pv.clear_ply(ply);

        let (mut alpha, beta) = if self.config.pruning { (alpha, beta) } else { (-INFINITY, INFINITY) };

        let key = core.fingerprint();
        let cached = if self.probes_cache() { self.cache.get(key) } else { None };
        if let Some(entry) = cached {
            if self.config.hash_cutoffs
                && entry.node_type == NodeType::Cut
                && entry.depth >= depth
                && entry.score >= beta
            {
                return Ok(entry.score);
            }
        }

        if depth == 0 {
            return if self.config.quiescence {
                self.quiescence_node(core, alpha, beta)
            } else {
                Ok(core.evaluate_normalized())
            };
        }

        let mut moves = core.generate_moves();
        if moves.is_empty() {
            return Ok(if core.checks(core.side_to_move()).is_empty() {
                DRAW
            } else {
                -(MATE + depth as i32)
            });
        }
        self.order(&mut moves, cached.and_then(|entry| entry.mv), ply, depth);

        let mut best_move = None;
        for mv in moves {
            let score = {
                let mut child = MoveGuard::new(&mut *core, mv);
                -self.negamax(&mut *child, -beta, -alpha, depth - 1, ply + 1)?
            };

            if score >= beta {
                if mv.is_quiet() {
                    self.state.killers.record(depth, mv);
                }
                self.state.history.bump(mv, depth);
                self.cache.set(key, Entry { node_type: NodeType::Cut, depth, score: beta, mv: Some(mv) });
                return Ok(beta);
            }
            if score > alpha {
                alpha = score;
                best_move = Some(mv);
                self.state.pv.update(ply, mv);
            }
        }

        let node_type = if best_move.is_some() { NodeType::Pv } else { NodeType::All };
        self.cache.set(key, Entry { node_type, depth, score: alpha, mv: best_move });
        Ok(alpha)
    }

    fn quiescence<E: EngineCore<Key = K>>(&mut self, core: &mut E, alpha: i32, beta: i32) -> Result<i32, TimedOut> {
        self.visit()?;
        self.quiescence_node(core, alpha, beta)
    }

    /// Captures-only search below the horizon. The stand-pat score is a
    /// lower bound: the side to move may decline every capture.
    fn quiescence_node<E: EngineCore<Key = K>>(
        &mut self,
        core: &mut E,
        alpha: i32,
        beta: i32,
    ) -> Result<i32, TimedOut> {
        let stand_pat = core.evaluate_normalized();
        if stand_pat >= beta {
            return Ok(beta);
        }
        let mut alpha = alpha.max(stand_pat);

        let mut captures = core.generate_attacking_moves();
        order_captures(&mut captures, core.position());
        for mv in captures {
            let (child_alpha, child_beta) = if self.config.pruning { (-beta, -alpha) } else { (-INFINITY, INFINITY) };
            let score = {
                let mut child = MoveGuard::new(&mut *core, mv);
                -self.quiescence(&mut *child, child_alpha, child_beta)?
            };
            if score >= beta {
                return Ok(beta);
            }
            alpha = alpha.max(score);
        }
        Ok(alpha)
    }

    /// Follows PV entries from the current position while their moves stay
    /// legal. Every move is undone before returning.
    fn pv_from_cache<E: EngineCore<Key = K>>(&mut self, core: &mut E, max_len: usize) -> Vec<Move> {
        if max_len == 0 {
            return Vec::new();
        }
        let next = match self.cache.get(core.fingerprint()) {
            Some(Entry { node_type: NodeType::Pv, mv: Some(mv), .. }) => mv,
            _ => return Vec::new(),
        };
        if !core.generate_moves().contains(&next) {
            return Vec::new();
        }
        let mut child = MoveGuard::new(&mut *core, next);
        let mut line = vec![next];
        line.extend(self.pv_from_cache(&mut *child, max_len - 1));
        line
    }

    /// Used when not even depth 1 completed: the first root move in search
    /// order, scored statically.
    fn fallback<E: EngineCore<Key = K>>(&mut self, core: &mut E, root_moves: &[Move]) -> SearchResult {
        let mut moves = root_moves.to_vec();
        self.order(&mut moves, None, 0, 1);
        let mv = moves[0];
        let score = -MoveGuard::new(&mut *core, mv).evaluate_normalized();
        warn!("no iteration completed before the deadline, falling back to {}", mv);
        SearchResult {
            best_move: mv,
            score,
            principal_variation: vec![mv],
            move_scores: vec![(mv, score)],
            depth: 0,
            nodes: self.nodes,
        }
    }
}
