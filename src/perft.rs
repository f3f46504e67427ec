//! Move-path enumeration for validating an engine core's move generator.

use crate::chess_move::Move;
use crate::engine::{EngineCore, MoveGuard};
use crate::movegeneration::CastlingSide;
use crate::position::PieceKind;

/// Leaf counts by move kind, counted on the last ply only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Perft {
    pub nodes: u64,
    pub captures: u64,
    pub en_passants: u64,
    pub castles: u64,
    pub promotions: u64,
}

impl Perft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks every legal line `depth` plies deep from the core's position
    /// and adds the leaves to the counters.
    pub fn run<E: EngineCore>(&mut self, core: &mut E, depth: u32) -> u64 {
        if depth == 0 {
            self.nodes += 1;
            return 1;
        }

        let mut leaves = 0;
        for mv in core.generate_moves() {
            if depth == 1 {
                self.classify(core, mv);
                self.nodes += 1;
                leaves += 1;
                continue;
            }
            let mut child = MoveGuard::new(&mut *core, mv);
            leaves += self.run(&mut *child, depth - 1);
        }
        leaves
    }

    fn classify<E: EngineCore>(&mut self, core: &E, mv: Move) {
        let position = core.position();
        let moving = position.piece_at(mv.from()).map(|piece| piece.kind);
        if mv.is_attack() {
            self.captures += 1;
            if moving == Some(PieceKind::Pawn) && position.piece_at(mv.to()).is_none() {
                self.en_passants += 1;
            }
        }
        if moving == Some(PieceKind::King) && CastlingSide::of_king_step(mv.from(), mv.to()).is_some() {
            self.castles += 1;
        }
        if mv.promotion().is_some() {
            self.promotions += 1;
        }
    }
}

/// Number of legal move paths of length `depth`.
pub fn perft<E: EngineCore>(core: &mut E, depth: u32) -> u64 {
    Perft::new().run(core, depth)
}
