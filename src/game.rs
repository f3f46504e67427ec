//! The reference engine core.
//!
//! `Game` owns a `Position`, keeps its Zobrist fingerprint in step with every
//! placement and removal, and records what each move destroyed so it can be
//! taken back exactly.

use std::sync::Arc;

use crate::chess_move::Move;
use crate::engine::{EngineCore, MoveGuard};
use crate::error::FenError;
use crate::evaluation::Evaluator;
use crate::movegen_tables::MoveGenTables;
use crate::movegeneration::{self, CastlingSide};
use crate::position::{CastlingRights, Color, Piece, PieceKind, Position};
use crate::utils::{index_to_position, Square};
use crate::zobrist::{HashKey, Zobrist, ZobristKeys};

/// State a move overwrites, kept so the move can be reverted.
#[derive(Debug, Clone, Copy)]
struct Undo {
    mv: Move,
    moved: Piece,
    /// Captured piece and the square it stood on (differs from `mv.to()`
    /// for en passant)
    captured: Option<(Square, Piece)>,
    castling_rights: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

pub struct Game<K: HashKey = u64> {
    position: Position,
    tables: &'static MoveGenTables,
    zobrist: Zobrist<K>,
    evaluator: Evaluator,
    history: Vec<Undo>,
}

impl Game<u64> {
    /// The start position with freshly drawn 64-bit keys.
    pub fn new() -> Self {
        Game::with_keys(Position::startpos(), Arc::new(ZobristKeys::random()))
    }
}

impl Default for Game<u64> {
    fn default() -> Self {
        Game::new()
    }
}

impl<K: HashKey> Game<K> {
    /// Reproducible keys, mostly for tests and benchmarks.
    pub fn with_seed(position: Position, seed: u64) -> Self {
        Game::with_keys(position, Arc::new(ZobristKeys::from_seed(seed)))
    }

    pub fn with_keys(position: Position, keys: Arc<ZobristKeys<K>>) -> Self {
        let zobrist = Zobrist::new(keys, &position);
        Game {
            position,
            tables: MoveGenTables::global(),
            zobrist,
            evaluator: Evaluator::default(),
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Game::with_keys(Position::from_fen(fen)?, Arc::new(ZobristKeys::random())))
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn evaluator(&self) -> Evaluator {
        self.evaluator
    }

    /// Moves played since the position was loaded.
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    /// Finds the legal move written as `text` in long algebraic notation.
    pub fn parse_move(&mut self, text: &str) -> Option<Move> {
        let text = text.trim().to_ascii_lowercase();
        self.generate_moves().into_iter().find(|mv| mv.to_string() == text)
    }

    fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.position.remove_piece(square)?;
        self.zobrist.update_square_occupancy(piece.color, piece.kind, square);
        Some(piece)
    }

    fn place(&mut self, square: Square, piece: Piece) {
        self.position.put_piece(square, piece);
        self.zobrist.update_square_occupancy(piece.color, piece.kind, square);
    }

    /// Installs `rights`, toggling only the keys of rights that changed.
    fn set_castling(&mut self, rights: CastlingRights) {
        let changed = self.position.castling_rights ^ rights;
        for right in CastlingRights::EACH {
            if changed.contains(right) {
                self.zobrist.update_castling(right);
            }
        }
        self.position.castling_rights = rights;
    }

    fn flip_turn(&mut self) {
        self.position.active_color = self.position.active_color.opponent();
        self.zobrist.update_turn();
    }

    fn move_rook_for_castling(&mut self, color: Color, side: CastlingSide, undo: bool) {
        let (_, _, rook_from, rook_to) = side.squares(color);
        let (from, to) = if undo { (rook_to, rook_from) } else { (rook_from, rook_to) };
        let rook = self
            .take(from)
            .unwrap_or_else(|| panic!("castling without a rook on {}", index_to_position(from)));
        self.place(to, rook);
    }

    /// Whether `mv` leaves the mover's king safe.
    fn is_legal(&mut self, mv: Move) -> bool {
        let mover = self.position.active_color;
        let after = MoveGuard::new(self, mv);
        match after.position.king_square(mover) {
            Some(king) => !movegeneration::is_square_attacked(&after.position, after.tables, king, mover.opponent()),
            None => true,
        }
    }

    fn legal_only(&mut self, candidates: Vec<Move>) -> Vec<Move> {
        candidates.into_iter().filter(|&mv| self.is_legal(mv)).collect()
    }
}

impl<K: HashKey> EngineCore for Game<K> {
    type Key = K;

    fn generate_moves(&mut self) -> Vec<Move> {
        let mut candidates = Vec::with_capacity(48);
        movegeneration::generate_moves(&self.position, self.tables, &mut candidates);
        self.legal_only(candidates)
    }

    fn generate_attacking_moves(&mut self) -> Vec<Move> {
        let mut candidates = Vec::new();
        movegeneration::generate_attacking_moves(&self.position, self.tables, &mut candidates);
        self.legal_only(candidates)
    }

    /// Panics if `from` is empty.
    fn apply_move(&mut self, mv: Move) {
        let mover = self.position.active_color;
        let (from, to) = (mv.from(), mv.to());
        let previous = Undo {
            mv,
            moved: Piece::new(mover, PieceKind::King),
            captured: None,
            castling_rights: self.position.castling_rights,
            en_passant: self.position.en_passant,
            halfmove_clock: self.position.halfmove_clock,
            fullmove_number: self.position.fullmove_number,
        };

        let piece = self
            .take(from)
            .unwrap_or_else(|| panic!("no piece on {} to play {}", index_to_position(from), mv));
        let is_pawn = piece.kind == PieceKind::Pawn;

        let en_passant_victim = match mover {
            Color::White => to.wrapping_sub(8),
            Color::Black => to + 8,
        };
        let captured = if is_pawn && self.position.en_passant == Some(to) && from % 8 != to % 8 {
            self.take(en_passant_victim).map(|victim| (en_passant_victim, victim))
        } else {
            self.take(to).map(|victim| (to, victim))
        };

        let landed = match mv.promotion() {
            Some(kind) => Piece::new(mover, kind),
            None => piece,
        };
        self.place(to, landed);

        if piece.kind == PieceKind::King {
            if let Some(side) = CastlingSide::of_king_step(from, to) {
                self.move_rook_for_castling(mover, side, false);
            }
        }

        let rights = self.position.castling_rights - CastlingRights::revoked_by(from) - CastlingRights::revoked_by(to);
        self.set_castling(rights);

        self.position.en_passant = if is_pawn && from.abs_diff(to) == 16 { Some((from + to) / 2) } else { None };
        self.position.halfmove_clock =
            if is_pawn || captured.is_some() { 0 } else { self.position.halfmove_clock + 1 };
        if mover == Color::Black {
            self.position.fullmove_number += 1;
        }
        self.flip_turn();

        self.history.push(Undo { moved: piece, captured, ..previous });
    }

    /// Panics when there is nothing to undo.
    fn undo_last_move(&mut self) {
        let undo = self.history.pop().unwrap_or_else(|| panic!("undo_last_move called with an empty move history"));
        self.flip_turn();
        let mover = self.position.active_color;
        let (from, to) = (undo.mv.from(), undo.mv.to());

        self.take(to);
        self.place(from, undo.moved);

        if undo.moved.kind == PieceKind::King {
            if let Some(side) = CastlingSide::of_king_step(from, to) {
                self.move_rook_for_castling(mover, side, true);
            }
        }
        if let Some((square, victim)) = undo.captured {
            self.place(square, victim);
        }

        self.set_castling(undo.castling_rights);
        self.position.en_passant = undo.en_passant;
        self.position.halfmove_clock = undo.halfmove_clock;
        self.position.fullmove_number = undo.fullmove_number;
    }

    fn evaluate_normalized(&self) -> i32 {
        let score = self.evaluator.evaluate(&self.position);
        match self.position.active_color {
            Color::White => score,
            Color::Black => -score,
        }
    }

    fn checks(&self, side: Color) -> Vec<Square> {
        movegeneration::checkers(&self.position, self.tables, side)
    }

    fn side_to_move(&self) -> Color {
        self.position.active_color
    }

    fn fingerprint(&self) -> K {
        self.zobrist.fingerprint()
    }

    fn position(&self) -> &Position {
        &self.position
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
        self.history.clear();
        self.zobrist.reset(&self.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zobrist::KeyPair;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    /// Plays `moves` checking the running hash against a from-scratch one
    /// after every apply and undo.
    fn replay<K: HashKey>(fen: &str, moves: &[&str]) {
        let position = Position::from_fen(fen).unwrap();
        let mut game: Game<K> = Game::with_seed(position.clone(), 99);
        let keys = Arc::clone(game.zobrist.keys());

        for text in moves {
            let mv = game.parse_move(text).unwrap_or_else(|| panic!("{} is not legal here", text));
            game.apply_move(mv);
            assert_eq!(game.fingerprint(), keys.hash_position(game.position()), "after {}", text);
        }
        for _ in moves {
            game.undo_last_move();
            assert_eq!(game.fingerprint(), keys.hash_position(game.position()));
        }
        assert_eq!(game.position(), &position);
        assert_eq!(game.ply(), 0);
    }

    #[test]
    fn incremental_hash_through_castling_and_promotion() {
        let moves = ["e1g1", "e8c8", "d5e6", "h3g2", "e6f7", "g2f1q", "g1f1"];
        replay::<u64>(KIWIPETE, &moves);
        replay::<KeyPair>(KIWIPETE, &moves);
    }

    #[test]
    fn incremental_hash_through_en_passant() {
        let moves = ["e2e4", "a7a6", "e4e5", "d7d5", "e5d6"];
        replay::<u64>(crate::position::START_FEN, &moves);
        replay::<KeyPair>(crate::position::START_FEN, &moves);
    }

    #[test]
    fn test_castling_moves_the_rook() {
        let mut game: Game = Game::with_seed(Position::from_fen(KIWIPETE).unwrap(), 1);
        let castle = game.parse_move("e1c1").unwrap();
        game.apply_move(castle);
        let position = game.position();
        assert_eq!(position.piece_at(2), Some(Piece::new(Color::White, PieceKind::King)));
        assert_eq!(position.piece_at(3), Some(Piece::new(Color::White, PieceKind::Rook)));
        assert_eq!(position.piece_at(0), None);
        assert!(!position.castling_rights.intersects(CastlingRights::WHITEKINGSIDE | CastlingRights::WHITEQUEENSIDE));
        assert!(position.castling_rights.contains(CastlingRights::BLACKKINGSIDE));
    }

    #[test]
    fn en_passant_removes_the_passed_pawn() {
        let mut game: Game = Game::with_seed(Position::startpos(), 1);
        for text in ["e2e4", "a7a6", "e4e5", "d7d5"] {
            let mv = game.parse_move(text).unwrap();
            game.apply_move(mv);
        }
        assert_eq!(game.position().en_passant, Some(43));
        let capture = game.parse_move("e5d6").unwrap();
        assert!(capture.is_attack());
        game.apply_move(capture);
        assert_eq!(game.position().piece_at(35), None);
        assert_eq!(game.position().halfmove_clock, 0);
    }

    #[test]
    fn test_legal_move_counts() {
        let mut game = Game::new();
        assert_eq!(game.generate_moves().len(), 20);

        // Fool's mate
        game.set_position(Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap());
        assert!(game.generate_moves().is_empty());
        assert_eq!(game.checks(Color::White), vec![31]);

        // The e2 knight is pinned by the e8 rook
        game.set_position(Position::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap());
        let moves = game.generate_moves();
        assert!(moves.iter().all(|mv| mv.from() != 12));
        assert_eq!(moves.len(), 4);
    }

    #[test]
    fn attacking_moves_are_legal_captures() {
        let mut game: Game = Game::with_seed(Position::from_fen(KIWIPETE).unwrap(), 3);
        let captures = game.generate_attacking_moves();
        assert_eq!(captures.len(), 8);
        assert!(captures.iter().all(|mv| mv.is_attack()));
    }

    #[test]
    fn evaluation_follows_the_side_to_move() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1").unwrap();
        let mut game: Game = Game::with_seed(position, 5).with_evaluator(Evaluator::Material);
        assert_eq!(game.evaluate_normalized(), 900);
        let mv = game.parse_move("e1d1").unwrap();
        game.apply_move(mv);
        assert_eq!(game.evaluate_normalized(), -900);
    }

    #[test]
    fn parse_move_rejects_illegal_text() {
        let mut game = Game::new();
        assert!(game.parse_move("e2e5").is_none());
        assert!(game.parse_move("zz").is_none());
        assert_eq!(game.parse_move("G1F3"), Some(Move::new(6, 21)));
    }

    #[test]
    #[should_panic(expected = "empty move history")]
    fn undo_without_history_panics() {
        Game::new().undo_last_move();
    }

    #[test]
    #[should_panic(expected = "no piece on e4")]
    fn moving_from_an_empty_square_panics() {
        Game::new().apply_move(Move::new(28, 36));
    }
}
