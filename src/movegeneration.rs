//! Chess move generation module.
//!
//! Generates pseudo-legal moves (own king may be left in check) for the side
//! to move, and answers attack queries. Legality filtering lives in `Game`,
//! which applies each candidate and rejects those leaving the mover in check.
//!
//! Output order is deterministic: pieces by ascending square, then each
//! piece's targets in table order. Move ordering ties fall back to it.

use crate::chess_move::Move;
use crate::movegen_tables::{Direction, MoveGenTables, PieceFamily};
use crate::position::PieceKind::*;
use crate::position::*;
use crate::utils::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CastlingSide {
    Kingside,
    Queenside,
}

impl CastlingSide {
    /// (king from, king to, rook from, rook to) for `color`.
    pub fn squares(self, color: Color) -> (Square, Square, Square, Square) {
        match (color, self) {
            (Color::White, CastlingSide::Kingside) => (4, 6, 7, 5),
            (Color::White, CastlingSide::Queenside) => (4, 2, 0, 3),
            (Color::Black, CastlingSide::Kingside) => (60, 62, 63, 61),
            (Color::Black, CastlingSide::Queenside) => (60, 58, 56, 59),
        }
    }

    /// Recognises a king's two-square step as castling.
    pub fn of_king_step(from: Square, to: Square) -> Option<CastlingSide> {
        match (from, to) {
            (4, 6) | (60, 62) => Some(CastlingSide::Kingside),
            (4, 2) | (60, 58) => Some(CastlingSide::Queenside),
            _ => None,
        }
    }

    fn right(self, color: Color) -> CastlingRights {
        match (color, self) {
            (Color::White, CastlingSide::Kingside) => CastlingRights::WHITEKINGSIDE,
            (Color::White, CastlingSide::Queenside) => CastlingRights::WHITEQUEENSIDE,
            (Color::Black, CastlingSide::Kingside) => CastlingRights::BLACKKINGSIDE,
            (Color::Black, CastlingSide::Queenside) => CastlingRights::BLACKQUEENSIDE,
        }
    }

    /// Squares strictly between king and rook that must be empty.
    fn path(self, color: Color) -> Bitboard {
        match (color, self) {
            (Color::White, CastlingSide::Kingside) => 0x60,
            (Color::White, CastlingSide::Queenside) => 0xE,
            (Color::Black, CastlingSide::Kingside) => 0x6000000000000000,
            (Color::Black, CastlingSide::Queenside) => 0x0E00000000000000,
        }
    }
}

/// Generates all pseudo-legal moves for the side to move.
///
/// # Arguments
///
/// * `position` - The position to generate moves for
/// * `tables` - Precomputed geometry
/// * `moves` - Output buffer; moves are appended
pub fn generate_moves(position: &Position, tables: &MoveGenTables, moves: &mut Vec<Move>) {
    let color = position.active_color;
    for (square, piece) in position.pieces_of(color) {
        match piece.kind {
            Pawn => generate_pawn_moves(position, tables, square, color, moves),
            Knight => generate_jump_moves(position, tables.knight_jumps(square), square, moves),
            Bishop => generate_slider_moves(position, tables, square, &Direction::DIAGONAL, moves),
            Rook => generate_slider_moves(position, tables, square, &Direction::ORTHOGONAL, moves),
            Queen => generate_slider_moves(position, tables, square, &Direction::ALL, moves),
            King => {
                generate_jump_moves(position, tables.king_jumps(square), square, moves);
                for side in [CastlingSide::Kingside, CastlingSide::Queenside] {
                    if can_castle(position, tables, color, side) {
                        let (king_from, king_to, _, _) = side.squares(color);
                        moves.push(Move::new(king_from, king_to));
                    }
                }
            }
        }
    }
}

/// Pseudo-legal captures only, en passant included.
pub fn generate_attacking_moves(position: &Position, tables: &MoveGenTables, moves: &mut Vec<Move>) {
    let mut all = Vec::with_capacity(48);
    generate_moves(position, tables, &mut all);
    moves.extend(all.into_iter().filter(|mv| mv.is_attack()));
}

fn push_target(position: &Position, from: Square, to: Square, moves: &mut Vec<Move>) {
    match position.piece_at(to) {
        None => moves.push(Move::new(from, to)),
        Some(target) if target.color != position.active_color => moves.push(Move::capture(from, to)),
        Some(_) => {}
    }
}

fn generate_jump_moves(position: &Position, jumps: &[Square], from: Square, moves: &mut Vec<Move>) {
    for &to in jumps {
        push_target(position, from, to, moves);
    }
}

fn generate_slider_moves(
    position: &Position,
    tables: &MoveGenTables,
    from: Square,
    directions: &[Direction],
    moves: &mut Vec<Move>,
) {
    for &direction in directions {
        for &to in tables.ray(from, direction) {
            push_target(position, from, to, moves);
            if position.piece_at(to).is_some() {
                break;
            }
        }
    }
}

/// Pushes, double pushes, captures, en passant. Moves onto the last rank
/// expand into one move per promotion kind, queen first.
fn generate_pawn_moves(
    position: &Position,
    tables: &MoveGenTables,
    from: Square,
    color: Color,
    moves: &mut Vec<Move>,
) {
    let (step, start_rank, last_rank): (i32, i32, i32) = match color {
        Color::White => (8, 1, 7),
        Color::Black => (-8, 6, 0),
    };
    let single = (from as i32 + step) as Square;
    if position.piece_at(single).is_none() {
        push_pawn_move(Move::new(from, single), last_rank, moves);
        if rank_of(from) == start_rank {
            let double = (single as i32 + step) as Square;
            if position.piece_at(double).is_none() {
                moves.push(Move::new(from, double));
            }
        }
    }

    for &to in tables.pawn_captures(color, from) {
        match position.piece_at(to) {
            Some(target) if target.color != color => push_pawn_move(Move::capture(from, to), last_rank, moves),
            None if position.en_passant == Some(to) => moves.push(Move::capture(from, to)),
            _ => {}
        }
    }
}

fn push_pawn_move(mv: Move, last_rank: i32, moves: &mut Vec<Move>) {
    if rank_of(mv.to()) == last_rank {
        for kind in PieceKind::PROMOTIONS {
            moves.push(mv.with_promotion(kind));
        }
    } else {
        moves.push(mv);
    }
}

/// Checks if castling is available in the current position.
///
/// Requires the right, an empty path between king and rook, the rook in its
/// corner, and neither the king's square nor the squares it crosses or lands
/// on attacked.
pub fn can_castle(position: &Position, tables: &MoveGenTables, color: Color, side: CastlingSide) -> bool {
    if !position.castling_rights.contains(side.right(color)) {
        return false;
    }
    if position.all_occupancy() & side.path(color) != 0 {
        return false;
    }

    let (king_from, king_to, rook_from, _) = side.squares(color);
    if position.piece_at(king_from) != Some(Piece::new(color, King))
        || position.piece_at(rook_from) != Some(Piece::new(color, Rook))
    {
        return false;
    }

    let (low, high) = if king_from < king_to { (king_from, king_to) } else { (king_to, king_from) };
    (low..=high).all(|square| !is_square_attacked(position, tables, square, color.opponent()))
}

/// Whether `piece` standing on `from` attacks `target` in `position`.
fn attacks(position: &Position, tables: &MoveGenTables, from: Square, piece: Piece, target: Square) -> bool {
    if !tables.can_reach(PieceFamily::of(piece), from, target) {
        return false;
    }
    match piece.kind {
        Bishop | Rook | Queen => {
            let Some(direction) = MoveGenTables::direction_between(from, target) else {
                return false;
            };
            tables
                .ray(from, direction)
                .iter()
                .take_while(|&&square| square != target)
                .all(|&square| position.piece_at(square).is_none())
        }
        Pawn | Knight | King => true,
    }
}

/// Squares of `by`'s pieces that attack `target`, ascending.
pub fn attackers_of(position: &Position, tables: &MoveGenTables, target: Square, by: Color) -> Vec<Square> {
    position
        .pieces_of(by)
        .filter(|&(from, piece)| attacks(position, tables, from, piece, target))
        .map(|(from, _)| from)
        .collect()
}

pub fn is_square_attacked(position: &Position, tables: &MoveGenTables, target: Square, by: Color) -> bool {
    position.pieces_of(by).any(|(from, piece)| attacks(position, tables, from, piece, target))
}

/// Enemy pieces giving check to `color`'s king.
pub fn checkers(position: &Position, tables: &MoveGenTables, color: Color) -> Vec<Square> {
    match position.king_square(color) {
        Some(king) => attackers_of(position, tables, king, color.opponent()),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves_of(fen: &str) -> Vec<Move> {
        let position = Position::from_fen(fen).unwrap();
        let mut moves = Vec::new();
        generate_moves(&position, MoveGenTables::global(), &mut moves);
        moves
    }

    #[test]
    fn start_position_has_twenty_moves() {
        let moves = moves_of(START_FEN);
        assert_eq!(moves.len(), 20);
        assert!(moves.iter().all(|mv| !mv.is_attack()));
        // Generation order follows ascending origin squares
        assert_eq!(moves[0].to_string(), "b1a3");
    }

    #[test]
    fn test_can_castle_path_blocked() {
        let position = Position::startpos();
        assert!(!can_castle(&position, MoveGenTables::global(), Color::White, CastlingSide::Kingside));
    }

    #[test]
    fn test_can_castle_both_sides() {
        let position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let tables = MoveGenTables::global();
        assert!(can_castle(&position, tables, Color::White, CastlingSide::Kingside));
        assert!(can_castle(&position, tables, Color::White, CastlingSide::Queenside));
        assert!(can_castle(&position, tables, Color::Black, CastlingSide::Kingside));
    }

    #[test]
    fn test_can_castle_without_right() {
        let position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Qkq - 0 1").unwrap();
        assert!(!can_castle(&position, MoveGenTables::global(), Color::White, CastlingSide::Kingside));
    }

    #[test]
    fn test_can_castle_path_attacked() {
        // Black rook on f8 covers f1
        let position = Position::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let tables = MoveGenTables::global();
        assert!(!can_castle(&position, tables, Color::White, CastlingSide::Kingside));
        assert!(can_castle(&position, tables, Color::White, CastlingSide::Queenside));
    }

    #[test]
    fn test_cannot_castle_out_of_check() {
        let position = Position::from_fen("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let tables = MoveGenTables::global();
        assert!(!can_castle(&position, tables, Color::White, CastlingSide::Kingside));
        assert!(!can_castle(&position, tables, Color::White, CastlingSide::Queenside));
    }

    #[test]
    fn promotions_expand_queen_first() {
        let moves = moves_of("8/4P3/8/8/8/8/8/k1K5 w - - 0 1");
        let promotions: Vec<String> =
            moves.iter().filter(|mv| mv.promotion().is_some()).map(|mv| mv.to_string()).collect();
        assert_eq!(promotions, vec!["e7e8q", "e7e8r", "e7e8b", "e7e8n"]);
    }

    #[test]
    fn en_passant_is_an_attack() {
        let moves = moves_of("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let ep = moves.iter().find(|mv| mv.to_string() == "e5d6").unwrap();
        assert!(ep.is_attack());
    }

    #[test]
    fn attacking_moves_are_only_captures() {
        let position =
            Position::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/3PP3/8/PPP2PPP/RNBQKBNR w KQkq - 0 3").unwrap();
        let mut captures = Vec::new();
        generate_attacking_moves(&position, MoveGenTables::global(), &mut captures);
        let names: Vec<String> = captures.iter().map(|mv| mv.to_string()).collect();
        assert_eq!(names, vec!["d4e5"]);
    }

    #[test]
    fn sliders_are_blocked() {
        let position = Position::from_fen("4k3/8/8/8/8/2p5/8/Q3K3 w - - 0 1").unwrap();
        let tables = MoveGenTables::global();
        assert!(is_square_attacked(&position, tables, 9, Color::White));
        assert!(!is_square_attacked(&position, tables, 27, Color::White));
        assert_eq!(attackers_of(&position, tables, 25, Color::White), Vec::<Square>::new());
        assert_eq!(attackers_of(&position, tables, 24, Color::White), vec![0]);
    }

    #[test]
    fn checkers_finds_every_attacker() {
        let position = Position::from_fen("4k3/8/8/8/8/5n2/8/r3K3 w - - 0 1").unwrap();
        assert_eq!(checkers(&position, MoveGenTables::global(), Color::White), vec![0, 21]);
        assert!(checkers(&position, MoveGenTables::global(), Color::Black).is_empty());
    }
}
