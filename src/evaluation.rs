//! Static evaluation.
//!
//! Scores are centipawns from White's perspective; `Game` negates them for
//! Black to produce the side-to-move score the search consumes.

use crate::position::{Color, PieceKind, Position};
use crate::utils::Bitboard;

// Material values in centipawns (1 pawn = 100)
const PAWN_VALUE: i32 = 100;
const KNIGHT_VALUE: i32 = 320;
const BISHOP_VALUE: i32 = 330;
const ROOK_VALUE: i32 = 500;
const QUEEN_VALUE: i32 = 900;

// Piece-square tables, laid out as printed: first row is rank 8, so White
// reads them through `square ^ 56` and Black reads them directly.
#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MIDDLEGAME_TABLE: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

// Pawn structure bonuses/penalties
const CENTRAL_PAWN_BONUS: i32 = 20;
const DOUBLED_PAWN_PENALTY: i32 = -20;
const ISOLATED_PAWN_PENALTY: i32 = -10;

// d4, e4, d5, e5
const CENTRAL_SQUARES: Bitboard = 0x0000_0018_1800_0000;
const FILE_A: Bitboard = 0x0101_0101_0101_0101;

/// Which static evaluation the engine core uses at leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Evaluator {
    /// Material balance only.
    Material,
    /// Material, piece-square tables and pawn structure.
    #[default]
    PieceSquare,
}

impl Evaluator {
    /// Evaluates a chess position from White's perspective.
    /// Returns a score in centipawns, positive for White advantage.
    pub fn evaluate(self, position: &Position) -> i32 {
        match self {
            Evaluator::Material => evaluate_material(position),
            Evaluator::PieceSquare => {
                evaluate_material(position) + evaluate_piece_positions(position) + evaluate_pawn_structure(position)
            }
        }
    }
}

pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => PAWN_VALUE,
        PieceKind::Knight => KNIGHT_VALUE,
        PieceKind::Bishop => BISHOP_VALUE,
        PieceKind::Rook => ROOK_VALUE,
        PieceKind::Queen => QUEEN_VALUE,
        PieceKind::King => 0,
    }
}

fn signed(color: Color, value: i32) -> i32 {
    match color {
        Color::White => value,
        Color::Black => -value,
    }
}

fn evaluate_material(position: &Position) -> i32 {
    position
        .board
        .iter()
        .flatten()
        .map(|piece| signed(piece.color, piece_value(piece.kind)))
        .sum()
}

fn evaluate_piece_positions(position: &Position) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        for (square, piece) in position.pieces_of(color) {
            let index = match color {
                Color::White => (square ^ 56) as usize,
                Color::Black => square as usize,
            };
            let table = match piece.kind {
                PieceKind::Pawn => &PAWN_TABLE,
                PieceKind::Knight => &KNIGHT_TABLE,
                PieceKind::Bishop => &BISHOP_TABLE,
                PieceKind::Rook => &ROOK_TABLE,
                PieceKind::Queen => &QUEEN_TABLE,
                PieceKind::King => &KING_MIDDLEGAME_TABLE,
            };
            score += signed(color, table[index]);
        }
    }
    score
}

fn pawns_of(position: &Position, color: Color) -> Bitboard {
    position
        .pieces_of(color)
        .filter(|(_, piece)| piece.kind == PieceKind::Pawn)
        .fold(0, |acc, (square, _)| acc | (1u64 << square))
}

fn evaluate_pawn_structure(position: &Position) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let pawns = pawns_of(position, color);
        let mut side = (pawns & CENTRAL_SQUARES).count_ones() as i32 * CENTRAL_PAWN_BONUS;

        for file in 0..8 {
            let file_mask = FILE_A << file;
            let on_file = (pawns & file_mask).count_ones() as i32;
            if on_file > 1 {
                side += DOUBLED_PAWN_PENALTY * (on_file - 1);
            }

            let mut neighbours = 0;
            if file > 0 {
                neighbours |= FILE_A << (file - 1);
            }
            if file < 7 {
                neighbours |= FILE_A << (file + 1);
            }
            if on_file > 0 && pawns & neighbours == 0 {
                side += ISOLATED_PAWN_PENALTY;
            }
        }
        score += signed(color, side);
    }
    score
}
