//! Move generation lookup tables.
//!
//! Pre-computed, per-square board geometry: ray sequences for the sliding
//! directions (ordered outward from the origin square), jump targets for the
//! short-range pieces, and flattened reachability vectors per piece family.
//! Everything here is a pure function of rank/file arithmetic with edge
//! clipping, so the tables are built once per process and shared read-only.

use std::sync::OnceLock;

use crate::position::{Color, Piece, PieceKind};
use crate::utils::*;

/// The eight sliding directions, as (rank, file) steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub const ORTHOGONAL: [Direction; 4] =
        [Direction::North, Direction::East, Direction::South, Direction::West];

    pub const DIAGONAL: [Direction; 4] =
        [Direction::NorthEast, Direction::SouthEast, Direction::SouthWest, Direction::NorthWest];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (1, 0),
            Direction::NorthEast => (1, 1),
            Direction::East => (0, 1),
            Direction::SouthEast => (-1, 1),
            Direction::South => (-1, 0),
            Direction::SouthWest => (-1, -1),
            Direction::West => (0, -1),
            Direction::NorthWest => (1, -1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        let (dr, df) = self.delta();
        dr != 0 && df != 0
    }

    fn from_delta(dr: i32, df: i32) -> Option<Direction> {
        Direction::ALL.iter().copied().find(|d| d.delta() == (dr, df))
    }
}

/// Movement families with distinct empty-board reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceFamily {
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
    /// Capture reach of a white pawn
    WhitePawn,
    /// Capture reach of a black pawn
    BlackPawn,
}

impl PieceFamily {
    const COUNT: usize = 7;

    /// The family whose reach describes how `piece` attacks.
    pub fn of(piece: Piece) -> PieceFamily {
        match (piece.kind, piece.color) {
            (PieceKind::Pawn, Color::White) => PieceFamily::WhitePawn,
            (PieceKind::Pawn, Color::Black) => PieceFamily::BlackPawn,
            (PieceKind::Knight, _) => PieceFamily::Knight,
            (PieceKind::Bishop, _) => PieceFamily::Bishop,
            (PieceKind::Rook, _) => PieceFamily::Rook,
            (PieceKind::Queen, _) => PieceFamily::Queen,
            (PieceKind::King, _) => PieceFamily::King,
        }
    }
}

/// A collection of pre-computed lookup tables for chess move generation.
#[derive(Debug, Clone)]
pub struct MoveGenTables {
    /// Rays indexed by [square][direction], nearest square first
    rays: Vec<[Vec<Square>; 8]>,
    knight_jumps: Vec<Vec<Square>>,
    king_jumps: Vec<Vec<Square>>,
    /// Pawn capture targets indexed by [color][square]
    pawn_captures: [Vec<Vec<Square>>; 2],

    /// Knight attack patterns as bitboards, indexed by square.
    pub knight_attacks: [Bitboard; 64],
    /// King attack patterns as bitboards, indexed by square.
    pub king_attacks: [Bitboard; 64],
    /// Pawn capture patterns indexed by [color][square].
    pub pawn_attacks: [[Bitboard; 64]; 2],

    /// Reachability flattened as [family][from][to]
    reach: Vec<bool>,
}

impl Default for MoveGenTables {
    fn default() -> Self {
        MoveGenTables::new()
    }
}

impl MoveGenTables {
    /// Builds every table. Cheap, but callers normally want `global()`.
    pub fn new() -> Self {
        let mut tables = Self {
            rays: Vec::with_capacity(64),
            knight_jumps: Vec::with_capacity(64),
            king_jumps: Vec::with_capacity(64),
            pawn_captures: [Vec::with_capacity(64), Vec::with_capacity(64)],
            knight_attacks: [0; 64],
            king_attacks: [0; 64],
            pawn_attacks: [[0; 64]; 2],
            reach: vec![false; PieceFamily::COUNT * 64 * 64],
        };

        for square in 0..64u8 {
            tables.rays.push(std::array::from_fn(|d| generate_ray(square, Direction::ALL[d])));
            tables.knight_jumps.push(generate_jumps(square, &KNIGHT_STEPS));
            tables.king_jumps.push(generate_jumps(square, &KING_STEPS));
            tables.pawn_captures[Color::White.index()].push(generate_jumps(square, &[(1, -1), (1, 1)]));
            tables.pawn_captures[Color::Black.index()].push(generate_jumps(square, &[(-1, -1), (-1, 1)]));

            tables.knight_attacks[square as usize] = to_bitboard(&tables.knight_jumps[square as usize]);
            tables.king_attacks[square as usize] = to_bitboard(&tables.king_jumps[square as usize]);
            for color in [Color::White, Color::Black] {
                tables.pawn_attacks[color.index()][square as usize] =
                    to_bitboard(&tables.pawn_captures[color.index()][square as usize]);
            }
        }

        for from in 0..64u8 {
            let diagonal: Vec<Square> = Direction::DIAGONAL
                .iter()
                .flat_map(|&d| tables.ray(from, d).to_vec())
                .collect();
            let orthogonal: Vec<Square> = Direction::ORTHOGONAL
                .iter()
                .flat_map(|&d| tables.ray(from, d).to_vec())
                .collect();
            let targets = [
                (PieceFamily::Knight, tables.knight_jumps[from as usize].clone()),
                (PieceFamily::Bishop, diagonal.clone()),
                (PieceFamily::Rook, orthogonal.clone()),
                (PieceFamily::Queen, [diagonal, orthogonal].concat()),
                (PieceFamily::King, tables.king_jumps[from as usize].clone()),
                (PieceFamily::WhitePawn, tables.pawn_captures[0][from as usize].clone()),
                (PieceFamily::BlackPawn, tables.pawn_captures[1][from as usize].clone()),
            ];
            for (family, squares) in targets {
                for to in squares {
                    let index = reach_index(family, from, to);
                    tables.reach[index] = true;
                }
            }
        }

        tables
    }

    /// Process-wide tables, built on first use.
    pub fn global() -> &'static MoveGenTables {
        static TABLES: OnceLock<MoveGenTables> = OnceLock::new();
        TABLES.get_or_init(MoveGenTables::new)
    }

    /// Squares along `direction` from `square`, nearest first.
    pub fn ray(&self, square: Square, direction: Direction) -> &[Square] {
        &self.rays[square as usize][direction as usize]
    }

    pub fn knight_jumps(&self, square: Square) -> &[Square] {
        &self.knight_jumps[square as usize]
    }

    pub fn king_jumps(&self, square: Square) -> &[Square] {
        &self.king_jumps[square as usize]
    }

    /// Squares a pawn of `color` on `square` captures on.
    pub fn pawn_captures(&self, color: Color, square: Square) -> &[Square] {
        &self.pawn_captures[color.index()][square as usize]
    }

    /// Whether `family` standing on `from` could ever reach `to` on an empty board.
    pub fn can_reach(&self, family: PieceFamily, from: Square, to: Square) -> bool {
        self.reach[reach_index(family, from, to)]
    }

    /// Queen-line direction leading from `from` to `to`, if they share a line.
    pub fn direction_between(from: Square, to: Square) -> Option<Direction> {
        if from == to {
            return None;
        }
        let dr = rank_of(to) - rank_of(from);
        let df = file_of(to) - file_of(from);
        if dr != 0 && df != 0 && dr.abs() != df.abs() {
            return None;
        }
        Direction::from_delta(dr.signum(), df.signum())
    }
}

const KNIGHT_STEPS: [(i32, i32); 8] =
    [(1, 2), (1, -2), (-1, 2), (-1, -2), (2, 1), (2, -1), (-2, 1), (-2, -1)];

const KING_STEPS: [(i32, i32); 8] =
    [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];

fn reach_index(family: PieceFamily, from: Square, to: Square) -> usize {
    family as usize * 4096 + from as usize * 64 + to as usize
}

fn generate_ray(square: Square, direction: Direction) -> Vec<Square> {
    let (dr, df) = direction.delta();
    let mut ray = Vec::with_capacity(7);
    let (mut rank, mut file) = (rank_of(square) + dr, file_of(square) + df);
    while on_board(rank, file) {
        ray.push((rank * 8 + file) as Square);
        rank += dr;
        file += df;
    }
    ray
}

fn generate_jumps(square: Square, steps: &[(i32, i32)]) -> Vec<Square> {
    let mut jumps: Vec<Square> = steps
        .iter()
        .map(|(dr, df)| (rank_of(square) + dr, file_of(square) + df))
        .filter(|&(rank, file)| on_board(rank, file))
        .map(|(rank, file)| (rank * 8 + file) as Square)
        .collect();
    jumps.sort_unstable();
    jumps
}

fn to_bitboard(squares: &[Square]) -> Bitboard {
    squares.iter().fold(0, |acc, &sq| acc | (1u64 << sq))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rays_are_ordered_outward_and_clipped() {
        let tables = MoveGenTables::global();
        assert_eq!(tables.ray(0, Direction::North), &[8, 16, 24, 32, 40, 48, 56]);
        assert_eq!(tables.ray(27, Direction::SouthWest), &[18, 9, 0]);
        assert!(tables.ray(7, Direction::East).is_empty());
        // h4 going north-east must not wrap onto the a-file
        assert!(tables.ray(31, Direction::NorthEast).is_empty());
    }

    #[test]
    fn jump_counts_match_geometry() {
        let tables = MoveGenTables::new();
        assert_eq!(tables.knight_jumps(0), &[10, 17]);
        assert_eq!(tables.knight_jumps(27).len(), 8);
        assert_eq!(tables.king_jumps(0), &[1, 8, 9]);
        assert_eq!(tables.king_jumps(27).len(), 8);
        assert_eq!(tables.knight_attacks[0], (1 << 10) | (1 << 17));
    }

    #[test]
    fn pawn_captures_depend_on_color() {
        let tables = MoveGenTables::global();
        assert_eq!(tables.pawn_captures(Color::White, 12), &[19, 21]);
        assert_eq!(tables.pawn_captures(Color::Black, 52), &[43, 45]);
        assert_eq!(tables.pawn_captures(Color::White, 8), &[17]);
        assert!(tables.pawn_captures(Color::White, 60).is_empty());
    }

    #[test]
    fn reachability_matches_empty_board_moves() {
        let tables = MoveGenTables::global();
        for from in 0..64u8 {
            let rook = (0..64u8).filter(|&to| tables.can_reach(PieceFamily::Rook, from, to)).count();
            assert_eq!(rook, 14);
            assert!(!tables.can_reach(PieceFamily::Queen, from, from));
        }
        assert!(tables.can_reach(PieceFamily::Queen, 0, 63));
        assert!(tables.can_reach(PieceFamily::Bishop, 0, 63));
        assert!(!tables.can_reach(PieceFamily::Rook, 0, 63));
        assert!(tables.can_reach(PieceFamily::Knight, 0, 17));
        assert!(!tables.can_reach(PieceFamily::Knight, 0, 18));
        assert!(tables.can_reach(PieceFamily::WhitePawn, 12, 21));
        assert!(!tables.can_reach(PieceFamily::BlackPawn, 12, 21));
        let bishop = (0..64u8).filter(|&to| tables.can_reach(PieceFamily::Bishop, 27, to)).count();
        assert_eq!(bishop, 13);
    }

    #[test]
    fn direction_between_follows_queen_lines() {
        assert_eq!(MoveGenTables::direction_between(0, 63), Some(Direction::NorthEast));
        assert_eq!(MoveGenTables::direction_between(60, 4), Some(Direction::South));
        assert_eq!(MoveGenTables::direction_between(4, 0), Some(Direction::West));
        assert_eq!(MoveGenTables::direction_between(0, 17), None);
        assert_eq!(MoveGenTables::direction_between(5, 5), None);
    }
}
