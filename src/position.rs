//! Board representation for the reference engine core.
//!
//! A `Position` is a plain snapshot: a 64-square mailbox kept in sync with
//! per-color occupancy bitboards, plus side to move, castling rights, the en
//! passant target and the move clocks. It knows nothing about hashing or
//! move history; `Game` layers those on top.

use bitflags::bitflags;
use std::fmt;

use crate::error::FenError;
use crate::utils::*;

/// Standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Kinds a pawn may promote to, strongest first.
    pub const PROMOTIONS: [PieceKind; 4] =
        [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_char(ch: char) -> Option<PieceKind> {
        match ch.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Self {
        Piece { color, kind }
    }

    /// FEN letter: uppercase for White, lowercase for Black.
    pub fn to_char(self) -> char {
        let ch = self.kind.to_char();
        if self.color == Color::White {
            ch.to_ascii_uppercase()
        } else {
            ch
        }
    }

    pub fn from_char(ch: char) -> Option<Piece> {
        let kind = PieceKind::from_char(ch)?;
        let color = if ch.is_ascii_uppercase() { Color::White } else { Color::Black };
        Some(Piece { color, kind })
    }
}

bitflags! {
    pub struct CastlingRights: u8 {
        const NONE = 0;
        const WHITEKINGSIDE = 1 << 0;
        const WHITEQUEENSIDE = 1 << 1;
        const BLACKKINGSIDE = 1 << 2;
        const BLACKQUEENSIDE = 1 << 3;
        const ALL =
            Self::WHITEKINGSIDE.bits
            | Self::WHITEQUEENSIDE.bits
            | Self::BLACKKINGSIDE.bits
            | Self::BLACKQUEENSIDE.bits;
    }
}

impl CastlingRights {
    /// The four individual rights, in bit order.
    pub const EACH: [CastlingRights; 4] = [
        CastlingRights::WHITEKINGSIDE,
        CastlingRights::WHITEQUEENSIDE,
        CastlingRights::BLACKKINGSIDE,
        CastlingRights::BLACKQUEENSIDE,
    ];

    /// Rights lost when a piece leaves or lands on `square`.
    pub fn revoked_by(square: Square) -> CastlingRights {
        match square {
            0 => CastlingRights::WHITEQUEENSIDE,
            4 => CastlingRights::WHITEKINGSIDE | CastlingRights::WHITEQUEENSIDE,
            7 => CastlingRights::WHITEKINGSIDE,
            56 => CastlingRights::BLACKQUEENSIDE,
            60 => CastlingRights::BLACKKINGSIDE | CastlingRights::BLACKQUEENSIDE,
            63 => CastlingRights::BLACKKINGSIDE,
            _ => CastlingRights::NONE,
        }
    }
}

/// Represents a complete chess position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Piece on each square, a1 first
    pub board: [Option<Piece>; 64],
    /// Occupancy bitboards indexed by `Color::index`
    pub occupancy: [Bitboard; 2],
    /// The color to move next
    pub active_color: Color,
    /// Current castling rights for both colors
    pub castling_rights: CastlingRights,
    /// Square where en passant capture is possible, if any
    pub en_passant: Option<Square>,
    /// Number of halfmoves since last pawn advance or capture
    pub halfmove_clock: u32,
    /// Number of completed full moves
    pub fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        Position::startpos()
    }
}

impl Position {
    /// An empty board with White to move and no rights.
    pub fn empty() -> Position {
        Position {
            board: [None; 64],
            occupancy: [0; 2],
            active_color: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn startpos() -> Position {
        Position::from_fen(START_FEN).expect("start position FEN is valid")
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square as usize]
    }

    /// Places a piece on an empty square.
    pub fn put_piece(&mut self, square: Square, piece: Piece) {
        debug_assert!(self.board[square as usize].is_none(), "square {} is occupied", square);
        self.board[square as usize] = Some(piece);
        self.occupancy[piece.color.index()] |= 1u64 << square;
    }

    /// Lifts whatever stands on `square`.
    pub fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        let piece = self.board[square as usize].take()?;
        self.occupancy[piece.color.index()] &= !(1u64 << square);
        Some(piece)
    }

    pub fn occupancy_of(&self, color: Color) -> Bitboard {
        self.occupancy[color.index()]
    }

    pub fn all_occupancy(&self) -> Bitboard {
        self.occupancy[0] | self.occupancy[1]
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        extract_bits(self.occupancy_of(color))
            .into_iter()
            .find(|&sq| matches!(self.piece_at(sq), Some(p) if p.kind == PieceKind::King))
    }

    /// Squares and pieces of one color, lowest square first.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        extract_bits(self.occupancy_of(color))
            .into_iter()
            .filter_map(move |sq| self.piece_at(sq).map(|piece| (sq, piece)))
    }

    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let (placement, rest) = split_on(fen.trim(), ' ');
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 3 || fields.len() > 5 {
            return Err(FenError::FieldCount(fields.len() + 1));
        }

        let mut position = Position::empty();

        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != 8 {
            return Err(FenError::RankCount(rows.len()));
        }
        for (row_index, row) in rows.iter().enumerate() {
            let rank = 7 - row_index as u8;
            let mut file = 0u8;
            for ch in row.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as u8;
                } else {
                    let piece = Piece::from_char(ch).ok_or(FenError::Piece(ch))?;
                    if file >= 8 {
                        return Err(FenError::RankWidth { rank: rank as usize + 1 });
                    }
                    position.put_piece(rank * 8 + file, piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::RankWidth { rank: rank as usize + 1 });
            }
        }

        position.active_color = match fields[0] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::ActiveColor(other.to_string())),
        };

        for ch in fields[1].chars() {
            position.castling_rights |= match ch {
                'K' => CastlingRights::WHITEKINGSIDE,
                'Q' => CastlingRights::WHITEQUEENSIDE,
                'k' => CastlingRights::BLACKKINGSIDE,
                'q' => CastlingRights::BLACKQUEENSIDE,
                '-' => CastlingRights::NONE,
                other => return Err(FenError::Castling(other)),
            };
        }

        position.en_passant = match fields[2] {
            "-" => None,
            square => Some(position_to_index(square).map_err(FenError::EnPassant)?),
        };

        if let Some(clock) = fields.get(3) {
            position.halfmove_clock = clock.parse().map_err(|_| FenError::Counter(clock.to_string()))?;
        }
        if let Some(number) = fields.get(4) {
            position.fullmove_number = number.parse().map_err(|_| FenError::Counter(number.to_string()))?;
        }

        let kings = |color| position.pieces_of(color).filter(|(_, p)| p.kind == PieceKind::King).count();
        if kings(Color::White) != 1 || kings(Color::Black) != 1 {
            return Err(FenError::Kings);
        }

        Ok(position)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_at(rank * 8 + file) {
                    None => empty += 1,
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.to_char());
                    }
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push_str(if self.active_color == Color::White { " w " } else { " b " });

        if self.castling_rights.is_empty() {
            fen.push('-');
        } else {
            for (right, ch) in CastlingRights::EACH.iter().zip(['K', 'Q', 'k', 'q']) {
                if self.castling_rights.contains(*right) {
                    fen.push(ch);
                }
            }
        }

        match self.en_passant {
            Some(square) => {
                fen.push(' ');
                fen.push_str(&index_to_position(square));
            }
            None => fen.push_str(" -"),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                match self.piece_at(rank * 8 + file) {
                    Some(piece) => write!(f, "{} ", piece.to_char())?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fen_initial_position() {
        let position = Position::startpos();
        assert_eq!(position.active_color, Color::White);
        assert_eq!(position.castling_rights, CastlingRights::ALL);
        assert_eq!(position.en_passant, None);
        assert_eq!(position.halfmove_clock, 0);
        assert_eq!(position.fullmove_number, 1);
    }

    #[test]
    fn test_read_fen_occupancy() {
        let position = Position::startpos();
        assert_eq!(position.occupancy_of(Color::White), 0xFFFF);
        assert_eq!(position.occupancy_of(Color::Black), 0xFFFF000000000000);
        assert_eq!(position.piece_at(4), Some(Piece::new(Color::White, PieceKind::King)));
        assert_eq!(position.piece_at(59), Some(Piece::new(Color::Black, PieceKind::Queen)));
    }

    #[test]
    fn test_read_fen_castling_rights() {
        let mut rights = String::new();
        for i in 0..16 {
            if i & 1 != 0 { rights.push('K'); }
            if i & 2 != 0 { rights.push('Q'); }
            if i & 4 != 0 { rights.push('k'); }
            if i & 8 != 0 { rights.push('q'); }
            if rights.is_empty() { rights.push('-'); }

            let fen = format!("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w {} - 0 1", rights);
            let position = Position::from_fen(&fen).unwrap();
            assert_eq!(position.castling_rights.bits(), i as u8, "FEN: {}", fen);
            rights.clear();
        }
    }

    #[test]
    fn test_read_fen_en_passant_and_clocks() {
        let position =
            Position::from_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 3").unwrap();
        assert_eq!(position.active_color, Color::Black);
        assert_eq!(position.en_passant, Some(20));
        assert_eq!(position.fullmove_number, 3);
    }

    #[test]
    fn fen_round_trips() {
        for fen in [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 3",
        ] {
            assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
        }
    }

    #[test]
    fn missing_clocks_default() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
        assert_eq!(position.halfmove_clock, 0);
        assert_eq!(position.fullmove_number, 1);
    }

    #[test]
    fn malformed_fen_is_rejected() {
        assert_eq!(Position::from_fen("8/8/8 w - - 0 1"), Err(FenError::RankCount(3)));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1"),
            Err(FenError::ActiveColor(_))
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4KX2 w - - 0 1"),
            Err(FenError::Piece('X'))
        ));
        assert_eq!(Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"), Err(FenError::Kings));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K4 w - - 0 1"),
            Err(FenError::RankWidth { rank: 1 })
        ));
    }

    #[test]
    fn remove_and_put_keep_occupancy_in_sync() {
        let mut position = Position::startpos();
        let knight = position.remove_piece(1).unwrap();
        assert_eq!(position.occupancy_of(Color::White) & 0b10, 0);
        position.put_piece(18, knight);
        assert_ne!(position.occupancy_of(Color::White) & (1u64 << 18), 0);
        assert_eq!(position.piece_at(18), Some(knight));
    }
}
