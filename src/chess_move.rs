use std::fmt;

use crate::position::PieceKind;
use crate::utils::{index_to_position, Square};

/// A move as produced by the engine core and consumed by the search.
///
/// `attack` marks captures (en passant included). Castling is encoded as the
/// king's two-square step; the engine core moves the rook.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Move {
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
    attack: bool,
}

impl Move {
    /// Panics when `from == to`: such a move is never legal, and its packed
    /// form would collide with the "no move" word of the packed cache.
    pub fn new(from: Square, to: Square) -> Self {
        assert!(from < 64 && to < 64, "square out of range: {} -> {}", from, to);
        assert_ne!(from, to, "a move must change squares");
        Move { from, to, promotion: None, attack: false }
    }

    pub fn capture(from: Square, to: Square) -> Self {
        Move { attack: true, ..Move::new(from, to) }
    }

    pub fn with_promotion(self, kind: PieceKind) -> Self {
        Move { promotion: Some(kind), ..self }
    }

    pub fn from(&self) -> Square {
        self.from
    }

    pub fn to(&self) -> Square {
        self.to
    }

    pub fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }

    pub fn is_attack(&self) -> bool {
        self.attack
    }

    /// Same squares and promotion, ignoring the capture flag. Caller-built
    /// moves often lack it.
    pub fn matches(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    /// Neither a capture nor a promotion; the only moves that become killers.
    pub fn is_quiet(&self) -> bool {
        !self.attack && self.promotion.is_none()
    }
}

/// Long algebraic notation, e.g. `e2e4` or `e7e8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", index_to_position(self.from), index_to_position(self.to))?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.to_char())?;
        }
        Ok(())
    }
}
