//! Incremental Zobrist fingerprints.
//!
//! The fingerprint of a position is the XOR of one random key per occupied
//! (color, piece kind, square), one key when Black is to move, and one key
//! per granted castling right. Every update is an XOR toggle, so applying
//! the same toggle twice restores the previous value.
//!
//! Keys are generic: a single `u64`, or a `KeyPair` of two independently
//! seeded 32-bit fingerprints for targets without fast 64-bit arithmetic.

use std::fmt::Debug;
use std::ops::{BitXor, BitXorAssign};
use std::sync::Arc;

use rand::prelude::*;

use crate::position::{CastlingRights, Color, PieceKind, Position};
use crate::utils::Square;

/// A fingerprint value. Caches split it into a primary half (slot index)
/// and a secondary half.
pub trait HashKey:
    Copy + Eq + Default + Debug + BitXor<Output = Self> + BitXorAssign + Send + Sync + 'static
{
    /// Draws a fresh random key. Single-width keys only use `primary`.
    fn draw(primary: &mut StdRng, secondary: &mut StdRng) -> Self;

    fn primary(self) -> u32;

    fn secondary(self) -> u32;
}

impl HashKey for u64 {
    fn draw(primary: &mut StdRng, _secondary: &mut StdRng) -> Self {
        primary.gen()
    }

    fn primary(self) -> u32 {
        self as u32
    }

    fn secondary(self) -> u32 {
        (self >> 32) as u32
    }
}

/// Two independent 32-bit fingerprints compared as a tuple.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug)]
pub struct KeyPair(pub u32, pub u32);

impl BitXor for KeyPair {
    type Output = KeyPair;

    fn bitxor(self, rhs: KeyPair) -> KeyPair {
        KeyPair(self.0 ^ rhs.0, self.1 ^ rhs.1)
    }
}

impl BitXorAssign for KeyPair {
    fn bitxor_assign(&mut self, rhs: KeyPair) {
        self.0 ^= rhs.0;
        self.1 ^= rhs.1;
    }
}

impl HashKey for KeyPair {
    fn draw(primary: &mut StdRng, secondary: &mut StdRng) -> Self {
        KeyPair(primary.gen(), secondary.gen())
    }

    fn primary(self) -> u32 {
        self.0
    }

    fn secondary(self) -> u32 {
        self.1
    }
}

/// Random keys for one cache lifetime. Regenerating them invalidates every
/// cached entry, so they are built once and shared behind an `Arc`.
#[derive(Clone, Debug)]
pub struct ZobristKeys<K: HashKey = u64> {
    piece_square: [[K; 64]; 12],
    black_to_move: K,
    castling_rights: [K; 4],
}

impl<K: HashKey> ZobristKeys<K> {
    /// Deterministic keys for a given seed.
    pub fn from_seed(seed: u64) -> Self {
        let mut primary = StdRng::seed_from_u64(seed);
        let mut secondary = StdRng::seed_from_u64(seed.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15);

        let mut keys = ZobristKeys {
            piece_square: [[K::default(); 64]; 12],
            black_to_move: K::draw(&mut primary, &mut secondary),
            castling_rights: [K::default(); 4],
        };
        for piece in keys.piece_square.iter_mut() {
            for key in piece.iter_mut() {
                *key = K::draw(&mut primary, &mut secondary);
            }
        }
        for key in keys.castling_rights.iter_mut() {
            *key = K::draw(&mut primary, &mut secondary);
        }
        keys
    }

    /// Keys seeded from system entropy.
    pub fn random() -> Self {
        Self::from_seed(thread_rng().gen())
    }

    pub fn piece(&self, color: Color, kind: PieceKind, square: Square) -> K {
        self.piece_square[color.index() * 6 + kind.index()][square as usize]
    }

    pub fn black_to_move(&self) -> K {
        self.black_to_move
    }

    /// Key of a single castling right.
    pub fn castling(&self, right: CastlingRights) -> K {
        debug_assert_eq!(right.bits().count_ones(), 1, "expected a single right");
        self.castling_rights[right.bits().trailing_zeros() as usize]
    }

    /// Full fingerprint of `position`, computed from scratch.
    pub fn hash_position(&self, position: &Position) -> K {
        let mut hash = K::default();

        for color in [Color::White, Color::Black] {
            for (square, piece) in position.pieces_of(color) {
                hash ^= self.piece(piece.color, piece.kind, square);
            }
        }

        if position.active_color == Color::Black {
            hash ^= self.black_to_move;
        }

        for right in CastlingRights::EACH {
            if position.castling_rights.contains(right) {
                hash ^= self.castling(right);
            }
        }

        hash
    }
}

/// The running fingerprint of one board, updated alongside every mutation.
///
/// Holds no knowledge of the board itself: the owner must call exactly the
/// toggles matching each placement, removal, turn flip and rights change, in
/// both the apply and the undo direction.
#[derive(Clone, Debug)]
pub struct Zobrist<K: HashKey = u64> {
    keys: Arc<ZobristKeys<K>>,
    fingerprint: K,
}

impl<K: HashKey> Zobrist<K> {
    pub fn new(keys: Arc<ZobristKeys<K>>, position: &Position) -> Self {
        let fingerprint = keys.hash_position(position);
        Zobrist { keys, fingerprint }
    }

    pub fn fingerprint(&self) -> K {
        self.fingerprint
    }

    pub fn keys(&self) -> &Arc<ZobristKeys<K>> {
        &self.keys
    }

    /// Resynchronises with a freshly loaded position.
    pub fn reset(&mut self, position: &Position) {
        self.fingerprint = self.keys.hash_position(position);
    }

    pub fn update_square_occupancy(&mut self, color: Color, kind: PieceKind, square: Square) {
        self.fingerprint ^= self.keys.piece(color, kind, square);
    }

    pub fn update_turn(&mut self) {
        self.fingerprint ^= self.keys.black_to_move;
    }

    pub fn update_castling(&mut self, right: CastlingRights) {
        self.fingerprint ^= self.keys.castling(right);
    }
}
