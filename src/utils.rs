//! Utility functions for chess operations.
//!
//! This module provides bitboard helpers and square naming used by the
//! lookup tables, the reference engine core and move formatting.

/// Type alias for a 64-bit integer representing a chess board
pub type Bitboard = u64;

/// Board square index, a1 = 0 through h8 = 63.
pub type Square = u8;

static COL_MAP: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// Sets a bit in a bitboard based on zero-based rank and file.
///
/// Coordinates outside the board produce an empty bitboard, which lets
/// table builders clip at the edges without wraparound.
pub fn set_bit(rank: i32, file: i32) -> Bitboard {
    if !on_board(rank, file) {
        return 0;
    }
    1 << (rank * 8 + file)
}

/// Returns true when the zero-based rank and file lie on the board.
pub fn on_board(rank: i32, file: i32) -> bool {
    (0..8).contains(&rank) && (0..8).contains(&file)
}

pub fn rank_of(square: Square) -> i32 {
    (square / 8) as i32
}

pub fn file_of(square: Square) -> i32 {
    (square % 8) as i32
}

/// Splits a string on the first occurrence of a delimiter.
pub fn split_on(s: &str, delimiter: char) -> (&str, &str) {
    match s.find(delimiter) {
        None => (s, ""),
        Some(index) => (&s[..index], &s[index + 1..]),
    }
}

/// Extracts all set bits from a bitboard, lowest square first.
pub fn extract_bits(mut bitboard: Bitboard) -> Vec<Square> {
    let mut bits = Vec::with_capacity(bitboard.count_ones() as usize);
    while bitboard != 0 {
        bits.push(bitboard.trailing_zeros() as Square);
        bitboard &= bitboard - 1;
    }
    bits
}

/// Formats a square index as algebraic notation, e.g. 28 -> "e4".
pub fn index_to_position(index: Square) -> String {
    let column = (index % 8) as usize;
    let row = index / 8 + 1;
    format!("{}{}", COL_MAP[column], row)
}

/// Parses algebraic notation ("e4") into a square index.
pub fn position_to_index(position: &str) -> Result<Square, String> {
    let bytes = position.as_bytes();
    if bytes.len() != 2 {
        return Err(format!("Invalid length: {}, string: '{}'", bytes.len(), position));
    }

    let column = match bytes[0] {
        b @ b'a'..=b'h' => b - b'a',
        other => {
            return Err(format!("Invalid column character: {}, string: '{}'", other as char, position))
        }
    };
    let row = match bytes[1] {
        b @ b'1'..=b'8' => b - b'1',
        other => {
            return Err(format!("Invalid row character: {}, string: '{}'", other as char, position))
        }
    };

    Ok(row * 8 + column)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that split_on correctly handles space-separated strings
    #[test]
    fn split_on_space_works() {
        let (should_be_a, rest) = split_on("A B C D", ' ');
        assert_eq!(should_be_a, "A");
        assert_eq!(rest, "B C D");
    }

    #[test]
    fn extract_bits_lists_squares_in_order() {
        let bitboard = (1u64 << 3) | (1u64 << 17) | (1u64 << 63);
        assert_eq!(extract_bits(bitboard), vec![3, 17, 63]);
        assert!(extract_bits(0).is_empty());
    }

    #[test]
    fn set_bit_clips_at_edges() {
        assert_eq!(set_bit(0, 0), 1);
        assert_eq!(set_bit(7, 7), 1 << 63);
        assert_eq!(set_bit(8, 0), 0);
        assert_eq!(set_bit(0, -1), 0);
    }

    #[test]
    fn square_names_round_trip() {
        for square in 0..64u8 {
            let name = index_to_position(square);
            assert_eq!(position_to_index(&name), Ok(square), "{}", name);
        }
        assert_eq!(index_to_position(28), "e4");
        assert!(position_to_index("i9").is_err());
        assert!(position_to_index("e").is_err());
    }
}
