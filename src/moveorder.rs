use std::cmp::Reverse;

use crate::chess_move::Move;
use crate::evaluation::piece_value;
use crate::position::{PieceKind, Position};
use crate::search_state::HistoryTable;

/// Moves that deserve to be searched first at one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderingHints {
    /// Best move the cache remembers for this position
    pub hash_move: Option<Move>,
    /// Move the previous iteration's principal variation played at this ply
    pub pv_move: Option<Move>,
    /// Latest quiet cutoff move at this remaining depth
    pub killer: Option<Move>,
}

impl OrderingHints {
    fn tier(&self, mv: Move) -> u8 {
        if self.hash_move == Some(mv) {
            3
        } else if self.pv_move == Some(mv) {
            2
        } else if self.killer == Some(mv) {
            1
        } else {
            0
        }
    }
}

/// Sorts `moves` by hash move, PV move, killer, then descending history.
/// The sort is stable, so ties keep generation order.
pub fn order_moves(moves: &mut [Move], hints: &OrderingHints, history: Option<&HistoryTable>) {
    moves.sort_by_cached_key(|&mv| {
        let history_score = history.map_or(0, |table| table.score(mv));
        Reverse((hints.tier(mv), history_score))
    });
}

/// Sorts captures most valuable victim first, then least valuable attacker
/// (MVV-LVA). A promotion adds the promoted piece to the victim's value; en
/// passant lands on an empty square and counts as taking a pawn.
pub fn order_captures(moves: &mut [Move], position: &Position) {
    moves.sort_by_cached_key(|mv| {
        let victim = position.piece_at(mv.to()).map_or(PieceKind::Pawn, |piece| piece.kind);
        let gain = piece_value(victim) + mv.promotion().map_or(0, piece_value);
        let attacker = position.piece_at(mv.from()).map_or(0, |piece| piece_value(piece.kind));
        (Reverse(gain), attacker)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves() -> Vec<Move> {
        vec![
            Move::new(1, 16),
            Move::new(1, 18),
            Move::new(6, 21),
            Move::new(12, 28),
            Move::capture(11, 20),
        ]
    }

    #[test]
    fn hints_take_priority_in_order() {
        let mut list = moves();
        let hints = OrderingHints {
            hash_move: Some(Move::new(12, 28)),
            pv_move: Some(Move::new(6, 21)),
            killer: Some(Move::new(1, 18)),
        };
        order_moves(&mut list, &hints, None);
        assert_eq!(
            list,
            vec![Move::new(12, 28), Move::new(6, 21), Move::new(1, 18), Move::new(1, 16), Move::capture(11, 20)]
        );
    }

    #[test]
    fn history_ranks_the_rest_and_ties_keep_generation_order() {
        let mut list = moves();
        let mut history = HistoryTable::default();
        history.bump(Move::new(12, 28), 2);
        history.bump(Move::new(6, 21), 3);
        order_moves(&mut list, &OrderingHints::default(), Some(&history));
        assert_eq!(
            list,
            vec![Move::new(6, 21), Move::new(12, 28), Move::new(1, 16), Move::new(1, 18), Move::capture(11, 20)]
        );
    }

    #[test]
    fn test_hash_move_beats_history() {
        let mut list = moves();
        let mut history = HistoryTable::default();
        history.bump(Move::new(6, 21), 10);
        let hints = OrderingHints { hash_move: Some(Move::capture(11, 20)), ..Default::default() };
        order_moves(&mut list, &hints, Some(&history));
        assert_eq!(list[0], Move::capture(11, 20));
        assert_eq!(list[1], Move::new(6, 21));
    }

    #[test]
    fn no_hints_is_identity() {
        let mut list = moves();
        order_moves(&mut list, &OrderingHints::default(), None);
        assert_eq!(list, moves());
    }

    #[test]
    fn captures_take_the_biggest_victim_with_the_smallest_attacker() {
        // Queen and pawn can both take the d5 rook
        let position = Position::from_fen("4k3/8/8/1p1r4/2P5/1n6/3Q4/N3K3 w - - 0 1").unwrap();
        let mut captures =
            vec![Move::capture(0, 17), Move::capture(11, 35), Move::capture(26, 33), Move::capture(26, 35)];
        order_captures(&mut captures, &position);
        assert_eq!(
            captures,
            vec![Move::capture(26, 35), Move::capture(11, 35), Move::capture(0, 17), Move::capture(26, 33)]
        );
    }
}
