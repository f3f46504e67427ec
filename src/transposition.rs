//! Transposition cache.
//!
//! Two interchangeable strategies behind `TranspositionCache`: an exact
//! chained map, and a fixed array of 16-byte slots with always-replace
//! writes and explicit type-1 collision accounting.

use std::collections::HashMap;
use std::fmt;

use crate::chess_move::Move;
use crate::error::SearchError;
use crate::position::PieceKind;
use crate::zobrist::HashKey;

/// How a stored score relates to the true score of the node.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NodeType {
    /// Exact score; some move raised alpha
    Pv,
    /// Lower bound; a move reached beta
    Cut,
    /// Upper bound; no move raised alpha
    All,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Entry {
    pub node_type: NodeType,
    /// Remaining depth the score was searched to, 0..=63
    pub depth: u8,
    pub score: i32,
    pub mv: Option<Move>,
}

/// Diagnostic counters. Never consulted by the search itself.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Slot matched by index, rejected by key
    pub collisions: u64,
    pub occupied: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Load against `capacity`, capped at 100. The chained cache's capacity
    /// is nominal and its entry count can exceed it.
    pub fn percent_full(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        (self.occupied as f64 * 100.0 / self.capacity as f64).min(100.0)
    }

    pub fn hit_rate(&self) -> f64 {
        let probes = self.hits + self.misses + self.collisions;
        if probes == 0 {
            return 0.0;
        }
        self.hits as f64 * 100.0 / probes as f64
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache {:.1}% full, {:.1}% hits ({} hits, {} misses, {} collisions)",
            self.percent_full(),
            self.hit_rate(),
            self.hits,
            self.misses,
            self.collisions
        )
    }
}

/// Maps a position fingerprint to the last search result stored for it.
pub trait TranspositionCache<K: HashKey> {
    fn get(&mut self, key: K) -> Option<Entry>;

    /// Stores `entry`, replacing whatever the slot held.
    fn set(&mut self, key: K, entry: Entry);

    fn stats(&self) -> CacheStats;

    fn clear(&mut self);
}

/// Nested maps on the two key halves: exact, no false hits, grows without
/// bound. `capacity` only scales the percent-full figure.
#[derive(Debug, Clone, Default)]
pub struct ChainedCache {
    table: HashMap<u32, HashMap<u32, Entry>>,
    occupied: usize,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl ChainedCache {
    pub fn new(nominal_bytes: usize) -> Self {
        ChainedCache { capacity: nominal_bytes / ENTRY_SIZE, ..Default::default() }
    }
}

impl<K: HashKey> TranspositionCache<K> for ChainedCache {
    fn get(&mut self, key: K) -> Option<Entry> {
        let found = self.table.get(&key.primary()).and_then(|chain| chain.get(&key.secondary())).copied();
        match found {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        found
    }

    fn set(&mut self, key: K, entry: Entry) {
        let chain = self.table.entry(key.primary()).or_default();
        if chain.insert(key.secondary(), entry).is_none() {
            self.occupied += 1;
        }
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            collisions: 0,
            occupied: self.occupied,
            capacity: self.capacity,
        }
    }

    fn clear(&mut self) {
        self.table.clear();
        self.occupied = 0;
        self.hits = 0;
        self.misses = 0;
    }
}

/// Bytes per packed slot.
pub const ENTRY_SIZE: usize = 16;

/// One packed slot: metadata word, move word, full key.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
struct Slot<K: HashKey> {
    meta: u32,
    mv: u32,
    key: K,
}

const NODE_TYPE_BITS: u32 = 0b11;
const DEPTH_SHIFT: u32 = 2;
const DEPTH_MASK: u32 = 0x3F;
const SCORE_SHIFT: u32 = 8;
/// Scores must fit a signed 24-bit field.
pub const SCORE_LIMIT: i32 = (1 << 23) - 1;

/// Packs node type (0 reserved for empty), depth and score into one word.
pub fn pack_meta(node_type: NodeType, depth: u8, score: i32) -> u32 {
    debug_assert!(depth as u32 <= DEPTH_MASK, "depth {} exceeds 6 bits", depth);
    debug_assert!((-SCORE_LIMIT..=SCORE_LIMIT).contains(&score), "score {} exceeds 24 bits", score);
    let code = match node_type {
        NodeType::Pv => 1,
        NodeType::Cut => 2,
        NodeType::All => 3,
    };
    code | ((depth as u32 & DEPTH_MASK) << DEPTH_SHIFT) | ((score as u32) << SCORE_SHIFT)
}

/// Inverse of `pack_meta`; `None` for an empty slot.
pub fn unpack_meta(meta: u32) -> Option<(NodeType, u8, i32)> {
    let node_type = match meta & NODE_TYPE_BITS {
        1 => NodeType::Pv,
        2 => NodeType::Cut,
        3 => NodeType::All,
        _ => return None,
    };
    let depth = ((meta >> DEPTH_SHIFT) & DEPTH_MASK) as u8;
    // arithmetic shift sign-extends the 24-bit score
    let score = (meta as i32) >> SCORE_SHIFT;
    Some((node_type, depth, score))
}

const PROMOTION_SHIFT: u32 = 12;
const ATTACK_BIT: u32 = 1 << 15;

/// from 6 bits, to 6 bits, promotion 3 bits, attack flag. Zero means no move;
/// `Move::new` rejects from == to, so no real move packs to zero.
pub fn pack_move(mv: Option<Move>) -> u32 {
    let Some(mv) = mv else {
        return 0;
    };
    let promotion = match mv.promotion() {
        None => 0,
        Some(PieceKind::Knight) => 1,
        Some(PieceKind::Bishop) => 2,
        Some(PieceKind::Rook) => 3,
        Some(PieceKind::Queen) => 4,
        Some(kind) => unreachable!("cannot promote to {:?}", kind),
    };
    let attack = if mv.is_attack() { ATTACK_BIT } else { 0 };
    (mv.from() as u32) | ((mv.to() as u32) << 6) | (promotion << PROMOTION_SHIFT) | attack
}

pub fn unpack_move(word: u32) -> Option<Move> {
    if word == 0 {
        return None;
    }
    let from = (word & 0x3F) as u8;
    let to = ((word >> 6) & 0x3F) as u8;
    let mut mv = if word & ATTACK_BIT != 0 { Move::capture(from, to) } else { Move::new(from, to) };
    mv = match (word >> PROMOTION_SHIFT) & 0b111 {
        1 => mv.with_promotion(PieceKind::Knight),
        2 => mv.with_promotion(PieceKind::Bishop),
        3 => mv.with_promotion(PieceKind::Rook),
        4 => mv.with_promotion(PieceKind::Queen),
        _ => mv,
    };
    Some(mv)
}

/// Fixed-capacity array of packed slots indexed by the key's primary half.
#[derive(Debug, Clone)]
pub struct PackedCache<K: HashKey> {
    slots: Vec<Slot<K>>,
    occupied: usize,
    hits: u64,
    misses: u64,
    collisions: u64,
}

impl<K: HashKey> PackedCache<K> {
    /// Splits `bytes` into 16-byte slots. The budget must be a positive
    /// multiple of the slot size.
    pub fn new(bytes: usize) -> Result<Self, SearchError> {
        debug_assert_eq!(std::mem::size_of::<Slot<K>>(), ENTRY_SIZE);
        if bytes == 0 || bytes % ENTRY_SIZE != 0 {
            return Err(SearchError::InvalidCacheSize { bytes, entry_size: ENTRY_SIZE });
        }
        Ok(PackedCache {
            slots: vec![Slot::default(); bytes / ENTRY_SIZE],
            occupied: 0,
            hits: 0,
            misses: 0,
            collisions: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn index(&self, key: K) -> usize {
        key.primary() as usize % self.slots.len()
    }
}

impl<K: HashKey> TranspositionCache<K> for PackedCache<K> {
    fn get(&mut self, key: K) -> Option<Entry> {
        let slot = self.slots[self.index(key)];
        let Some((node_type, depth, score)) = unpack_meta(slot.meta) else {
            self.misses += 1;
            return None;
        };
        if slot.key != key {
            self.collisions += 1;
            return None;
        }
        self.hits += 1;
        Some(Entry { node_type, depth, score, mv: unpack_move(slot.mv) })
    }

    fn set(&mut self, key: K, entry: Entry) {
        let index = self.index(key);
        let slot = &mut self.slots[index];
        if slot.meta == 0 {
            self.occupied += 1;
        }
        *slot = Slot {
            meta: pack_meta(entry.node_type, entry.depth, entry.score),
            mv: pack_move(entry.mv),
            key,
        };
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            collisions: self.collisions,
            occupied: self.occupied,
            capacity: self.slots.len(),
        }
    }

    fn clear(&mut self) {
        self.slots.fill(Slot::default());
        self.occupied = 0;
        self.hits = 0;
        self.misses = 0;
        self.collisions = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zobrist::KeyPair;

    fn entry(node_type: NodeType, depth: u8, score: i32, mv: Option<Move>) -> Entry {
        Entry { node_type, depth, score, mv }
    }

    #[test]
    fn test_store_and_probe() {
        let mut cache = PackedCache::<u64>::new(1 << 20).unwrap();
        let hash = 123456789;
        let stored = entry(NodeType::Pv, 4, 100, Some(Move::new(12, 28)));

        cache.set(hash, stored);
        assert_eq!(cache.get(hash), Some(stored));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().occupied, 1);
    }

    #[test]
    fn slot_is_sixteen_bytes_for_both_widths() {
        assert_eq!(std::mem::size_of::<Slot<u64>>(), ENTRY_SIZE);
        assert_eq!(std::mem::size_of::<Slot<KeyPair>>(), ENTRY_SIZE);
    }

    #[test]
    fn packed_entries_round_trip() {
        let moves = [
            None,
            Some(Move::new(1, 0)),
            Some(Move::new(63, 62)),
            Some(Move::capture(52, 61).with_promotion(PieceKind::Queen)),
            Some(Move::new(8, 0).with_promotion(PieceKind::Knight)),
            Some(Move::new(48, 56).with_promotion(PieceKind::Bishop)),
            Some(Move::capture(9, 0).with_promotion(PieceKind::Rook)),
        ];
        let scores = [0, 1, -1, 100_063, -100_063, 1_000_000, -1_000_000, SCORE_LIMIT, -SCORE_LIMIT];
        for node_type in [NodeType::Pv, NodeType::Cut, NodeType::All] {
            for depth in 0..=63u8 {
                for &score in &scores {
                    let meta = pack_meta(node_type, depth, score);
                    assert_ne!(meta, 0);
                    assert_eq!(unpack_meta(meta), Some((node_type, depth, score)));
                }
            }
        }
        for mv in moves {
            assert_eq!(unpack_move(pack_move(mv)), mv);
        }
        assert_eq!(unpack_meta(0), None);
    }

    #[test]
    fn aliasing_keys_count_one_collision() {
        let mut cache = PackedCache::<u64>::new(64 * ENTRY_SIZE).unwrap();
        let first = 5u64;
        let second = 5u64 + 64 + (7 << 32);
        cache.set(first, entry(NodeType::Cut, 3, 50, None));

        assert_eq!(cache.get(second), None);
        let stats = cache.stats();
        assert_eq!(stats.collisions, 1);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);

        assert_eq!(cache.get(77), None);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().collisions, 1);
    }

    #[test]
    fn writes_always_replace() {
        let mut cache = PackedCache::<KeyPair>::new(16 * ENTRY_SIZE).unwrap();
        let deep = KeyPair(3, 11);
        let shallow_alias = KeyPair(3 + 16, 12);

        cache.set(deep, entry(NodeType::Pv, 20, 35, Some(Move::new(6, 21))));
        cache.set(deep, entry(NodeType::All, 1, -5, None));
        assert_eq!(cache.get(deep), Some(entry(NodeType::All, 1, -5, None)));

        cache.set(shallow_alias, entry(NodeType::Cut, 0, 9, None));
        assert_eq!(cache.get(shallow_alias), Some(entry(NodeType::Cut, 0, 9, None)));
        assert_eq!(cache.get(deep), None);
        assert_eq!(cache.stats().occupied, 1);
    }

    #[test]
    fn cache_size_must_split_into_entries() {
        assert_eq!(
            PackedCache::<u64>::new(1000).unwrap_err(),
            SearchError::InvalidCacheSize { bytes: 1000, entry_size: 16 }
        );
        assert!(PackedCache::<u64>::new(0).is_err());
        assert_eq!(PackedCache::<u64>::new(1 << 10).unwrap().capacity(), 64);
    }

    #[test]
    fn chained_cache_is_exact() {
        let mut cache = ChainedCache::new(1 << 10);
        let a = KeyPair(1, 2);
        let b = KeyPair(1, 3);
        TranspositionCache::set(&mut cache, a, entry(NodeType::Pv, 2, 10, None));
        assert_eq!(TranspositionCache::get(&mut cache, b), None);
        assert_eq!(TranspositionCache::get(&mut cache, a).map(|e| e.score), Some(10));
        TranspositionCache::set(&mut cache, b, entry(NodeType::All, 2, -3, None));

        let stats = TranspositionCache::<KeyPair>::stats(&cache);
        assert_eq!((stats.hits, stats.misses, stats.collisions), (1, 1, 0));
        assert_eq!(stats.occupied, 2);
        assert!((stats.percent_full() - 2.0 * 100.0 / 64.0).abs() < 1e-9);

        TranspositionCache::<KeyPair>::clear(&mut cache);
        assert_eq!(TranspositionCache::<KeyPair>::stats(&cache).occupied, 0);
    }

    #[test]
    fn stats_display_reports_load() {
        let stats = CacheStats { hits: 3, misses: 1, collisions: 0, occupied: 1, capacity: 4 };
        assert_eq!(stats.to_string(), "cache 25.0% full, 75.0% hits (3 hits, 1 misses, 0 collisions)");
    }

    #[test]
    fn chained_load_is_capped_at_full() {
        let mut cache = ChainedCache::new(2 * ENTRY_SIZE);
        let entry = Entry { node_type: NodeType::All, depth: 1, score: 0, mv: None };
        for key in 1..=5u64 {
            TranspositionCache::<u64>::set(&mut cache, key, entry);
        }
        let stats = TranspositionCache::<u64>::stats(&cache);
        assert_eq!((stats.occupied, stats.capacity), (5, 2));
        assert_eq!(stats.percent_full(), 100.0);
    }
}
