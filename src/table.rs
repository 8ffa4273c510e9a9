use std::hash::BuildHasher;

use fnv::FnvBuildHasher;

use crate::bitset::{self, Word};
use crate::data::Pos;
use crate::state::State;

const EMPTY: u32 = u32::MAX;

/// Resolves the `(player, crates)` key of a state stored in the arena.
#[derive(Debug)]
pub(crate) struct Keys<'a> {
    pub(crate) states: &'a [State],
    pub(crate) bitsets: &'a [Word],
    pub(crate) initial_crates: &'a [Word],
    pub(crate) words: usize,
}

impl Keys<'_> {
    fn crates_of(&self, state: &State) -> &[Word] {
        match state.crates {
            None => self.initial_crates,
            Some(slot) => &self.bitsets[slot as usize * self.words..][..self.words],
        }
    }
}

/// Hash of the `(player, crates)` key: the crates hash shifted by one so that
/// states differing only in player position still spread.
pub(crate) fn state_hash(player: Pos, crates: &[Word]) -> u64 {
    let hasher = FnvBuildHasher::default();
    let player_hash = hasher.hash_one(player);
    let crates_hash = hasher.hash_one(crates);
    player_hash ^ (crates_hash << 1)
}

/// Open-addressed set of state indices keyed by `(player, crates)`.
/// Sized once from the context's capacity; insert never grows the table, and
/// the load factor stays below 1/2 so probe runs are short and always end.
#[derive(Debug, Default)]
pub(crate) struct StateTable {
    buckets: Vec<u32>,
    mask: u64,
}

impl StateTable {
    pub(crate) fn new() -> Self {
        StateTable::default()
    }

    /// Returns false on allocation failure.
    pub(crate) fn try_reserve(&mut self, state_count: usize) -> bool {
        let len = (state_count * 2).next_power_of_two();
        if self.buckets.try_reserve_exact(len).is_err() {
            return false;
        }
        self.buckets.resize(len, EMPTY);
        self.mask = (len - 1) as u64;
        true
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.fill(EMPTY);
    }

    /// Equality compares the player first, then the crate bit-vectors.
    pub(crate) fn lookup(&self, hash: u64, player: Pos, crates: &[Word], keys: &Keys<'_>) -> Option<u32> {
        let mut bucket = (hash & self.mask) as usize;
        loop {
            let entry = self.buckets[bucket];
            if entry == EMPTY {
                return None;
            }
            let state = &keys.states[entry as usize];
            if state.player == player && bitset::compare(keys.crates_of(state), crates).is_eq() {
                return Some(entry);
            }
            bucket = (bucket + 1) & self.mask as usize;
        }
    }

    /// The caller must have verified through `lookup` that the key is absent.
    pub(crate) fn insert(&mut self, hash: u64, index: u32) {
        let mut bucket = (hash & self.mask) as usize;
        while self.buckets[bucket] != EMPTY {
            bucket = (bucket + 1) & self.mask as usize;
        }
        self.buckets[bucket] = index;
    }
}
