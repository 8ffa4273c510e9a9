use crate::bitset::{self, Word};
use crate::data::Pos;
use crate::heap::MinHeap;
use crate::state::State;
use crate::table::StateTable;

/// The solver arena. Every state and every crate bit-vector a search will
/// ever hold is carved out of these pools, so a search allocates nothing but
/// its final action string. Capacity is fixed at construction; a search that
/// outgrows it reports `limit_exceeded` instead of resizing.
#[derive(Debug)]
pub struct Context {
    pub(crate) width: Pos,
    pub(crate) height: Pos,
    pub(crate) area: Pos,
    /// Words per crate bit-vector.
    pub(crate) words: usize,
    /// Maximum number of live states: `capacity + 1`.
    pub(crate) state_count: usize,
    pub(crate) states: Vec<State>,
    /// `state_count` slots of `words` words each.
    pub(crate) bitsets: Vec<Word>,
    pub(crate) table: StateTable,
    pub(crate) heap: MinHeap,
    pools_ready: bool,
}

impl Context {
    /// `width` and `height` are the raw level dimensions; a one-tile wall
    /// border is added around them. `capacity` is the maximum number of
    /// states a search may ever hold and must be at least 1.
    ///
    /// Panics when `capacity` is 0 or the padded area does not fit in 16
    /// bits (the packed position width).
    pub fn new(width: u8, height: u8, capacity: usize) -> Self {
        assert!(capacity >= 1, "capacity must be at least 1");
        assert!(
            capacity < u32::MAX as usize,
            "state indices are stored as u32"
        );
        let padded_width = usize::from(width) + 2;
        let padded_height = usize::from(height) + 2;
        let area = padded_width * padded_height;
        assert!(
            area <= usize::from(Pos::MAX),
            "padded level area must fit in 16 bits"
        );
        Context {
            width: padded_width as Pos,
            height: padded_height as Pos,
            area: area as Pos,
            words: bitset::words_for(area),
            state_count: capacity + 1,
            states: Vec::new(),
            bitsets: Vec::new(),
            table: StateTable::new(),
            heap: MinHeap::new(),
            pools_ready: false,
        }
    }

    /// Lazily allocates the pools before the first search; later searches
    /// reuse them. Returns false on allocation failure, which the drivers
    /// report as a resource limit.
    pub(crate) fn ensure_pools(&mut self) -> bool {
        if self.pools_ready {
            return true;
        }
        if self.states.try_reserve_exact(self.state_count).is_err() {
            return false;
        }
        self.states.resize(self.state_count, State::default());
        let bitset_words = self.state_count * self.words;
        if self.bitsets.try_reserve_exact(bitset_words).is_err() {
            return false;
        }
        self.bitsets.resize(bitset_words, 0);
        if !self.table.try_reserve(self.state_count) {
            return false;
        }
        if !self.heap.try_reserve(self.state_count) {
            return false;
        }
        self.pools_ready = true;
        true
    }
}
