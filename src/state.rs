use crate::data::{Cost, Pos};

/// `heap_index` of a state that is not in the frontier.
pub(crate) const NOT_IN_HEAP: i32 = -1;

/// A search node. States live in the context's state arena and `parent` is an
/// index into that same arena. `crates` is the index of a slot in the bitset
/// arena; `None` means the problem's initial crate bit-vector, which every
/// state on a push-free path shares instead of copying.
#[derive(Debug, Clone, Copy)]
pub(crate) struct State {
    pub(crate) priority: f32,
    pub(crate) heuristic: Cost,
    pub(crate) cost: Cost,
    pub(crate) parent: Option<u32>,
    pub(crate) heap_index: i32,
    pub(crate) action: u8,
    pub(crate) player: Pos,
    pub(crate) crates: Option<u32>,
}

impl Default for State {
    fn default() -> Self {
        State {
            priority: 0.0,
            heuristic: 0,
            cost: 0,
            parent: None,
            heap_index: NOT_IN_HEAP,
            action: 0,
            player: 0,
            crates: None,
        }
    }
}
