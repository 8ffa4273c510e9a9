/// Position on the padded grid, packed as `y * width + x`.
pub type Pos = u16;

/// Path cost in moves.
pub type Cost = u16;

/// Object counts (crates, goals).
pub type Count = u16;

/// Action characters in direction order, non-push moves first.
/// Pushes use the uppercase letter of the same direction.
pub(crate) const ACTIONS: [u8; 8] = *b"lrduLRDU";

/// Direction offsets on the padded grid, in the order the action alphabet
/// assigns them: left, right, down, up.
pub(crate) fn directions(width: Pos) -> [i32; 4] {
    [-1, 1, i32::from(width), -i32::from(width)]
}

/// Applies a direction offset. Callers check the result against the wall
/// bit-vector immediately; the wall border keeps all probes inside the grid.
pub(crate) fn offset(pos: Pos, dir: i32) -> Pos {
    (i32::from(pos) + dir) as Pos
}
