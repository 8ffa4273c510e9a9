pub(crate) mod a_star;
pub(crate) mod bfs;

use std::fmt::{self, Display, Formatter};

use separator::Separatable;

use crate::bitset::{self, Word};
use crate::data::{directions, offset, Cost, Pos, ACTIONS};
use crate::problem::Problem;
use crate::state::State;

/// The outcome of a search. `actions` is the only allocation that leaves the
/// solver; everything else lives in the context's pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveResult {
    pub solved: bool,
    /// One character per move, uppercase for pushes.
    pub actions: Option<String>,
    /// Expansions performed before returning.
    pub iterations: u64,
    /// True when the iteration cap, the state capacity or an allocation
    /// failure stopped the search.
    pub limit_exceeded: bool,
}

impl SolveResult {
    pub(crate) fn solved(actions: String, iterations: u64) -> Self {
        SolveResult {
            solved: true,
            actions: Some(actions),
            iterations,
            limit_exceeded: false,
        }
    }

    pub(crate) fn unsolvable(iterations: u64) -> Self {
        SolveResult {
            solved: false,
            actions: None,
            iterations,
            limit_exceeded: false,
        }
    }

    pub(crate) fn limit(iterations: u64) -> Self {
        SolveResult {
            solved: false,
            actions: None,
            iterations,
            limit_exceeded: true,
        }
    }
}

impl Display for SolveResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.solved {
            let moves = self.actions.as_ref().map_or(0, String::len);
            writeln!(f, "Solved: {} moves", moves)?;
        } else if self.limit_exceeded {
            writeln!(f, "No solution found: limit exceeded")?;
        } else {
            writeln!(f, "No solution")?;
        }
        write!(f, "Iterations: {}", self.iterations.separated_string())
    }
}

pub(crate) struct Expansion {
    pub(crate) player: Pos,
    pub(crate) action: u8,
    pub(crate) pushed: bool,
}

/// Resolves a state's crate bit-vector against the arena.
pub(crate) fn crates_slice<'a>(
    bitsets: &'a [Word],
    initial: &'a [Word],
    crates: Option<u32>,
    words: usize,
) -> &'a [Word] {
    match crates {
        None => initial,
        Some(slot) => &bitsets[slot as usize * words..][..words],
    }
}

/// Tries one direction from a parent state. A push writes the child's crate
/// bit-vector into the slot at `free_bits`; the caller commits it by bumping
/// the free cursor only when the child survives deduplication, so a rejected
/// duplicate costs nothing.
pub(crate) fn try_move(
    problem: &Problem,
    bitsets: &mut [Word],
    free_bits: usize,
    parent_player: Pos,
    parent_crates: Option<u32>,
    dir_index: usize,
) -> Option<Expansion> {
    let words = problem.walls.len();
    let dir = directions(problem.width)[dir_index];
    let player = offset(parent_player, dir);
    if bitset::get(&problem.walls, player) {
        return None;
    }
    // the parent's slot was committed earlier, so it is always below the cut
    let (committed, free) = bitsets.split_at_mut(free_bits * words);
    let parent_bits: &[Word] = match parent_crates {
        None => &problem.crates,
        Some(slot) => &committed[slot as usize * words..][..words],
    };
    if !bitset::get(parent_bits, player) {
        return Some(Expansion {
            player,
            action: ACTIONS[dir_index],
            pushed: false,
        });
    }
    let next = offset(player, dir);
    if bitset::get(&problem.walls, next)
        || bitset::get(parent_bits, next)
        || bitset::get(&problem.deadlocks, next)
    {
        return None;
    }
    if check_push_2x2_deadlock(problem, parent_bits, next, dir) {
        return None;
    }
    let child_bits = &mut free[..words];
    bitset::copy(parent_bits, child_bits);
    bitset::set(child_bits, next);
    bitset::clear(child_bits, player);
    Some(Expansion {
        player,
        action: ACTIONS[dir_index + 4],
        pushed: true,
    })
}

/// After pushing a crate to `position` along `direction`, examines the two
/// 2×2 squares made of the crate, its cell ahead and one orthogonal side.
/// A square fully closed by walls and crates with at least one crate off a
/// goal locks the level. `crates` is the bit-vector before the push; the
/// pushed crate is accounted for through `position` itself and its old cell
/// is never part of either square.
pub(crate) fn check_push_2x2_deadlock(
    problem: &Problem,
    crates: &[Word],
    position: Pos,
    direction: i32,
) -> bool {
    let ortho = i32::from(problem.width) + 1 - direction.abs();
    let mut off_goal = if bitset::get(&problem.goals, position) { 0 } else { 1 };

    let ahead = offset(position, direction);
    let ahead_crate = bitset::get(crates, ahead);
    if !ahead_crate && !bitset::get(&problem.walls, ahead) {
        return false;
    }
    if ahead_crate && !bitset::get(&problem.goals, ahead) {
        off_goal += 1;
    }

    for &ortho in &[ortho, -ortho] {
        let mut off_goal_in_square = off_goal;
        let side = offset(position, ortho);
        let side_crate = bitset::get(crates, side);
        if !side_crate && !bitset::get(&problem.walls, side) {
            continue;
        }
        if side_crate && !bitset::get(&problem.goals, side) {
            off_goal_in_square += 1;
        }
        let corner = offset(ahead, ortho);
        let corner_crate = bitset::get(crates, corner);
        if !corner_crate && !bitset::get(&problem.walls, corner) {
            continue;
        }
        if corner_crate && !bitset::get(&problem.goals, corner) {
            off_goal_in_square += 1;
        }
        if off_goal_in_square > 0 {
            return true;
        }
    }
    false
}

/// Sum of the precomputed push distances of every crate to its nearest goal.
pub(crate) fn compute_heuristic(problem: &Problem, crates: &[Word]) -> Cost {
    let mut heuristic: Cost = 0;
    for position in bitset::ones(crates) {
        heuristic = heuristic.saturating_add(problem.heuristics[usize::from(position)]);
    }
    heuristic
}

/// Builds the action string by walking the parent chain backwards from the
/// state that generated the goal configuration.
pub(crate) fn reconstruct(states: &[State], parent: u32, last_action: u8, cost: Cost) -> String {
    let mut actions = vec![0u8; usize::from(cost)];
    let mut index = usize::from(cost) - 1;
    actions[index] = last_action;
    let mut current = parent;
    loop {
        let state = &states[current as usize];
        match state.parent {
            // the root carries no action
            None => break,
            Some(next) => {
                index -= 1;
                actions[index] = state.action;
                current = next;
            }
        }
    }
    debug_assert_eq!(index, 0);
    actions.into_iter().map(char::from).collect()
}
