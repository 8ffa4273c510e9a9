use std::collections::VecDeque;
use std::fmt::{self, Display, Formatter};

use crate::bitset::{self, Word};
use crate::context::Context;
use crate::data::{directions, offset, Cost, Count, Pos};

fn is_tile(byte: u8) -> bool {
    matches!(
        byte,
        b'W' | b'w' | b'.' | b'0' | b'1' | b'A' | b'a' | b'g' | b'G' | b'+'
    )
}

/// The static puzzle plus everything derived from it at parse time: the
/// deadlock map, the per-cell push distance to the nearest goal and the
/// solvability verdicts. All bit-vectors cover the padded grid whose outer
/// ring is always wall.
#[derive(Debug, Clone)]
pub struct Problem {
    pub(crate) goal_count: Count,
    pub(crate) player: Pos,
    pub(crate) walls: Vec<Word>,
    pub(crate) goals: Vec<Word>,
    pub(crate) crates: Vec<Word>,
    /// Set bit: a single crate there can never be pushed onto any goal.
    pub(crate) deadlocks: Vec<Word>,
    /// Reverse-push distance to the nearest goal; `area` where unreachable.
    pub(crate) heuristics: Vec<Cost>,
    pub(crate) compilable: bool,
    pub(crate) potentially_solvable: bool,
    pub(crate) width: Pos,
    pub(crate) height: Pos,
    pub(crate) area: Pos,
}

impl Problem {
    /// Allocates a problem sized for `context`. The same problem can be
    /// re-parsed any number of times; every parse resets the buffers.
    pub fn new(context: &Context) -> Self {
        let words = context.words;
        Problem {
            goal_count: 0,
            player: 0,
            walls: vec![0; words],
            goals: vec![0; words],
            crates: vec![0; words],
            deadlocks: vec![0; words],
            heuristics: vec![0; usize::from(context.area)],
            compilable: false,
            potentially_solvable: false,
            width: context.width,
            height: context.height,
            area: context.area,
        }
    }

    pub fn compilable(&self) -> bool {
        self.compilable
    }

    pub fn potentially_solvable(&self) -> bool {
        self.potentially_solvable
    }

    pub fn goal_count(&self) -> Count {
        self.goal_count
    }

    /// The deadlock map over the padded grid, one bit per cell.
    pub fn deadlock_map(&self) -> &[u64] {
        &self.deadlocks
    }

    /// Parses `text` into the padded grid and runs the static analyses.
    /// Tiles fill the interior row by row; characters outside the tile
    /// alphabet are skipped without consuming a cell and a NUL byte ends
    /// parsing early (unfilled cells stay walls). Returns whether the level
    /// is compilable: exactly one player, as many crates as goals, and at
    /// least one crate off a goal.
    pub fn parse(&mut self, text: &str) -> bool {
        self.walls.fill(!0);
        self.goals.fill(0);
        self.crates.fill(0);
        self.player = 0;
        let mut goal_count: Count = 0;
        let mut crate_count: Count = 0;
        let mut player_count: Count = 0;

        let width = usize::from(self.width);
        let mut bytes = text.bytes();
        'grid: for y in 1..usize::from(self.height) - 1 {
            for x in 1..width - 1 {
                let tile = loop {
                    match bytes.next() {
                        None | Some(0) => break 'grid,
                        Some(byte) if is_tile(byte) => break byte,
                        Some(_) => {}
                    }
                };
                let pos = (y * width + x) as Pos;
                if tile != b'W' && tile != b'w' {
                    bitset::clear(&mut self.walls, pos);
                }
                match tile {
                    b'0' => {
                        bitset::set(&mut self.goals, pos);
                        goal_count += 1;
                    }
                    b'1' => {
                        bitset::set(&mut self.crates, pos);
                        crate_count += 1;
                    }
                    b'A' | b'a' => {
                        self.player = pos;
                        player_count += 1;
                    }
                    b'g' | b'G' => {
                        bitset::set(&mut self.goals, pos);
                        goal_count += 1;
                        bitset::set(&mut self.crates, pos);
                        crate_count += 1;
                    }
                    b'+' => {
                        bitset::set(&mut self.goals, pos);
                        goal_count += 1;
                        self.player = pos;
                        player_count += 1;
                    }
                    _ => {}
                }
            }
        }

        self.goal_count = goal_count;
        let valid = player_count == 1
            && goal_count == crate_count
            && !bitset::equals(&self.crates, &self.goals);
        self.compilable = valid;

        let mut solvable = valid;
        if solvable {
            solvable = !self.has_full_2x2_deadlock();
        }
        if solvable {
            self.generate_deadlock_map();
            solvable = !bitset::covers_any(&self.crates, &self.deadlocks);
        }
        if solvable {
            solvable = self.check_reachability();
        }
        self.potentially_solvable = solvable;
        self.compilable
    }

    /// Reverse-push BFS from every goal: a crate can be "pulled" from `next`
    /// back towards a goal only if the cell beyond `next` is free for the
    /// player. Cells never reached this way are deadlocks, and the pull
    /// distances double as the admissible per-crate heuristic (walls block,
    /// other crates are ignored).
    fn generate_deadlock_map(&mut self) {
        self.deadlocks.fill(!0);
        self.heuristics.fill(self.area);

        let dirs = directions(self.width);
        let mut queue = VecDeque::new();
        for position in 0..self.area {
            if !bitset::get(&self.goals, position) {
                continue;
            }
            bitset::clear(&mut self.deadlocks, position);
            self.heuristics[usize::from(position)] = 0;
            queue.push_back(position);
            while let Some(current) = queue.pop_front() {
                let cost = self.heuristics[usize::from(current)] + 1;
                for &dir in &dirs {
                    let next = offset(current, dir);
                    if bitset::get(&self.walls, next) {
                        continue;
                    }
                    if !bitset::get(&self.deadlocks, next)
                        && self.heuristics[usize::from(next)] <= cost
                    {
                        continue;
                    }
                    let beyond = offset(next, dir);
                    if bitset::get(&self.walls, beyond) {
                        continue;
                    }
                    queue.push_back(next);
                    bitset::clear(&mut self.deadlocks, next);
                    self.heuristics[usize::from(next)] = cost;
                }
            }
        }
    }

    /// A 2×2 window filled entirely by walls and crates with at least one
    /// crate off a goal can never be cleared, so the level is statically
    /// unsolvable.
    fn has_full_2x2_deadlock(&self) -> bool {
        let width = self.width;
        for y in 0..self.height - 1 {
            for x in 0..width - 1 {
                let corner = y * width + x;
                let window = [corner, corner + 1, corner + width, corner + width + 1];
                let mut off_goal_crates = 0;
                let mut closed = true;
                for &pos in &window {
                    let has_crate = bitset::get(&self.crates, pos);
                    if !has_crate && !bitset::get(&self.walls, pos) {
                        closed = false;
                        break;
                    }
                    if has_crate && !bitset::get(&self.goals, pos) {
                        off_goal_crates += 1;
                    }
                }
                if closed && off_goal_crates > 0 {
                    return true;
                }
            }
        }
        false
    }

    /// Flood-fills from the player across non-wall cells and requires every
    /// mismatched cell (crate without goal, goal without crate) to be
    /// reachable.
    fn check_reachability(&self) -> bool {
        let mut reach = vec![0; self.walls.len()];
        bitset::set(&mut reach, self.player);
        let mut stack = vec![self.player];
        let dirs = directions(self.width);
        while let Some(current) = stack.pop() {
            for &dir in &dirs {
                let next = offset(current, dir);
                if bitset::get(&self.walls, next) || bitset::get(&reach, next) {
                    continue;
                }
                bitset::set(&mut reach, next);
                stack.push(next);
            }
        }

        let mut free_objects = vec![0; self.walls.len()];
        bitset::xor(&self.crates, &self.goals, &mut free_objects);
        bitset::covers_all(&free_objects, &reach)
    }

    /// Renders the padded grid with an arbitrary player position and crate
    /// bit-vector, in the same tile alphabet the parser reads.
    pub fn render_state(&self, player: Pos, crates: &[u64]) -> String {
        let mut out = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let position = y * self.width + x;
                let tile = if bitset::get(&self.walls, position) {
                    'W'
                } else if bitset::get(&self.goals, position) {
                    if player == position {
                        '+'
                    } else if bitset::get(crates, position) {
                        'g'
                    } else {
                        '0'
                    }
                } else if player == position {
                    'A'
                } else if bitset::get(crates, position) {
                    '1'
                } else {
                    '.'
                };
                out.push(tile);
            }
            out.push('\n');
        }
        out
    }

    /// Renders a bit-vector over the padded grid, `#` for set bits.
    pub fn render_bits(&self, bits: &[u64]) -> String {
        let mut out = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(if bitset::get(bits, y * self.width + x) { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_state(self.player, &self.crates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(width: u8, height: u8, level: &str) -> (Problem, bool) {
        let context = Context::new(width, height, 1);
        let mut problem = Problem::new(&context);
        let compilable = problem.parse(level);
        (problem, compilable)
    }

    #[test]
    fn corridor_level() {
        let (problem, compilable) = parsed(5, 1, "A.1.0");
        assert!(compilable);
        assert!(problem.potentially_solvable());
        assert_eq!(problem.goal_count(), 1);
        assert_eq!(problem.player, 8);
        assert_eq!(
            problem.to_string(),
            "WWWWWWW\n\
             WA.1.0W\n\
             WWWWWWW\n"
        );
    }

    #[test]
    fn mismatched_counts_are_not_compilable() {
        // one goal (under the player), two crates
        let (problem, compilable) = parsed(4, 4, "....|..+.|.11.|....");
        assert!(!compilable);
        assert!(!problem.potentially_solvable());
    }

    #[test]
    fn solved_level_is_not_compilable() {
        // every crate already sits on a goal
        let (_, compilable) = parsed(3, 1, "Ag.");
        assert!(!compilable);
    }

    #[test]
    fn two_players_are_not_compilable() {
        let (_, compilable) = parsed(5, 1, "AA1.0");
        assert!(!compilable);
    }

    #[test]
    fn unknown_characters_do_not_consume_cells() {
        let (plain, _) = parsed(5, 1, "A.1.0");
        let (spaced, compilable) = parsed(5, 1, " A . 1\n.  0 \n");
        assert!(compilable);
        assert_eq!(spaced.to_string(), plain.to_string());
    }

    #[test]
    fn nul_ends_parsing_and_leaves_walls() {
        let (problem, compilable) = parsed(5, 1, "A.1\0.0");
        assert!(!compilable);
        // the last two cells were never cleared
        assert_eq!(
            problem.to_string(),
            "WWWWWWW\n\
             WA.1WWW\n\
             WWWWWWW\n"
        );
    }

    #[test]
    fn lowercase_tiles_parse_like_uppercase() {
        let (upper, _) = parsed(5, 1, "A.1W0");
        let (lower, compilable) = parsed(5, 1, "a.1w0");
        assert!(compilable);
        assert_eq!(lower.to_string(), upper.to_string());
    }

    #[test]
    fn corridor_deadlock_map_and_heuristics() {
        let (problem, _) = parsed(5, 1, "A.1.0");
        // the leftmost cell has no cell behind it to pull from
        assert_eq!(
            problem.render_bits(problem.deadlock_map()),
            "#######\n\
             ##....#\n\
             #######\n"
        );
        // pull distances from the goal at x=5
        assert_eq!(problem.heuristics[8..13], [problem.area, 3, 2, 1, 0]);
    }

    #[test]
    fn initial_crate_on_deadlock_cell() {
        // the crate starts in a corner it can never leave
        let (problem, compilable) = parsed(4, 1, "1A.0");
        assert!(compilable);
        assert!(!problem.potentially_solvable());
    }

    #[test]
    fn full_2x2_crate_block_is_statically_unsolvable() {
        let (problem, compilable) = parsed(4, 4, ".10.|..A.|0110|0110");
        assert!(compilable);
        assert!(!problem.potentially_solvable());
    }

    #[test]
    fn full_2x2_of_crates_on_goals_is_fine() {
        let (problem, compilable) = parsed(4, 4, "gg.0|gg1.|.A..|....");
        assert!(compilable);
        assert!(problem.potentially_solvable());
    }

    #[test]
    fn unreachable_free_goal_fails_reachability() {
        // the right chamber is sealed off from the player; its crate could
        // still reach the chamber goal, so only reachability catches this
        let (problem, compilable) = parsed(5, 3, "..0W0|.1.W1|A..W.");
        assert!(compilable);
        assert!(!problem.potentially_solvable());
    }

    #[test]
    fn reparsing_is_idempotent() {
        let context = Context::new(5, 3, 1);
        let mut problem = Problem::new(&context);
        assert!(problem.parse("..0W0|.1.W1|A..W."));
        let first = problem.clone();
        assert!(problem.parse("..0W0|.1.W1|A..W."));
        assert_eq!(problem.walls, first.walls);
        assert_eq!(problem.goals, first.goals);
        assert_eq!(problem.crates, first.crates);
        assert_eq!(problem.deadlocks, first.deadlocks);
        assert_eq!(problem.heuristics, first.heuristics);
        assert_eq!(problem.player, first.player);
        assert_eq!(problem.potentially_solvable, first.potentially_solvable);
    }

    #[test]
    fn reparsing_resets_previous_level() {
        let context = Context::new(5, 1, 1);
        let mut problem = Problem::new(&context);
        assert!(problem.parse("A.1.0"));
        let first = problem.to_string();
        assert!(problem.parse("0.1.A"));
        assert!(problem.parse("A.1.0"));
        assert_eq!(problem.to_string(), first);
    }
}
