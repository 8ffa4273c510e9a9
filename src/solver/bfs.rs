use crate::bitset;
use crate::context::Context;
use crate::problem::Problem;
use crate::state::State;
use crate::table::{state_hash, Keys};

use super::{crates_slice, reconstruct, try_move, SolveResult};

/// Breadth-first search. The state arena doubles as the FIFO queue: states
/// are appended in discovery order, so walking a cursor from the front
/// expands them in strict level order and no separate queue exists. Every
/// move costs 1, so the first push that produces the goal configuration is
/// already optimal and the goal test runs at generation time.
pub fn solve_bfs(context: &mut Context, problem: &Problem, max_iterations: u64) -> SolveResult {
    if !problem.potentially_solvable {
        return SolveResult::unsolvable(0);
    }
    if !context.ensure_pools() {
        return SolveResult::limit(0);
    }
    debug_assert_eq!(problem.area, context.area);
    context.table.clear();
    let words = context.words;
    let state_count = context.state_count;

    context.states[0] = State {
        player: problem.player,
        ..State::default()
    };
    context.table.insert(state_hash(problem.player, &problem.crates), 0);
    let mut free_state: usize = 1;
    let mut free_bits: usize = 0;

    let mut current: usize = 0;
    let mut iterations: u64 = 0;
    while current < free_state {
        if max_iterations > 0 && iterations >= max_iterations {
            return SolveResult::limit(iterations);
        }
        iterations += 1;
        let parent = context.states[current];
        let parent_index = current as u32;
        current += 1;
        let cost = parent.cost + 1;

        for dir_index in 0..4 {
            let expansion = match try_move(
                problem,
                &mut context.bitsets,
                free_bits,
                parent.player,
                parent.crates,
                dir_index,
            ) {
                Some(expansion) => expansion,
                None => continue,
            };
            let crates = if expansion.pushed {
                Some(free_bits as u32)
            } else {
                parent.crates
            };
            let child_bits = crates_slice(&context.bitsets, &problem.crates, crates, words);
            if expansion.pushed && bitset::equals(child_bits, &problem.goals) {
                let actions = reconstruct(&context.states, parent_index, expansion.action, cost);
                return SolveResult::solved(actions, iterations);
            }
            let hash = state_hash(expansion.player, child_bits);
            let keys = Keys {
                states: &context.states,
                bitsets: &context.bitsets,
                initial_crates: &problem.crates,
                words,
            };
            if context.table.lookup(hash, expansion.player, child_bits, &keys).is_some() {
                // duplicate; the tentative bit-vector was never committed
                continue;
            }
            if expansion.pushed {
                free_bits += 1;
            }
            context.states[free_state] = State {
                parent: Some(parent_index),
                action: expansion.action,
                player: expansion.player,
                crates,
                cost,
                ..State::default()
            };
            context.table.insert(hash, free_state as u32);
            free_state += 1;
            if free_state == state_count {
                return SolveResult::limit(iterations);
            }
        }
    }
    SolveResult::unsolvable(iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::tests::replay;

    const TWO_CRATES: &str = "..0.|..+.|.11.|....";

    fn solve(width: u8, height: u8, capacity: usize, level: &str, max_iterations: u64) -> (SolveResult, Problem) {
        let mut context = Context::new(width, height, capacity);
        let mut problem = Problem::new(&context);
        assert!(problem.parse(level));
        let result = solve_bfs(&mut context, &problem, max_iterations);
        (result, problem)
    }

    #[test]
    fn corridor_solution() {
        let (result, _) = solve(5, 1, 100, "A.1.0", 0);
        assert_eq!(result.actions.as_deref(), Some("rRR"));
        assert_eq!(result.iterations, 3);
        assert!(result.solved);
        assert!(!result.limit_exceeded);
    }

    #[test]
    fn two_crates_optimal_length() {
        let (result, problem) = solve(4, 4, 100_000, TWO_CRATES, 10_000);
        assert!(result.solved);
        let actions = result.actions.unwrap();
        assert_eq!(actions.len(), 12);
        let crates = replay(&problem, &actions);
        assert!(bitset::equals(&crates, &problem.goals));
    }

    #[test]
    fn statically_unsolvable_level_is_not_searched() {
        let mut context = Context::new(4, 4, 100);
        let mut problem = Problem::new(&context);
        assert!(problem.parse(".10.|..A.|0110|0110"));
        assert!(!problem.potentially_solvable());
        let result = solve_bfs(&mut context, &problem, 10_000);
        assert_eq!(result, SolveResult::unsolvable(0));
    }

    #[test]
    fn exhaustion_proves_unsolvable() {
        // the right crate can only ever be pushed away from the goals
        let (result, _) = solve(9, 1, 10_000, "00.1A1...", 0);
        assert!(!result.solved);
        assert!(!result.limit_exceeded);
        assert!(result.iterations > 0);
    }

    #[test]
    fn iteration_limit() {
        let (result, _) = solve(4, 4, 100_000, TWO_CRATES, 1);
        assert!(!result.solved);
        assert!(result.limit_exceeded);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn root_expansion_may_still_solve_under_a_tight_limit() {
        let (result, _) = solve(3, 1, 100, "A10", 1);
        assert!(result.solved);
        assert_eq!(result.actions.as_deref(), Some("R"));
    }

    #[test]
    fn capacity_limit() {
        let (result, _) = solve(4, 4, 1, TWO_CRATES, 0);
        assert!(!result.solved);
        assert!(result.limit_exceeded);
    }

    #[test]
    fn deterministic_output() {
        let mut context = Context::new(4, 4, 100_000);
        let mut problem = Problem::new(&context);
        assert!(problem.parse(TWO_CRATES));
        let first = solve_bfs(&mut context, &problem, 0);
        let second = solve_bfs(&mut context, &problem, 0);
        assert_eq!(first, second);
    }
}
