use crate::bitset;
use crate::context::Context;
use crate::problem::Problem;
use crate::state::State;
use crate::table::{state_hash, Keys};

use super::{compute_heuristic, crates_slice, reconstruct, try_move, SolveResult};

/// Weighted best-first search over the same arena as BFS, with the intrusive
/// min-heap as the frontier. `priority = h_factor * heuristic + g_factor *
/// cost`, so (1, 1) is A*, (0, 1) uniform-cost and (1, 0) greedy best-first.
/// All step costs equal 1 and the heuristic is consistent, which keeps the
/// generation-time goal test optimal for A*.
pub fn solve_astar(
    context: &mut Context,
    problem: &Problem,
    h_factor: f32,
    g_factor: f32,
    max_iterations: u64,
) -> SolveResult {
    if !problem.potentially_solvable {
        return SolveResult::unsolvable(0);
    }
    if !context.ensure_pools() {
        return SolveResult::limit(0);
    }
    debug_assert_eq!(problem.area, context.area);
    context.table.clear();
    context.heap.clear();
    let words = context.words;
    let state_count = context.state_count;

    let root_heuristic = compute_heuristic(problem, &problem.crates);
    context.states[0] = State {
        player: problem.player,
        heuristic: root_heuristic,
        priority: h_factor * f32::from(root_heuristic),
        ..State::default()
    };
    context.table.insert(state_hash(problem.player, &problem.crates), 0);
    context.heap.insert(&mut context.states, 0);
    let mut free_state: usize = 1;
    let mut free_bits: usize = 0;

    let mut iterations: u64 = 0;
    while let Some(parent_index) = context.heap.pop(&mut context.states) {
        if max_iterations > 0 && iterations >= max_iterations {
            return SolveResult::limit(iterations);
        }
        iterations += 1;
        let parent = context.states[parent_index as usize];
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
            match context.table.lookup(hash, expansion.player, child_bits, &keys) {
                None => {
                    // the heuristic depends only on crate positions
                    let heuristic = if expansion.pushed {
                        compute_heuristic(problem, child_bits)
                    } else {
                        parent.heuristic
                    };
                    if expansion.pushed {
                        free_bits += 1;
                    }
                    context.states[free_state] = State {
                        parent: Some(parent_index),
                        action: expansion.action,
                        player: expansion.player,
                        crates,
                        cost,
                        heuristic,
                        priority: g_factor * f32::from(cost) + h_factor * f32::from(heuristic),
                        ..State::default()
                    };
                    context.table.insert(hash, free_state as u32);
                    context.heap.insert(&mut context.states, free_state as u32);
                    free_state += 1;
                    if free_state == state_count {
                        return SolveResult::limit(iterations);
                    }
                }
                Some(twin_index) => {
                    // the tentative bit-vector was never committed; decrease-key
                    // the twin if we reached the same state on a shorter path
                    let twin = &mut context.states[twin_index as usize];
                    if twin.heap_index >= 0 && twin.cost > cost {
                        twin.parent = Some(parent_index);
                        twin.action = expansion.action;
                        twin.cost = cost;
                        twin.priority =
                            g_factor * f32::from(cost) + h_factor * f32::from(twin.heuristic);
                        let slot = twin.heap_index as usize;
                        context.heap.sift_up(&mut context.states, slot);
                    }
                }
            }
        }
    }
    SolveResult::unsolvable(iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::bfs::solve_bfs;
    use crate::solver::tests::replay;

    const TWO_CRATES: &str = "..0.|..+.|.11.|....";
    const PACKED_GOALS: &str = ".Wg.|gW..|.WWW|A.10";

    fn solve(
        width: u8,
        height: u8,
        level: &str,
        h_factor: f32,
        g_factor: f32,
        max_iterations: u64,
    ) -> (SolveResult, Problem) {
        let mut context = Context::new(width, height, 100_000);
        let mut problem = Problem::new(&context);
        assert!(problem.parse(level));
        let result = solve_astar(&mut context, &problem, h_factor, g_factor, max_iterations);
        (result, problem)
    }

    #[test]
    fn a_star_matches_the_bfs_optimum() {
        let (result, problem) = solve(4, 4, TWO_CRATES, 1.0, 1.0, 10_000);
        assert!(result.solved);
        let actions = result.actions.unwrap();
        assert_eq!(actions.len(), 12);
        let crates = replay(&problem, &actions);
        assert!(bitset::equals(&crates, &problem.goals));
    }

    #[test]
    fn uniform_cost_is_also_optimal() {
        let (result, _) = solve(4, 4, TWO_CRATES, 0.0, 1.0, 10_000);
        assert!(result.solved);
        assert_eq!(result.actions.unwrap().len(), 12);
    }

    #[test]
    fn greedy_still_finds_a_valid_solution() {
        let (result, problem) = solve(4, 4, PACKED_GOALS, 1.0, 0.0, 10_000);
        assert!(result.solved);
        let crates = replay(&problem, &result.actions.unwrap());
        assert!(bitset::equals(&crates, &problem.goals));
    }

    #[test]
    fn solution_lengths_agree_with_bfs() {
        let mut context = Context::new(4, 4, 100_000);
        let mut problem = Problem::new(&context);
        assert!(problem.parse(TWO_CRATES));
        let bfs = solve_bfs(&mut context, &problem, 0);
        let a_star = solve_astar(&mut context, &problem, 1.0, 1.0, 0);
        assert_eq!(
            bfs.actions.map(|actions| actions.len()),
            a_star.actions.map(|actions| actions.len())
        );
    }

    #[test]
    fn iteration_limit() {
        let (result, _) = solve(4, 4, TWO_CRATES, 1.0, 1.0, 1);
        assert!(!result.solved);
        assert!(result.limit_exceeded);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn statically_unsolvable_level_is_not_searched() {
        let mut context = Context::new(4, 4, 100);
        let mut problem = Problem::new(&context);
        assert!(problem.parse(".10.|..A.|0110|0110"));
        let result = solve_astar(&mut context, &problem, 1.0, 1.0, 0);
        assert_eq!(result, SolveResult::unsolvable(0));
    }

    #[test]
    fn deterministic_output() {
        let (first, _) = solve(4, 4, TWO_CRATES, 1.0, 1.0, 0);
        let (second, _) = solve(4, 4, TWO_CRATES, 1.0, 1.0, 0);
        assert_eq!(first, second);
    }

    #[test]
    fn exhaustion_proves_unsolvable() {
        let (result, _) = solve(9, 1, "00.1A1...", 1.0, 1.0, 0);
        assert!(!result.solved);
        assert!(!result.limit_exceeded);
        assert!(result.iterations > 0);
    }
}
