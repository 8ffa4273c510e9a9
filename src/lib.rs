//! BFS and A* solver for Sokoban levels.
//!
//! A [`Context`] preallocates every state and crate bit-vector a search may
//! ever hold, a [`Problem`] is parsed under it (deriving the deadlock map and
//! the push-distance heuristic), and [`solve_bfs`] / [`solve_astar`] run over
//! the arena:
//!
//! ```
//! use sokosolve::{solve_bfs, Context, Problem};
//!
//! let mut context = Context::new(5, 1, 1000);
//! let mut problem = Problem::new(&context);
//! assert!(problem.parse("A.1.0"));
//! let result = solve_bfs(&mut context, &problem, 0);
//! assert_eq!(result.actions.as_deref(), Some("rRR"));
//! ```

// Opt in to warnings about new 2018 idioms
#![warn(rust_2018_idioms)]
// Additional warnings that are allow by default (`rustc -W help`)
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unreachable_pub)]
#![warn(unused)]
// Clippy
#![warn(clippy::all)]

pub mod suite;

mod bitset;
mod context;
mod data;
mod heap;
mod problem;
mod solver;
mod state;
mod table;

pub use crate::context::Context;
pub use crate::data::{Cost, Count, Pos};
pub use crate::problem::Problem;
pub use crate::solver::a_star::solve_astar;
pub use crate::solver::bfs::solve_bfs;
pub use crate::solver::SolveResult;
