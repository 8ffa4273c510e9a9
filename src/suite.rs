//! Test-harness scripts: level rows interleaved with `;` directives that run
//! a search and check its outcome. Lines starting with `#` are comments and
//! blank lines separate nothing in particular; level rows after a directive
//! start a new case.
//!
//! ```text
//! # a corridor
//! A.1.0
//! ; BFS(100) = S(3)
//! ; A*(1, 1, 100) = S(3)
//! ```

use std::fmt::{self, Display, Formatter};

use crate::context::Context;
use crate::problem::Problem;
use crate::solver::a_star::solve_astar;
use crate::solver::bfs::solve_bfs;
use crate::solver::SolveResult;

/// Levels may not exceed the `u8` dimensions of a context.
const MAX_SIZE: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteErr {
    DirectiveBeforeLevel(usize),
    BadDirective(usize),
    BadExpectation(usize),
    TooLarge(usize),
}

impl Display for SuiteErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            SuiteErr::DirectiveBeforeLevel(line) => {
                write!(f, "Directive before any level rows on line {}", line)
            }
            SuiteErr::BadDirective(line) => write!(f, "Malformed directive on line {}", line),
            SuiteErr::BadExpectation(line) => write!(f, "Malformed expectation on line {}", line),
            SuiteErr::TooLarge(line) => {
                write!(f, "Level starting on line {} is too large to solve", line)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Search {
    Bfs {
        max_iterations: u64,
    },
    AStar {
        h_factor: f32,
        g_factor: f32,
        max_iterations: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// `C`: the level must not compile.
    NotCompilable,
    /// `U`: no solution, without hitting a limit.
    Unsolvable,
    /// `L`: the iteration or capacity limit must trip.
    LimitExceeded,
    /// `S(len)` or `S(_)`: solved, optionally with an exact length.
    Solved(Option<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Directive {
    pub search: Search,
    pub expect: Expect,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub rows: Vec<String>,
    pub directives: Vec<Directive>,
    /// Line of the first level row.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub line: usize,
    pub message: String,
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

pub fn parse(script: &str) -> Result<Vec<Case>, SuiteErr> {
    let mut cases: Vec<Case> = Vec::new();
    let mut rows: Vec<String> = Vec::new();
    let mut first_row_line = 0;

    for (index, line) in script.lines().enumerate() {
        let number = index + 1;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix(';') {
            if !rows.is_empty() {
                cases.push(Case {
                    rows: std::mem::take(&mut rows),
                    directives: Vec::new(),
                    line: first_row_line,
                });
            }
            let directive = parse_directive(rest, number)?;
            match cases.last_mut() {
                Some(case) => case.directives.push(directive),
                None => return Err(SuiteErr::DirectiveBeforeLevel(number)),
            }
        } else {
            if rows.is_empty() {
                first_row_line = number;
            }
            rows.push(line.to_string());
        }
    }
    if !rows.is_empty() {
        cases.push(Case {
            rows,
            directives: Vec::new(),
            line: first_row_line,
        });
    }
    Ok(cases)
}

fn parse_directive(rest: &str, line: usize) -> Result<Directive, SuiteErr> {
    let (call, expect) = rest.split_once('=').ok_or(SuiteErr::BadDirective(line))?;

    let call = call.trim();
    let search = if let Some(args) = call.strip_prefix("BFS(").and_then(|c| c.strip_suffix(')')) {
        Search::Bfs {
            max_iterations: args.trim().parse().map_err(|_| SuiteErr::BadDirective(line))?,
        }
    } else if let Some(args) = call.strip_prefix("A*(").and_then(|c| c.strip_suffix(')')) {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(SuiteErr::BadDirective(line));
        }
        Search::AStar {
            h_factor: parts[0].parse().map_err(|_| SuiteErr::BadDirective(line))?,
            g_factor: parts[1].parse().map_err(|_| SuiteErr::BadDirective(line))?,
            max_iterations: parts[2].parse().map_err(|_| SuiteErr::BadDirective(line))?,
        }
    } else {
        return Err(SuiteErr::BadDirective(line));
    };

    let expect = match expect.trim() {
        "C" => Expect::NotCompilable,
        "U" => Expect::Unsolvable,
        "L" => Expect::LimitExceeded,
        "S(_)" => Expect::Solved(None),
        other => {
            let len = other
                .strip_prefix("S(")
                .and_then(|e| e.strip_suffix(')'))
                .ok_or(SuiteErr::BadExpectation(line))?;
            Expect::Solved(Some(
                len.trim().parse().map_err(|_| SuiteErr::BadExpectation(line))?,
            ))
        }
    };

    Ok(Directive { search, expect, line })
}

/// Runs every case in `script` against a fresh context per case and returns
/// the expectations that did not hold. `print_status` echoes each level and
/// directive verdict to stdout.
pub fn run(script: &str, capacity: usize, print_status: bool) -> Result<Vec<Failure>, SuiteErr> {
    let cases = parse(script)?;
    let mut failures = Vec::new();

    for case in &cases {
        let height = case.rows.len();
        let width = case.rows.iter().map(String::len).max().unwrap_or(0);
        if width == 0 || width > MAX_SIZE || height > MAX_SIZE || (width + 2) * (height + 2) > 65535 {
            return Err(SuiteErr::TooLarge(case.line));
        }
        // short rows are padded with empty tiles to keep the grid aligned
        let mut level = String::new();
        for row in &case.rows {
            level.push_str(row);
            for _ in row.len()..width {
                level.push('.');
            }
        }

        let mut context = Context::new(width as u8, height as u8, capacity);
        let mut problem = Problem::new(&context);
        let compilable = problem.parse(&level);
        if print_status {
            println!("Level at line {}:", case.line);
            print!("{}", problem);
        }

        for directive in &case.directives {
            let outcome = match (compilable, directive.search) {
                (false, _) => None,
                (true, Search::Bfs { max_iterations }) => {
                    Some(solve_bfs(&mut context, &problem, max_iterations))
                }
                (
                    true,
                    Search::AStar {
                        h_factor,
                        g_factor,
                        max_iterations,
                    },
                ) => Some(solve_astar(
                    &mut context,
                    &problem,
                    h_factor,
                    g_factor,
                    max_iterations,
                )),
            };
            match check(directive.expect, outcome.as_ref()) {
                Some(message) => failures.push(Failure {
                    line: directive.line,
                    message,
                }),
                None => {
                    if print_status {
                        println!("line {}: ok", directive.line);
                    }
                }
            }
        }
    }
    Ok(failures)
}

fn check(expect: Expect, outcome: Option<&SolveResult>) -> Option<String> {
    let result = match (expect, outcome) {
        (Expect::NotCompilable, None) => return None,
        (Expect::NotCompilable, Some(_)) => {
            return Some("expected the level not to compile".to_string())
        }
        (_, None) => return Some("the level did not compile".to_string()),
        (_, Some(result)) => result,
    };
    let ok = match expect {
        Expect::NotCompilable => unreachable!(),
        Expect::Unsolvable => !result.solved && !result.limit_exceeded,
        Expect::LimitExceeded => !result.solved && result.limit_exceeded,
        Expect::Solved(None) => result.solved,
        Expect::Solved(Some(len)) => {
            result.solved && result.actions.as_ref().map_or(0, String::len) == len
        }
    };
    if ok {
        None
    } else {
        Some(format!(
            "expected {:?}, got solved={} limit_exceeded={} length={:?}",
            expect,
            result.solved,
            result.limit_exceeded,
            result.actions.as_ref().map(String::len),
        ))
    }
}
