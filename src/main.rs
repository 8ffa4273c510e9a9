use std::env;
use std::fs;
use std::process;

use sokosolve::suite;
use sokosolve::{solve_astar, solve_bfs, Context, Problem};

const DEFAULT_CAPACITY: usize = 1 << 20;
const MAX_SIZE: usize = 255;

struct Args {
    path: String,
    suite: bool,
    astar: Option<(f32, f32)>,
    show_deadlocks: bool,
    max_iterations: u64,
    capacity: usize,
}

fn main() {
    let args = parse_args().unwrap_or_else(|message| {
        eprintln!("{}", message);
        eprintln!("Usage: sokosolve [--astar H G] [--max-iterations N] [--capacity N] [--deadlocks] <level-file>");
        eprintln!("       sokosolve --suite [--capacity N] <script-file>");
        process::exit(1);
    });

    let text = fs::read_to_string(&args.path).unwrap_or_else(|err| {
        eprintln!("Can't read {}: {}", args.path, err);
        process::exit(1);
    });

    if args.suite {
        run_suite(&text, args.capacity);
    } else {
        solve_level(&text, &args);
    }
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        path: String::new(),
        suite: false,
        astar: None,
        show_deadlocks: false,
        max_iterations: 0,
        capacity: DEFAULT_CAPACITY,
    };
    let mut rest = env::args().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--suite" => args.suite = true,
            "--deadlocks" => args.show_deadlocks = true,
            "--astar" => {
                let h_factor = next_number(&mut rest, "--astar")?;
                let g_factor = next_number(&mut rest, "--astar")?;
                args.astar = Some((h_factor, g_factor));
            }
            "--max-iterations" => args.max_iterations = next_number(&mut rest, "--max-iterations")?,
            "--capacity" => args.capacity = next_number(&mut rest, "--capacity")?,
            _ if arg.starts_with("--") => return Err(format!("Unknown option {}", arg)),
            _ if args.path.is_empty() => args.path = arg,
            _ => return Err("More than one input file".to_string()),
        }
    }
    if args.path.is_empty() {
        return Err("No input file".to_string());
    }
    if args.capacity == 0 {
        return Err("--capacity must be at least 1".to_string());
    }
    Ok(args)
}

fn next_number<T, I>(rest: &mut I, option: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    I: Iterator<Item = String>,
{
    rest.next()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| format!("{} expects a number", option))
}

fn solve_level(text: &str, args: &Args) {
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    let height = rows.len();
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    if width == 0 || width > MAX_SIZE || height > MAX_SIZE || (width + 2) * (height + 2) > 65535 {
        eprintln!("Level too large: at most 255 rows/columns and a padded area of 65535 tiles");
        process::exit(1);
    }
    let mut level = String::new();
    for row in &rows {
        level.push_str(row);
        for _ in row.len()..width {
            level.push('.');
        }
    }

    let mut context = Context::new(width as u8, height as u8, args.capacity);
    let mut problem = Problem::new(&context);
    if !problem.parse(&level) {
        eprintln!("Invalid level: needs exactly one player, as many crates as goals and at least one crate off a goal");
        process::exit(1);
    }
    print!("{}", problem);
    if args.show_deadlocks {
        println!("Deadlock cells:");
        print!("{}", problem.render_bits(problem.deadlock_map()));
    }

    let result = match args.astar {
        None => solve_bfs(&mut context, &problem, args.max_iterations),
        Some((h_factor, g_factor)) => {
            solve_astar(&mut context, &problem, h_factor, g_factor, args.max_iterations)
        }
    };
    println!("{}", result);
    if let Some(actions) = &result.actions {
        println!("{}", actions);
    }
}

fn run_suite(text: &str, capacity: usize) {
    let failures = suite::run(text, capacity, true).unwrap_or_else(|err| {
        eprintln!("Bad suite script: {}", err);
        process::exit(1);
    });
    if failures.is_empty() {
        println!("All expectations hold");
    } else {
        for failure in &failures {
            println!("{}", failure);
        }
        process::exit(1);
    }
}
