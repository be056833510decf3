//! Quilt Tiling Solver
//!
//! Reads a board and a stock of patches from a TOML puzzle file and searches
//! for placements that cover every free cell exactly once.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use log::info;

use quilt::geometry::TransformPolicy;
use quilt::grid::{format_solution, placement_label, QuiltBoard};
use quilt::persistence;
use quilt::pieces::{catalog, Stock};
use quilt::solver::{verify, PlacementSolver, SolveOutcome, SolverConfig};
use quilt::{Dimension, Puzzle, Transformation};

/// Solves polyomino quilt tiling puzzles.
#[derive(Parser)]
#[command(name = "quilt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search for a tiling of a puzzle file.
    Solve {
        file: PathBuf,
        #[command(flatten)]
        search: SearchArgs,
        /// Enumerate every solution instead of stopping at the first.
        #[arg(long)]
        all: bool,
        /// Stop enumerating after this many solutions.
        #[arg(long)]
        limit: Option<usize>,
        /// Worker threads for a single-solution search.
        #[arg(long, default_value_t = 1)]
        threads: usize,
        /// Also write the solutions to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the number of solutions of a puzzle file.
    Count {
        file: PathBuf,
        #[command(flatten)]
        search: SearchArgs,
        /// Stop counting after this many solutions.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the board and pieces of a puzzle file.
    Show { file: PathBuf },
    /// Tile a rectangle with the twelve pentominoes.
    Demo {
        /// Rectangle width (the height follows from 60 cells).
        #[arg(long, default_value_t = 10)]
        width: usize,
        #[arg(long, default_value_t = 1)]
        threads: usize,
    },
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Override the transformation policy from the puzzle file.
    #[arg(long, value_enum)]
    transforms: Option<TransformPolicy>,
    /// Give up after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Disable pruning of unfillable regions.
    #[arg(long)]
    no_prune: bool,
}

impl SearchArgs {
    fn config(&self, puzzle: &Puzzle) -> SolverConfig {
        let mut config = puzzle.solver_config().with_pruning(!self.no_prune);
        if let Some(policy) = self.transforms {
            config.policy = policy;
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_deadline(Instant::now() + Duration::from_millis(ms));
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Solve {
            file,
            search,
            all,
            limit,
            threads,
            output,
        } => with_puzzle(&file, |puzzle| {
            run_solve(puzzle, &search, all, limit, threads, output)
        }),
        Command::Count {
            file,
            search,
            limit,
        } => with_puzzle(&file, |puzzle| run_count(puzzle, &search, limit)),
        Command::Show { file } => with_puzzle(&file, |puzzle| {
            print!("{}", describe(puzzle));
            ExitCode::SUCCESS
        }),
        Command::Demo { width, threads } => run_demo(width, threads),
    }
}

/// `-v` flags raise the default level; `RUST_LOG` still takes precedence.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn with_puzzle(file: &Path, run: impl FnOnce(&Puzzle) -> ExitCode) -> ExitCode {
    match Puzzle::load(file) {
        Ok(puzzle) => {
            info!(
                "loaded {}: {}x{} board, {} stock entries",
                file.display(),
                puzzle.board.width(),
                puzzle.board.height(),
                puzzle.stock.len()
            );
            run(&puzzle)
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}", file.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn run_solve(
    puzzle: &Puzzle,
    search: &SearchArgs,
    all: bool,
    limit: Option<usize>,
    threads: usize,
    output: Option<PathBuf>,
) -> ExitCode {
    let solver = puzzle.solver(search.config(puzzle));

    let solutions = if all || limit.is_some() {
        let enumeration = solver.solve_all(limit);
        print!("{}", persistence::format_listing(&puzzle.board, &enumeration.solutions));
        if !enumeration.complete {
            println!("(enumeration stopped early)");
        }
        enumeration.solutions
    } else {
        let outcome = if threads > 1 {
            solver.solve_parallel(threads)
        } else {
            solver.solve()
        };
        report_outcome(puzzle, &outcome);
        match outcome {
            SolveOutcome::Solved(solution) => vec![solution],
            _ => Vec::new(),
        }
    };
    info!("search stats: {:?}", solver.stats());

    if let Some(path) = output {
        if let Err(e) = persistence::save_text(&path, &puzzle.board, &solutions) {
            eprintln!("Failed to save solutions: {}", e);
            return ExitCode::FAILURE;
        }
        println!("Wrote {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_count(puzzle: &Puzzle, search: &SearchArgs, limit: Option<usize>) -> ExitCode {
    let solver = puzzle.solver(search.config(puzzle));
    let enumeration = solver.solve_all(limit);
    if enumeration.complete {
        println!("{} solutions", enumeration.solutions.len());
    } else {
        println!("at least {} solutions", enumeration.solutions.len());
    }
    ExitCode::SUCCESS
}

fn run_demo(width: usize, threads: usize) -> ExitCode {
    if width == 0 || 60 % width != 0 {
        eprintln!("Width must divide 60, got {}", width);
        return ExitCode::FAILURE;
    }

    let board = QuiltBoard::new(Dimension::new(width, 60 / width));
    let stock: Vec<Stock> = catalog::pentominoes()
        .into_iter()
        .map(|(_, piece)| Stock::one(piece))
        .collect();
    let solver = PlacementSolver::new(
        &board,
        &stock,
        SolverConfig::new(TransformPolicy::RotationsAndReflections),
    );

    let outcome = solver.solve_parallel(threads);
    match &outcome {
        SolveOutcome::Solved(solution) => {
            print!("{}", format_solution(&board, solution));
            if let Err(e) = verify(&board, &stock, solution) {
                eprintln!("Solution failed verification: {}", e);
                return ExitCode::FAILURE;
            }
        }
        other => println!("{:?}", other),
    }
    info!("search stats: {:?}", solver.stats());
    ExitCode::SUCCESS
}

fn report_outcome(puzzle: &Puzzle, outcome: &SolveOutcome) {
    match outcome {
        SolveOutcome::Solved(solution) => {
            println!("Solved with {} placements:", solution.len());
            print!("{}", format_solution(&puzzle.board, solution));
            for (n, placement) in solution.iter().enumerate() {
                println!(
                    "  {} {} {} at ({}, {})",
                    placement_label(n),
                    puzzle.names[placement.piece_id],
                    placement.transformation,
                    placement.offset_x,
                    placement.offset_y
                );
            }
        }
        SolveOutcome::NoSolution => println!("No solution"),
        SolveOutcome::Infeasible => println!(
            "Infeasible: {} free cells cannot be matched by the stock",
            puzzle.board.free_cells()
        ),
        SolveOutcome::Interrupted => println!("Interrupted before an answer was found"),
    }
}

/// Text description of a puzzle: the board, then each piece.
fn describe(puzzle: &Puzzle) -> String {
    let mut output = format!(
        "Board {}x{} ({} free cells), transforms {:?}, usage {:?}\n",
        puzzle.board.width(),
        puzzle.board.height(),
        puzzle.board.free_cells(),
        puzzle.policy,
        puzzle.usage
    );
    output.push_str(&puzzle.board.to_string());

    for (name, entry) in puzzle.names.iter().zip(&puzzle.stock) {
        output.push_str(&format!("\n{} x{}\n", name, entry.count));
        let dimension = entry.piece.dimension(Transformation::identity());
        let mut rows = vec![vec!['.'; dimension.width]; dimension.height];
        for square in entry.piece.squares() {
            rows[square.y()][square.x()] = '#';
        }
        for row in rows {
            output.extend(row);
            output.push('\n');
        }
    }
    output
}
