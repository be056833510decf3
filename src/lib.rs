//! Quilt Tiling Solver Library
//!
//! Decides whether a stock of polyomino patches exactly covers the free cells
//! of a quilt board, and reports the placements that do.

pub mod error;
pub mod geometry;
pub mod grid;
pub mod persistence;
pub mod pieces;
pub mod puzzle;
pub mod solver;

pub use error::{ModelError, PlacementError, PuzzleError, VerifyError};
pub use geometry::{Dimension, Position, TransformPolicy, Transformation};
pub use grid::QuiltBoard;
pub use pieces::{Piece, Square, Stock};
pub use puzzle::Puzzle;
pub use solver::{
    verify, Enumeration, InventoryUsage, Placement, PlacementSolver, SearchStats, Solution,
    SolveOutcome, SolverConfig,
};

/// Solves a board with default settings for the given policy.
///
/// ```
/// use quilt::{Dimension, Piece, QuiltBoard, SolveOutcome, Stock, TransformPolicy};
///
/// let board = QuiltBoard::new(Dimension::new(2, 1));
/// let stock = [Stock::one(Piece::parse("#\n#").unwrap())];
/// let outcome = quilt::solve(&board, &stock, TransformPolicy::RotationsOnly);
/// assert!(matches!(outcome, SolveOutcome::Solved(ref placements) if placements.len() == 1));
/// ```
pub fn solve(board: &QuiltBoard, stock: &[Stock], policy: TransformPolicy) -> SolveOutcome {
    PlacementSolver::new(board, stock, SolverConfig::new(policy)).solve()
}
