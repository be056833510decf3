//! Puzzle definitions read from TOML files.
//!
//! ```toml
//! transforms = "rotations-and-reflections"
//! usage = "at-most"
//! board = [
//!     "....",
//!     ".#..",
//!     "....",
//! ]
//!
//! [[pieces]]
//! name = "corner"
//! shape = ["##", "#."]
//! count = 2
//! ```
//!
//! Instead of `board` rows a file may give `width` and `height` for an empty
//! board, optionally with `obstacles = [[x, y], ...]`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ModelError, PlacementError, PuzzleError};
use crate::geometry::{Dimension, Position, TransformPolicy};
use crate::grid::QuiltBoard;
use crate::pieces::{Piece, Stock};
use crate::solver::{InventoryUsage, PlacementSolver, SolverConfig};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PuzzleFile {
    transforms: TransformPolicy,
    #[serde(default)]
    usage: InventoryUsage,
    board: Option<Vec<String>>,
    width: Option<usize>,
    height: Option<usize>,
    #[serde(default)]
    obstacles: Vec<[usize; 2]>,
    #[serde(default)]
    pieces: Vec<PieceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PieceEntry {
    name: Option<String>,
    shape: Vec<String>,
    #[serde(default = "single_copy")]
    count: usize,
}

fn single_copy() -> usize {
    1
}

/// A board, an inventory and the rules for placing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub board: QuiltBoard,
    pub stock: Vec<Stock>,
    /// Display name of each stock entry.
    pub names: Vec<String>,
    pub policy: TransformPolicy,
    pub usage: InventoryUsage,
}

impl Puzzle {
    /// Reads and validates a puzzle file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PuzzleError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PuzzleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, PuzzleError> {
        let file: PuzzleFile = toml::from_str(text)?;

        let mut board = match (&file.board, file.width, file.height) {
            (Some(rows), _, _) => QuiltBoard::parse(&rows.join("\n")).map_err(PuzzleError::Board)?,
            (None, Some(width), Some(height)) => QuiltBoard::new(Dimension::new(width, height)),
            _ => return Err(PuzzleError::MissingBoard),
        };
        for &[x, y] in &file.obstacles {
            let position = Position::new(x, y);
            if !board.is_position_in_bounds(position) {
                return Err(PuzzleError::Board(ModelError::OutOfBounds {
                    position,
                    dimension: board.dimension(),
                }));
            }
            match board.cover(position) {
                // listed twice, or on a `#` cell of the board rows
                Ok(()) | Err(PlacementError::OverlapsPiece) => {}
                Err(source) => return Err(PuzzleError::Obstacle { position, source }),
            }
        }

        let mut stock = Vec::with_capacity(file.pieces.len());
        let mut names = Vec::with_capacity(file.pieces.len());
        for (index, entry) in file.pieces.into_iter().enumerate() {
            let name = entry.name.unwrap_or_else(|| format!("piece{index}"));
            let piece = Piece::parse(&entry.shape.join("\n")).map_err(|source| PuzzleError::Piece {
                name: name.clone(),
                source,
            })?;
            stock.push(Stock::new(piece, entry.count));
            names.push(name);
        }

        Ok(Self {
            board,
            stock,
            names,
            policy: file.transforms,
            usage: file.usage,
        })
    }

    /// Solver settings described by the file.
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig::new(self.policy).with_usage(self.usage)
    }

    pub fn solver(&self, config: SolverConfig) -> PlacementSolver {
        PlacementSolver::new(&self.board, &self.stock, config)
    }
}
