//! Error types for model construction, piece placement and puzzle loading.
//!
//! Solver outcomes (`NoSolution`, `Infeasible`, ...) are ordinary values in
//! [`crate::solver::SolveOutcome`] and never show up here.

use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::{Dimension, Position};

/// Validation failures raised while building squares, pieces and boards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("square ({}, {}) lies outside the {}x{} bounding box",
            .position.x, .position.y, .dimension.width, .dimension.height)]
    OutOfBounds {
        position: Position,
        dimension: Dimension,
    },

    #[error("square ({}, {}) appears more than once", .position.x, .position.y)]
    DuplicateSquare { position: Position },

    #[error("grid is {actual_width}x{actual_height} but {}x{} was declared",
            .declared.width, .declared.height)]
    DimensionMismatch {
        declared: Dimension,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("piece bounding box must be non-empty, got {}x{}", .dimension.width, .dimension.height)]
    InvalidDimension { dimension: Dimension },

    #[error("piece has no squares")]
    EmptyPiece,

    #[error("unexpected character {found:?} at line {line}, column {column}")]
    InvalidPattern {
        line: usize,
        column: usize,
        found: char,
    },
}

/// Reasons a piece cannot be added to a board at a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("placement overhangs the right edge of the board")]
    OverhangsRight,
    #[error("placement overhangs the bottom edge of the board")]
    OverhangsBottom,
    #[error("placement overlaps a covered square")]
    OverlapsPiece,
}

/// Ways a placement list can fail to be an exact cover of a board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("placement {index} refers to unknown piece {piece_id}")]
    UnknownPiece { index: usize, piece_id: usize },

    #[error("piece {piece_id} is placed more often than its {available} available copies")]
    Overused { piece_id: usize, available: usize },

    #[error("placement {index} does not match the shape of piece {piece_id}")]
    ShapeMismatch { index: usize, piece_id: usize },

    #[error("placement {index} does not fit: {source}")]
    Placement {
        index: usize,
        #[source]
        source: PlacementError,
    },

    #[error("{count} cells are left uncovered")]
    Uncovered { count: usize },
}

/// Failures while reading a puzzle definition.
#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid puzzle file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid board: {0}")]
    Board(#[source] ModelError),

    #[error("invalid piece {name:?}: {source}")]
    Piece {
        name: String,
        #[source]
        source: ModelError,
    },

    #[error("obstacle at ({}, {}) cannot be placed: {source}", .position.x, .position.y)]
    Obstacle {
        position: Position,
        #[source]
        source: PlacementError,
    },

    #[error("puzzle needs either `board` rows or both `width` and `height`")]
    MissingBoard,
}

pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_message() {
        let err = ModelError::OutOfBounds {
            position: Position::new(3, 0),
            dimension: Dimension::new(2, 2),
        };
        assert_eq!(
            err.to_string(),
            "square (3, 0) lies outside the 2x2 bounding box"
        );
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = ModelError::DimensionMismatch {
            declared: Dimension::new(4, 3),
            actual_width: 4,
            actual_height: 2,
        };
        assert_eq!(err.to_string(), "grid is 4x2 but 4x3 was declared");
    }
}
