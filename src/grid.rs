//! The quilt board and its text renderings.
//!
//! The board is a flat row-major array of booleans: cell `(x, y)` lives at
//! index `y * width + x` and is `true` once covered.

use std::fmt;

use crate::error::{ModelError, ModelResult, PlacementError};
use crate::geometry::{Dimension, Flip, Position, Rotation, Transformation};
use crate::pieces::Piece;
use crate::solver::Placement;

/// The width and height of the default quilt board.
pub const DEFAULT_DIMENSION: usize = 9;

/// The board on which the quilt is constructed.
///
/// Invariant: `cells.len() == width * height`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuiltBoard {
    dimension: Dimension,
    cells: Vec<bool>,
}

/// Converts `(x, y)` to a row-major cell index.
#[inline(always)]
pub const fn coord_to_idx(width: usize, x: usize, y: usize) -> usize {
    y * width + x
}

/// Converts a row-major cell index back to a position.
#[inline(always)]
pub const fn idx_to_coord(width: usize, index: usize) -> Position {
    Position::new(index % width, index / width)
}

impl QuiltBoard {
    /// Creates an empty board of the given dimension.
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            cells: vec![false; dimension.area()],
        }
    }

    /// Creates a board from rows of occupancy flags, `rows[y][x]`.
    pub fn from_rows(dimension: Dimension, rows: &[Vec<bool>]) -> ModelResult<Self> {
        let mismatch = |actual_width| ModelError::DimensionMismatch {
            declared: dimension,
            actual_width,
            actual_height: rows.len(),
        };

        if rows.len() != dimension.height {
            let width = rows.first().map_or(0, Vec::len);
            return Err(mismatch(width));
        }
        if let Some(row) = rows.iter().find(|row| row.len() != dimension.width) {
            return Err(mismatch(row.len()));
        }

        Ok(Self {
            dimension,
            cells: rows.concat(),
        })
    }

    /// Parses a board drawn with `#` (covered) and `.` (free), one line per
    /// row. All rows must have the same length.
    pub fn parse(pattern: &str) -> ModelResult<Self> {
        let mut rows = Vec::new();
        for (y, line) in pattern.lines().enumerate() {
            let mut row = Vec::with_capacity(line.len());
            for (x, c) in line.chars().enumerate() {
                match c {
                    '#' => row.push(true),
                    '.' => row.push(false),
                    found => {
                        return Err(ModelError::InvalidPattern {
                            line: y + 1,
                            column: x + 1,
                            found,
                        })
                    }
                }
            }
            rows.push(row);
        }

        let width = rows.first().map_or(0, Vec::len);
        Self::from_rows(Dimension::new(width, rows.len()), &rows)
    }

    /// The dimensions of the board.
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn width(&self) -> usize {
        self.dimension.width
    }

    pub fn height(&self) -> usize {
        self.dimension.height
    }

    /// Row-major occupancy flags.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Is the given position in bounds for the quilt board?
    pub fn is_position_in_bounds(&self, position: Position) -> bool {
        self.dimension.contains(position)
    }

    /// Is the given position covered? Out-of-bounds positions are not.
    pub fn is_position_covered(&self, position: Position) -> bool {
        self.is_position_in_bounds(position)
            && self.cells[coord_to_idx(self.width(), position.x, position.y)]
    }

    /// Marks a single cell as covered, e.g. a fixed obstacle.
    pub fn cover(&mut self, position: Position) -> Result<(), PlacementError> {
        self.add_piece(position, &Piece::single_square(), Transformation::identity())
    }

    /// Returns the number of covered cells.
    pub fn positions_covered(&self) -> usize {
        self.cells.iter().filter(|&&covered| covered).count()
    }

    /// Returns the number of cells still to be covered.
    pub fn free_cells(&self) -> usize {
        self.cells.len() - self.positions_covered()
    }

    /// Index of the first free cell at or after `from`, in row-major order.
    pub fn first_free_from(&self, from: usize) -> Option<usize> {
        self.cells
            .get(from..)?
            .iter()
            .position(|&covered| !covered)
            .map(|offset| from + offset)
    }

    /// Is there a `size`-by-`size` block of covered cells anywhere?
    pub fn is_square_covered(&self, size: usize) -> bool {
        if size == 0 {
            return true;
        }
        if size > self.width() || size > self.height() {
            return false;
        }

        (0..=self.height() - size).any(|y| {
            (0..=self.width() - size).any(|x| self.is_square_covered_at(Position::new(x, y), size))
        })
    }

    fn is_square_covered_at(&self, corner: Position, size: usize) -> bool {
        (corner.y..corner.y + size)
            .all(|y| (corner.x..corner.x + size).all(|x| self.is_position_covered(Position::new(x, y))))
    }

    /// Can the given piece be added with its bounding box at `position`?
    pub fn can_add_piece(
        &self,
        position: Position,
        piece: &Piece,
        transformation: Transformation,
    ) -> Result<(), PlacementError> {
        for square in piece.positions(transformation) {
            let target = square.translate(position);

            if target.x >= self.width() {
                return Err(PlacementError::OverhangsRight);
            } else if target.y >= self.height() {
                return Err(PlacementError::OverhangsBottom);
            } else if self.is_position_covered(target) {
                return Err(PlacementError::OverlapsPiece);
            }
        }

        Ok(())
    }

    /// Adds the given piece with its bounding box at `position`.
    pub fn add_piece(
        &mut self,
        position: Position,
        piece: &Piece,
        transformation: Transformation,
    ) -> Result<(), PlacementError> {
        self.can_add_piece(position, piece, transformation)?;

        let width = self.width();
        for square in piece.positions(transformation) {
            let target = square.translate(position);
            self.cells[coord_to_idx(width, target.x, target.y)] = true;
        }

        Ok(())
    }

    /// Covers every cell of a solver placement list.
    ///
    /// Stops at the first placement that does not fit.
    pub fn apply(&mut self, solution: &[Placement]) -> Result<(), PlacementError> {
        let width = self.width();
        for placement in solution {
            for &target in &placement.positions {
                if target.x >= self.width() {
                    return Err(PlacementError::OverhangsRight);
                } else if target.y >= self.height() {
                    return Err(PlacementError::OverhangsBottom);
                }
                let index = coord_to_idx(width, target.x, target.y);
                if self.cells[index] {
                    return Err(PlacementError::OverlapsPiece);
                }
                self.cells[index] = true;
            }
        }
        Ok(())
    }

    /// The board rotated a quarter turn clockwise.
    pub fn rotated_clockwise(&self) -> Self {
        const QUARTER_TURN: Transformation = Transformation::new(Rotation::Clockwise90, Flip::Identity);

        let rotated = self.dimension.transpose();
        let mut cells = vec![false; self.cells.len()];

        for (index, &covered) in self.cells.iter().enumerate() {
            let source = idx_to_coord(self.width(), index);
            let target = QUARTER_TURN.apply(self.dimension, source);
            cells[coord_to_idx(rotated.width, target.x, target.y)] = covered;
        }

        Self {
            dimension: rotated,
            cells,
        }
    }
}

impl Default for QuiltBoard {
    fn default() -> Self {
        Self::new(Dimension::square(DEFAULT_DIMENSION))
    }
}

impl fmt::Display for QuiltBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width().max(1)) {
            for &covered in row {
                f.write_str(if covered { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Labels cycle through digits, then upper and lower case letters.
const LABELS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Label used for the `n`th placement of a solution.
pub fn placement_label(n: usize) -> char {
    char::from(LABELS[n % LABELS.len()])
}

/// Formats a solution as a grid of characters.
///
/// Cells covered before solving show as `#`, cells left free as `.`, and
/// each placement gets its own label in placement order.
pub fn format_solution(board: &QuiltBoard, solution: &[Placement]) -> String {
    let mut grid: Vec<char> = board
        .cells
        .iter()
        .map(|&covered| if covered { '#' } else { '.' })
        .collect();

    for (n, placement) in solution.iter().enumerate() {
        for target in &placement.positions {
            if board.is_position_in_bounds(*target) {
                grid[coord_to_idx(board.width(), target.x, target.y)] = placement_label(n);
            }
        }
    }

    let mut output = String::with_capacity(grid.len() + board.height());
    for row in grid.chunks(board.width().max(1)) {
        output.extend(row);
        output.push('\n');
    }
    output
}
