//! Quilt patch definitions.
//!
//! A piece is a set of unit squares inside a bounding box. Squares are stored
//! relative to the box's upper-left corner and sorted in row-major order.

use std::slice;

use rustc_hash::FxHashSet;

use crate::error::{ModelError, ModelResult};
use crate::geometry::{orientations, Dimension, Orientation, Position, TransformPolicy, Transformation};

/// A unit square of a piece, valid within the piece's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    position: Position,
}

impl Square {
    /// Creates a square, checking it lies inside `dimension`.
    pub fn new(x: usize, y: usize, dimension: Dimension) -> ModelResult<Self> {
        let position = Position::new(x, y);
        if !dimension.contains(position) {
            return Err(ModelError::OutOfBounds {
                position,
                dimension,
            });
        }
        Ok(Self { position })
    }

    pub fn x(self) -> usize {
        self.position.x
    }

    pub fn y(self) -> usize {
        self.position.y
    }

    pub fn position(self) -> Position {
        self.position
    }
}

/// A patch shape.
///
/// Invariants: the bounding box is the tight box of the squares, squares are
/// pairwise distinct and there is at least one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    dimension: Dimension,
    squares: Box<[Square]>,
}

impl Piece {
    /// Builds a piece from squares within a declared bounding box.
    ///
    /// Squares are validated against `dimension`, then shifted so the piece
    /// sits in its tight bounding box at the origin.
    pub fn new<I>(dimension: Dimension, positions: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        if dimension.width == 0 || dimension.height == 0 {
            return Err(ModelError::InvalidDimension { dimension });
        }

        let mut seen = FxHashSet::default();
        let mut squares = Vec::new();
        for position in positions {
            let square = Square::new(position.x, position.y, dimension)?;
            if !seen.insert(position) {
                return Err(ModelError::DuplicateSquare { position });
            }
            squares.push(square);
        }

        if squares.is_empty() {
            return Err(ModelError::EmptyPiece);
        }

        // padding around the squares is dropped: the stored box is tight
        let min_x = squares.iter().map(|s| s.position.x).min().unwrap_or(0);
        let min_y = squares.iter().map(|s| s.position.y).min().unwrap_or(0);
        for square in &mut squares {
            square.position = Position::new(square.position.x - min_x, square.position.y - min_y);
        }
        squares.sort_by_key(|s| s.position.row_major());

        let positions: Vec<Position> = squares.iter().map(|s| s.position).collect();
        Ok(Self {
            dimension: compute_dimension(&positions),
            squares: squares.into_boxed_slice(),
        })
    }

    /// Builds a piece whose bounding box tightly fits the given positions.
    pub fn from_positions(positions: &[Position]) -> ModelResult<Self> {
        let dimension = compute_dimension(positions);
        if dimension.area() == 0 {
            return Err(ModelError::EmptyPiece);
        }
        Self::new(dimension, positions.iter().copied())
    }

    /// Parses ASCII art, one line per row: `#` is a square, `.` or a space
    /// is empty. Empty rows and columns around the squares are trimmed.
    ///
    /// ```
    /// let corner = quilt::pieces::Piece::parse("##\n#.").unwrap();
    /// assert_eq!(corner.size(), 3);
    /// ```
    pub fn parse(pattern: &str) -> ModelResult<Self> {
        let mut positions = Vec::new();
        let mut dimension = Dimension::new(0, 0);

        for (y, line) in pattern.lines().enumerate() {
            dimension.height = y + 1;
            dimension.width = dimension.width.max(line.chars().count());
            for (x, c) in line.chars().enumerate() {
                match c {
                    '#' => positions.push(Position::new(x, y)),
                    '.' | ' ' => {}
                    found => {
                        return Err(ModelError::InvalidPattern {
                            line: y + 1,
                            column: x + 1,
                            found,
                        })
                    }
                }
            }
        }

        if positions.is_empty() {
            return Err(ModelError::EmptyPiece);
        }
        Self::new(dimension, positions)
    }

    /// A lone square.
    pub fn single_square() -> Self {
        Self {
            dimension: Dimension::square(1),
            squares: Box::new([Square {
                position: Position::new(0, 0),
            }]),
        }
    }

    /// Gets the dimension of this piece under the given transformation.
    pub fn dimension(&self, transformation: Transformation) -> Dimension {
        transformation.apply_dim(self.dimension)
    }

    /// Number of squares in the piece.
    pub fn size(&self) -> usize {
        self.squares.len()
    }

    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    /// Iterates over the squares of this piece under the given transformation.
    pub fn positions(&self, transformation: Transformation) -> Positions<'_> {
        Positions {
            raw_squares: self.squares.iter(),
            raw_dimension: self.dimension,
            transformation,
        }
    }

    /// The distinct normalized shapes this piece can take under `policy`.
    pub fn orientations(&self, policy: TransformPolicy) -> Vec<Orientation> {
        let raw: Vec<Position> = self.squares.iter().map(|s| s.position).collect();
        orientations(self.dimension, &raw, policy)
    }
}

/// Computes the smallest dimension that holds the given positions.
fn compute_dimension(positions: &[Position]) -> Dimension {
    positions
        .iter()
        .fold(Dimension::new(0, 0), |d, p| {
            Dimension::new(d.width.max(p.x + 1), d.height.max(p.y + 1))
        })
}

/// An iterator over the (transformed) positions of a `Piece`.
#[derive(Debug, Clone)]
pub struct Positions<'a> {
    raw_squares: slice::Iter<'a, Square>,
    raw_dimension: Dimension,
    transformation: Transformation,
}

impl Iterator for Positions<'_> {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        self.raw_squares
            .next()
            .map(|s| self.transformation.apply(self.raw_dimension, s.position))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw_squares.size_hint()
    }
}

impl ExactSizeIterator for Positions<'_> {}

/// An inventory entry: a piece and how many copies of it are available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stock {
    pub piece: Piece,
    pub count: usize,
}

impl Stock {
    pub fn new(piece: Piece, count: usize) -> Self {
        Self { piece, count }
    }

    /// A single copy of `piece`.
    pub fn one(piece: Piece) -> Self {
        Self::new(piece, 1)
    }

    /// Total number of squares across all copies, saturating at `usize::MAX`.
    pub fn cells(&self) -> usize {
        self.piece.size().saturating_mul(self.count)
    }
}

/// Built-in shapes used by the demo, tests and benchmarks.
pub mod catalog {
    use super::Piece;
    use crate::geometry::Position;

    /// Sample quilt patches.
    ///
    /// ```text
    /// piece0   piece1   piece2   piece3   piece4
    /// ##       ##       ##        #        #
    ///  #        #        ##      ##        #
    ///  #        #        ##               ###
    ///           ##                         #
    ///                                      #
    /// ```
    pub const PATCHES: &[&[(usize, usize)]] = &[
        &[(0, 0), (1, 0), (1, 1), (1, 2)],
        &[(0, 0), (1, 0), (1, 1), (1, 2), (1, 3), (2, 3)],
        &[(0, 0), (1, 0), (1, 1), (2, 1), (1, 2), (2, 2)],
        &[(1, 0), (0, 1), (1, 1)],
        &[(1, 0), (1, 1), (0, 2), (1, 2), (2, 2), (1, 3), (1, 4)],
    ];

    /// The twelve free pentominoes, named by their conventional letters.
    pub const PENTOMINOES: &[(char, &[(usize, usize)])] = &[
        ('F', &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)]),
        ('I', &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)]),
        ('L', &[(0, 0), (0, 1), (0, 2), (0, 3), (1, 3)]),
        ('N', &[(1, 0), (1, 1), (0, 2), (1, 2), (0, 3)]),
        ('P', &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]),
        ('T', &[(0, 0), (1, 0), (2, 0), (1, 1), (1, 2)]),
        ('U', &[(0, 0), (2, 0), (0, 1), (1, 1), (2, 1)]),
        ('V', &[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)]),
        ('W', &[(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)]),
        ('X', &[(1, 0), (0, 1), (1, 1), (2, 1), (1, 2)]),
        ('Y', &[(1, 0), (0, 1), (1, 1), (1, 2), (1, 3)]),
        ('Z', &[(0, 0), (1, 0), (1, 1), (1, 2), (2, 2)]),
    ];

    /// Builds a catalog shape. The tables above are checked by tests, so a
    /// failure here would be a bug in the tables themselves.
    fn build(coords: &[(usize, usize)]) -> Piece {
        let positions: Vec<Position> = coords.iter().map(|&(x, y)| Position::new(x, y)).collect();
        match Piece::from_positions(&positions) {
            Ok(piece) => piece,
            Err(err) => panic!("catalog shape {coords:?} is invalid: {err}"),
        }
    }

    /// Sample patch `index`, if there is one.
    pub fn patch(index: usize) -> Option<Piece> {
        PATCHES.get(index).map(|coords| build(coords))
    }

    /// All sample patches in order.
    pub fn patches() -> Vec<Piece> {
        PATCHES.iter().map(|coords| build(coords)).collect()
    }

    /// The pentomino with the given letter, if any.
    pub fn pentomino(letter: char) -> Option<Piece> {
        PENTOMINOES
            .iter()
            .find(|(name, _)| *name == letter)
            .map(|(_, coords)| build(coords))
    }

    /// All twelve pentominoes in letter order.
    pub fn pentominoes() -> Vec<(char, Piece)> {
        PENTOMINOES
            .iter()
            .map(|&(name, coords)| (name, build(coords)))
            .collect()
    }
}
