//! 2D coordinates and the eight symmetries of a square grid.
//!
//! A piece may be rotated by a multiple of 90 degrees and optionally mirrored,
//! giving at most eight distinct orientations (the dihedral group of the
//! square). Which of them the solver may use is chosen by a [`TransformPolicy`].

use std::fmt;

use rustc_hash::FxHashSet;
use serde::Deserialize;

/// A position on the board or in a piece.
///
/// Origin is in the upper left; `x` grows to the right, `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Translates a position relative to another (vector addition).
    pub const fn translate(self, other: Position) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Sort key placing positions in row-major scan order.
    #[inline]
    pub const fn row_major(self) -> (usize, usize) {
        (self.y, self.x)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The width and height of a board or piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dimension {
    pub width: usize,
    pub height: usize,
}

impl Dimension {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub const fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Is the given position within this dimension?
    #[inline]
    pub const fn contains(self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Swaps width and height.
    pub const fn transpose(self) -> Self {
        Self::new(self.height, self.width)
    }

    pub const fn area(self) -> usize {
        self.width * self.height
    }
}

/// Clockwise rotation by a multiple of 90 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    NoRotation,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    /// Applies this rotation to a dimension; odd rotations transpose it.
    pub const fn apply_dim(self, dimension: Dimension) -> Dimension {
        match self {
            Rotation::NoRotation | Rotation::Clockwise180 => dimension,
            Rotation::Clockwise90 | Rotation::Clockwise270 => dimension.transpose(),
        }
    }

    /// Applies this rotation to a position inside a box of the given dimension.
    pub const fn apply(self, d: Dimension, p: Position) -> Position {
        match self {
            Rotation::NoRotation => p,
            Rotation::Clockwise90 => Position::new(d.height - p.y - 1, p.x),
            Rotation::Clockwise180 => Position::new(d.width - p.x - 1, d.height - p.y - 1),
            Rotation::Clockwise270 => Position::new(p.y, d.width - p.x - 1),
        }
    }

    fn degrees(self) -> u16 {
        match self {
            Rotation::NoRotation => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Clockwise180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }
}

/// Mirror image across the vertical axis, or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flip {
    Identity,
    Horizontal,
}

impl Flip {
    pub const fn apply(self, d: Dimension, p: Position) -> Position {
        match self {
            Flip::Identity => p,
            Flip::Horizontal => Position::new(d.width - p.x - 1, p.y),
        }
    }
}

/// A rotation applied first, followed by a flip in the rotated box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transformation {
    pub rotation: Rotation,
    pub flip: Flip,
}

impl Transformation {
    pub const fn new(rotation: Rotation, flip: Flip) -> Self {
        Self { rotation, flip }
    }

    pub const fn identity() -> Self {
        Self::new(Rotation::NoRotation, Flip::Identity)
    }

    pub const fn apply_dim(self, dimension: Dimension) -> Dimension {
        self.rotation.apply_dim(dimension)
    }

    /// Applies this transformation to a position inside a box of dimension `d`.
    pub const fn apply(self, d: Dimension, p: Position) -> Position {
        let p = self.rotation.apply(d, p);
        let d = self.rotation.apply_dim(d);
        self.flip.apply(d, p)
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.rotation.degrees())?;
        if self.flip == Flip::Horizontal {
            f.write_str("+flip")?;
        }
        Ok(())
    }
}

/// All eight transformations in canonical order: identity, the three
/// clockwise rotations, then the same four rotations followed by a flip.
pub const TRANSFORMATIONS: [Transformation; 8] = [
    Transformation::new(Rotation::NoRotation, Flip::Identity),
    Transformation::new(Rotation::Clockwise90, Flip::Identity),
    Transformation::new(Rotation::Clockwise180, Flip::Identity),
    Transformation::new(Rotation::Clockwise270, Flip::Identity),
    Transformation::new(Rotation::NoRotation, Flip::Horizontal),
    Transformation::new(Rotation::Clockwise90, Flip::Horizontal),
    Transformation::new(Rotation::Clockwise180, Flip::Horizontal),
    Transformation::new(Rotation::Clockwise270, Flip::Horizontal),
];

/// Which transformations the solver may apply to a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TransformPolicy {
    NoTransform,
    RotationsOnly,
    RotationsAndReflections,
}

impl TransformPolicy {
    /// Allowed transformations, in canonical order.
    pub fn transformations(self) -> &'static [Transformation] {
        match self {
            TransformPolicy::NoTransform => &TRANSFORMATIONS[..1],
            TransformPolicy::RotationsOnly => &TRANSFORMATIONS[..4],
            TransformPolicy::RotationsAndReflections => &TRANSFORMATIONS,
        }
    }
}

/// One distinct shape a piece can take on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orientation {
    /// First transformation (in canonical order) producing this shape.
    pub transformation: Transformation,
    /// Tight bounding box of the shape.
    pub dimension: Dimension,
    /// Squares normalized to the origin, sorted in row-major order.
    pub squares: Vec<Position>,
}

impl Orientation {
    /// The row-major first square, used to align the shape to a board cell.
    #[inline]
    pub fn anchor(&self) -> Position {
        self.squares[0]
    }
}

/// Generates the distinct orientations of a shape under a policy.
///
/// Each transformed shape is normalized so its minimum coordinates sit at the
/// origin; shapes equal to an earlier one (symmetric pieces) are dropped, so
/// the result keeps canonical order and holds at most eight entries.
pub fn orientations(
    dimension: Dimension,
    squares: &[Position],
    policy: TransformPolicy,
) -> Vec<Orientation> {
    let mut seen: FxHashSet<Vec<Position>> = FxHashSet::default();
    let mut result = Vec::new();

    for &transformation in policy.transformations() {
        let transformed: Vec<Position> = squares
            .iter()
            .map(|&square| transformation.apply(dimension, square))
            .collect();
        let (normalized, tight) = normalize_to_origin(transformed);

        if seen.insert(normalized.clone()) {
            result.push(Orientation {
                transformation,
                dimension: tight,
                squares: normalized,
            });
        }
    }

    result
}

/// Translates positions so the minimum x and y are zero, sorts them in
/// row-major order, and returns them with their tight bounding box.
pub fn normalize_to_origin(mut positions: Vec<Position>) -> (Vec<Position>, Dimension) {
    let (Some(min_x), Some(min_y)) = (
        positions.iter().map(|p| p.x).min(),
        positions.iter().map(|p| p.y).min(),
    ) else {
        return (positions, Dimension::new(0, 0));
    };

    let mut tight = Dimension::new(0, 0);
    for p in &mut positions {
        p.x -= min_x;
        p.y -= min_y;
        tight.width = tight.width.max(p.x + 1);
        tight.height = tight.height.max(p.y + 1);
    }
    positions.sort_by_key(|p| p.row_major());

    (positions, tight)
}

#[cfg(test)]
mod tests {
    use super::Flip::*;
    use super::Rotation::*;
    use super::*;

    fn pos(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_transform_upper_left_corner() {
        let d = Dimension::new(6, 4);
        let p = pos(0, 0);
        let check = |r, f, x, y| assert_eq!(Transformation::new(r, f).apply(d, p), pos(x, y));

        check(NoRotation, Identity, 0, 0);
        check(Clockwise90, Identity, 3, 0);
        check(Clockwise180, Identity, 5, 3);
        check(Clockwise270, Identity, 0, 5);
        check(NoRotation, Horizontal, 5, 0);
        check(Clockwise90, Horizontal, 0, 0);
        check(Clockwise180, Horizontal, 0, 3);
        check(Clockwise270, Horizontal, 3, 5);
    }

    #[test]
    fn test_transform_interior_point() {
        let d = Dimension::new(6, 4);
        let p = pos(2, 1);
        let check = |r, f, x, y| assert_eq!(Transformation::new(r, f).apply(d, p), pos(x, y));

        check(NoRotation, Identity, 2, 1);
        check(Clockwise90, Identity, 2, 2);
        check(Clockwise180, Identity, 3, 2);
        check(Clockwise270, Identity, 1, 3);
        check(NoRotation, Horizontal, 3, 1);
        check(Clockwise90, Horizontal, 1, 2);
        check(Clockwise180, Horizontal, 2, 2);
        check(Clockwise270, Horizontal, 2, 3);
    }

    #[test]
    fn test_odd_rotations_transpose_dimension() {
        let d = Dimension::new(2, 3);
        assert_eq!(Transformation::identity().apply_dim(d), d);
        assert_eq!(
            Transformation::new(Clockwise90, Horizontal).apply_dim(d),
            Dimension::new(3, 2)
        );
    }

    #[test]
    fn test_policy_transformation_counts() {
        assert_eq!(TransformPolicy::NoTransform.transformations().len(), 1);
        assert_eq!(TransformPolicy::RotationsOnly.transformations().len(), 4);
        assert_eq!(
            TransformPolicy::RotationsAndReflections.transformations().len(),
            8
        );
        assert_eq!(
            TransformPolicy::NoTransform.transformations()[0],
            Transformation::identity()
        );
    }

    #[test]
    fn test_symmetric_shapes_collapse() {
        // 2x2 block: every transformation yields the same shape
        let block = [pos(0, 0), pos(1, 0), pos(0, 1), pos(1, 1)];
        let all = orientations(Dimension::square(2), &block, TransformPolicy::RotationsAndReflections);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].transformation, Transformation::identity());

        // straight tromino: two orientations
        let bar = [pos(0, 0), pos(1, 0), pos(2, 0)];
        let all = orientations(Dimension::new(3, 1), &bar, TransformPolicy::RotationsAndReflections);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].dimension, Dimension::new(1, 3));
    }

    #[test]
    fn test_chiral_shape_has_eight_orientations() {
        // ##
        //  #
        //  #
        let shape = [pos(0, 0), pos(1, 0), pos(1, 1), pos(1, 2)];
        let d = Dimension::new(2, 3);
        assert_eq!(orientations(d, &shape, TransformPolicy::RotationsOnly).len(), 4);
        assert_eq!(
            orientations(d, &shape, TransformPolicy::RotationsAndReflections).len(),
            8
        );
    }

    #[test]
    fn test_loose_bounding_box_is_normalized() {
        // single square in the right column of a 3x1 box
        let shape = [pos(2, 0)];
        let all = orientations(Dimension::new(3, 1), &shape, TransformPolicy::RotationsOnly);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].squares, vec![pos(0, 0)]);
        assert_eq!(all[0].dimension, Dimension::new(1, 1));
    }

    #[test]
    fn test_anchor_is_row_major_first() {
        //  #
        // ##
        let shape = [pos(1, 0), pos(0, 1), pos(1, 1)];
        let all = orientations(Dimension::square(2), &shape, TransformPolicy::NoTransform);
        assert_eq!(all[0].anchor(), pos(1, 0));
        assert_eq!(all[0].squares, vec![pos(1, 0), pos(0, 1), pos(1, 1)]);
    }
}
