//! Grid geometry: positions, facing and relative turns.
//!
//! `x` grows to the east and `y` grows to the south, so `North` is `y - 1`.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// An integer position (or offset) on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vector2D {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Vector2D {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance, `max(|dx|, |dy|)`. Used for every range test.
    #[must_use]
    pub const fn chebyshev_distance(self, other: Self) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        if dx > dy { dx } else { dy }
    }

    /// Squared Euclidean distance.
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance(self, other: Self) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    /// Whether `other` lies within `range` of this position (Chebyshev).
    #[must_use]
    pub const fn is_within(self, other: Self, range: i32) -> bool {
        self.chebyshev_distance(other) <= range
    }

    /// Component-wise sum, or `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match (self.x.checked_add(other.x), self.y.checked_add(other.y)) {
            (Some(x), Some(y)) => Some(Self::new(x, y)),
            _ => None,
        }
    }

    /// Both components multiplied by `factor`, or `None` on overflow.
    #[must_use]
    pub const fn checked_scale(self, factor: i32) -> Option<Self> {
        match (self.x.checked_mul(factor), self.y.checked_mul(factor)) {
            (Some(x), Some(y)) => Some(Self::new(x, y)),
            _ => None,
        }
    }

    /// The eight surrounding positions, in row-major order.
    #[must_use]
    pub fn surrounding(self) -> [Vector2D; 8] {
        [
            Vector2D::new(self.x - 1, self.y - 1),
            Vector2D::new(self.x, self.y - 1),
            Vector2D::new(self.x + 1, self.y - 1),
            Vector2D::new(self.x - 1, self.y),
            Vector2D::new(self.x + 1, self.y),
            Vector2D::new(self.x - 1, self.y + 1),
            Vector2D::new(self.x, self.y + 1),
            Vector2D::new(self.x + 1, self.y + 1),
        ]
    }
}

impl Add for Vector2D {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2D {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Vector2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Absolute facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Towards `y - 1`.
    North,
    /// Towards `y + 1`.
    South,
    /// Towards `x + 1`.
    East,
    /// Towards `x - 1`.
    West,
}

impl Orientation {
    /// All orientations, clockwise from north.
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::East,
        Orientation::South,
        Orientation::West,
    ];

    /// Unit step in this direction.
    #[must_use]
    pub const fn unit(self) -> Vector2D {
        match self {
            Orientation::North => Vector2D::new(0, -1),
            Orientation::South => Vector2D::new(0, 1),
            Orientation::East => Vector2D::new(1, 0),
            Orientation::West => Vector2D::new(-1, 0),
        }
    }

    /// Quarter turn clockwise.
    #[must_use]
    pub const fn right(self) -> Self {
        match self {
            Orientation::North => Orientation::East,
            Orientation::East => Orientation::South,
            Orientation::South => Orientation::West,
            Orientation::West => Orientation::North,
        }
    }

    /// Quarter turn counter-clockwise.
    #[must_use]
    pub const fn left(self) -> Self {
        match self {
            Orientation::North => Orientation::West,
            Orientation::West => Orientation::South,
            Orientation::South => Orientation::East,
            Orientation::East => Orientation::North,
        }
    }

    /// Half turn.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Orientation::North => Orientation::South,
            Orientation::South => Orientation::North,
            Orientation::East => Orientation::West,
            Orientation::West => Orientation::East,
        }
    }

    /// Orientation after turning in a relative direction.
    ///
    /// [`Direction::Random`] must be resolved by the caller; it is treated as
    /// [`Direction::Forward`] here.
    #[must_use]
    pub const fn turn(self, direction: Direction) -> Self {
        match direction {
            Direction::Forward | Direction::Random => self,
            Direction::Backward => self.opposite(),
            Direction::Left => self.left(),
            Direction::Right => self.right(),
        }
    }
}

/// A turn relative to the current orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Keep facing.
    Forward,
    /// Turn around.
    Backward,
    /// Quarter turn counter-clockwise.
    Left,
    /// Quarter turn clockwise.
    Right,
    /// One of the four above, drawn by the world's RNG.
    Random,
}

impl Direction {
    /// The four concrete directions.
    pub const CONCRETE: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];
}

/// Position plus facing. Immutable; moves produce a new pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pose {
    /// Grid position.
    pub position: Vector2D,
    /// Facing.
    pub orientation: Orientation,
}

impl Pose {
    /// Create a new pose.
    #[must_use]
    pub const fn new(position: Vector2D, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Same facing, different position.
    #[must_use]
    pub const fn at(self, position: Vector2D) -> Self {
        Self::new(position, self.orientation)
    }

    /// Pose reached by turning towards `direction` and walking `step` cells.
    ///
    /// `None` when the destination does not fit in an `i32` grid position.
    #[must_use]
    pub const fn stepped(self, step: i32, direction: Direction) -> Option<Self> {
        let orientation = self.orientation.turn(direction);
        let Some(offset) = orientation.unit().checked_scale(step) else {
            return None;
        };
        match self.position.checked_add(offset) {
            Some(position) => Some(Self::new(position, orientation)),
            None => None,
        }
    }
}
