//! Core value types shared across the controller
//!
//! [`Position`] is the continuous world-space location of the agent and
//! [`DiscreteState`] the grid cell it maps to for table lookups.

use std::{
    fmt,
    ops::{Add, Sub},
};

use serde::{Deserialize, Serialize};

/// World axis, used to report which coordinate left the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Continuous 3D position in world units
///
/// `y` is the vertical axis; the ground plane sits at `y = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Coordinate along `axis`
    pub fn component(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Euclidean length of the position treated as a vector
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to `other`
    pub fn distance(&self, other: &Position) -> f64 {
        (*self - *other).length()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Copy of this position with `y` raised to at least `floor`
    pub fn with_min_height(&self, floor: f64) -> Self {
        Self {
            y: self.y.max(floor),
            ..*self
        }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Grid cell produced by [`crate::discretizer::StateDiscretizer`]
///
/// Each index lies in `[0, grid_size)` of the discretizer that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscreteState {
    pub ix: u32,
    pub iy: u32,
    pub iz: u32,
}

impl DiscreteState {
    pub const fn new(ix: u32, iy: u32, iz: u32) -> Self {
        Self { ix, iy, iz }
    }

    /// Row-major offset into a dense `grid_size³` table
    pub fn flat_index(&self, grid_size: usize) -> usize {
        (self.ix as usize * grid_size + self.iy as usize) * grid_size + self.iz as usize
    }
}

impl fmt::Display for DiscreteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.ix, self.iy, self.iz)
    }
}
