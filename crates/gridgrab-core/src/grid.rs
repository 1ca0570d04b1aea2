use rand::Rng;
use serde::{Deserialize, Serialize};

/// Side length of the square, wrap-around board.
pub const GRID_SIZE: u8 = 20;

/// A board coordinate, always normalized into `[0, GRID_SIZE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: u8,
    pub y: u8,
}

impl Cell {
    pub fn new(x: u8, y: u8) -> Self {
        Self {
            x: x % GRID_SIZE,
            y: y % GRID_SIZE,
        }
    }

    /// Move one cell, wrapping to the opposite edge.
    pub fn step(self, direction: Direction) -> Self {
        let n = GRID_SIZE;
        match direction {
            Direction::Left => Self::new((self.x + n - 1) % n, self.y),
            Direction::Right => Self::new((self.x + 1) % n, self.y),
            Direction::Up => Self::new(self.x, (self.y + n - 1) % n),
            Direction::Down => Self::new(self.x, (self.y + 1) % n),
        }
    }

    /// Plain `|dx| + |dy|`. Radii do not wrap across the board edge.
    pub fn manhattan(self, other: Cell) -> u32 {
        u32::from(self.x.abs_diff(other.x)) + u32::from(self.y.abs_diff(other.y))
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.random_range(0..GRID_SIZE), rng.random_range(0..GRID_SIZE))
    }
}

/// Movement intent sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Mirror image used while a player is confused.
    pub fn inverted(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}
