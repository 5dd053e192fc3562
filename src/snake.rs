use std::collections::VecDeque;

use serde::Serialize;

use crate::config::round_half_up;
use crate::error::GameError;
use crate::input::Vector2;

/// Grid position in logical cell coordinates.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this position moved by one step of `velocity`.
    #[must_use]
    pub fn offset(self, velocity: Velocity) -> Self {
        Self {
            x: self.x + velocity.x(),
            y: self.y + velocity.y(),
        }
    }
}

/// Per-tick movement: either standing still or one unit along an axis.
///
/// The fields are private so that only the five legal values can exist.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub struct Velocity {
    x: i32,
    y: i32,
}

impl Velocity {
    pub const ZERO: Self = Self { x: 0, y: 0 };
    pub const RIGHT: Self = Self { x: 1, y: 0 };
    pub const LEFT: Self = Self { x: -1, y: 0 };
    pub const DOWN: Self = Self { x: 0, y: 1 };
    pub const UP: Self = Self { x: 0, y: -1 };

    #[must_use]
    pub fn x(self) -> i32 {
        self.x
    }

    #[must_use]
    pub fn y(self) -> i32 {
        self.y
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// Returns the 180° opposite of this velocity.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl TryFrom<Vector2> for Velocity {
    type Error = GameError;

    /// Rounds both components and accepts only zero or a unit axis vector.
    fn try_from(raw: Vector2) -> Result<Self, Self::Error> {
        let invalid = || GameError::InvalidDirection { x: raw.x, y: raw.y };

        if !raw.x.is_finite() || !raw.y.is_finite() {
            return Err(invalid());
        }

        let x = round_half_up(raw.x);
        let y = round_half_up(raw.y);
        if x != 0.0 && y != 0.0 {
            return Err(invalid());
        }
        if x.abs() > 1.0 || y.abs() > 1.0 {
            return Err(invalid());
        }

        Ok(Self {
            x: x as i32,
            y: y as i32,
        })
    }
}

/// Ordered snake body, head at the front.
#[derive(Debug, Clone)]
pub struct Snake {
    body: VecDeque<Position>,
}

impl Snake {
    /// Creates a one-cell snake at `start`.
    #[must_use]
    pub fn new(start: Position) -> Self {
        let mut body = VecDeque::new();
        body.push_front(start);

        Self { body }
    }

    /// Creates a snake from explicit body segments (front is head).
    ///
    /// Returns `None` for an empty segment list.
    #[must_use]
    pub fn from_segments(segments: Vec<Position>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }

        Some(Self {
            body: VecDeque::from(segments),
        })
    }

    /// Returns the current head position.
    #[must_use]
    pub fn head(&self) -> Position {
        // Every constructor guarantees at least one segment and nothing pops
        // the last one.
        self.body[0]
    }

    /// Returns the last segment.
    #[must_use]
    pub fn tail(&self) -> Position {
        self.body[self.body.len() - 1]
    }

    /// Returns true if any segment occupies `position`.
    #[must_use]
    pub fn occupies(&self, position: Position) -> bool {
        self.body.contains(&position)
    }

    /// Returns true when two segments share a cell.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.body
            .iter()
            .enumerate()
            .any(|(index, segment)| self.body.iter().skip(index + 1).any(|other| other == segment))
    }

    /// Returns current segment count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Always false: a snake has at least one segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Iterates over body segments from head to tail.
    pub fn segments(&self) -> impl Iterator<Item = &Position> {
        self.body.iter()
    }

    pub(crate) fn push_head(&mut self, position: Position) {
        self.body.push_front(position);
    }

    /// Drops the tail segment, never the last remaining one.
    pub(crate) fn pop_tail(&mut self) {
        if self.body.len() > 1 {
            let _ = self.body.pop_back();
        }
    }
}
