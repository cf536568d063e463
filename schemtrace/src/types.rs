//! Geometric primitives shared by every pipeline stage.
//!
//! All coordinates are integer pixel positions in image space (y grows
//! downward). Types derive [`serde::Serialize`] so a normalized graph can be
//! dumped to JSON for inspection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Point in 2D image space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }

    /// Translate by an integer offset.
    pub fn offset(&self, dx: i64, dy: i64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An immutable detected line segment.
///
/// Serialized as the `[x1, y1, x2, y2]` tuple the line detector produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 4]", into = "[i64; 4]")]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// If `p` lies within `radius` of one endpoint, return the opposite
    /// endpoint. The start endpoint is tested first.
    pub fn far_end_from(&self, p: Point, radius: f64) -> Option<Point> {
        if p.distance(self.start) < radius {
            Some(self.end)
        } else if p.distance(self.end) < radius {
            Some(self.start)
        } else {
            None
        }
    }
}

impl From<[i64; 4]> for Line {
    fn from(v: [i64; 4]) -> Self {
        Line::new(Point::new(v[0], v[1]), Point::new(v[2], v[3]))
    }
}

impl From<Line> for [i64; 4] {
    fn from(l: Line) -> Self {
        [l.start.x, l.start.y, l.end.x, l.end.y]
    }
}

/// Symbol rotation. Only the two orthogonal placements are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[serde(rename = "0")]
    R0,
    #[default]
    #[serde(rename = "90")]
    R90,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.degrees())
    }
}

/// Terminal slot of a node. Two-terminal parts only use `A` and `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terminal {
    A,
    B,
    C,
    D,
}

impl Terminal {
    pub const ALL: [Terminal; 4] = [Terminal::A, Terminal::B, Terminal::C, Terminal::D];

    /// Slot index into per-terminal arrays.
    pub fn index(self) -> usize {
        match self {
            Terminal::A => 0,
            Terminal::B => 1,
            Terminal::C => 2,
            Terminal::D => 3,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Terminal::A => "A",
            Terminal::B => "B",
            Terminal::C => "C",
            Terminal::D => "D",
        };
        f.write_str(s)
    }
}

/// Index of a node inside [`crate::graph::Graph::nodes`].
///
/// Neighbor links are stored as ids rather than references so the graph
/// stays a flat arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiId(pub usize);

impl fmt::Display for PoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
