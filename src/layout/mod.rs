//! Force-directed layout.
//!
//! The engine is an explicit state machine ([`Simulation`]) advanced one
//! [`Simulation::tick`] at a time by an external scheduler. Each tick decays
//! alpha, applies link, many-body, centering and collision forces to node
//! velocities, then integrates positions. Pinned nodes keep their pin.

pub mod forces;
pub mod simulation;

use serde::{Deserialize, Serialize};

pub use forces::ForceParams;
pub use simulation::{SimLink, SimNode, Simulation, TickOutcome};

/// A point or vector in world coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Smallest box containing every circle `(center, radius)`. `None` if empty.
    pub fn of_circles(circles: impl IntoIterator<Item = (Point, f64)>) -> Option<Self> {
        circles.into_iter().fold(None, |acc, (c, r)| {
            let lo = Point::new(c.x - r, c.y - r);
            let hi = Point::new(c.x + r, c.y + r);
            Some(match acc {
                None => Bounds { min: lo, max: hi },
                Some(b) => Bounds {
                    min: Point::new(b.min.x.min(lo.x), b.min.y.min(lo.y)),
                    max: Point::new(b.max.x.max(hi.x), b.max.y.max(hi.y)),
                },
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }
}
