//! Regions and the rectangular plane they tile.

use crate::alert::Severity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A Voronoi-like cell of the plane.
///
/// Immutable after generation. `local_factor` multiplies the baseline
/// delivery reliability for alerts in this region; `severity` is the
/// region's hazard class (Moderate, Severe, or Extreme) and biases both
/// alert synthesis and history synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: u32,
    pub center: Point,
    /// Convex polygon vertices, implicitly closed. At least 3 points.
    pub polygon: Vec<Point>,
    /// Local reliability multiplier in `[0.7, 1.3]`.
    pub local_factor: f64,
    pub severity: Severity,
}

/// The rectangular plane plus its regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub width: f64,
    pub height: f64,
    pub regions: Vec<Region>,
}

impl Environment {
    /// Look up a region by id. Region ids are dense indexes, so this is a
    /// direct access guarded against holes.
    pub fn region(&self, id: u32) -> Option<&Region> {
        self.regions
            .get(id as usize)
            .filter(|r| r.id == id)
            .or_else(|| self.regions.iter().find(|r| r.id == id))
    }
}
