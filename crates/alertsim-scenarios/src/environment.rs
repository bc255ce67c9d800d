//! Deterministic environment generation.
//!
//! Builds a rectangular plane tiled by N polygonal regions approximating a
//! bounded Voronoi diagram: centers come from rejection sampling with a
//! minimum spacing, then each region's 36-vertex polygon is traced by
//! shrinking each direction's radius to the nearest of the plane boundary
//! and the Voronoi bisectors against the other centers.

use alertsim_core::{Environment, Mulberry32, Point, Region, Severity};

const POLYGON_VERTICES: usize = 36;
const EDGE_MARGIN: f64 = 60.0;
const MIN_RADIUS: f64 = 25.0;

/// Generate the environment for one run. Same RNG state and inputs yield
/// identical regions.
pub fn generate_environment(
    rng: &mut Mulberry32,
    width: f64,
    height: f64,
    region_count: usize,
) -> Environment {
    let centers = sample_centers(rng, width, height, region_count);

    let mut regions = Vec::with_capacity(centers.len());
    for (i, &center) in centers.iter().enumerate() {
        let polygon = trace_polygon(rng, center, &centers, i, width, height);
        let local_factor = (0.9 + (rng.next_f64() - 0.5) * 0.6).clamp(0.7, 1.3);
        let severity = match rng.next_f64() {
            u if u < 0.15 => Severity::Extreme,
            u if u < 0.55 => Severity::Severe,
            _ => Severity::Moderate,
        };
        regions.push(Region {
            id: i as u32,
            center,
            polygon,
            local_factor,
            severity,
        });
    }

    Environment {
        width,
        height,
        regions,
    }
}

/// Rejection-sample region centers with a spacing floor. After the attempt
/// budget runs out the spacing requirement is relaxed so generation always
/// terminates.
fn sample_centers(rng: &mut Mulberry32, width: f64, height: f64, count: usize) -> Vec<Point> {
    let min_spacing = (width.min(height) / (count as f64).sqrt()).max(40.0) * 0.8;
    let budget = count * 240;
    let mut attempts = 0usize;
    let mut centers: Vec<Point> = Vec::with_capacity(count);
    while centers.len() < count {
        let u = rng.next_f64();
        let v = rng.next_f64();
        let candidate = Point {
            x: EDGE_MARGIN + u * (width - 2.0 * EDGE_MARGIN),
            y: EDGE_MARGIN + v * (height - 2.0 * EDGE_MARGIN),
        };
        attempts += 1;
        let spaced = centers
            .iter()
            .all(|c| c.distance(&candidate) > min_spacing);
        if spaced || attempts > budget {
            centers.push(candidate);
        }
    }
    centers
}

fn trace_polygon(
    rng: &mut Mulberry32,
    center: Point,
    centers: &[Point],
    own_index: usize,
    width: f64,
    height: f64,
) -> Vec<Point> {
    let max_radius = width.max(height);
    let mut polygon = Vec::with_capacity(POLYGON_VERTICES);
    for k in 0..POLYGON_VERTICES {
        let theta = k as f64 / POLYGON_VERTICES as f64 * std::f64::consts::TAU;
        let (dx, dy) = (theta.cos(), theta.sin());

        let mut radius = boundary_distance(center, dx, dy, width, height);
        for (j, other) in centers.iter().enumerate() {
            if j != own_index {
                radius = radius.min(bisector_distance(center, *other, dx, dy));
            }
        }
        let jitter = 0.78 + 0.18 * rng.next_f64();
        let r = (radius * jitter).clamp(MIN_RADIUS, max_radius);
        polygon.push(Point {
            x: center.x + r * dx,
            y: center.y + r * dy,
        });
    }
    polygon
}

/// Distance from `c` to the plane boundary along direction `(dx, dy)`.
fn boundary_distance(c: Point, dx: f64, dy: f64, width: f64, height: f64) -> f64 {
    let mut best = f64::INFINITY;
    if dx > 1e-12 {
        best = best.min((width - c.x) / dx);
    } else if dx < -1e-12 {
        best = best.min(-c.x / dx);
    }
    if dy > 1e-12 {
        best = best.min((height - c.y) / dy);
    } else if dy < -1e-12 {
        best = best.min(-c.y / dy);
    }
    best
}

/// Classical Voronoi radius: distance along `(dx, dy)` from `a` to the
/// perpendicular bisector of `a` and `b`. Infinite when the direction
/// points away from `b`.
fn bisector_distance(a: Point, b: Point, dx: f64, dy: f64) -> f64 {
    let ex = b.x - a.x;
    let ey = b.y - a.y;
    let projection = ex * dx + ey * dy;
    if projection <= 0.0 {
        return f64::INFINITY;
    }
    (ex * ex + ey * ey) / (2.0 * projection)
}
