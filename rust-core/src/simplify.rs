//! Route polyline simplification.
//!
//! Recorded GPX tracks carry a point every few meters, far denser than a
//! trek route needs. The Ramer-Douglas-Peucker algorithm drops points that
//! lie within a tolerance of the straight line between their neighbours.

use crate::geo::Coordinate;

const M_PER_DEG_LAT: f64 = 111_320.0;

/// Simplify a polyline, keeping every point that deviates more than
/// `tolerance_m` meters from the simplified line.
///
/// Endpoints are always preserved, so the result of a route with at least
/// two points still starts and ends where the input does.
pub fn simplify(points: &[Coordinate], tolerance_m: f64) -> Vec<Coordinate> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let first = &points[0];
    let last = &points[points.len() - 1];

    let (max_idx, max_dist) = points[1..points.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, perpendicular_distance_m(p, first, last)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if max_dist > tolerance_m {
        let mut left = simplify(&points[..=max_idx], tolerance_m);
        let right = simplify(&points[max_idx..], tolerance_m);

        // junction point appears in both halves
        left.pop();
        left.extend(right);
        left
    } else {
        vec![*first, *last]
    }
}

/// Perpendicular distance from `p` to the line through `a` and `b`, in meters.
///
/// Planar approximation with latitude-cosine scaling.
fn perpendicular_distance_m(p: &Coordinate, a: &Coordinate, b: &Coordinate) -> f64 {
    let m_per_deg_lon = M_PER_DEG_LAT * ((a.lat + b.lat) / 2.0).to_radians().cos();

    let project = |c: &Coordinate| (c.lon * m_per_deg_lon, c.lat * M_PER_DEG_LAT);
    let (ax, ay) = project(a);
    let (bx, by) = project(b);
    let (px, py) = project(p);

    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-10 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }

    ((px - ax) * dy - (py - ay) * dx).abs() / len_sq.sqrt()
}
