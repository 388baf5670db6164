//! Geospatial computations.
//!
//! Platform-agnostic great-circle math used by the tracker and the
//! guidance generator. All coordinates use WGS84 (lat/lon in degrees),
//! all distances are kilometers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees.
///
/// Serialized as a `[lat, lon]` pair, which is how trek catalog files and
/// the Android app exchange positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Position from latitude and longitude.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True for a finite latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lat, c.lon]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance between two coordinates in kilometers.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Initial bearing from `a` to `b` along the great circle, in degrees [0, 360).
///
/// Identical points yield 0.
pub fn bearing(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let bearing = y.atan2(x).to_degrees();
    (bearing + 360.0) % 360.0
}

/// The eight compass points used in spoken directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl Direction {
    const ALL: [Direction; 8] = [
        Direction::North,
        Direction::Northeast,
        Direction::East,
        Direction::Southeast,
        Direction::South,
        Direction::Southwest,
        Direction::West,
        Direction::Northwest,
    ];

    /// Compass point whose 45° sector contains `bearing`.
    pub fn from_bearing(bearing: f64) -> Self {
        let index = (bearing / 45.0).round() as i64;
        Self::ALL[index.rem_euclid(8) as usize]
    }

    /// Compass label, e.g. "Northeast".
    pub fn label(self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::Northeast => "Northeast",
            Direction::East => "East",
            Direction::Southeast => "Southeast",
            Direction::South => "South",
            Direction::Southwest => "Southwest",
            Direction::West => "West",
            Direction::Northwest => "Northwest",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compass label for a bearing in degrees.
pub fn direction_label(bearing: f64) -> &'static str {
    Direction::from_bearing(bearing).label()
}

/// Total length of a route polyline in kilometers.
pub fn route_length_km(coordinates: &[Coordinate]) -> f64 {
    coordinates
        .windows(2)
        .map(|w| distance(&w[0], &w[1]))
        .sum()
}

/// Result of projecting a position onto a route polyline.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// Nearest point on the route.
    pub point: Coordinate,
    /// Index of the segment start point (0-based).
    pub segment_index: usize,
    /// Cross-track distance from the position to `point`, in kilometers.
    pub distance_km: f64,
    /// Distance along the route from its start to `point`, in kilometers.
    pub along_km: f64,
}

/// Project a position onto the nearest segment of a route.
///
/// Returns None if the route has fewer than 2 points.
pub fn project_on_route(position: &Coordinate, route: &[Coordinate]) -> Option<Projection> {
    if route.len() < 2 {
        return None;
    }

    let mut best: Option<Projection> = None;
    let mut cumulative = 0.0;

    for (i, segment) in route.windows(2).enumerate() {
        let a = &segment[0];
        let b = &segment[1];

        let projected = project_on_segment(position, a, b);
        let dist = distance(position, &projected);

        if best.map_or(true, |prev| dist < prev.distance_km) {
            best = Some(Projection {
                point: projected,
                segment_index: i,
                distance_km: dist,
                along_km: cumulative + distance(a, &projected),
            });
        }

        cumulative += distance(a, b);
    }

    best
}

/// Planar projection of `p` onto segment a-b, scaled by latitude cosine.
///
/// Accurate enough for trail segments, which are far below 10 km.
fn project_on_segment(p: &Coordinate, a: &Coordinate, b: &Coordinate) -> Coordinate {
    let cos_lat = ((a.lat + b.lat) / 2.0).to_radians().cos();

    let dx = (b.lon - a.lon) * cos_lat;
    let dy = b.lat - a.lat;
    let px = (p.lon - a.lon) * cos_lat;
    let py = p.lat - a.lat;

    let seg_len_sq = dx * dx + dy * dy;
    if seg_len_sq < 1e-20 {
        return *a;
    }

    let t = ((px * dx + py * dy) / seg_len_sq).clamp(0.0, 1.0);

    Coordinate {
        lat: a.lat + t * (b.lat - a.lat),
        lon: a.lon + t * (b.lon - a.lon),
    }
}
