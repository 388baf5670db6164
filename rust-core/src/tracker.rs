//! Navigation state tracking.
//!
//! Each location tick is turned into a `NavigationUpdate` by the pure
//! `update` function; the session merges that snapshot into its
//! `NavigationState`. Progress is a straight-line heuristic (distance from
//! the start point over the route length), not a projection onto the route,
//! so a hiker far off the trail can still see a high percentage. The
//! cross-track distance is reported separately in `off_route_km`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Difficulty, TrekPath, Waypoint, WaypointCategory};
use crate::geo::{distance, project_on_route, route_length_km, Coordinate};

/// Waypoints closer than this (100 m) count as already reached.
pub const WAYPOINT_EXCLUSION_KM: f64 = 0.1;

/// Alert urgency. Ordered, `Critical` is highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// What a safety alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Weather,
    Terrain,
    Wildlife,
    Medical,
}

impl AlertCategory {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertCategory::Weather => "weather",
            AlertCategory::Terrain => "terrain",
            AlertCategory::Wildlife => "wildlife",
            AlertCategory::Medical => "medical",
        }
    }
}

/// A safety alert raised during a session. Never modified once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub category: AlertCategory,
    pub severity: Severity,
    pub message: String,
    pub coordinates: Coordinate,
    pub timestamp: DateTime<Utc>,
}

impl SafetyAlert {
    /// Create an alert stamped with the current time; the id is the
    /// timestamp in milliseconds.
    pub fn new(
        category: AlertCategory,
        severity: Severity,
        message: impl Into<String>,
        coordinates: Coordinate,
    ) -> Self {
        let timestamp = Utc::now();
        Self {
            id: timestamp.timestamp_millis().to_string(),
            category,
            severity,
            message: message.into(),
            coordinates,
            timestamp,
        }
    }
}

/// Weather snapshot attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherInfo {
    /// Degrees Celsius.
    pub temperature: f64,
    pub condition: String,
    /// Meters.
    pub visibility: f64,
    /// km/h.
    pub wind_speed: f64,
    /// mm.
    pub precipitation: f64,
    pub updated_at: DateTime<Utc>,
}

impl Default for WeatherInfo {
    fn default() -> Self {
        Self {
            temperature: 20.0,
            condition: "Clear".into(),
            visibility: 100.0,
            wind_speed: 10.0,
            precipitation: 0.0,
            updated_at: Utc::now(),
        }
    }
}

/// Owned summary of the waypoint the hiker is heading to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextWaypoint {
    pub id: String,
    pub name: String,
    pub category: WaypointCategory,
    pub coordinates: Coordinate,
}

impl From<Waypoint<'_>> for NextWaypoint {
    fn from(w: Waypoint<'_>) -> Self {
        Self {
            id: w.id().to_string(),
            name: w.name().to_string(),
            category: w.category(),
            coordinates: *w.coordinates(),
        }
    }
}

/// Result of one location tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationUpdate {
    pub location: Coordinate,
    /// Percent, within [0, 100].
    pub progress: f64,
    pub next_waypoint: Option<NextWaypoint>,
    /// Kilometers, 0 when no waypoint is eligible.
    pub distance_to_next: f64,
    /// Minutes.
    pub estimated_time_to_next: u32,
    /// Cross-track distance to the route polyline, in kilometers.
    pub off_route_km: f64,
}

/// Per-session navigation state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationState {
    pub current_location: Option<Coordinate>,
    #[serde(skip)]
    pub current_trek: Option<Arc<TrekPath>>,
    pub progress: f64,
    pub next_waypoint: Option<NextWaypoint>,
    pub distance_to_next: f64,
    pub estimated_time_to_next: u32,
    pub off_route_km: f64,
    pub weather_conditions: WeatherInfo,
    /// Append-only for the life of the session.
    pub safety_alerts: Vec<SafetyAlert>,
}

impl NavigationState {
    /// Fresh state for navigating `trek`.
    pub fn new(trek: Arc<TrekPath>) -> Self {
        Self {
            current_trek: Some(trek),
            ..Self::default()
        }
    }

    /// Merge the result of a location tick.
    pub fn apply(&mut self, update: NavigationUpdate) {
        self.current_location = Some(update.location);
        self.progress = update.progress;
        self.next_waypoint = update.next_waypoint;
        self.distance_to_next = update.distance_to_next;
        self.estimated_time_to_next = update.estimated_time_to_next;
        self.off_route_km = update.off_route_km;
    }

    /// Append an alert. Alerts are never removed.
    pub fn push_alert(&mut self, alert: SafetyAlert) {
        self.safety_alerts.push(alert);
    }
}

/// Nearest landmark or campsite farther away than `exclusion_km`.
///
/// Ties keep the first candidate in `TrekPath::route_waypoints` order.
/// A location that yields no finite distance selects nothing.
pub fn find_next_waypoint<'a>(
    location: &Coordinate,
    trek: &'a TrekPath,
    exclusion_km: f64,
) -> Option<(Waypoint<'a>, f64)> {
    let mut best: Option<(Waypoint<'a>, f64)> = None;

    for waypoint in trek.route_waypoints() {
        let d = distance(location, waypoint.coordinates());
        if d.is_nan() || d <= exclusion_km {
            continue;
        }
        if best.map_or(true, |(_, min)| d < min) {
            best = Some((waypoint, d));
        }
    }

    best
}

/// Walking time for `distance_km` on a trail of the given difficulty, in
/// whole minutes.
pub fn estimate_minutes(distance_km: f64, difficulty: Difficulty) -> u32 {
    (distance_km / difficulty.walking_speed_kmh() * 60.0).round() as u32
}

/// Straight-line progress from the start point, clamped to [0, 100].
pub fn progress(location: &Coordinate, trek: &TrekPath) -> f64 {
    let total = route_length_km(&trek.coordinates);
    if total.is_nan() || total <= 0.0 {
        return 0.0;
    }

    let pct = distance(&trek.start_point, location) / total * 100.0;
    if pct.is_nan() {
        0.0
    } else {
        pct.clamp(0.0, 100.0)
    }
}

/// Recompute navigation data for a new location.
pub fn update(location: &Coordinate, trek: &TrekPath) -> NavigationUpdate {
    update_with(location, trek, WAYPOINT_EXCLUSION_KM)
}

/// `update` with an explicit waypoint exclusion radius.
pub fn update_with(location: &Coordinate, trek: &TrekPath, exclusion_km: f64) -> NavigationUpdate {
    let next = find_next_waypoint(location, trek, exclusion_km);
    let distance_to_next = next.map_or(0.0, |(_, d)| d);

    let off_route_km = project_on_route(location, &trek.coordinates)
        .map(|p| p.distance_km)
        .filter(|d| d.is_finite())
        .unwrap_or(0.0);

    NavigationUpdate {
        location: *location,
        progress: progress(location, trek),
        next_waypoint: next.map(|(w, _)| w.into()),
        distance_to_next,
        estimated_time_to_next: estimate_minutes(distance_to_next, trek.difficulty),
        off_route_km,
    }
}
