//! Spoken navigation guidance.
//!
//! Guidance re-resolves the next waypoint itself instead of reading it from
//! `NavigationState`, so it can be requested at any moment without waiting
//! for the next location tick.

use serde::Serialize;

use crate::catalog::{TrekPath, Waypoint};
use crate::config::NavigatorConfig;
use crate::geo::{bearing, distance, Coordinate, Direction};
use crate::tracker::{estimate_minutes, find_next_waypoint, NavigationState, WeatherInfo};

const NO_WAYPOINT_INSTRUCTION: &str =
    "Continue following the marked trail. Stay alert for trail markers.";
const DEFAULT_WAYPOINT_NOTE: &str = "Stay on the marked trail.";
const UNKNOWN_WAYPOINT: &str = "Unknown location";
const UNKNOWN_DIRECTION: &str = "Unknown";

/// Guidance for the hiker's current position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Guidance {
    pub instruction: String,
    /// Kilometers to the next waypoint.
    pub distance: f64,
    pub direction: String,
    /// Minutes to the next waypoint.
    pub estimated_time: u32,
    pub safety_warnings: Vec<String>,
    pub landmarks: Vec<String>,
    pub next_waypoint: String,
}

/// Build guidance with default radii.
pub fn guidance(location: &Coordinate, trek: &TrekPath, state: &NavigationState) -> Guidance {
    guidance_with(location, trek, state, &NavigatorConfig::default())
}

/// `guidance` with explicit exclusion and landmark radii.
pub fn guidance_with(
    location: &Coordinate,
    trek: &TrekPath,
    state: &NavigationState,
    config: &NavigatorConfig,
) -> Guidance {
    let next = find_next_waypoint(location, trek, config.waypoint_exclusion_km);

    let mut safety_warnings = alert_messages(state);
    safety_warnings.extend(trek.warnings.iter().cloned());

    let landmarks = nearby_landmarks(location, trek, config.nearby_landmark_km);

    match next {
        Some((waypoint, dist)) => {
            let direction = Direction::from_bearing(bearing(location, waypoint.coordinates()));
            Guidance {
                instruction: instruction(dist, direction, &waypoint),
                distance: dist,
                direction: direction.label().to_string(),
                estimated_time: estimate_minutes(dist, trek.difficulty),
                safety_warnings,
                landmarks,
                next_waypoint: waypoint.name().to_string(),
            }
        }
        None => Guidance {
            safety_warnings,
            landmarks,
            ..no_waypoint()
        },
    }
}

/// Guidance when no trek is selected: the generic trail instruction plus
/// whatever alerts the session has collected.
pub fn guidance_without_trek(state: &NavigationState) -> Guidance {
    Guidance {
        safety_warnings: alert_messages(state),
        ..no_waypoint()
    }
}

fn no_waypoint() -> Guidance {
    Guidance {
        instruction: NO_WAYPOINT_INSTRUCTION.to_string(),
        distance: 0.0,
        direction: UNKNOWN_DIRECTION.to_string(),
        estimated_time: 0,
        safety_warnings: Vec::new(),
        landmarks: Vec::new(),
        next_waypoint: UNKNOWN_WAYPOINT.to_string(),
    }
}

fn alert_messages(state: &NavigationState) -> Vec<String> {
    state.safety_alerts.iter().map(|a| a.message.clone()).collect()
}

fn instruction(distance_km: f64, direction: Direction, waypoint: &Waypoint<'_>) -> String {
    let note = match waypoint.description() {
        Some(d) => sentence(d),
        None => DEFAULT_WAYPOINT_NOTE.to_string(),
    };

    format!(
        "Continue {} for {} to reach {}. {}",
        direction.label().to_lowercase(),
        format_distance(distance_km),
        waypoint.name(),
        note
    )
}

fn sentence(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{} meters", (km * 1000.0).round() as i64)
    } else {
        format!("{km:.1} kilometers")
    }
}

/// Landmarks within `radius_km`, in declared order.
fn nearby_landmarks(location: &Coordinate, trek: &TrekPath, radius_km: f64) -> Vec<String> {
    trek.landmarks
        .iter()
        .filter_map(|l| {
            let d = distance(location, &l.coordinates);
            (d < radius_km).then(|| format!("{} ({d:.1} km away)", l.name))
        })
        .collect()
}

/// Advice derived from the current weather snapshot.
pub fn weather_guidance(weather: &WeatherInfo) -> String {
    let mut advice: Vec<&str> = Vec::new();

    if weather.temperature < 0.0 {
        advice.push("WARNING: Freezing temperatures. Ensure proper thermal protection.");
    } else if weather.temperature > 35.0 {
        advice.push("WARNING: High temperatures. Stay hydrated and avoid heat exhaustion.");
    }

    if weather.visibility < 100.0 {
        advice.push("CAUTION: Low visibility. Stay on marked trails and use GPS navigation.");
    }

    if weather.wind_speed > 50.0 {
        advice.push("WARNING: High winds. Be cautious of falling branches and debris.");
    }

    let condition = weather.condition.to_lowercase();
    if condition.contains("rain") || condition.contains("snow") {
        advice.push("CAUTION: Wet conditions. Trails may be slippery. Use appropriate footwear.");
    }

    if advice.is_empty() {
        "Weather conditions are suitable for trekking. Continue with normal precautions.".to_string()
    } else {
        advice.join(" ")
    }
}
