//! Navigator tunables.
//!
//! Every field has a default, so the Android host only needs to pass the
//! values it wants to override, e.g. `{"pollIntervalSecs": 5}`.

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Configuration for a navigation session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigatorConfig {
    /// Seconds between location polls while navigating.
    pub poll_interval_secs: u64,
    /// Upper bound for one visual path analysis.
    pub analysis_timeout_secs: u64,
    /// Waypoints closer than this are considered passed.
    pub waypoint_exclusion_km: f64,
    /// Landmarks within this radius are listed in guidance.
    pub nearby_landmark_km: f64,
    /// Cross-track distance beyond which the hiker is off the trail.
    pub off_route_threshold_km: f64,
    /// RDP tolerance applied to imported GPX tracks, in meters.
    pub gpx_simplify_tolerance_m: f64,
    pub speech: SpeechConfig,
}

/// Speech parameters for normal and critical announcements.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub normal: Voice,
    pub critical: Voice,
}

/// Speech rate, pitch and volume passed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Voice {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            analysis_timeout_secs: 15,
            waypoint_exclusion_km: 0.1,
            nearby_landmark_km: 2.0,
            off_route_threshold_km: 0.25,
            gpx_simplify_tolerance_m: 10.0,
            speech: SpeechConfig::default(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            normal: Voice { rate: 0.9, pitch: 1.0, volume: 1.0 },
            critical: Voice { rate: 0.8, pitch: 1.2, volume: 1.0 },
        }
    }
}

impl NavigatorConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Location poll period, at least one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Upper bound for one visual analysis.
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = NavigatorConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.analysis_timeout(), Duration::from_secs(15));
        assert_eq!(config.waypoint_exclusion_km, 0.1);
        assert_eq!(config.speech.critical.pitch, 1.2);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = NavigatorConfig::from_json(r#"{"pollIntervalSecs": 5}"#).unwrap();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.nearby_landmark_km, 2.0);
        assert_eq!(config.speech, SpeechConfig::default());
    }

    #[test]
    fn zero_poll_interval_is_raised_to_one_second() {
        let config = NavigatorConfig::from_json(r#"{"pollIntervalSecs": 0}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(NavigatorConfig::from_json("not json").is_err());
    }
}
