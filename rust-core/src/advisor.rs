//! Emergency escalation messages.
//!
//! Every (category, severity) pair maps to a fixed sentence. Raising an
//! alert records it in the session state and speaks the sentence with the
//! alert's severity as priority.

use serde::Serialize;

use crate::catalog::{EmergencyPoint, TrekPath};
use crate::geo::{distance, Coordinate};
use crate::tracker::{AlertCategory, NavigationState, SafetyAlert, Severity};
use crate::voice::Announcer;

/// Spoken when wire names match no known category or severity.
pub const FALLBACK_MESSAGE: &str =
    "Alert: Please check your surroundings and proceed with caution.";

/// Escalation sentence for an alert category and severity.
pub fn escalation_message(category: AlertCategory, severity: Severity) -> &'static str {
    use AlertCategory::*;
    use Severity::*;

    match (category, severity) {
        (Weather, Critical) => {
            "CRITICAL: Severe weather detected. Seek immediate shelter. Do not continue trekking."
        }
        (Weather, High) => {
            "WARNING: Dangerous weather conditions. Consider turning back or finding shelter."
        }
        (Weather, Medium) => "CAUTION: Weather conditions deteriorating. Monitor closely.",
        (Weather, Low) => "Notice: Weather conditions may change. Stay alert.",

        (Terrain, Critical) => "CRITICAL: Dangerous terrain ahead. Turn back immediately.",
        (Terrain, High) => "WARNING: Difficult terrain detected. Proceed with extreme caution.",
        (Terrain, Medium) => "CAUTION: Challenging terrain ahead. Slow down and be careful.",
        (Terrain, Low) => "Notice: Terrain changes ahead. Stay on marked path.",

        (Wildlife, Critical) => {
            "CRITICAL: Wildlife threat detected. Do not approach. Back away slowly."
        }
        (Wildlife, High) => "WARNING: Wildlife in area. Make noise and stay alert.",
        (Wildlife, Medium) => "CAUTION: Wildlife may be present. Stay on trail.",
        (Wildlife, Low) => "Notice: Wildlife habitat area. Respect their space.",

        (Medical, Critical) => "CRITICAL: Medical emergency. Call emergency services immediately.",
        (Medical, High) => "WARNING: Medical attention may be needed. Assess situation.",
        (Medical, Medium) => "CAUTION: Monitor health conditions. Rest if needed.",
        (Medical, Low) => "Notice: Take regular breaks and stay hydrated.",
    }
}

/// Parse wire names (`"medical"`, `"critical"`) and look up the sentence,
/// falling back to a generic caution for unknown names.
pub fn escalation_message_for(category: &str, severity: &str) -> &'static str {
    let category = serde_json::from_value(serde_json::Value::from(category));
    let severity = serde_json::from_value(serde_json::Value::from(severity));

    match (category, severity) {
        (Ok(c), Ok(s)) => escalation_message(c, s),
        _ => FALLBACK_MESSAGE,
    }
}

/// Nearest emergency point of a trek.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestEmergencyPoint {
    pub name: String,
    pub contact: String,
    pub distance_km: f64,
}

/// What the hiker is told when an alert is raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyResponse {
    pub message: String,
    pub spoken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_emergency_point: Option<NearestEmergencyPoint>,
}

/// Emergency point of `trek` closest to `location`, if the trek has any.
pub fn nearest_emergency_point(location: &Coordinate, trek: &TrekPath) -> Option<NearestEmergencyPoint> {
    trek.emergency_points
        .iter()
        .map(|p| (p, distance(location, &p.coordinates)))
        .fold(None, |best: Option<(&EmergencyPoint, f64)>, cur| match best {
            Some(b) if b.1 <= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(p, d)| NearestEmergencyPoint {
            name: p.name.clone(),
            contact: p.contact.clone(),
            distance_km: d,
        })
}

/// Critical alert for an emergency button press.
///
/// Uses `[0, 0]` when the location is not known yet.
pub fn emergency_alert(category: AlertCategory, location: Option<Coordinate>) -> SafetyAlert {
    SafetyAlert::new(
        category,
        Severity::Critical,
        format!(
            "Emergency alert: {} emergency detected. Seek immediate assistance.",
            category.as_str()
        ),
        location.unwrap_or(Coordinate::new(0.0, 0.0)),
    )
}

/// Record an alert, speak its escalation sentence, and point at the
/// nearest emergency point of the current trek.
pub fn raise_alert(
    alert: SafetyAlert,
    state: &mut NavigationState,
    announcer: &Announcer,
) -> EmergencyResponse {
    let message = escalation_message(alert.category, alert.severity);
    log::warn!(
        "Safety alert {} ({:?}/{:?}): {}",
        alert.id,
        alert.category,
        alert.severity,
        alert.message
    );

    let nearest = state
        .current_trek
        .as_deref()
        .and_then(|trek| nearest_emergency_point(&alert.coordinates, trek));

    let spoken = announcer.announce_unmuted(message, alert.severity);
    state.push_alert(alert);

    EmergencyResponse {
        message: message.to_string(),
        spoken,
        nearest_emergency_point: nearest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TrekCatalog;
    use crate::voice::tests::RecordingEngine;
    use std::sync::Arc;

    const CATEGORIES: [AlertCategory; 4] = [
        AlertCategory::Weather,
        AlertCategory::Terrain,
        AlertCategory::Wildlife,
        AlertCategory::Medical,
    ];
    const SEVERITIES: [Severity; 4] =
        [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];

    #[test]
    fn every_combination_has_text() {
        for category in CATEGORIES {
            for severity in SEVERITIES {
                assert!(!escalation_message(category, severity).is_empty());
            }
        }
    }

    #[test]
    fn medical_critical_message() {
        assert_eq!(
            escalation_message(AlertCategory::Medical, Severity::Critical),
            "CRITICAL: Medical emergency. Call emergency services immediately."
        );
    }

    #[test]
    fn wire_names_resolve() {
        assert_eq!(
            escalation_message_for("terrain", "low"),
            "Notice: Terrain changes ahead. Stay on marked path."
        );
        assert_eq!(escalation_message_for("volcano", "critical"), FALLBACK_MESSAGE);
        assert_eq!(escalation_message_for("medical", "extreme"), FALLBACK_MESSAGE);
    }

    #[test]
    fn critical_alert_interrupts_speech_and_is_recorded() {
        let engine = Arc::new(RecordingEngine::default());
        let announcer = Announcer::new(engine.clone());
        announcer.announce("Continue north for 300 meters.", Severity::Medium);

        let trek = TrekCatalog::builtin().require("himalayan-ascent").unwrap();
        let mut state = NavigationState::new(trek);
        let alert = emergency_alert(AlertCategory::Medical, Some(Coordinate::new(30.0668, 78.9629)));

        let response = raise_alert(alert, &mut state, &announcer);

        assert_eq!(
            response.message,
            "CRITICAL: Medical emergency. Call emergency services immediately."
        );
        assert!(response.spoken);
        assert_eq!(engine.last_text().as_deref(), Some(response.message.as_str()));
        assert_eq!(engine.cancels(), 1);

        assert_eq!(state.safety_alerts.len(), 1);
        assert_eq!(
            state.safety_alerts[0].message,
            "Emergency alert: medical emergency detected. Seek immediate assistance."
        );

        let nearest = response.nearest_emergency_point.unwrap();
        assert_eq!(nearest.name, "Emergency Helipad");
        assert_eq!(nearest.contact, "+91-1234567890");
    }

    #[test]
    fn low_alert_is_recorded_even_when_not_spoken() {
        let engine = Arc::new(RecordingEngine::default());
        let announcer = Announcer::new(engine.clone());
        announcer.announce("Busy", Severity::Medium);

        let mut state = NavigationState::default();
        let alert = SafetyAlert::new(
            AlertCategory::Wildlife,
            Severity::Low,
            "Monkeys nearby",
            Coordinate::new(30.0, 78.0),
        );

        let response = raise_alert(alert, &mut state, &announcer);
        assert!(!response.spoken);
        assert!(response.nearest_emergency_point.is_none());
        assert_eq!(state.safety_alerts.len(), 1);
    }

    #[test]
    fn emergency_alert_without_location() {
        let alert = emergency_alert(AlertCategory::Weather, None);
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.coordinates, Coordinate::new(0.0, 0.0));
    }
}
