//! Trek path catalog.
//!
//! Static, read-only registry of trek routes. Treks are validated once when
//! they enter the catalog and are shared as `Arc<TrekPath>` between any
//! number of navigation sessions afterwards.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// Trail difficulty, which drives the assumed walking speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
    #[serde(other)]
    Unknown,
}

impl Difficulty {
    /// Assumed walking speed on this kind of trail, in km/h.
    pub fn walking_speed_kmh(self) -> f64 {
        match self {
            Difficulty::Easy => 4.0,
            Difficulty::Moderate => 3.0,
            Difficulty::Challenging => 2.0,
            Difficulty::Unknown => 3.0,
        }
    }
}

/// Overnight stop along a trek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campsite {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinate,
    /// Meters above sea level.
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub water_source: bool,
    #[serde(default)]
    pub shelter: bool,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub booking_required: bool,
}

/// Kind of help available at an emergency point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyKind {
    Helipad,
    Medical,
    Ranger,
    EmergencyPhone,
}

/// Place to get help: helipad, medical post, ranger station or phone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyPoint {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinate,
    #[serde(rename = "type")]
    pub kind: EmergencyKind,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub description: String,
}

/// What a landmark is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    Viewpoint,
    Waterfall,
    Lake,
    Peak,
    Bridge,
    Junction,
    #[serde(other)]
    Other,
}

/// Named point of interest announced to the hiker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmark {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinate,
    #[serde(rename = "type")]
    pub kind: LandmarkKind,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// A trek route with its points of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrekPath {
    pub id: String,
    pub name: String,
    /// Route polyline from start to end.
    pub coordinates: Vec<Coordinate>,
    pub difficulty: Difficulty,
    /// Highest elevation reached, in meters.
    #[serde(default)]
    pub elevation: f64,
    /// Advertised length in kilometers.
    #[serde(default)]
    pub distance: f64,
    /// Advertised duration in hours.
    #[serde(default)]
    pub estimated_duration: f64,
    pub start_point: Coordinate,
    pub end_point: Coordinate,
    #[serde(default)]
    pub campsites: Vec<Campsite>,
    #[serde(default)]
    pub emergency_points: Vec<EmergencyPoint>,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub safety_notes: Vec<String>,
}

/// Borrowed view of any point of interest on a trek.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waypoint<'a> {
    Campsite(&'a Campsite),
    Emergency(&'a EmergencyPoint),
    Landmark(&'a Landmark),
}

impl<'a> Waypoint<'a> {
    /// Id of the underlying campsite, emergency point or landmark.
    pub fn id(&self) -> &'a str {
        match self {
            Waypoint::Campsite(c) => &c.id,
            Waypoint::Emergency(e) => &e.id,
            Waypoint::Landmark(l) => &l.id,
        }
    }

    /// Display name, used in spoken guidance.
    pub fn name(&self) -> &'a str {
        match self {
            Waypoint::Campsite(c) => &c.name,
            Waypoint::Emergency(e) => &e.name,
            Waypoint::Landmark(l) => &l.name,
        }
    }

    /// Position of the waypoint.
    pub fn coordinates(&self) -> &'a Coordinate {
        match self {
            Waypoint::Campsite(c) => &c.coordinates,
            Waypoint::Emergency(e) => &e.coordinates,
            Waypoint::Landmark(l) => &l.coordinates,
        }
    }

    /// Free-text description, if the waypoint carries a non-empty one.
    pub fn description(&self) -> Option<&'a str> {
        let text = match self {
            Waypoint::Campsite(_) => return None,
            Waypoint::Emergency(e) => e.description.as_str(),
            Waypoint::Landmark(l) => l.description.as_str(),
        };
        Some(text).filter(|t| !t.trim().is_empty())
    }

    /// Which list of the trek the waypoint came from.
    pub fn category(&self) -> WaypointCategory {
        match self {
            Waypoint::Campsite(_) => WaypointCategory::Campsite,
            Waypoint::Emergency(_) => WaypointCategory::EmergencyPoint,
            Waypoint::Landmark(_) => WaypointCategory::Landmark,
        }
    }
}

/// Wire tag for the kind of a `Waypoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointCategory {
    Campsite,
    EmergencyPoint,
    Landmark,
}

impl TrekPath {
    /// Waypoints eligible as navigation targets: landmarks first, then
    /// campsites, each in declared order.
    pub fn route_waypoints(&self) -> impl Iterator<Item = Waypoint<'_>> {
        self.landmarks
            .iter()
            .map(Waypoint::Landmark)
            .chain(self.campsites.iter().map(Waypoint::Campsite))
    }

    /// Check the structural invariants every catalog entry must satisfy.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidTrek {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if self.coordinates.len() < 2 {
            return Err(invalid("route needs at least 2 coordinates"));
        }
        if self.coordinates.iter().any(|c| !c.is_valid()) {
            return Err(invalid("coordinate out of range"));
        }
        if self.coordinates.first() != Some(&self.start_point) {
            return Err(invalid("start point differs from first coordinate"));
        }
        if self.coordinates.last() != Some(&self.end_point) {
            return Err(invalid("end point differs from last coordinate"));
        }

        Ok(())
    }
}

/// Registry of all treks available for navigation.
#[derive(Debug, Clone, Default)]
pub struct TrekCatalog {
    treks: Vec<Arc<TrekPath>>,
}

impl TrekCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the bundled treks.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for trek in builtin_treks() {
            if let Err(e) = catalog.insert(trek) {
                log::error!("Skipping bundled trek: {e}");
            }
        }
        catalog
    }

    /// Add a trek, replacing any existing entry with the same id.
    pub fn insert(&mut self, trek: TrekPath) -> Result<Arc<TrekPath>> {
        trek.validate()?;

        let trek = Arc::new(trek);
        match self.treks.iter_mut().find(|t| t.id == trek.id) {
            Some(slot) => *slot = Arc::clone(&trek),
            None => self.treks.push(Arc::clone(&trek)),
        }

        Ok(trek)
    }

    /// Load a JSON array of catalog entries.
    ///
    /// The whole batch is rejected if any entry is invalid.
    pub fn load_json(&mut self, json: &str) -> Result<usize> {
        let treks: Vec<TrekPath> = serde_json::from_str(json)?;
        for trek in &treks {
            trek.validate().inspect_err(|e| log::warn!("Rejecting catalog: {e}"))?;
        }

        let count = treks.len();
        for trek in treks {
            self.insert(trek)?;
        }

        log::info!("Loaded {count} treks into catalog");
        Ok(count)
    }

    /// Trek by id.
    pub fn get(&self, id: &str) -> Option<Arc<TrekPath>> {
        self.treks.iter().find(|t| t.id == id).cloned()
    }

    /// Trek by id, or `Error::UnknownTrek`.
    pub fn require(&self, id: &str) -> Result<Arc<TrekPath>> {
        self.get(id).ok_or_else(|| Error::UnknownTrek(id.to_string()))
    }

    /// Treks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TrekPath>> {
        self.treks.iter()
    }

    /// Number of treks.
    pub fn len(&self) -> usize {
        self.treks.len()
    }

    /// True if the catalog holds no trek.
    pub fn is_empty(&self) -> bool {
        self.treks.is_empty()
    }

    /// Serialize every trek as a JSON array.
    pub fn to_json(&self) -> Result<String> {
        let treks: Vec<&TrekPath> = self.treks.iter().map(|t| t.as_ref()).collect();
        Ok(serde_json::to_string(&treks)?)
    }
}

fn builtin_treks() -> Vec<TrekPath> {
    let c = Coordinate::new;

    vec![TrekPath {
        id: "himalayan-ascent".into(),
        name: "Himalayan Ascent".into(),
        coordinates: vec![
            c(30.0668, 78.9629),
            c(30.0672, 78.9635),
            c(30.0678, 78.9641),
            c(30.0685, 78.9648),
            c(30.0692, 78.9655),
            c(30.0698, 78.9662),
            c(30.0705, 78.9669),
        ],
        difficulty: Difficulty::Moderate,
        elevation: 4500.0,
        distance: 12.5,
        estimated_duration: 7.0,
        start_point: c(30.0668, 78.9629),
        end_point: c(30.0705, 78.9669),
        campsites: vec![
            Campsite {
                id: "camp-1".into(),
                name: "Base Camp".into(),
                coordinates: c(30.0672, 78.9635),
                elevation: 2800.0,
                facilities: vec!["water".into(), "shelter".into(), "fire_pit".into()],
                water_source: true,
                shelter: true,
                capacity: 20,
                booking_required: false,
            },
            Campsite {
                id: "camp-2".into(),
                name: "High Camp".into(),
                coordinates: c(30.0692, 78.9655),
                elevation: 3800.0,
                facilities: vec!["water".into(), "shelter".into()],
                water_source: true,
                shelter: true,
                capacity: 12,
                booking_required: true,
            },
        ],
        emergency_points: vec![EmergencyPoint {
            id: "emergency-1".into(),
            name: "Emergency Helipad".into(),
            coordinates: c(30.0678, 78.9641),
            kind: EmergencyKind::Helipad,
            contact: "+91-1234567890".into(),
            description: "Emergency evacuation point".into(),
        }],
        landmarks: vec![Landmark {
            id: "landmark-1".into(),
            name: "Sunrise Point".into(),
            coordinates: c(30.0685, 78.9648),
            kind: LandmarkKind::Viewpoint,
            description: "Spectacular sunrise view of the Himalayas".into(),
            photo_url: None,
        }],
        warnings: vec![
            "High altitude - acclimatization required".into(),
            "Weather can change rapidly".into(),
            "Carry sufficient water and supplies".into(),
        ],
        safety_notes: vec![
            "Check weather forecast before starting".into(),
            "Inform someone about your trek plan".into(),
            "Carry emergency contact numbers".into(),
            "Stay on marked trails only".into(),
        ],
    }]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn two_point_trek() -> TrekPath {
        let start = Coordinate::new(30.0668, 78.9629);
        let end = Coordinate::new(30.0705, 78.9669);
        TrekPath {
            id: "short".into(),
            name: "Short Trek".into(),
            coordinates: vec![start, end],
            difficulty: Difficulty::Easy,
            elevation: 0.0,
            distance: 0.5,
            estimated_duration: 1.0,
            start_point: start,
            end_point: end,
            campsites: Vec::new(),
            emergency_points: Vec::new(),
            landmarks: Vec::new(),
            warnings: Vec::new(),
            safety_notes: Vec::new(),
        }
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = TrekCatalog::builtin();
        assert_eq!(catalog.len(), 1);

        let trek = catalog.get("himalayan-ascent").unwrap();
        assert_eq!(trek.coordinates.len(), 7);
        assert_eq!(trek.campsites.len(), 2);
        assert_eq!(trek.emergency_points.len(), 1);
        assert_eq!(trek.landmarks.len(), 1);
        assert_eq!(trek.warnings.len(), 3);
        assert_eq!(trek.safety_notes.len(), 4);
        assert!(trek.validate().is_ok());
    }

    #[test]
    fn route_waypoints_lists_landmarks_before_campsites() {
        let catalog = TrekCatalog::builtin();
        let trek = catalog.get("himalayan-ascent").unwrap();

        let names: Vec<&str> = trek.route_waypoints().map(|w| w.name()).collect();
        assert_eq!(names, ["Sunrise Point", "Base Camp", "High Camp"]);
    }

    #[test]
    fn unknown_trek_is_an_error() {
        let catalog = TrekCatalog::builtin();
        assert!(catalog.get("everest").is_none());
        assert!(matches!(catalog.require("everest"), Err(Error::UnknownTrek(_))));
    }

    #[test]
    fn validate_rejects_single_coordinate() {
        let mut trek = two_point_trek();
        trek.coordinates.pop();
        assert!(matches!(trek.validate(), Err(Error::InvalidTrek { .. })));
    }

    #[test]
    fn validate_rejects_mismatched_endpoints() {
        let mut trek = two_point_trek();
        trek.end_point = Coordinate::new(31.0, 79.0);
        assert!(trek.validate().is_err());

        let mut trek = two_point_trek();
        trek.start_point = Coordinate::new(31.0, 79.0);
        assert!(trek.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut trek = two_point_trek();
        trek.coordinates[0] = Coordinate::new(95.0, 78.0);
        trek.start_point = trek.coordinates[0];
        assert!(trek.validate().is_err());
    }

    #[test]
    fn insert_replaces_same_id() {
        let mut catalog = TrekCatalog::new();
        catalog.insert(two_point_trek()).unwrap();

        let mut renamed = two_point_trek();
        renamed.name = "Renamed".into();
        catalog.insert(renamed).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("short").unwrap().name, "Renamed");
    }

    #[test]
    fn json_round_trip_uses_catalog_format() {
        let catalog = TrekCatalog::builtin();
        let json = catalog.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let trek = &value[0];
        assert!(trek["startPoint"].is_array());
        assert_eq!(trek["startPoint"].as_array().unwrap().len(), 2);
        assert_eq!(trek["emergencyPoints"][0]["type"], "helipad");
        assert_eq!(trek["landmarks"][0]["type"], "viewpoint");
        assert_eq!(trek["campsites"][0]["waterSource"], true);

        let mut loaded = TrekCatalog::new();
        assert_eq!(loaded.load_json(&json).unwrap(), 1);
        let trek = loaded.get("himalayan-ascent").unwrap();
        assert_eq!(trek.name, "Himalayan Ascent");
        assert_eq!(trek.coordinates.len(), 7);
        assert_eq!(trek.difficulty, Difficulty::Moderate);
    }

    #[test]
    fn load_json_rejects_whole_batch_on_invalid_entry() {
        let json = r#"[
            {"id": "ok", "name": "Ok", "coordinates": [[30.0, 78.0], [30.1, 78.1]],
             "difficulty": "Easy", "startPoint": [30.0, 78.0], "endPoint": [30.1, 78.1]},
            {"id": "bad", "name": "Bad", "coordinates": [[30.0, 78.0]],
             "difficulty": "Easy", "startPoint": [30.0, 78.0], "endPoint": [30.0, 78.0]}
        ]"#;

        let mut catalog = TrekCatalog::new();
        assert!(catalog.load_json(json).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn unknown_difficulty_uses_default_speed() {
        let d: Difficulty = serde_json::from_str(r#""Extreme""#).unwrap();
        assert_eq!(d, Difficulty::Unknown);
        assert_eq!(d.walking_speed_kmh(), 3.0);
    }
}
