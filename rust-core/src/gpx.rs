//! GPX 1.1 trek import.
//!
//! Wraps the `gpx` crate and turns a GPX file into a `TrekPath`: the track
//! becomes the route polyline, and each `<wpt>` becomes a campsite, an
//! emergency point, or a landmark depending on its `<type>` or `<sym>`.

use std::io::Read;

use crate::catalog::{
    Campsite, Difficulty, EmergencyKind, EmergencyPoint, Landmark, LandmarkKind, TrekPath,
};
use crate::config::NavigatorConfig;
use crate::error::{Error, Result};
use crate::geo::{route_length_km, Coordinate};
use crate::simplify::simplify;

/// Trek metadata the GPX file itself cannot express.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub id: String,
    pub difficulty: Difficulty,
    /// RDP tolerance in meters. Zero keeps every track point.
    pub simplify_tolerance_m: f64,
}

impl ImportOptions {
    /// Options using the configured simplification tolerance.
    pub fn new(id: impl Into<String>, difficulty: Difficulty, config: &NavigatorConfig) -> Self {
        Self {
            id: id.into(),
            difficulty,
            simplify_tolerance_m: config.gpx_simplify_tolerance_m,
        }
    }
}

/// What a GPX waypoint stands for on the trek.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Category {
    Campsite,
    Emergency(EmergencyKind),
    Landmark(LandmarkKind),
}

fn categorize(tag: Option<&str>) -> Category {
    let tag = tag.map(|t| t.trim().to_ascii_lowercase()).unwrap_or_default();
    match tag.as_str() {
        "campsite" | "camp" | "campground" => Category::Campsite,
        "emergency" | "helipad" => Category::Emergency(EmergencyKind::Helipad),
        "medical" => Category::Emergency(EmergencyKind::Medical),
        "ranger" => Category::Emergency(EmergencyKind::Ranger),
        "emergency_phone" => Category::Emergency(EmergencyKind::EmergencyPhone),
        "viewpoint" => Category::Landmark(LandmarkKind::Viewpoint),
        "waterfall" => Category::Landmark(LandmarkKind::Waterfall),
        "lake" => Category::Landmark(LandmarkKind::Lake),
        "peak" | "summit" => Category::Landmark(LandmarkKind::Peak),
        "bridge" => Category::Landmark(LandmarkKind::Bridge),
        "junction" => Category::Landmark(LandmarkKind::Junction),
        _ => Category::Landmark(LandmarkKind::Other),
    }
}

/// Parse a GPX file from any reader into a validated trek.
pub fn parse_trek<R: Read>(reader: R, options: &ImportOptions) -> Result<TrekPath> {
    let gpx = gpx::read(reader).map_err(|e| Error::Gpx(e.to_string()))?;

    let points: Vec<Coordinate> = gpx
        .tracks
        .iter()
        .flat_map(|t| t.segments.iter())
        .flat_map(|seg| seg.points.iter())
        .chain(gpx.routes.iter().flat_map(|r| r.points.iter()))
        .map(|wp| Coordinate::new(wp.point().y(), wp.point().x()))
        .collect();

    let elevation = gpx
        .tracks
        .iter()
        .flat_map(|t| t.segments.iter())
        .flat_map(|seg| seg.points.iter())
        .filter_map(|wp| wp.elevation)
        .fold(0.0, f64::max);

    let coordinates = simplify(&points, options.simplify_tolerance_m);
    log::debug!(
        "GPX import `{}`: {} track points simplified to {}",
        options.id,
        points.len(),
        coordinates.len()
    );

    let name = gpx
        .tracks
        .first()
        .and_then(|t| t.name.clone())
        .or_else(|| gpx.metadata.as_ref().and_then(|m| m.name.clone()))
        .unwrap_or_else(|| options.id.clone());

    let mut trek = TrekPath {
        id: options.id.clone(),
        name,
        distance: route_length_km(&coordinates),
        start_point: coordinates.first().copied().unwrap_or(Coordinate::new(0.0, 0.0)),
        end_point: coordinates.last().copied().unwrap_or(Coordinate::new(0.0, 0.0)),
        coordinates,
        difficulty: options.difficulty,
        elevation,
        estimated_duration: 0.0,
        campsites: Vec::new(),
        emergency_points: Vec::new(),
        landmarks: Vec::new(),
        warnings: Vec::new(),
        safety_notes: Vec::new(),
    };
    trek.estimated_duration = trek.distance / options.difficulty.walking_speed_kmh();

    for (i, wp) in gpx.waypoints.iter().enumerate() {
        let coordinates = Coordinate::new(wp.point().y(), wp.point().x());
        let name = wp.name.clone().unwrap_or_else(|| format!("Waypoint {}", i + 1));
        let description = wp.description.clone().or_else(|| wp.comment.clone()).unwrap_or_default();
        let tag = wp.type_.as_deref().or(wp.symbol.as_deref());

        match categorize(tag) {
            Category::Campsite => trek.campsites.push(Campsite {
                id: format!("camp-{}", trek.campsites.len() + 1),
                name,
                coordinates,
                elevation: wp.elevation.unwrap_or(0.0),
                facilities: Vec::new(),
                water_source: false,
                shelter: false,
                capacity: 0,
                booking_required: false,
            }),
            Category::Emergency(kind) => trek.emergency_points.push(EmergencyPoint {
                id: format!("emergency-{}", trek.emergency_points.len() + 1),
                name,
                coordinates,
                kind,
                contact: String::new(),
                description,
            }),
            Category::Landmark(kind) => trek.landmarks.push(Landmark {
                id: format!("landmark-{}", trek.landmarks.len() + 1),
                name,
                coordinates,
                kind,
                description,
                photo_url: None,
            }),
        }
    }

    trek.validate()?;
    Ok(trek)
}

/// Parse GPX held in memory, as handed over by the Android app.
pub fn parse_trek_bytes(data: &[u8], options: &ImportOptions) -> Result<TrekPath> {
    parse_trek(data, options)
}
