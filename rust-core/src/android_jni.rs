//! JNI bindings for the Android app.
//!
//! Each exported function corresponds to an `external fun` declaration
//! in RustBridge.kt. The function names follow JNI naming conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! Data crosses the boundary as JSON strings. The exports are thin
//! wrappers around the `*_json` functions below; any error is logged and
//! surfaces to Kotlin as a null string.

use std::sync::OnceLock;

use jni::objects::{JClass, JString};
use jni::sys::{jdouble, jstring};
use jni::JNIEnv;

use crate::advisor::escalation_message_for;
use crate::catalog::{Difficulty, TrekCatalog};
use crate::config::NavigatorConfig;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::gpx::{parse_trek_bytes, ImportOptions};
use crate::guidance::{guidance, guidance_without_trek};
use crate::tracker::{update, NavigationState};

fn catalog() -> &'static TrekCatalog {
    static CATALOG: OnceLock<TrekCatalog> = OnceLock::new();
    CATALOG.get_or_init(TrekCatalog::builtin)
}

/// Position from the app, rejected when not a real coordinate (NaN,
/// infinite or out of range).
fn location(lat: f64, lon: f64) -> Result<Coordinate> {
    let location = Coordinate::new(lat, lon);
    if location.is_valid() {
        Ok(location)
    } else {
        Err(Error::InvalidLocation { lat, lon })
    }
}

/// All bundled treks as a JSON array.
pub fn catalog_json() -> Result<String> {
    catalog().to_json()
}

/// One location tick against a bundled trek.
pub fn navigation_update_json(trek_id: &str, lat: f64, lon: f64) -> Result<String> {
    let location = location(lat, lon)?;
    let trek = catalog().require(trek_id)?;
    let update = update(&location, &trek);
    Ok(serde_json::to_string(&update)?)
}

/// Guidance for a position. `state_json` carries the app's alerts; an
/// empty string means no state. An unknown trek yields the generic
/// follow-the-trail guidance.
pub fn guidance_json(trek_id: &str, lat: f64, lon: f64, state_json: &str) -> Result<String> {
    let location = location(lat, lon)?;
    let state: NavigationState = if state_json.trim().is_empty() {
        NavigationState::default()
    } else {
        serde_json::from_str(state_json)?
    };

    let guidance = match catalog().get(trek_id) {
        Some(trek) => guidance(&location, &trek, &state),
        None => {
            log::debug!("No trek `{trek_id}`, giving generic guidance");
            guidance_without_trek(&state)
        }
    };
    Ok(serde_json::to_string(&guidance)?)
}

/// Import a GPX document as a trek and return it in catalog JSON form.
/// `difficulty` is a catalog name (`"Moderate"`); unknown names map to
/// `Unknown`.
pub fn import_gpx_json(trek_id: &str, difficulty: &str, gpx: &str) -> Result<String> {
    let difficulty: Difficulty = serde_json::from_value(serde_json::Value::from(difficulty))?;
    let options = ImportOptions::new(trek_id, difficulty, &NavigatorConfig::default());

    let trek = parse_trek_bytes(gpx.as_bytes(), &options)?;
    log::info!(
        "Imported GPX trek `{}` with {} route points",
        trek.id,
        trek.coordinates.len()
    );
    Ok(serde_json::to_string(&trek)?)
}

fn read_string(env: &mut JNIEnv, s: &JString) -> Result<String> {
    Ok(env.get_string(s)?.into())
}

fn to_jstring(env: &JNIEnv, what: &str, result: Result<String>) -> jstring {
    match result.and_then(|s| Ok(env.new_string(s)?)) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            log::error!("{what} failed: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Returns the rust-core library version.
/// Maps to: RustBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_trekmate_app_RustBridge_version(
    env: JNIEnv,
    _class: JClass,
) -> jstring {
    to_jstring(&env, "version", Ok(crate::VERSION.to_string()))
}

/// Maps to: RustBridge.initLogging()
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_trekmate_app_RustBridge_initLogging(
    _env: JNIEnv,
    _class: JClass,
) {
    crate::init_logging();
}

/// Maps to: RustBridge.catalogJson() -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_trekmate_app_RustBridge_catalogJson(
    env: JNIEnv,
    _class: JClass,
) -> jstring {
    to_jstring(&env, "catalogJson", catalog_json())
}

/// Maps to: RustBridge.navigationUpdateJson(trekId: String, lat: Double, lon: Double) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_trekmate_app_RustBridge_navigationUpdateJson(
    mut env: JNIEnv,
    _class: JClass,
    trek_id: JString,
    lat: jdouble,
    lon: jdouble,
) -> jstring {
    let result = read_string(&mut env, &trek_id)
        .and_then(|id| navigation_update_json(&id, lat, lon));
    to_jstring(&env, "navigationUpdateJson", result)
}

/// Maps to: RustBridge.guidanceJson(trekId: String, lat: Double, lon: Double, stateJson: String) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_trekmate_app_RustBridge_guidanceJson(
    mut env: JNIEnv,
    _class: JClass,
    trek_id: JString,
    lat: jdouble,
    lon: jdouble,
    state_json: JString,
) -> jstring {
    let result = read_string(&mut env, &trek_id).and_then(|id| {
        let state = read_string(&mut env, &state_json)?;
        guidance_json(&id, lat, lon, &state)
    });
    to_jstring(&env, "guidanceJson", result)
}

/// Maps to: RustBridge.emergencyMessage(category: String, severity: String) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_trekmate_app_RustBridge_emergencyMessage(
    mut env: JNIEnv,
    _class: JClass,
    category: JString,
    severity: JString,
) -> jstring {
    let result = read_string(&mut env, &category).and_then(|category| {
        let severity = read_string(&mut env, &severity)?;
        Ok(escalation_message_for(&category, &severity).to_string())
    });
    to_jstring(&env, "emergencyMessage", result)
}

/// Maps to: RustBridge.importGpxJson(trekId: String, difficulty: String, gpx: String) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_trekmate_app_RustBridge_importGpxJson(
    mut env: JNIEnv,
    _class: JClass,
    trek_id: JString,
    difficulty: JString,
    gpx: JString,
) -> jstring {
    let result = read_string(&mut env, &trek_id).and_then(|id| {
        let difficulty = read_string(&mut env, &difficulty)?;
        let gpx = read_string(&mut env, &gpx)?;
        import_gpx_json(&id, &difficulty, &gpx)
    });
    to_jstring(&env, "importGpxJson", result)
}
