//! TrekMate navigation core.
//!
//! Offline trail navigation for hikers: trek catalog and GPX import,
//! location tracking against a route, spoken guidance, safety alerts and
//! camera-based path analysis. The Android app drives it through
//! `android_jni`.

pub mod advisor;
pub mod android_jni;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geo;
pub mod gpx;
pub mod guidance;
pub mod session;
pub mod simplify;
pub mod tracker;
pub mod vision;
pub mod voice;

pub use catalog::{TrekCatalog, TrekPath};
pub use config::NavigatorConfig;
pub use error::{Error, Result};
pub use geo::Coordinate;
pub use session::{LocationError, LocationProvider, NavigationSession};
pub use tracker::{NavigationState, SafetyAlert};

/// Crate version, reported to the app over JNI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Route `log` output to logcat under the `TrekMate` tag. Safe to call
/// more than once.
#[cfg(target_os = "android")]
pub fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("TrekMate"),
    );
}

/// No-op off Android; hosts install their own `log` backend.
#[cfg(not(target_os = "android"))]
pub fn init_logging() {}
