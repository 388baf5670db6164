use std::io;

/// Errors raised while loading trek data or crossing the JNI boundary.
///
/// Runtime navigation failures (no GPS fix, vision service down) are not
/// represented here; they degrade to spoken messages instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("GPX parse error: {0}")]
    Gpx(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid trek `{id}`: {reason}")]
    InvalidTrek { id: String, reason: String },

    #[error("Invalid location: ({lat}, {lon})")]
    InvalidLocation { lat: f64, lon: f64 },

    #[error("Unknown trek: {0}")]
    UnknownTrek(String),

    #[error("JNI error: {0}")]
    Jni(#[from] jni::errors::Error),
}

/// Result alias for fallible crate operations.
pub type Result<T> = std::result::Result<T, Error>;
