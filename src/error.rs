use thiserror::Error;

/// Track meter error types
#[derive(Error, Debug)]
pub enum TrackerError {
    /// No location capability present; fatal to starting a session.
    #[error("Location sensing unavailable")]
    SensingUnavailable,

    /// Per-event failure reported by the location source. Never fatal.
    #[error("Location sensing failed: {0}")]
    SensingFailure(String),

    #[error("Tracker task failed: {0}")]
    TaskFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;
