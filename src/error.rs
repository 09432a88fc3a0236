use thiserror::Error;

/// Failures surfaced by the tracking engine.
///
/// Clone because failures also travel the broadcast event channel, where
/// every subscriber gets its own copy.
#[derive(Debug, Clone, Error)]
pub enum TrackError {
    /// The position source cannot produce fixes (permission denied, hardware
    /// failure, timeout). Tracking cannot continue; the session is stopped.
    #[error("position source unavailable: {0}")]
    PositionUnavailable(String),

    /// Persistence read/write failure. In-memory state is left intact.
    #[error("storage failure: {0}")]
    Storage(String),

    /// A state-machine operation was called out of order. Rejected, never
    /// destructive: a confused front end must not crash the engine.
    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),
}

impl From<serde_json::Error> for TrackError {
    fn from(err: serde_json::Error) -> Self {
        TrackError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackError>;
