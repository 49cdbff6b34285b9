use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    /// Malformed configuration, reported at startup.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid command: {0}")]
    Command(String),

    #[error("monitoring session is already active")]
    SessionActive,

    #[error("no monitoring session is active")]
    SessionIdle,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
