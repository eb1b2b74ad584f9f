use thiserror::Error;

/// All errors produced by visage-core.
#[derive(Debug, Error)]
pub enum VisageError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("neutral viseme {0:?} is not part of the viseme catalog")]
    MissingNeutralViseme(String),

    #[error("blink scheduler is already running")]
    AlreadyBlinking,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VisageError>;
