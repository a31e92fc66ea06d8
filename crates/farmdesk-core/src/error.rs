use thiserror::Error;

#[derive(Debug, Error)]
pub enum FarmdeskError {
    #[error("farm not found: {0}")]
    FarmNotFound(String),

    #[error("triggered action not found: {0}")]
    ActionNotFound(String),

    #[error("invalid sector: {0}")]
    InvalidSector(String),

    #[error("invalid severity: {0}")]
    InvalidSeverity(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("unknown condition kind: {0}")]
    UnknownCondition(String),

    #[error("invalid params for rule '{rule}': {reason}")]
    InvalidParams { rule: String, reason: String },

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FarmdeskError>;
