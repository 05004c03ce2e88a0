use thiserror::Error;

/// Crate-wide error type. One variant per error kind in the error-handling
/// design; library callers match on the structured enum, the CLI binary
/// flattens it to a string at its own boundary.
#[derive(Debug, Error)]
pub enum CodeGraphError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("ambiguous: {0}")]
    Ambiguous(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("internal invariant violation: {0}")]
    Invariant(String),

    #[error("database error: {0}")]
    Database(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, CodeGraphError>;
