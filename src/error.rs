use thiserror::Error;

/// Typed error hierarchy for the crate's fallible surface.
///
/// The storage engine deliberately does not expose these — its public
/// methods degrade to booleans and empty results (see `history`). They
/// surface from the record factory, request validation, and config loading,
/// where a caller can actually act on the failure.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Database(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Io(String),

    #[error("config error: {0}")]
    Config(String),
}

// ── From impls ─────────────────────────────────────────────────────────────

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(e: serde_yaml::Error) -> Self {
        AppError::Config(e.to_string())
    }
}
