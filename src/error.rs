use crate::config::ConfigError;
use crate::datasource::SourceError;
use thiserror::Error;

/// Errors surfaced by the engine's entry points.
///
/// Only boundary problems become errors; dangling references and missing
/// rates inside a calculation count as zero instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Whether the error is the caller's input rather than the data.
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}
