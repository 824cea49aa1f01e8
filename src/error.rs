//! Error handling for the ATS scoring engine

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtsError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

/// Failures at the embedding model boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("embedding call timed out after {0:?}")]
    Timeout(Duration),

    #[error("embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("malformed embedding: {0}")]
    Malformed(String),

    #[error("embedding dimensions don't match: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

impl AtsError {
    /// True when the caller supplied bad input; false for server-side failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AtsError::Validation(_) | AtsError::InvalidInput(_) | AtsError::UnsupportedFormat(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AtsError>;

impl From<toml::de::Error> for AtsError {
    fn from(err: toml::de::Error) -> Self {
        AtsError::Configuration(format!("Failed to parse config: {}", err))
    }
}

impl From<toml::ser::Error> for AtsError {
    fn from(err: toml::ser::Error) -> Self {
        AtsError::Configuration(format!("Failed to serialize config: {}", err))
    }
}
