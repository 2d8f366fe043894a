//! Error types for visage-relay

use thiserror::Error;
use visage_core::Error as CoreError;

/// Frame ingestion errors
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "relay")]
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

impl From<RelayError> for CoreError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Core(inner) => inner,
            other => CoreError::Relay(other.to_string()),
        }
    }
}
