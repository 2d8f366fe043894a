//! Error types for visage-anim

use thiserror::Error;
use visage_core::Error as CoreError;

#[derive(Error, Debug)]
pub enum AnimError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AnimError> for CoreError {
    fn from(err: AnimError) -> Self {
        CoreError::Deserialization(format!("Animation error: {}", err))
    }
}
