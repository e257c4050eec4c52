use thiserror::Error;
use crate::services::StoreError;

/// Errors surfaced by the matching operations
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Profile store error: {0}")]
    Store(String),
}

impl From<StoreError> for MatchError {
    fn from(err: StoreError) -> Self {
        MatchError::Store(err.to_string())
    }
}
