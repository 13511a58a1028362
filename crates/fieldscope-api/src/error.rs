use serde::{Deserialize, Serialize};

/// Errors crossing the portal backend boundary.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ApiError {
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    #[error("Validation rejected: {message}")]
    Validation { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Transport-level failures are safe to retry unchanged; nothing was
    /// committed on the backend.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network { .. } | ApiError::Timeout)
    }
}
