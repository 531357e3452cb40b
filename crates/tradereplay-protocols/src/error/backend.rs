//! Remote backend errors.

use thiserror::Error;

use super::StoreError;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Backend returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
