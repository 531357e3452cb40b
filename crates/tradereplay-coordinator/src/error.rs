//! Coordinator errors surfaced to callers of user-initiated actions.

use thiserror::Error;

use tradereplay_protocols::error::{CaptureError, ErrorKind, StoreError};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl CoordinatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::Capture(e) => ErrorKind::from(e),
            CoordinatorError::Store(e) => ErrorKind::from(e),
        }
    }
}
