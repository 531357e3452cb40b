//! Error taxonomy shared by every surface that shows errors to a user.

use serde::{Deserialize, Serialize};

use super::{BackendError, CaptureError, ChannelError, StoreError};

/// Coarse classification of any pipeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connectivity,
    Timeout,
    NotFound,
    ApiUnavailable,
    Validation,
    Storage,
    Remote,
}

impl From<&ChannelError> for ErrorKind {
    fn from(err: &ChannelError) -> Self {
        match err {
            ChannelError::Timeout { .. } => ErrorKind::Timeout,
            ChannelError::Disconnected(_)
            | ChannelError::ContextInvalidated
            | ChannelError::SendFailed(_) => ErrorKind::Connectivity,
            ChannelError::Rejected(_) => ErrorKind::Remote,
            ChannelError::UnexpectedResponse { .. } | ChannelError::Protocol(_) => {
                ErrorKind::Validation
            }
        }
    }
}

impl From<&CaptureError> for ErrorKind {
    fn from(err: &CaptureError) -> Self {
        match err {
            CaptureError::NoTabId => ErrorKind::Validation,
            CaptureError::TabNotFound(_) => ErrorKind::NotFound,
            CaptureError::NotAccessible(_) | CaptureError::ApiUnavailable(_) => {
                ErrorKind::ApiUnavailable
            }
            CaptureError::Failed(_) => ErrorKind::Remote,
        }
    }
}

impl From<&StoreError> for ErrorKind {
    fn from(_: &StoreError) -> Self {
        ErrorKind::Storage
    }
}

impl From<&BackendError> for ErrorKind {
    fn from(err: &BackendError) -> Self {
        match err {
            BackendError::NotAuthenticated => ErrorKind::Validation,
            BackendError::Validation(_) => ErrorKind::Validation,
            BackendError::Http { status: 404, .. } => ErrorKind::NotFound,
            BackendError::Http { .. } | BackendError::Decode(_) => ErrorKind::Remote,
            BackendError::Network(_) => ErrorKind::Connectivity,
            BackendError::Store(_) => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_kinds() {
        let timeout = ChannelError::Timeout {
            request: "PING".into(),
            timeout_ms: 1,
        };
        assert_eq!(ErrorKind::from(&timeout), ErrorKind::Timeout);
        assert_eq!(
            ErrorKind::from(&ChannelError::ContextInvalidated),
            ErrorKind::Connectivity
        );
    }

    #[test]
    fn test_capture_kinds() {
        assert_eq!(ErrorKind::from(&CaptureError::NoTabId), ErrorKind::Validation);
        assert_eq!(ErrorKind::from(&CaptureError::TabNotFound(1)), ErrorKind::NotFound);
        assert_eq!(
            ErrorKind::from(&CaptureError::ApiUnavailable("x".into())),
            ErrorKind::ApiUnavailable
        );
    }

    #[test]
    fn test_backend_kinds() {
        let not_found = BackendError::Http {
            status: 404,
            message: "missing".into(),
        };
        assert_eq!(ErrorKind::from(&not_found), ErrorKind::NotFound);
        assert_eq!(
            ErrorKind::from(&BackendError::Network("reset".into())),
            ErrorKind::Connectivity
        );
    }
}
