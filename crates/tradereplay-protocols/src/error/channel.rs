//! Cross-context channel errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChannelError {
    /// The receiving context is gone or not reachable right now.
    #[error("Channel disconnected: {0}")]
    Disconnected(String),

    /// The extension was reloaded or updated; the channel will never work again.
    #[error("Extension context invalidated")]
    ContextInvalidated,

    #[error("Request {request} timed out after {timeout_ms}ms")]
    Timeout { request: String, timeout_ms: u64 },

    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The remote side handled the request and answered `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response to {request}")]
    UnexpectedResponse { request: String },

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl ChannelError {
    /// Classify a raw runtime error string.
    ///
    /// Browsers report channel failures only as messages, so the
    /// recognisable phrases are matched case-insensitively.
    pub fn from_runtime_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("context invalidated") {
            ChannelError::ContextInvalidated
        } else if lower.contains("receiving end does not exist")
            || lower.contains("could not establish connection")
            || lower.contains("message port closed")
        {
            ChannelError::Disconnected(message.to_string())
        } else {
            ChannelError::SendFailed(message.to_string())
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ChannelError::Timeout { .. })
    }

    /// Whether the channel can never recover without a reload.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelError::ContextInvalidated)
    }
}
