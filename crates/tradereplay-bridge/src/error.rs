//! Bridge errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Bind error: {0}")]
    Bind(String),

    #[error("Server error: {0}")]
    Serve(String),

    /// The client broke the framing protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
