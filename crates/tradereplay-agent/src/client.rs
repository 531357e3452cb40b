//! Request client with per-request timeouts.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use tradereplay_protocols::{ChannelError, MessageChannel, Request, Response, ResponseBody};

/// Wraps a [`MessageChannel`] so that every request has a deadline.
///
/// A timeout is reported as [`ChannelError::Timeout`]. Nothing is retried
/// and the receiver is not told the caller gave up.
#[derive(Clone)]
pub struct AgentClient {
    channel: Arc<dyn MessageChannel>,
    timeout: Duration,
}

impl AgentClient {
    pub fn new(channel: Arc<dyn MessageChannel>, timeout: Duration) -> Self {
        Self { channel, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send with the default timeout and return the raw response.
    pub async fn send(&self, request: Request) -> Result<Response, ChannelError> {
        self.send_with_timeout(request, self.timeout).await
    }

    pub async fn send_with_timeout(
        &self,
        request: Request,
        timeout: Duration,
    ) -> Result<Response, ChannelError> {
        let tag = request.tag();
        debug!("Sending {} (timeout {:?})", tag, timeout);
        match tokio::time::timeout(timeout, self.channel.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ChannelError::Timeout {
                request: tag.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Send and turn `success: false` into [`ChannelError::Rejected`].
    pub async fn request(&self, request: Request) -> Result<ResponseBody, ChannelError> {
        self.send(request).await?.into_result()
    }

    pub async fn request_with_timeout(
        &self,
        request: Request,
        timeout: Duration,
    ) -> Result<ResponseBody, ChannelError> {
        self.send_with_timeout(request, timeout).await?.into_result()
    }
}
