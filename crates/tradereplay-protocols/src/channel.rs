//! Transports between contexts and to the remote backend.

use async_trait::async_trait;

use crate::error::{BackendError, ChannelError};
use crate::message::{Request, Response};
use crate::types::TradeRecord;

/// One request, one response. No retries, no cancellation propagation: if
/// the caller stops waiting the receiver may still complete the work.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, ChannelError>;
}

/// Remote destination for recorded trades.
#[async_trait]
pub trait TradeSink: Send + Sync {
    async fn push_trade(&self, trade: &TradeRecord) -> Result<(), BackendError>;
}
