//! # Tradereplay Protocols
//!
//! Shared definitions for the trade capture pipeline.
//! Contains only types and interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`LocalStore`] - Extension-scoped key-value persistence
//! - [`BrowserHost`] - Tab, capture, badge and push capabilities of the host browser
//! - [`MessageChannel`] - Request/response transport between extension contexts
//! - [`TradeSink`] - Remote destination for recorded trades
//! - [`Sleeper`] - Injectable delay source for retry and settle timers
//! - [`TradeDetector`] - Platform-specific trade detection capability

pub mod error;
pub mod types;
pub mod message;
pub mod store;
pub mod host;
pub mod channel;
pub mod clock;
pub mod detector;
pub mod frame;

pub use channel::{MessageChannel, TradeSink};
pub use clock::{Sleeper, TokioSleeper};
pub use detector::{DomEvent, ElementSnapshot, TradeDetector};
pub use error::{
    BackendError, CaptureError, ChannelError, ErrorKind, StoreError,
};
pub use frame::{Hello, RequestFrame, ServerFrame};
pub use host::BrowserHost;
pub use message::{Push, Request, Response, ResponseBody, Sender};
pub use store::{keys, LocalStore};
pub use types::*;
