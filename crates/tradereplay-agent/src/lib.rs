//! # Tradereplay Agent
//!
//! Extension-side contexts that talk to the background coordinator:
//!
//! - [`ContentAgent`] runs in a trading-platform tab. It keeps a
//!   self-healing connection, mirrors the recording flag and forwards
//!   detected trades.
//! - [`PopupController`] is the toolbar popup. It issues one-shot requests
//!   and stops for good once the extension context is invalidated.
//! - [`AgentClient`] adds per-request timeouts on top of any
//!   [`MessageChannel`](tradereplay_protocols::MessageChannel), and
//!   [`WsChannel`] is a channel over the bridge socket.

mod backoff;
mod client;
mod content;
mod detect;
mod popup;
mod state;
mod status;
mod ws;

pub use backoff::BackoffPolicy;
pub use client::AgentClient;
pub use content::ContentAgent;
pub use detect::{infer_direction, KeywordDetector, MonitoredElements};
pub use popup::{PopupController, PopupState};
pub use state::ConnectionState;
pub use status::{StatusLevel, StatusMessage};
pub use ws::WsChannel;

#[cfg(test)]
mod testing;
