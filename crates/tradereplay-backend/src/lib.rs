//! # Tradereplay Backend
//!
//! Client for the hosted backend (auth, the `trade_replays` table and the
//! recordings bucket) and the logic behind the review views.

mod client;
mod model;
mod session;

pub mod review;

pub use client::{BackendClient, TradeSource};
pub use model::{NewTradeReplay, TradeReplay};
pub use session::Session;
