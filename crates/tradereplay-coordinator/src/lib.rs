//! # Tradereplay Coordinator
//!
//! The background coordinator is the single source of truth for the
//! recording flag, the trade log and the screenshot ring, and the only
//! component that touches the [`LocalStore`](tradereplay_protocols::LocalStore).
//!
//! ## Usage
//!
//! ```ignore
//! let coordinator = BackgroundCoordinator::new(store, host, CoordinatorConfig::default());
//! let (handle, _task) = CoordinatorService::spawn(coordinator);
//! let port = handle.port(Sender::tab(tab));
//! let response = port.send(Request::Ping).await?;
//! ```

mod badge;
mod coordinator;
mod error;
mod platform;
mod screenshots;
mod service;
mod tab_registry;

pub use badge::badge_text;
pub use coordinator::BackgroundCoordinator;
pub use error::CoordinatorError;
pub use platform::PlatformMatcher;
pub use screenshots::append_capped;
pub use service::{CoordinatorHandle, CoordinatorService, Port};
pub use tab_registry::{TabEntry, TabRegistry};

#[cfg(test)]
mod testing;
