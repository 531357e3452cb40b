//! Error types for the tradereplay protocol layer.

mod backend;
mod capture;
mod channel;
mod kind;
mod store;

pub use backend::*;
pub use capture::*;
pub use channel::*;
pub use kind::*;
pub use store::*;
