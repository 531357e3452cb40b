//! # Tradereplay Store
//!
//! Implementations of the extension-scoped [`LocalStore`].
//!
//! - [`MemoryStore`] keeps everything in memory (tests, ephemeral runs)
//! - [`FileStore`] persists the whole key space as one JSON document

mod file;
mod memory;

pub use file::{FileStore, SESSION_FILE};
pub use memory::MemoryStore;
pub use tradereplay_protocols::LocalStore;
