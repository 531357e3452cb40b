//! Core data types.

mod screenshot;
mod tab;
mod trade;

pub use screenshot::*;
pub use tab::*;
pub use trade::*;
