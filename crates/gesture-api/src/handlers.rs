//! Request handlers.

pub mod health;
pub mod landmarks;

pub use health::*;
pub use landmarks::*;
