//! Request handlers.

pub mod crop;
pub mod health;

pub use crop::*;
pub use health::*;
