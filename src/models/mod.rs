//! Data models

pub mod prediction;
pub mod health;

pub use prediction::*;
pub use health::*;
