//! Command handlers.

pub mod discover;
pub mod resolve;
