//! Shared types for Eris.

pub mod config;
pub mod errors;
pub mod rule;

pub use rule::{Feedback, Rating, Rule, DEFAULT_RESPONSE};
