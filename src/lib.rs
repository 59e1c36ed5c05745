//! # Eris
//!
//! A pattern-response chat agent that learns its answers from feedback.
//!
//! Incoming text is matched against stored `(input_pattern, output_pattern)`
//! rules by substring; the first rule added wins. Every reply can be rated
//! 1-5 or corrected with a better reply, which becomes the rule for that
//! text from then on.
//!
//! ## Modules
//!
//! - [`store`] - SQLite rule table, export and import
//! - [`engine`] - Rule matching, feedback loop and the [`Responder`] facade
//! - [`hooks`] - Hooks fired on matches, misses, low ratings and overrides
//! - [`chat`] - Line-oriented chat session with timed feedback
//! - [`cli`] - Command line interface
//! - [`types`] - Shared types, configuration and errors

pub mod chat;
pub mod cli;
pub mod context;
pub mod engine;
pub mod hooks;
pub mod store;
pub mod types;

pub use context::ErisContext;
pub use engine::Responder;
pub use types::config::Config;
pub use types::errors::{ErisError, ErisResult};
pub use types::{Feedback, Rating, Rule, DEFAULT_RESPONSE};
