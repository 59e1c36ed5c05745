//! Chat connector.
//!
//! Plays the part of the chat platform: reads messages, prints replies and
//! collects a rating or replacement reply for each one.

mod session;

pub use session::{ChatSession, SessionSummary};
