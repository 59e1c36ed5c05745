//! Rule engine.
//!
//! - **RuleSet**: ordered in-memory cache and first-match substring matcher
//! - **FeedbackLoop**: ratings flag rules, override text rewrites them
//! - **Responder**: match-or-default, then feedback; the only entry point
//!   collaborators use
//! - **seeds**: built-in rules for a fresh installation

mod feedback;
mod responder;
mod rule_set;
pub mod seeds;

pub use feedback::{FeedbackLoop, FeedbackOutcome};
pub use responder::{FeedbackEffect, Reply, Responder, SeedReport, SharedResponder};
pub use rule_set::RuleSet;
