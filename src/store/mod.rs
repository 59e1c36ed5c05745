//! Durable rule storage.
//!
//! - **RuleStore**: SQLite table `rules` keyed by input pattern
//! - **Export/Import**: JSON snapshots for sharing rules between installations

mod export;
mod rule_store;

pub use export::{checksum, ImportResult, RuleExport, EXPORT_VERSION};
pub use rule_store::RuleStore;
