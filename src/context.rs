//! Process-wide context.

use crate::engine::Responder;
use crate::types::config::Config;
use crate::ErisResult;

/// Everything a running Eris needs, built once at startup and passed down
/// explicitly.
pub struct ErisContext {
    pub config: Config,
    pub responder: Responder,
}

impl ErisContext {
    /// Opens the rule store and builds the responder described by `config`.
    pub fn new(config: Config) -> ErisResult<Self> {
        let responder = Responder::from_config(&config)?;
        tracing::debug!(
            db_path = %config.storage.db_path.display(),
            rules = responder.rules().len(),
            "Context ready"
        );

        Ok(Self { config, responder })
    }
}
