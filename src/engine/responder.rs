//! Responder - the single entry point into the rule engine.
//!
//! Every message goes through the same pass: match (or fall back to the
//! default response), then apply whatever feedback came with it.

use std::sync::Arc;

use crate::hooks::HookSystem;
use crate::store::RuleStore;
use crate::types::config::Config;
use crate::types::{Feedback, Rule, DEFAULT_RESPONSE};
use crate::ErisResult;

use super::feedback::{FeedbackLoop, FeedbackOutcome};
use super::rule_set::RuleSet;
use super::seeds;

/// A responder shared between tasks. Holding the lock for a whole message
/// keeps messages from interleaving.
pub type SharedResponder = Arc<tokio::sync::Mutex<Responder>>;

/// Reply to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text sent back to the user.
    pub response: String,
    /// Pattern of the rule that produced the reply, if any.
    pub matched: Option<String>,
}

impl Reply {
    fn fallback(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            matched: None,
        }
    }
}

/// What feedback did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEffect {
    /// No feedback, or a rating for text that matched no rule.
    Ignored,
    /// A rating was recorded against the matched rule.
    Rated(FeedbackOutcome),
    /// The rule for the text was rewritten (or created).
    Overridden { created: bool },
}

/// Outcome of loading seed rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub skipped: usize,
}

/// Rule engine facade: store, cache, feedback loop and hooks.
pub struct Responder {
    store: RuleStore,
    rules: RuleSet,
    feedback: FeedbackLoop,
    hooks: HookSystem,
}

impl Responder {
    /// Wraps an opened store; the rule set is hydrated from it.
    pub fn new(store: RuleStore) -> ErisResult<Self> {
        let rules = RuleSet::hydrate(&store)?;

        Ok(Self {
            store,
            rules,
            feedback: FeedbackLoop::default(),
            hooks: HookSystem::with_defaults(),
        })
    }

    /// Opens the configured store and seeds it if enabled.
    pub fn from_config(config: &Config) -> ErisResult<Self> {
        let store = RuleStore::open(&config.storage.db_path)?;
        let mut responder =
            Self::new(store)?.with_low_rating_threshold(config.feedback.low_rating_threshold);

        if config.rules.seed_on_start {
            let report = responder.seed(seeds::startup_rules(&config.rules.seed))?;
            tracing::debug!(
                created = report.created,
                skipped = report.skipped,
                "Seed rules loaded"
            );
        }

        Ok(responder)
    }

    /// Replaces the hook system.
    pub fn with_hooks(mut self, hooks: HookSystem) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets the rating below which rules are flagged for revision.
    pub fn with_low_rating_threshold(mut self, threshold: u8) -> Self {
        self.feedback = FeedbackLoop::new(threshold);
        self
    }

    pub fn hooks_mut(&mut self) -> &mut HookSystem {
        &mut self.hooks
    }

    /// Wraps the responder for sharing between tasks.
    pub fn into_shared(self) -> SharedResponder {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Message flow
    // ═══════════════════════════════════════════════════════════════════════

    /// Handles one message and returns the reply text.
    ///
    /// Never fails: any storage error is logged and answered with the default
    /// response.
    pub async fn handle(&mut self, text: &str, feedback: Option<Feedback>) -> String {
        match self.try_handle(text, feedback).await {
            Ok(reply) => reply.response,
            Err(e) => {
                tracing::error!(text, error = %e, "Failed to handle message");
                DEFAULT_RESPONSE.to_string()
            }
        }
    }

    /// Handles one message: match, then apply feedback.
    ///
    /// The reply reflects the rules as they were before the feedback was
    /// applied; an override only affects later messages.
    pub async fn try_handle(&mut self, text: &str, feedback: Option<Feedback>) -> ErisResult<Reply> {
        let reply = self.respond(text).await;
        self.feedback(text, feedback).await?;
        Ok(reply)
    }

    /// Matches `text` without applying any feedback.
    pub async fn respond(&self, text: &str) -> Reply {
        match self.rules.find_match(text) {
            Some(rule) => {
                self.hooks.run_on_match(text, rule).await;
                Reply {
                    response: rule.output_pattern.clone(),
                    matched: Some(rule.input_pattern.clone()),
                }
            }
            None => {
                self.hooks.run_on_miss(text).await;
                Reply::fallback(DEFAULT_RESPONSE)
            }
        }
    }

    /// Applies feedback given for an earlier reply to `text`.
    ///
    /// A rating goes to the rule that `text` matches (a no-op if none does);
    /// an override rewrites the rule keyed by the whole of `text`.
    pub async fn feedback(
        &mut self,
        text: &str,
        feedback: Option<Feedback>,
    ) -> ErisResult<FeedbackEffect> {
        match feedback {
            None => Ok(FeedbackEffect::Ignored),
            Some(Feedback::Rating(rating)) => {
                let Some(rule) = self.rules.find_match(text) else {
                    tracing::debug!(text, %rating, "Rating for unmatched text ignored");
                    return Ok(FeedbackEffect::Ignored);
                };

                let outcome = self.feedback.apply_rating(rule, Some(rating));
                if let FeedbackOutcome::FlaggedForRevision { rating } = outcome {
                    self.hooks.run_on_low_rating(rule, rating).await;
                }
                Ok(FeedbackEffect::Rated(outcome))
            }
            Some(Feedback::Override(response)) => {
                let created =
                    self.feedback
                        .apply_override(&self.store, &mut self.rules, text, &response)?;
                self.hooks.run_on_override(text, &response, created).await;
                Ok(FeedbackEffect::Overridden { created })
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Rule management
    // ═══════════════════════════════════════════════════════════════════════

    /// Adds an observed `(input, response)` pair: persisted first, then cached.
    ///
    /// Returns `false` if the pattern was already stored; the stored response
    /// wins in that case.
    pub fn learn(&mut self, input_pattern: &str, output_pattern: &str) -> ErisResult<bool> {
        match self.store.create(input_pattern, output_pattern) {
            Ok(()) => {
                self.rules.add(Rule::new(input_pattern, output_pattern));
                Ok(true)
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(pattern = input_pattern, "Rule already exists, keeping it");
                if !self.rules.contains(input_pattern) {
                    if let Some(rule) = self.store.get(input_pattern)? {
                        self.rules.add(rule);
                    }
                }
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Loads seed pairs; patterns already stored are skipped.
    pub fn seed<I, S>(&mut self, pairs: I) -> ErisResult<SeedReport>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut report = SeedReport::default();

        for (input, output) in pairs {
            if self.learn(input.as_ref(), output.as_ref())? {
                report.created += 1;
            } else {
                report.skipped += 1;
            }
        }

        Ok(report)
    }

    /// Cached rules, in matching order.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The durable store behind the cache.
    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Patterns flagged by low ratings.
    pub fn revision_candidates(&self) -> &[String] {
        self.feedback.revision_candidates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responder_with(pairs: &[(&str, &str)]) -> Responder {
        let mut responder = Responder::new(RuleStore::in_memory().unwrap()).unwrap();
        responder.seed(pairs.iter().copied()).unwrap();
        responder
    }

    #[tokio::test]
    async fn test_match_or_default() {
        let mut responder = responder_with(&[("hello", "Hi there!"), ("hi", "Hello!")]);

        assert_eq!(responder.handle("hello world", None).await, "Hi there!");
        assert_eq!(responder.handle("xyzzy", None).await, DEFAULT_RESPONSE);
        assert_eq!(responder.handle("", None).await, DEFAULT_RESPONSE);
    }

    #[tokio::test]
    async fn test_reply_reports_matched_pattern() {
        let responder = responder_with(&[("hello", "Hi there!")]);

        let reply = responder.respond("oh hello").await;
        assert_eq!(reply.matched.as_deref(), Some("hello"));

        let reply = responder.respond("nothing").await;
        assert_eq!(reply.matched, None);
    }

    #[tokio::test]
    async fn test_miss_hooks_cannot_change_reply() {
        let mut responder = responder_with(&[("hello", "Hi there!")]);
        let counters = crate::hooks::MetricsHook::install(responder.hooks_mut());

        let reply = responder.respond("xyzzy").await;

        assert_eq!(reply.response, DEFAULT_RESPONSE);
        assert_eq!(reply.matched, None);
        assert_eq!(counters.total_misses(), 1);
    }

    #[tokio::test]
    async fn test_low_rating_keeps_response() {
        let mut responder = responder_with(&[("hello", "Hi there!")]);

        let response = responder
            .handle("hello", Some(Feedback::rating(2).unwrap()))
            .await;

        assert_eq!(response, "Hi there!");
        assert_eq!(responder.rules().find_match("hello").unwrap().output_pattern, "Hi there!");
        assert_eq!(responder.revision_candidates(), &["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_rating_for_unmatched_text_is_ignored() {
        let mut responder = responder_with(&[("hello", "Hi there!")]);

        let effect = responder
            .feedback("xyzzy", Some(Feedback::rating(1).unwrap()))
            .await
            .unwrap();

        assert_eq!(effect, FeedbackEffect::Ignored);
        assert!(responder.revision_candidates().is_empty());
    }

    #[tokio::test]
    async fn test_override_applies_to_next_message() {
        let mut responder = responder_with(&[]);

        let first = responder
            .handle("new phrase", Some(Feedback::reply("Custom reply")))
            .await;
        assert_eq!(first, DEFAULT_RESPONSE);

        assert_eq!(responder.handle("new phrase", None).await, "Custom reply");
        assert_eq!(
            responder.store().get("new phrase").unwrap().unwrap().output_pattern,
            "Custom reply"
        );
    }

    #[tokio::test]
    async fn test_override_existing_rule() {
        let mut responder = responder_with(&[("hello", "Hi there!")]);

        let effect = responder
            .feedback("hello", Some(Feedback::reply("Hey!")))
            .await
            .unwrap();

        assert_eq!(effect, FeedbackEffect::Overridden { created: false });
        assert_eq!(responder.handle("hello", None).await, "Hey!");
        assert_eq!(responder.rules().len(), 1);
    }

    #[tokio::test]
    async fn test_override_with_empty_text_falls_back() {
        let mut responder = responder_with(&[]);

        let response = responder.handle("", Some(Feedback::reply("x"))).await;
        assert_eq!(response, DEFAULT_RESPONSE);
        assert!(responder.try_handle("", Some(Feedback::reply("x"))).await.is_err());
        assert_eq!(responder.store().count().unwrap(), 0);
    }

    #[test]
    fn test_learn_keeps_first() {
        let mut responder = responder_with(&[]);

        assert!(responder.learn("hello", "Hi there!").unwrap());
        assert!(!responder.learn("hello", "Other").unwrap());

        assert_eq!(responder.rules().len(), 1);
        assert_eq!(responder.store().count().unwrap(), 1);
        assert_eq!(responder.rules().get("hello").unwrap().output_pattern, "Hi there!");
    }

    #[test]
    fn test_seed_report() {
        let mut responder = responder_with(&[("hello", "Hi there!")]);

        let report = responder
            .seed([("hello", "ignored"), ("bye", "See you later!")])
            .unwrap();

        assert_eq!(report, SeedReport { created: 1, skipped: 1 });
    }
}
