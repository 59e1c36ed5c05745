//! FeedbackLoop - turns user feedback into rule changes.
//!
//! Two channels:
//! - **Rating** (1-5): low ratings flag the rule as a revision candidate but
//!   never rewrite it.
//! - **Override**: literal replacement text, written to the store and then
//!   to the cache.

use crate::store::RuleStore;
use crate::types::{Rating, Rule};
use crate::ErisResult;

use super::rule_set::RuleSet;

/// What a rating did to the rule it was given for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// No rating was supplied.
    NoFeedback,
    /// The rating was at or above the threshold.
    Accepted { rating: Rating },
    /// The rating was below the threshold; the rule is now a revision candidate.
    FlaggedForRevision { rating: Rating },
}

/// Applies feedback to rules.
#[derive(Debug, Clone)]
pub struct FeedbackLoop {
    low_rating_threshold: u8,
    flagged: Vec<String>,
}

impl FeedbackLoop {
    /// Creates a loop that flags ratings strictly below `low_rating_threshold`.
    pub fn new(low_rating_threshold: u8) -> Self {
        Self {
            low_rating_threshold,
            flagged: Vec::new(),
        }
    }

    /// Records a rating for a matched rule.
    ///
    /// The rule itself is not modified and nothing is written to the store.
    pub fn apply_rating(&mut self, rule: &Rule, rating: Option<Rating>) -> FeedbackOutcome {
        let Some(rating) = rating else {
            return FeedbackOutcome::NoFeedback;
        };

        if rating.value() >= self.low_rating_threshold {
            tracing::debug!(pattern = %rule.input_pattern, %rating, "Rating accepted");
            return FeedbackOutcome::Accepted { rating };
        }

        if !self.flagged.contains(&rule.input_pattern) {
            self.flagged.push(rule.input_pattern.clone());
        }

        tracing::info!(
            pattern = %rule.input_pattern,
            %rating,
            "Rule flagged for revision"
        );

        FeedbackOutcome::FlaggedForRevision { rating }
    }

    /// Overwrites (or creates) the rule for `input_pattern` with `text`.
    ///
    /// The store is written first; the cache is only touched once the write
    /// succeeded. Returns `true` if the rule was newly created.
    pub fn apply_override(
        &mut self,
        store: &RuleStore,
        rules: &mut RuleSet,
        input_pattern: &str,
        text: &str,
    ) -> ErisResult<bool> {
        let created = store.upsert(input_pattern, text)?;
        rules.set_response(input_pattern, text);
        self.flagged.retain(|p| p != input_pattern);

        tracing::info!(pattern = input_pattern, created, "Rule overridden by feedback");
        Ok(created)
    }

    /// Patterns flagged by low ratings, in the order they were first flagged.
    pub fn revision_candidates(&self) -> &[String] {
        &self.flagged
    }
}

impl Default for FeedbackLoop {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(value: i64) -> Option<Rating> {
        Some(Rating::new(value).unwrap())
    }

    #[test]
    fn test_no_rating() {
        let mut feedback = FeedbackLoop::default();
        let rule = Rule::new("hello", "Hi there!");
        assert_eq!(feedback.apply_rating(&rule, None), FeedbackOutcome::NoFeedback);
        assert!(feedback.revision_candidates().is_empty());
    }

    #[test]
    fn test_low_rating_flags_without_mutation() {
        let mut feedback = FeedbackLoop::default();
        let rule = Rule::new("hello", "Hi there!");

        let outcome = feedback.apply_rating(&rule, rating(2));
        assert!(matches!(outcome, FeedbackOutcome::FlaggedForRevision { .. }));
        feedback.apply_rating(&rule, rating(1));

        assert_eq!(feedback.revision_candidates(), &["hello".to_string()]);
        assert_eq!(rule.output_pattern, "Hi there!");
    }

    #[test]
    fn test_threshold_rating_is_accepted() {
        let mut feedback = FeedbackLoop::default();
        let rule = Rule::new("hello", "Hi there!");

        assert!(matches!(
            feedback.apply_rating(&rule, rating(3)),
            FeedbackOutcome::Accepted { .. }
        ));
        assert!(feedback.revision_candidates().is_empty());
    }

    #[test]
    fn test_override_updates_store_and_set() {
        let store = RuleStore::in_memory().unwrap();
        store.create("hello", "Hi there!").unwrap();
        let mut rules = RuleSet::hydrate(&store).unwrap();
        let mut feedback = FeedbackLoop::default();

        let rule = rules.get("hello").unwrap().clone();
        feedback.apply_rating(&rule, rating(1));

        let created = feedback
            .apply_override(&store, &mut rules, "hello", "Greetings!")
            .unwrap();

        assert!(!created);
        assert_eq!(store.get("hello").unwrap().unwrap().output_pattern, "Greetings!");
        assert_eq!(rules.get("hello").unwrap().output_pattern, "Greetings!");
        assert!(feedback.revision_candidates().is_empty());
    }

    #[test]
    fn test_override_creates_missing_rule() {
        let store = RuleStore::in_memory().unwrap();
        let mut rules = RuleSet::new();
        let mut feedback = FeedbackLoop::default();

        let created = feedback
            .apply_override(&store, &mut rules, "new phrase", "Custom reply")
            .unwrap();

        assert!(created);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(
            rules.find_match("new phrase").unwrap().output_pattern,
            "Custom reply"
        );
    }
}
