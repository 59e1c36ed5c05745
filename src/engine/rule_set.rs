//! In-memory rule cache and the substring matcher.

use std::collections::HashMap;

use crate::store::RuleStore;
use crate::types::Rule;
use crate::ErisResult;

/// Ordered cache of rules mirroring the [`RuleStore`].
///
/// Iteration order is insertion order, and matching walks it front to back,
/// so the earliest-added rule wins when several patterns occur in the text.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from rules in the given order, keeping the first of any
    /// duplicate patterns.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut set = Self::new();
        for rule in rules {
            set.add(rule);
        }
        set
    }

    /// Loads every rule currently in the store.
    pub fn hydrate(store: &RuleStore) -> ErisResult<Self> {
        let set = Self::from_rules(store.list_all()?);
        tracing::debug!(rules = set.len(), "Rule set hydrated");
        Ok(set)
    }

    /// Appends a rule unless its pattern is already cached.
    ///
    /// Returns `false` (and keeps the existing rule) on a duplicate key or an
    /// empty pattern. Nothing is written to the store.
    pub fn add(&mut self, rule: Rule) -> bool {
        if rule.input_pattern.is_empty() || self.index.contains_key(&rule.input_pattern) {
            return false;
        }

        self.index
            .insert(rule.input_pattern.clone(), self.rules.len());
        self.rules.push(rule);
        true
    }

    /// Replaces the cached response for `input_pattern`, appending a new rule
    /// if none is cached. The rule keeps its position in the set.
    pub fn set_response(&mut self, input_pattern: &str, output_pattern: &str) {
        match self.index.get(input_pattern) {
            Some(&pos) => {
                let rule = &mut self.rules[pos];
                rule.output_pattern = output_pattern.to_string();
                rule.last_changed = chrono::Utc::now();
            }
            None => {
                self.add(Rule::new(input_pattern, output_pattern));
            }
        }
    }

    /// First rule whose pattern occurs in `text`.
    pub fn find_match(&self, text: &str) -> Option<&Rule> {
        if text.is_empty() {
            return None;
        }
        self.rules.iter().find(|rule| rule.matches(text))
    }

    /// Cached rule for an exact pattern.
    pub fn get(&self, input_pattern: &str) -> Option<&Rule> {
        self.index.get(input_pattern).map(|&pos| &self.rules[pos])
    }

    pub fn contains(&self, input_pattern: &str) -> bool {
        self.index.contains_key(input_pattern)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}
