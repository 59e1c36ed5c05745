//! Rules and feedback values exchanged with the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::errors::{ErisError, ErisResult};

/// Response returned when no rule matches the incoming text.
pub const DEFAULT_RESPONSE: &str = "I'm sorry, I didn't understand that.";

/// An input→output rule.
///
/// `input_pattern` is the identity of the rule: the store holds at most one
/// rule per pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub input_pattern: String,
    pub output_pattern: String,
    pub last_changed: DateTime<Utc>,
}

impl Rule {
    /// Creates a rule stamped with the current time.
    pub fn new(input_pattern: impl Into<String>, output_pattern: impl Into<String>) -> Self {
        Self {
            input_pattern: input_pattern.into(),
            output_pattern: output_pattern.into(),
            last_changed: Utc::now(),
        }
    }

    /// Whether the pattern occurs anywhere in `text`.
    ///
    /// Plain case-sensitive substring containment: not anchored, not tokenized.
    pub fn matches(&self, text: &str) -> bool {
        !self.input_pattern.is_empty() && text.contains(self.input_pattern.as_str())
    }
}

/// A user satisfaction rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validates a raw rating.
    pub fn new(value: i64) -> ErisResult<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ErisError::InvalidRating(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = ErisError;

    fn try_from(value: i64) -> ErisResult<Self> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Feedback supplied for a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    /// A 1-5 satisfaction rating.
    Rating(Rating),
    /// Literal replacement text for the reply.
    Override(String),
}

impl Feedback {
    /// Builds rating feedback, validating the range.
    pub fn rating(value: i64) -> ErisResult<Self> {
        Rating::new(value).map(Feedback::Rating)
    }

    /// Builds override feedback.
    pub fn reply(text: impl Into<String>) -> Self {
        Feedback::Override(text.into())
    }

    /// Classifies a raw feedback line.
    ///
    /// Blank input is no feedback, a bare integer is a rating (and must be in
    /// range), anything else is replacement text.
    pub fn parse(raw: &str) -> ErisResult<Option<Self>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        match trimmed.parse::<i64>() {
            Ok(value) => Self::rating(value).map(Some),
            Err(_) => Ok(Some(Self::reply(trimmed))),
        }
    }
}
