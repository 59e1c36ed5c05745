//! Error types for Eris.

use thiserror::Error;

/// Default result type for Eris.
pub type ErisResult<T> = Result<T, ErisError>;

/// Errors that can occur in Eris.
#[derive(Error, Debug)]
pub enum ErisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("A rule for '{0}' already exists")]
    Conflict(String),

    #[error("No rule found for '{0}'")]
    NotFound(String),

    #[error("Rating {0} is out of range (expected 1-5)")]
    InvalidRating(i64),

    #[error("Input pattern must not be empty")]
    EmptyPattern,

    #[error("Checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("{0}")]
    Other(String),
}

impl ErisError {
    /// Creates a generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error is a recoverable duplicate-insert.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let err = ErisError::Conflict("hello".to_string());
        assert_eq!(err.to_string(), "A rule for 'hello' already exists");
        assert!(err.is_conflict());
    }

    #[test]
    fn test_not_found_is_not_conflict() {
        let err = ErisError::NotFound("hello".to_string());
        assert!(!err.is_conflict());
    }
}
