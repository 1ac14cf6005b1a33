//! Error types for the tickparse system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tickparse system.
#[derive(Error, Debug)]
pub enum Error {
    /// The record-kind discriminator is absent, unknown, or the line could not be decoded.
    #[error("Classification failure: {0}")]
    Classification(String),

    /// A required field is missing or fails type conversion.
    #[error("Malformed field `{field}`: {reason}")]
    MalformedField {
        /// Column the failure was raised for.
        field: &'static str,
        /// Human readable cause.
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a classification error.
    pub fn classification(msg: impl Into<String>) -> Self {
        Error::Classification(msg.into())
    }

    /// Create a malformed field error.
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedField {
            field,
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether this error came from classification (as opposed to extraction).
    pub fn is_classification(&self) -> bool {
        matches!(self, Error::Classification(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_names_field() {
        let err = Error::malformed("trade_pr", "not a number");
        assert_eq!(err.to_string(), "Malformed field `trade_pr`: not a number");
        assert!(!err.is_classification());
    }

    #[test]
    fn test_classification_display() {
        let err = Error::classification("unknown record type \"X\"");
        assert!(err.is_classification());
        assert!(err.to_string().starts_with("Classification failure"));
    }
}
