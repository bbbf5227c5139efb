//! Error types for idxclean
//!
//! Every failure is fatal for the run. The variants are grouped by when they
//! can happen: configuration errors are raised before any statement reaches
//! the store, query and run errors afterwards.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cleanup operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    #[error("Empty pattern list")]
    EmptyPatternList,

    #[error("Invalid symbol in pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("Pattern '{pattern}' matches everything, check it")]
    AmbiguousPattern { pattern: String },

    #[error("{message}")]
    InvalidDateFilter {
        message: String,
        token: Option<String>,
        expected: &'static str,
    },

    #[error("Invalid {kind} '{value}': {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("Failed to read pattern file '{path}': {source}")]
    PatternFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load config file '{path}': {message}")]
    ConfigFile { path: PathBuf, message: String },

    // ==========================================================================
    // Query Errors
    // ==========================================================================
    #[error("Connection to {endpoint} failed: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Query failed: {message}\n  statement: {statement}")]
    Query { statement: String, message: String },

    #[error("Failed to decode query result: {message}")]
    Decode { message: String },

    // ==========================================================================
    // Run Errors
    // ==========================================================================
    #[error("No path found for {patterns} pattern(s)")]
    NoMatch { patterns: usize },

    #[error("Delete for {date} failed ({deleted} date(s) already deleted): {message}")]
    Execution {
        date: String,
        deleted: usize,
        message: String,
    },

    #[error("Canceled")]
    Canceled,

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type alias for cleanup operations
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<datefilter::FilterError> for Error {
    fn from(err: datefilter::FilterError) -> Self {
        Error::InvalidDateFilter {
            message: err.to_string(),
            token: err.token.clone(),
            expected: err.expected(),
        }
    }
}

impl From<crate::validation::ValidationError> for Error {
    fn from(err: crate::validation::ValidationError) -> Self {
        use crate::validation::ValidationError;

        match err {
            ValidationError::Empty => Error::EmptyPatternList,
            ValidationError::Ambiguous(pattern) => Error::AmbiguousPattern { pattern },
            ValidationError::ForbiddenSymbol(pattern, _) => Error::InvalidPattern {
                pattern,
                reason: "contains one of ~!@#$^&() '\"",
            },
            ValidationError::InvalidIdentifier(value, reason) => Error::InvalidIdentifier {
                kind: "identifier",
                value,
                reason,
            },
            ValidationError::TooLong(value, _max) => Error::InvalidIdentifier {
                kind: "identifier",
                value,
                reason: "exceeds maximum length",
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode {
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Error Display Helpers
// =============================================================================

impl Error {
    /// Returns a user-friendly suggestion for fixing the error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::EmptyPatternList => Some("Put one path pattern per line in the pattern file"),
            Error::AmbiguousPattern { .. } => {
                Some("Use a concrete prefix such as 'carbon.agents.%' instead of a bare wildcard")
            }
            Error::InvalidPattern { .. } => {
                Some("Remove any of ~!@#$^&() '\" and spaces from the pattern")
            }
            Error::InvalidDateFilter { expected, .. } => Some(*expected),
            Error::NoMatch { .. } => Some("Check the patterns with --show or --query before deleting"),
            Error::Connection { .. } => Some("Check the ClickHouse endpoint and credentials"),
            _ => None,
        }
    }

    /// True when the run failed before any statement was sent to the store
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::EmptyPatternList
                | Error::InvalidPattern { .. }
                | Error::AmbiguousPattern { .. }
                | Error::InvalidDateFilter { .. }
                | Error::InvalidIdentifier { .. }
                | Error::InvalidSetting { .. }
                | Error::PatternFileRead { .. }
                | Error::ConfigFile { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NoMatch { patterns: 2 };
        assert_eq!(err.to_string(), "No path found for 2 pattern(s)");
    }

    #[test]
    fn test_date_filter_conversion_keeps_token() {
        let err: Error = datefilter::parse("Date > 2020-02-01").unwrap_err().into();
        match &err {
            Error::InvalidDateFilter { token, .. } => {
                assert_eq!(token.as_deref(), Some("2020-02-01"));
            }
            other => panic!("Expected InvalidDateFilter, got {:?}", other),
        }
        assert!(err.is_configuration());
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_runtime_errors_are_not_configuration() {
        let err = Error::Execution {
            date: "2020-01-01".to_string(),
            deleted: 3,
            message: "timeout".to_string(),
        };
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("3 date(s) already deleted"));
    }
}
