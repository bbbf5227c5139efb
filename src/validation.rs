//! Input validation for idxclean
//!
//! Path patterns and table names end up inside generated SQL, so everything
//! that reaches the query planner passes through here first.

use thiserror::Error;

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Pattern list is empty")]
    Empty,

    #[error("Pattern '{0}' is a bare wildcard")]
    Ambiguous(String),

    #[error("Invalid symbol '{1}' in pattern '{0}'")]
    ForbiddenSymbol(String, char),

    #[error("Invalid identifier '{0}': {1}")]
    InvalidIdentifier(String, &'static str),

    #[error("Identifier '{0}' is too long (max {1} characters)")]
    TooLong(String, usize),
}

/// Maximum length for table and database names
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Characters that may never appear in a path pattern
pub const FORBIDDEN_PATTERN_SYMBOLS: &str = "~!@#$^&() '\"";

/// Wildcard-only patterns that would match the whole index
const AMBIGUOUS_PATTERNS: &[&str] = &["%", "?"];

/// Validate a single path pattern
///
/// Rules:
/// - Must not be empty
/// - Must not be a bare `%` or `?`
/// - Must not contain any of `~!@#$^&() '"`; `*` is a literal under LIKE and stays allowed
pub fn validate_pattern(pattern: &str) -> Result<(), ValidationError> {
    if pattern.is_empty() {
        return Err(ValidationError::Empty);
    }

    if AMBIGUOUS_PATTERNS.contains(&pattern) {
        return Err(ValidationError::Ambiguous(pattern.to_string()));
    }

    if let Some(c) = pattern.chars().find(|c| FORBIDDEN_PATTERN_SYMBOLS.contains(*c)) {
        return Err(ValidationError::ForbiddenSymbol(pattern.to_string(), c));
    }

    Ok(())
}

/// Validate a table name, optionally qualified as `database.table`
pub fn validate_table_name(name: &str) -> Result<(), ValidationError> {
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong(name.to_string(), MAX_IDENTIFIER_LENGTH));
    }

    let mut segments = name.split('.');
    let first = segments.next().unwrap_or_default();
    let second = segments.next();
    if segments.next().is_some() {
        return Err(ValidationError::InvalidIdentifier(
            name.to_string(),
            "at most one '.' separating database and table is allowed",
        ));
    }

    validate_segment(name, first)?;
    if let Some(table) = second {
        validate_segment(name, table)?;
    }

    Ok(())
}

/// Validate a database name
pub fn validate_database_name(name: &str) -> Result<(), ValidationError> {
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong(name.to_string(), MAX_IDENTIFIER_LENGTH));
    }
    validate_segment(name, name)
}

fn validate_segment(full: &str, segment: &str) -> Result<(), ValidationError> {
    if segment.is_empty() {
        return Err(ValidationError::InvalidIdentifier(
            full.to_string(),
            "cannot be empty",
        ));
    }

    for (i, c) in segment.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' {
            return Err(ValidationError::InvalidIdentifier(
                full.to_string(),
                "contains invalid characters (only alphanumeric and underscore allowed)",
            ));
        }
        if i == 0 && c.is_ascii_digit() {
            return Err(ValidationError::InvalidIdentifier(
                full.to_string(),
                "cannot start with a digit",
            ));
        }
    }

    Ok(())
}
