//! Error types for date filter parsing

use std::fmt;

/// Grammar reminder attached to every rejection
pub const EXPECTED_GRAMMAR: &str =
    "Date <op> 'YYYY-MM-DD' [AND Date <op> 'YYYY-MM-DD' ...] with <op> one of > >= < <= = !=";

/// What went wrong while reading a filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterErrorKind {
    /// Nothing to parse
    Empty,
    /// Fewer tokens than a single clause needs
    TooShort,
    /// Clause did not start with the date field
    Field,
    /// Unknown comparison operator
    Comparator,
    /// Value is not a quoted `YYYY-MM-DD` literal
    DateLiteral,
    /// Clauses must be joined by `AND`
    Conjunction,
    /// Expression ends with `AND`
    TrailingConjunction,
    /// Expression stops in the middle of a clause
    IncompleteClause,
}

/// Error that occurred while validating a filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterError {
    pub kind: FilterErrorKind,
    pub message: String,
    /// Offending token, if the failure is tied to one
    pub token: Option<String>,
    /// Zero-based index of the offending token
    pub position: Option<usize>,
}

impl FilterError {
    pub fn new(kind: FilterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            token: None,
            position: None,
        }
    }

    pub fn at(mut self, position: usize, token: &str) -> Self {
        self.position = Some(position);
        self.token = Some(token.to_string());
        self
    }

    /// The grammar the input was expected to follow
    pub fn expected(&self) -> &'static str {
        EXPECTED_GRAMMAR
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid date filter: {}", self.message)?;
        if let (Some(pos), Some(token)) = (self.position, &self.token) {
            write!(f, " (token {} '{}')", pos, token)?;
        }
        Ok(())
    }
}

impl std::error::Error for FilterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_token() {
        let err = FilterError::new(FilterErrorKind::Field, "use Date instead of Day").at(4, "Day");
        assert_eq!(
            err.to_string(),
            "Invalid date filter: use Date instead of Day (token 4 'Day')"
        );
    }

    #[test]
    fn test_display_without_token() {
        let err = FilterError::new(FilterErrorKind::Empty, "expression is empty");
        assert_eq!(err.to_string(), "Invalid date filter: expression is empty");
    }
}
