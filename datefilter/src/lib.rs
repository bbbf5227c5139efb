//! Date filter expressions
//!
//! A small, strict language for restricting index cleanup to a range of days.
//!
//! # Syntax
//!
//! ```text
//! Date > '2020-02-01' AND Date < '2020-03-01'
//! Date = '2021-06-15'
//! Date != '1970-02-12' AND Date <= '2019-12-31'
//! ```
//!
//! Each clause is exactly three whitespace-separated tokens: the `Date` field,
//! one of `>` `>=` `<` `<=` `=` `!=`, and a single-quoted `YYYY-MM-DD` literal.
//! Clauses are joined by an upper-case `AND`; nothing else is accepted.
//!
//! The parsed [`DateFilter`] renders back to the same textual form, so it can
//! be embedded into generated statements without passing user text through.

mod ast;
mod error;
mod parser;

pub use ast::*;
pub use error::{FilterError, FilterErrorKind, EXPECTED_GRAMMAR};

/// Parse and validate a filter expression
pub fn parse(input: &str) -> Result<DateFilter, FilterError> {
    parser::parse_filter(input)
}

impl std::str::FromStr for DateFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let filter = parse("Date > '2020-02-01' AND Date < '2020-03-01'").unwrap();
        assert_eq!(filter.to_string(), "Date > '2020-02-01' AND Date < '2020-03-01'");
    }

    #[test]
    fn test_parse_single_clause() {
        let filter: DateFilter = "Date != '1970-02-12'".parse().unwrap();
        assert_eq!(filter.clauses.len(), 1);
        assert_eq!(filter.clauses[0].op, Comparator::Ne);
    }

    #[test]
    fn test_unquoted_date_rejected() {
        let err = parse("Date > 2020-02-01").unwrap_err();
        assert_eq!(err.kind, FilterErrorKind::DateLiteral);
        assert_eq!(err.token.as_deref(), Some("2020-02-01"));
    }

    #[test]
    fn test_trailing_and_rejected() {
        let err = parse("Date > '2020-02-01' AND").unwrap_err();
        assert_eq!(err.kind, FilterErrorKind::TrailingConjunction);
        assert_eq!(err.position, Some(3));
    }

    #[test]
    fn test_bad_comparator_rejected() {
        let err = parse("Date => '2020-02-01'").unwrap_err();
        assert_eq!(err.kind, FilterErrorKind::Comparator);
        assert!(err.to_string().contains("=>"));
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(parse("   ").unwrap_err().kind, FilterErrorKind::Empty);
    }
}
