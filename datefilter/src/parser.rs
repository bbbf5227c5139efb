//! Date filter parser using nom
//!
//! The expression is split on whitespace first; every token is then matched
//! against the grammar slot it occupies, so a rejection can always name the
//! offending token.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::char,
    combinator::{all_consuming, map, map_res, value},
    sequence::{delimited, tuple},
};

use crate::ast::*;
use crate::error::{FilterError, FilterErrorKind};

/// Grammar slot the next token has to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Field,
    Comparator,
    Date,
    Conjunction,
}

/// Parse a complete filter expression
pub fn parse_filter(input: &str) -> Result<DateFilter, FilterError> {
    let tokens: Vec<&str> = input.split_whitespace().collect();

    if tokens.is_empty() {
        return Err(FilterError::new(FilterErrorKind::Empty, "expression is empty"));
    }
    if tokens.len() < 3 {
        return Err(FilterError::new(
            FilterErrorKind::TooShort,
            format!("expected at least 3 tokens, got {}", tokens.len()),
        ));
    }

    let mut clauses = Vec::new();
    let mut slot = Slot::Field;
    let mut op = Comparator::Eq;

    for (i, token) in tokens.iter().copied().enumerate() {
        match slot {
            Slot::Field => {
                if token != DATE_FIELD {
                    return Err(FilterError::new(
                        FilterErrorKind::Field,
                        format!("use {} instead of {}", DATE_FIELD, token),
                    )
                    .at(i, token));
                }
                slot = Slot::Comparator;
            }
            Slot::Comparator => {
                op = single(comparator, token).ok_or_else(|| {
                    FilterError::new(
                        FilterErrorKind::Comparator,
                        format!("use correct comparator instead of {}", token),
                    )
                    .at(i, token)
                })?;
                slot = Slot::Date;
            }
            Slot::Date => {
                let date = single(quoted_date, token).ok_or_else(|| {
                    FilterError::new(
                        FilterErrorKind::DateLiteral,
                        format!("use correct date instead of {}", token),
                    )
                    .at(i, token)
                })?;
                clauses.push(DateClause { op, date });
                slot = Slot::Conjunction;
            }
            Slot::Conjunction => {
                if token != "AND" {
                    return Err(FilterError::new(
                        FilterErrorKind::Conjunction,
                        format!("use AND instead of {}", token),
                    )
                    .at(i, token));
                }
                if i == tokens.len() - 1 {
                    return Err(FilterError::new(
                        FilterErrorKind::TrailingConjunction,
                        format!("can't use {} at the end", token),
                    )
                    .at(i, token));
                }
                slot = Slot::Field;
            }
        }
    }

    if slot != Slot::Conjunction {
        let last = tokens.len() - 1;
        return Err(FilterError::new(
            FilterErrorKind::IncompleteClause,
            "expression ends in the middle of a clause",
        )
        .at(last, tokens[last]));
    }

    Ok(DateFilter { clauses })
}

/// Run a token parser that must consume the whole token
fn single<'a, T>(parser: fn(&'a str) -> IResult<&'a str, T>, token: &'a str) -> Option<T> {
    all_consuming(parser)(token).ok().map(|(_, out)| out)
}

// ============================================================================
// Token Parsers
// ============================================================================

fn comparator(input: &str) -> IResult<&str, Comparator> {
    // Two-character operators first so `>=` is not read as `>`
    alt((
        value(Comparator::Ge, tag(">=")),
        value(Comparator::Le, tag("<=")),
        value(Comparator::Ne, tag("!=")),
        value(Comparator::Gt, tag(">")),
        value(Comparator::Lt, tag("<")),
        value(Comparator::Eq, tag("=")),
    ))(input)
}

fn quoted_date(input: &str) -> IResult<&str, DateLiteral> {
    delimited(char('\''), date_literal, char('\''))(input)
}

fn date_literal(input: &str) -> IResult<&str, DateLiteral> {
    map(
        tuple((digits::<u16>(4), char('-'), digits::<u8>(2), char('-'), digits::<u8>(2))),
        |(year, _, month, _, day)| DateLiteral::new(year, month, day),
    )(input)
}

fn digits<'a, T: std::str::FromStr>(count: usize) -> impl FnMut(&'a str) -> IResult<&'a str, T> {
    map_res(
        take_while_m_n(count, count, |c: char| c.is_ascii_digit()),
        |s: &'a str| s.parse::<T>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparators() {
        for op in Comparator::ALL {
            assert_eq!(single(comparator, op.as_str()), Some(op));
        }
        assert_eq!(single(comparator, "=>"), None);
        assert_eq!(single(comparator, "<>"), None);
    }

    #[test]
    fn test_quoted_date() {
        assert_eq!(
            single(quoted_date, "'2020-02-01'"),
            Some(DateLiteral::new(2020, 2, 1))
        );
        assert_eq!(single(quoted_date, "2020-02-01"), None);
        assert_eq!(single(quoted_date, "'2020-2-01'"), None);
        assert_eq!(single(quoted_date, "'20200-02-01'"), None);
        assert_eq!(single(quoted_date, "'2020-02-01"), None);
        assert_eq!(single(quoted_date, "\"2020-02-01\""), None);
    }

    #[test]
    fn test_range() {
        let filter = parse_filter("Date > '2020-02-01' AND Date < '2020-03-01'").unwrap();
        assert_eq!(filter.clauses.len(), 2);
        assert_eq!(filter.clauses[0].op, Comparator::Gt);
        assert_eq!(filter.clauses[1].date, DateLiteral::new(2020, 3, 1));
    }

    #[test]
    fn test_extra_whitespace_is_tolerated() {
        let filter = parse_filter("  Date   >=  '2021-01-01' ").unwrap();
        assert_eq!(filter.to_string(), "Date >= '2021-01-01'");
    }

    #[test]
    fn test_wrong_field() {
        let err = parse_filter("Day > '2020-02-01'").unwrap_err();
        assert_eq!(err.kind, FilterErrorKind::Field);
        assert_eq!(err.token.as_deref(), Some("Day"));
        assert_eq!(err.position, Some(0));
    }

    #[test]
    fn test_lowercase_conjunction_rejected() {
        let err = parse_filter("Date > '2020-02-01' and Date < '2020-03-01'").unwrap_err();
        assert_eq!(err.kind, FilterErrorKind::Conjunction);
        assert_eq!(err.position, Some(3));
    }

    #[test]
    fn test_incomplete_second_clause() {
        let err = parse_filter("Date > '2020-02-01' AND Date <").unwrap_err();
        assert_eq!(err.kind, FilterErrorKind::IncompleteClause);
        assert_eq!(err.token.as_deref(), Some("<"));
    }

    #[test]
    fn test_too_short() {
        let err = parse_filter("Date >").unwrap_err();
        assert_eq!(err.kind, FilterErrorKind::TooShort);
    }
}
