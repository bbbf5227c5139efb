//! WHERE clause rendering
//!
//! Patterns and dates are rendered from validated values only; string
//! literals are escaped even though the pattern charset already excludes
//! quotes.

use datefilter::DateFilter;

use crate::date::IndexDate;
use crate::pattern::Pattern;

/// Path column of the index table
pub const PATH_COLUMN: &str = "Path";

/// Date column of the index table
pub const DATE_COLUMN: &str = "Date";

/// Render `WHERE (Path like 'p1' OR Path like 'p2') [AND Date='YYYY-MM-DD']`
///
/// Returns an empty string when there are neither patterns nor a date.
pub fn predicate(patterns: &[Pattern], date: Option<&IndexDate>) -> String {
    if patterns.is_empty() && date.is_none() {
        return String::new();
    }

    let mut out = String::from("WHERE ");
    if !patterns.is_empty() {
        out.push_str(&pattern_group(patterns));
        if date.is_some() {
            out.push_str(" AND ");
        }
    }
    if let Some(date) = date {
        out.push_str(&date_equals(date));
    }
    out
}

/// `(Path like 'p1' OR Path like 'p2')`
pub fn pattern_group(patterns: &[Pattern]) -> String {
    let alternatives: Vec<String> = patterns
        .iter()
        .map(|p| format!("{} like {}", PATH_COLUMN, quote(p.as_str())))
        .collect();
    format!("({})", alternatives.join(" OR "))
}

/// `Date='YYYY-MM-DD'`
pub fn date_equals(date: &IndexDate) -> String {
    format!("{}={}", DATE_COLUMN, quote(&date.to_string()))
}

/// `(Date > 'YYYY-MM-DD' AND ...)` rendered from the parsed filter
pub fn date_range(filter: &DateFilter) -> String {
    format!("({})", filter)
}

/// Single-quote a string literal, escaping backslashes and quotes
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
