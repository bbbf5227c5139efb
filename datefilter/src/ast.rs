//! Typed representation of a date filter expression

use serde::{Deserialize, Serialize};
use std::fmt;

/// The only column a filter clause may reference
pub const DATE_FIELD: &str = "Date";

/// A validated filter: one or more clauses joined by `AND`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    pub clauses: Vec<DateClause>,
}

/// `Date <op> 'YYYY-MM-DD'`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateClause {
    pub op: Comparator,
    pub date: DateLiteral,
}

/// Comparison operators accepted in a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl Comparator {
    pub const ALL: [Comparator; 6] = [
        Comparator::Ge,
        Comparator::Le,
        Comparator::Ne,
        Comparator::Gt,
        Comparator::Lt,
        Comparator::Eq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
        }
    }
}

/// Calendar date exactly as written: four-digit year, two-digit month and day.
///
/// Digits are kept as given; range checks belong to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateLiteral {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl DateLiteral {
    pub fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }
}

impl fmt::Display for DateLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for DateClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} '{}'", DATE_FIELD, self.op.as_str(), self.date)
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}
