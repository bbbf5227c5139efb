//! Calendar days as stored in the index `Date` column

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Textual form used by the store and in generated statements
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 1970-02-12
pub const PLACEHOLDER_YMD: (i32, u32, u32) = (1970, 2, 12);

/// A day in the index, always rendered as `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexDate(NaiveDate);

impl IndexDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Day the index reports ahead of real dates; printed apart in run summaries
    pub fn is_placeholder(&self) -> bool {
        let (year, month, day) = PLACEHOLDER_YMD;
        self.0.year() == year && self.0.month() == month && self.0.day() == day
    }
}

impl From<NaiveDate> for IndexDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for IndexDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for IndexDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Self)
            .map_err(|e| Error::Decode {
                message: format!("invalid date '{}': {}", s, e),
            })
    }
}

impl<'de> Deserialize<'de> for IndexDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
