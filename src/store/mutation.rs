//! Rows of `system.mutations`

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::Error;

/// Format of `create_time` in ClickHouse JSON output
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static TARGET_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Date\s*=\s*'([^']*)'").expect("valid target date regex"));

/// A background operation the store has not finished yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub id: String,
    pub create_time: NaiveDateTime,
    pub parts_to_do: i64,
    pub is_done: bool,
    /// Command text as normalized by the server
    pub command: String,
}

impl Mutation {
    /// Day a delete mutation targets, taken from the last `Date = '...'` in its command
    pub fn target_date(&self) -> Option<&str> {
        TARGET_DATE
            .captures_iter(&self.command)
            .last()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Wire shape of a mutation row
#[derive(Debug, Deserialize)]
pub(crate) struct MutationRow {
    mutation_id: String,
    create_time: String,
    parts_to_do: i64,
    is_done: u8,
    command: String,
}

impl TryFrom<MutationRow> for Mutation {
    type Error = Error;

    fn try_from(row: MutationRow) -> Result<Self, Self::Error> {
        let create_time = NaiveDateTime::parse_from_str(&row.create_time, DATETIME_FORMAT)
            .map_err(|e| Error::Decode {
                message: format!("invalid create_time '{}': {}", row.create_time, e),
            })?;

        Ok(Mutation {
            id: row.mutation_id,
            create_time,
            parts_to_do: row.parts_to_do,
            is_done: row.is_done != 0,
            command: row.command,
        })
    }
}
