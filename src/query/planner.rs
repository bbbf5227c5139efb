//! Statement planning for the index table
//!
//! Reads enumerate what a pattern set touches; deletes are always scoped to a
//! single day, however wide the date filter is.

use datefilter::DateFilter;
use std::fmt;
use tracing::debug;

use crate::config::CleanConfig;
use crate::date::IndexDate;
use crate::error::{Error, Result};
use crate::pattern::Pattern;
use crate::validation::{validate_database_name, validate_table_name};

use super::filter::{self, quote, DATE_COLUMN, PATH_COLUMN};

/// `ALTER TABLE ... DELETE` for exactly one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCommand {
    pub date: IndexDate,
    pub statement: String,
}

impl fmt::Display for DeleteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.statement)
    }
}

/// One delete per enumerated day, in enumeration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    commands: Vec<DeleteCommand>,
}

impl DeletionPlan {
    pub fn commands(&self) -> &[DeleteCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeleteCommand> {
        self.commands.iter()
    }
}

/// Builds every statement the cleaner sends to the index table
#[derive(Debug, Clone)]
pub struct IndexQueryPlanner {
    index: String,
    patterns: Vec<Pattern>,
    date_filter: Option<DateFilter>,
}

impl IndexQueryPlanner {
    pub fn new(
        index: impl Into<String>,
        patterns: Vec<Pattern>,
        date_filter: Option<DateFilter>,
    ) -> Result<Self> {
        let index = index.into();
        validate_table_name(&index)?;
        if patterns.is_empty() {
            return Err(Error::EmptyPatternList);
        }
        Ok(Self {
            index,
            patterns,
            date_filter,
        })
    }

    /// Planner for the pattern set the configuration selects
    pub fn from_config(config: &CleanConfig) -> Result<Self> {
        Self::new(
            config.index.clone(),
            config.patterns.select(config.reverse),
            config.date_filter.clone(),
        )
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// `SELECT Date FROM <index> WHERE ... GROUP BY Date`
    pub fn date_query(&self) -> String {
        self.enumeration_query(DATE_COLUMN)
    }

    /// `SELECT Path FROM <index> WHERE ... GROUP BY Path`
    pub fn path_query(&self) -> String {
        self.enumeration_query(PATH_COLUMN)
    }

    fn enumeration_query(&self, column: &str) -> String {
        let mut query = format!(
            "SELECT {} FROM {} {}",
            column,
            self.index,
            filter::predicate(&self.patterns, None)
        );
        if let Some(range) = &self.date_filter {
            query.push_str(" AND ");
            query.push_str(&filter::date_range(range));
        }
        query.push_str(" GROUP BY ");
        query.push_str(column);
        debug!(query = %query, "Planned enumeration query");
        query
    }

    /// Delete everything matching the patterns on one day
    pub fn delete_command(&self, date: &IndexDate) -> DeleteCommand {
        let statement = format!(
            "ALTER TABLE {} DELETE {}",
            self.index,
            filter::predicate(&self.patterns, Some(date))
        );
        DeleteCommand {
            date: *date,
            statement,
        }
    }

    /// One delete command per date, keeping the given order
    pub fn deletion_plan(&self, dates: &[IndexDate]) -> DeletionPlan {
        DeletionPlan {
            commands: dates.iter().map(|d| self.delete_command(d)).collect(),
        }
    }
}

/// Unfinished mutations registered against one table
pub fn mutations_query(database: &str, table: &str) -> Result<String> {
    validate_database_name(database)?;
    validate_table_name(table)?;
    Ok(format!(
        "SELECT mutation_id, create_time, parts_to_do, is_done, command FROM system.mutations \
         WHERE is_done=0 AND database={} AND table={}",
        quote(database),
        quote(table)
    ))
}
