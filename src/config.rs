//! Run configuration
//!
//! Command-line flags and the optional YAML file are folded into a single
//! [`CleanConfig`] once at startup; everything downstream only borrows it.

use datefilter::DateFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pattern::PatternSet;
use crate::validation::{validate_database_name, validate_table_name};

/// Index table cleaned when none is configured
pub const DEFAULT_INDEX: &str = "graphite_index";

/// Database searched for mutations of an unqualified index table
pub const DEFAULT_DATABASE: &str = "default";

/// ClickHouse HTTP interface
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8123";

/// What a run is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Print the path query and stop; no connection is opened
    QueryOnly,
    /// Enumerate, then print the delete statements instead of running them
    #[default]
    DryRun,
    /// Enumerate and run the deletes
    Execute,
}

/// Linear wait schedule used while too many mutations are pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    #[serde(with = "humantime_serde")]
    pub initial: Duration,
    #[serde(with = "humantime_serde")]
    pub step: Duration,
    #[serde(with = "humantime_serde")]
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(10),
            step: Duration::from_secs(10),
            cap: Duration::from_secs(60),
        }
    }
}

/// Delays between statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    /// Pause after each delete except the last one
    #[serde(with = "humantime_serde", default = "default_cooldown")]
    pub cooldown: Duration,
    #[serde(default)]
    pub backoff: BackoffPolicy,
}

fn default_cooldown() -> Duration {
    Duration::from_secs(1)
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            cooldown: default_cooldown(),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// How to reach the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Per-request timeout; mutations can make `ALTER TABLE` slow to return
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user: None,
            password: None,
            timeout: default_timeout(),
        }
    }
}

/// Settings that may come from a YAML file
///
/// ```yaml
/// connection:
///   endpoint: http://clickhouse:8123
///   user: cleaner
/// index: graphite_index
/// database: default
/// max_mutations: 2
/// pacing:
///   cooldown: 1s
///   backoff: { initial: 10s, step: 10s, cap: 60s }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub max_mutations: Option<usize>,
    #[serde(default)]
    pub pacing: Pacing,
}

impl FileConfig {
    pub fn parse(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::ConfigFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::parse(&text).map_err(|e| Error::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Everything one cleanup run needs, fixed for its whole duration
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Index table, optionally `database.table`
    pub index: String,
    /// Database of the index when `index` is unqualified
    pub database: String,
    pub patterns: PatternSet,
    pub date_filter: Option<DateFilter>,
    /// Match reversed patterns as well
    pub reverse: bool,
    pub mode: RunMode,
    /// Print matched paths before deleting
    pub show_paths: bool,
    /// Ask before switching a dry run to execution
    pub ask: bool,
    /// Deletes wait while this many mutations are unfinished
    pub max_mutations: usize,
    pub pacing: Pacing,
}

impl CleanConfig {
    /// Dry-run configuration with defaults for everything but the patterns
    pub fn new(patterns: PatternSet) -> Self {
        Self {
            index: DEFAULT_INDEX.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            patterns,
            date_filter: None,
            reverse: false,
            mode: RunMode::default(),
            show_paths: false,
            ask: false,
            max_mutations: 1,
            pacing: Pacing::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_table_name(&self.index)?;
        validate_database_name(&self.database)?;

        if self.max_mutations == 0 {
            return Err(Error::InvalidSetting {
                name: "max_mutations",
                reason: "must be at least 1, otherwise no delete could ever start".to_string(),
            });
        }

        let backoff = self.pacing.backoff;
        if backoff.initial > backoff.cap {
            return Err(Error::InvalidSetting {
                name: "pacing.backoff",
                reason: format!(
                    "initial delay {:?} exceeds cap {:?}",
                    backoff.initial, backoff.cap
                ),
            });
        }

        Ok(())
    }

    /// `(database, table)` whose mutations gate the deletes
    pub fn mutation_target(&self) -> (&str, &str) {
        match self.index.split_once('.') {
            Some((database, table)) => (database, table),
            None => (self.database.as_str(), self.index.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CleanConfig {
        CleanConfig::new(PatternSet::parse("a.b.*").unwrap())
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.mode, RunMode::DryRun);
        assert_eq!(config.max_mutations, 1);
        assert_eq!(config.pacing.cooldown, Duration::from_secs(1));
        assert_eq!(config.pacing.backoff.initial, Duration::from_secs(10));
        assert_eq!(config.pacing.backoff.cap, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let config = CleanConfig {
            max_mutations: 0,
            ..config()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidSetting { name: "max_mutations", .. })
        ));
    }

    #[test]
    fn test_mutation_target() {
        let config = config();
        assert_eq!(config.mutation_target(), ("default", "graphite_index"));

        let config = CleanConfig {
            index: "graphite.index_2".to_string(),
            ..config
        };
        assert_eq!(config.mutation_target(), ("graphite", "index_2"));
    }

    #[test]
    fn test_file_config() {
        let file = FileConfig::parse(
            r#"
connection:
  endpoint: http://ch:8123
  user: cleaner
  timeout: 30s
index: graphite.graphite_index
max_mutations: 3
pacing:
  cooldown: 500ms
  backoff:
    initial: 5s
    step: 5s
    cap: 30s
"#,
        )
        .unwrap();
        assert_eq!(file.connection.endpoint, "http://ch:8123");
        assert_eq!(file.connection.user.as_deref(), Some("cleaner"));
        assert_eq!(file.connection.timeout, Duration::from_secs(30));
        assert_eq!(file.index.as_deref(), Some("graphite.graphite_index"));
        assert_eq!(file.max_mutations, Some(3));
        assert_eq!(file.pacing.cooldown, Duration::from_millis(500));
        assert_eq!(file.pacing.backoff.cap, Duration::from_secs(30));
    }

    #[test]
    fn test_empty_file_config_uses_defaults() {
        let file = FileConfig::parse("{}").unwrap();
        assert_eq!(file, FileConfig::default());
        assert_eq!(file.connection.endpoint, DEFAULT_ENDPOINT);
    }
}
