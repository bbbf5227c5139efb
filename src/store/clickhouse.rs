//! ClickHouse over its HTTP interface

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::date::IndexDate;
use crate::error::{Error, Result};

use super::mutation::{Mutation, MutationRow};
use super::IndexStore;

/// Keeps `Int64` columns as JSON numbers
const QUERY_SETTINGS: &[(&str, &str)] = &[("output_format_json_quote_64bit_integers", "0")];

#[derive(Debug, Deserialize)]
struct DateRow {
    #[serde(rename = "Date")]
    date: IndexDate,
}

#[derive(Debug, Deserialize)]
struct PathRow {
    #[serde(rename = "Path")]
    path: String,
}

/// Single HTTP client reused for every statement of a run
pub struct ClickHouseStore {
    client: reqwest::Client,
    config: ConnectionConfig,
}

impl ClickHouseStore {
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| Error::Connection {
                endpoint: config.endpoint.clone(),
                source,
            })?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Send one statement and return the response body
    async fn post(&self, statement: &str, body: String) -> Result<String> {
        debug!(endpoint = %self.config.endpoint, statement = %statement, "Sending statement");

        let mut request = self
            .client
            .post(self.config.endpoint.as_str())
            .query(QUERY_SETTINGS)
            .body(body);
        if let Some(user) = &self.config.user {
            request = request.basic_auth(user, self.config.password.as_ref());
        }

        let response = request.send().await.map_err(|source| Error::Connection {
            endpoint: self.config.endpoint.clone(),
            source,
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| Error::Connection {
            endpoint: self.config.endpoint.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(Error::Query {
                statement: statement.to_string(),
                message: format!("{}: {}", status, text.trim()),
            });
        }

        Ok(text)
    }

    async fn select<T: DeserializeOwned>(&self, query: &str) -> Result<Vec<T>> {
        let text = self.post(query, format!("{} FORMAT JSONEachRow", query)).await?;
        parse_rows(&text)
    }
}

/// Decode a `JSONEachRow` body
fn parse_rows<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(Error::from))
        .collect()
}

#[async_trait]
impl IndexStore for ClickHouseStore {
    async fn fetch_dates(&self, query: &str) -> Result<Vec<IndexDate>> {
        let rows: Vec<DateRow> = self.select(query).await?;
        Ok(rows.into_iter().map(|r| r.date).collect())
    }

    async fn fetch_paths(&self, query: &str) -> Result<Vec<String>> {
        let rows: Vec<PathRow> = self.select(query).await?;
        Ok(rows.into_iter().map(|r| r.path).collect())
    }

    async fn fetch_mutations(&self, query: &str) -> Result<Vec<Mutation>> {
        let rows: Vec<MutationRow> = self.select(query).await?;
        rows.into_iter().map(Mutation::try_from).collect()
    }

    async fn execute(&self, statement: &str) -> Result<()> {
        self.post(statement, statement.to_string()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_rows() {
        let rows: Vec<DateRow> =
            parse_rows("{\"Date\":\"1970-02-12\"}\n{\"Date\":\"2020-01-05\"}\n").unwrap();
        let dates: Vec<String> = rows.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["1970-02-12", "2020-01-05"]);
    }

    #[test]
    fn test_parse_path_rows_skips_blank_lines() {
        let rows: Vec<PathRow> = parse_rows("{\"Path\":\"a.b.c\"}\n\n{\"Path\":\"c.d\"}\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].path, "c.d");
    }

    #[test]
    fn test_parse_empty_body() {
        let rows: Vec<PathRow> = parse_rows("").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_garbage() {
        let result: Result<Vec<PathRow>> = parse_rows("Code: 62. DB::Exception: Syntax error");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_new_keeps_endpoint() {
        let store = ClickHouseStore::new(ConnectionConfig::default()).unwrap();
        assert_eq!(store.endpoint(), "http://127.0.0.1:8123");
    }
}
