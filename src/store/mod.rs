//! Access to the column store holding the index
//!
//! Every method is one independent round trip: no batching, no transactions
//! and no retries.

mod clickhouse;
mod mutation;

pub use clickhouse::ClickHouseStore;
pub use mutation::{Mutation, DATETIME_FORMAT};

use async_trait::async_trait;

use crate::date::IndexDate;
use crate::error::Result;

/// Statements the cleaner needs from the store
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Run a query selecting a single `Date` column
    async fn fetch_dates(&self, query: &str) -> Result<Vec<IndexDate>>;

    /// Run a query selecting a single `Path` column
    async fn fetch_paths(&self, query: &str) -> Result<Vec<String>>;

    /// Run a query over `system.mutations`
    async fn fetch_mutations(&self, query: &str) -> Result<Vec<Mutation>>;

    /// Run a statement without a result set
    async fn execute(&self, statement: &str) -> Result<()>;
}
