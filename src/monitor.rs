//! Backpressure from pending mutations
//!
//! ClickHouse runs `ALTER TABLE ... DELETE` as background mutations that
//! rewrite parts alongside regular merges. Before each delete the monitor
//! counts the unfinished ones for the index table; at or above the ceiling
//! the caller has to wait and ask again.

use std::io::Write;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{BackoffPolicy, CleanConfig};
use crate::error::Result;
use crate::query::mutations_query;
use crate::store::{IndexStore, Mutation, DATETIME_FORMAT};

/// Outcome of one gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Fewer unfinished mutations than the ceiling
    Proceed,
    /// Too many unfinished mutations; they are returned for reporting
    Wait { pending: Vec<Mutation> },
}

/// Whether `pending` unfinished mutations still allow another delete
pub fn admits(pending: usize, ceiling: usize) -> bool {
    pending < ceiling
}

/// Polls `system.mutations` for one table
pub struct MutationMonitor<'a, S: ?Sized> {
    store: &'a S,
    query: String,
    ceiling: usize,
}

impl<'a, S: IndexStore + ?Sized> MutationMonitor<'a, S> {
    pub fn new(store: &'a S, config: &CleanConfig) -> Result<Self> {
        let (database, table) = config.mutation_target();
        Self::for_table(store, database, table, config.max_mutations)
    }

    pub fn for_table(store: &'a S, database: &str, table: &str, ceiling: usize) -> Result<Self> {
        Ok(Self {
            store,
            query: mutations_query(database, table)?,
            ceiling,
        })
    }

    /// Poll once and decide
    pub async fn check(&self) -> Result<Gate> {
        let mutations = self.store.fetch_mutations(&self.query).await?;
        let pending = mutations.iter().filter(|m| !m.is_done).count();

        if admits(pending, self.ceiling) {
            debug!(pending, ceiling = self.ceiling, "Mutation gate open");
            return Ok(Gate::Proceed);
        }

        warn!(pending, ceiling = self.ceiling, "Too many unfinished mutations, waiting");
        Ok(Gate::Wait {
            pending: mutations.into_iter().filter(|m| !m.is_done).collect(),
        })
    }
}

/// Linear wait schedule: initial, initial + step, ... up to the cap
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    next: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            next: policy.initial.min(policy.cap),
            policy,
        }
    }

    /// Delay for the current attempt; advances the schedule
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next + self.policy.step).min(self.policy.cap);
        delay
    }
}

/// One line per pending mutation: id, creation time, target date, parts left
pub fn write_pending(out: &mut impl Write, pending: &[Mutation]) -> std::io::Result<()> {
    for mutation in pending {
        let target = mutation
            .target_date()
            .map(|date| format!("Date = '{}'", date))
            .unwrap_or_default();
        writeln!(
            out,
            "{:<10}  {} {} parts {}",
            mutation.id,
            mutation.create_time.format(DATETIME_FORMAT),
            target,
            mutation.parts_to_do
        )?;
    }
    Ok(())
}
