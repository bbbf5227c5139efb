//! Per-day deletion loop
//!
//! ```text
//! Init -> Enumerate -> { Gate -> Execute -> Cooldown } per day -> Done
//!             |
//!             +-> NoMatch   (path enumeration came back empty)
//! ```
//!
//! Exactly one delete is in flight at a time. The mutation gate is polled
//! right before the delete it protects, and the first failing statement ends
//! the run; days deleted before it stay deleted.

use std::io::Write;
use tracing::{debug, info};

use crate::config::{CleanConfig, RunMode};
use crate::date::IndexDate;
use crate::error::{Error, Result};
use crate::monitor::{write_pending, Backoff, Gate, MutationMonitor};
use crate::query::{DeleteCommand, DeletionPlan, IndexQueryPlanner};
use crate::store::IndexStore;

/// Prompt shown before a dry run is switched to execution
pub const CONFIRM_PROMPT: &str = "Enter Y for start delete: ";

/// Where the scheduler currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Init,
    Enumerate,
    Gate { index: usize },
    Execute { index: usize },
    Cooldown { index: usize },
    Done,
    NoMatch,
}

/// Explicit go-ahead before deletes start
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> std::io::Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> std::io::Result<bool>,
{
    fn confirm(&mut self, prompt: &str) -> std::io::Result<bool> {
        self(prompt)
    }
}

/// What enumeration found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    /// Days in the order the store returned them
    pub dates: Vec<IndexDate>,
    pub paths: Vec<String>,
}

impl Enumeration {
    /// `Read N paths in M days: [1970-02-12] first [- last]`
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Read {} paths in {} days:",
            self.paths.len(),
            self.dates.len()
        );
        let (first, last) = match (self.dates.first(), self.dates.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return out,
        };

        let mut i = 0;
        if first.is_placeholder() {
            out.push_str(&format!(" {}", first));
            i += 1;
        }
        if let Some(date) = self.dates.get(i) {
            out.push_str(&format!(" {}", date));
        }
        if i != self.dates.len() - 1 {
            out.push_str(&format!(" - {}", last));
        }
        out
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub enumeration: Enumeration,
    pub plan: DeletionPlan,
    /// Days whose delete was executed, in order
    pub deleted: Vec<IndexDate>,
    /// Number of times the gate said wait
    pub waits: usize,
}

/// Drives one cleanup run against a store
pub struct DeletionScheduler<'a, S: ?Sized, W> {
    config: &'a CleanConfig,
    store: &'a S,
    planner: IndexQueryPlanner,
    out: W,
    state: SchedulerState,
}

impl<'a, S, W> DeletionScheduler<'a, S, W>
where
    S: IndexStore + ?Sized,
    W: Write,
{
    pub fn new(config: &'a CleanConfig, store: &'a S, out: W) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            planner: IndexQueryPlanner::from_config(config)?,
            out,
            state: SchedulerState::Init,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run to completion
    pub async fn run(&mut self, confirm: &mut dyn Confirm) -> Result<RunReport> {
        if self.config.mode == RunMode::QueryOnly {
            writeln!(self.out, "{}", self.planner.path_query())?;
            self.state = SchedulerState::Done;
            return Ok(RunReport::default());
        }

        let enumeration = self.enumerate().await?;

        if self.config.show_paths {
            for path in &enumeration.paths {
                writeln!(self.out, "{}", path)?;
            }
        }

        if enumeration.paths.is_empty() {
            self.state = SchedulerState::NoMatch;
            return Err(Error::NoMatch {
                patterns: self.planner.patterns().len(),
            });
        }

        writeln!(self.out, "{}", enumeration.summary())?;
        info!(
            paths = enumeration.paths.len(),
            days = enumeration.dates.len(),
            "Index enumeration completed"
        );

        let execute = self.should_execute(confirm)?;
        let plan = self.planner.deletion_plan(&enumeration.dates);

        let mut report = RunReport {
            enumeration,
            plan,
            ..Default::default()
        };

        if execute {
            self.execute_plan(&mut report).await?;
        } else {
            for command in report.plan.iter() {
                write!(self.out, "{}\n\n", command)?;
            }
        }

        self.state = SchedulerState::Done;
        info!(deleted = report.deleted.len(), waits = report.waits, "Cleanup run finished");
        Ok(report)
    }

    /// Read the days and paths the pattern set touches
    pub async fn enumerate(&mut self) -> Result<Enumeration> {
        self.state = SchedulerState::Enumerate;
        writeln!(self.out, "Check index")?;

        let dates = self.store.fetch_dates(&self.planner.date_query()).await?;
        let paths = self.store.fetch_paths(&self.planner.path_query()).await?;

        Ok(Enumeration { dates, paths })
    }

    fn should_execute(&mut self, confirm: &mut dyn Confirm) -> Result<bool> {
        if self.config.ask {
            self.out.flush()?;
            if !confirm.confirm(CONFIRM_PROMPT)? {
                return Err(Error::Canceled);
            }
            return Ok(true);
        }
        Ok(self.config.mode == RunMode::Execute)
    }

    async fn execute_plan(&mut self, report: &mut RunReport) -> Result<()> {
        let monitor = MutationMonitor::new(self.store, self.config)?;
        let commands = report.plan.commands().to_vec();
        let total = commands.len();

        for (index, command) in commands.iter().enumerate() {
            report.waits += self.wait_for_gate(&monitor, index, total, command).await?;

            self.state = SchedulerState::Execute { index };
            debug!(date = %command.date, statement = %command.statement, "Executing delete");
            self.store
                .execute(&command.statement)
                .await
                .map_err(|e| Error::Execution {
                    date: command.date.to_string(),
                    deleted: report.deleted.len(),
                    message: e.to_string(),
                })?;
            report.deleted.push(command.date);
            info!(date = %command.date, done = index + 1, total, "Deleted index day");

            if index + 1 < total {
                self.state = SchedulerState::Cooldown { index };
                tokio::time::sleep(self.config.pacing.cooldown).await;
            }
        }

        Ok(())
    }

    /// Block until the monitor lets the delete through; returns the number of waits
    async fn wait_for_gate(
        &mut self,
        monitor: &MutationMonitor<'_, S>,
        index: usize,
        total: usize,
        command: &DeleteCommand,
    ) -> Result<usize> {
        self.state = SchedulerState::Gate { index };
        let mut backoff = Backoff::new(self.config.pacing.backoff);
        let mut waits = 0;

        loop {
            match monitor.check().await? {
                Gate::Proceed => return Ok(waits),
                Gate::Wait { pending } => {
                    writeln!(
                        self.out,
                        "\nWait for merges complete before delete {} ({} of {})",
                        command.date, index, total
                    )?;
                    write_pending(&mut self.out, &pending)?;
                    let delay = backoff.next_delay();
                    debug!(date = %command.date, delay = ?delay, pending = pending.len(), "Delete postponed");
                    waits += 1;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> IndexDate {
        s.parse().unwrap()
    }

    fn enumeration(dates: &[&str]) -> Enumeration {
        Enumeration {
            dates: dates.iter().map(|d| day(d)).collect(),
            paths: vec!["a.b.c".to_string(), "c.d".to_string()],
        }
    }

    #[test]
    fn test_summary_range() {
        assert_eq!(
            enumeration(&["2020-01-01", "2020-01-02", "2020-01-03"]).summary(),
            "Read 2 paths in 3 days: 2020-01-01 - 2020-01-03"
        );
    }

    #[test]
    fn test_summary_single_day() {
        assert_eq!(
            enumeration(&["2020-01-01"]).summary(),
            "Read 2 paths in 1 days: 2020-01-01"
        );
    }

    #[test]
    fn test_summary_placeholder_first() {
        assert_eq!(
            enumeration(&["1970-02-12", "2020-01-01", "2020-01-09"]).summary(),
            "Read 2 paths in 3 days: 1970-02-12 2020-01-01 - 2020-01-09"
        );
        assert_eq!(
            enumeration(&["1970-02-12", "2020-01-01"]).summary(),
            "Read 2 paths in 2 days: 1970-02-12 2020-01-01"
        );
    }

    #[test]
    fn test_summary_placeholder_only() {
        assert_eq!(
            enumeration(&["1970-02-12"]).summary(),
            "Read 2 paths in 1 days: 1970-02-12 - 1970-02-12"
        );
    }

    #[test]
    fn test_summary_without_dates() {
        assert_eq!(enumeration(&[]).summary(), "Read 2 paths in 0 days:");
    }

    #[test]
    fn test_closure_confirm() {
        let mut yes = |_: &str| -> std::io::Result<bool> { Ok(true) };
        assert!(Confirm::confirm(&mut yes, CONFIRM_PROMPT).unwrap());
    }
}
