//! idxclean - graphite index cleanup for ClickHouse
//!
//! Removes stale entries from a graphite index table one day at a time while
//! keeping an eye on the table's background mutations, so bulk deletes never
//! pile up on top of unfinished merges.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          idxclean                             │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │  Patterns   │  │  datefilter  │  │   CleanConfig        │  │
//! │  │ (+reversed) │  │   grammar    │  │  (flags + YAML)      │  │
//! │  └──────┬──────┘  └──────┬───────┘  └──────────┬───────────┘  │
//! │         └────────┬───────┘                     │              │
//! │                  ▼                             │              │
//! │  ┌─────────────────────────────┐               │              │
//! │  │      IndexQueryPlanner      │◄──────────────┘              │
//! │  │ dates / paths / 1-day DELETE│                              │
//! │  └──────────────┬──────────────┘                              │
//! │                 ▼                                             │
//! │  ┌─────────────────────────────┐   ┌───────────────────────┐  │
//! │  │     DeletionScheduler       │──►│   MutationMonitor     │  │
//! │  │ enumerate → gate → execute  │   │ system.mutations gate │  │
//! │  └──────────────┬──────────────┘   └───────────┬───────────┘  │
//! │                 ▼                              ▼              │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │              IndexStore (ClickHouse HTTP)               │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod date;
pub mod error;
pub mod monitor;
pub mod pattern;
pub mod query;
pub mod scheduler;
pub mod store;
pub mod validation;

pub use config::{CleanConfig, ConnectionConfig, FileConfig, Pacing, RunMode};
pub use date::IndexDate;
pub use error::{Error, Result};
pub use monitor::{Gate, MutationMonitor};
pub use pattern::{Pattern, PatternSet};
pub use query::{DeleteCommand, DeletionPlan, IndexQueryPlanner};
pub use scheduler::{Confirm, DeletionScheduler, Enumeration, RunReport, SchedulerState};
pub use store::{ClickHouseStore, IndexStore, Mutation};
