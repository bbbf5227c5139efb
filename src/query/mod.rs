//! Statement generation for the index table
//!
//! Builds enumeration reads and single-day deletes from validated patterns.

pub mod filter;
mod planner;

pub use planner::{mutations_query, DeleteCommand, DeletionPlan, IndexQueryPlanner};
