//! checkrun - a small CI runner
//!
//! Matches a repository event (push, pull request, manual dispatch) against
//! a workflow's triggers and, on a match, runs the workflow's ordered steps
//! in a throwaway workspace, reporting a single pass/fail result.

pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;

// Re-export commonly used types
pub use core::{Event, RunState, RunStatus, Step, StepState, Triggers, Workflow};
pub use execution::{DispatchOutcome, RunEngine, RunEvent};
pub use persistence::{create_summary, InMemoryRunStore, RunStore, RunSummary};
