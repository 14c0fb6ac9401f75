//! Workflow domain model

use crate::core::{
    config::WorkflowConfig,
    event::{Event, Triggers},
    state::{RunState, RunStatus, StepState},
    step::Step,
};
use std::collections::HashMap;

/// A workflow definition together with its run state
#[derive(Debug, Clone)]
pub struct Workflow {
    /// Workflow name
    pub name: String,

    /// Compiled trigger set
    pub triggers: Triggers,

    /// Environment variables available to all steps
    pub env: HashMap<String, String>,

    /// Job display name
    pub job_name: Option<String>,

    /// Steps, executed strictly in declaration order
    pub steps: Vec<Step>,

    /// Run state
    pub state: RunState,
}

impl Workflow {
    /// Create a workflow from configuration
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Workflow {
            name: config.name.clone(),
            triggers: Triggers::from_config(&config.on),
            env: config.env.clone(),
            job_name: config.job.name.clone(),
            steps: config.job.steps.iter().map(Step::from_config).collect(),
            state: RunState::new(),
        }
    }

    /// Check whether the event starts a run of this workflow
    pub fn accepts(&self, event: &Event) -> bool {
        self.triggers.accepts(event)
    }

    /// Get a step by ID
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Get a mutable step by ID
    pub fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Count steps in each terminal state: (succeeded, failed, skipped)
    pub fn count_states(&self) -> (usize, usize, usize) {
        let mut succeeded = 0;
        let mut failed = 0;
        let mut skipped = 0;
        for step in &self.steps {
            match step.state {
                StepState::Succeeded { .. } => succeeded += 1,
                StepState::Failed { .. } => failed += 1,
                StepState::Skipped { .. } => skipped += 1,
                _ => {}
            }
        }
        (succeeded, failed, skipped)
    }

    /// Check if every step reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal())
    }

    /// True if any step failed without continue_on_error
    pub fn has_fatal_failure(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.state, StepState::Failed { .. }) && !s.continue_on_error)
    }

    /// Check if the run failed
    pub fn has_failed(&self) -> bool {
        self.state.status == RunStatus::Failed
    }
}
