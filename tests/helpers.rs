//! Test utilities for checkrun

use checkrun::core::config::WorkflowConfig;
use checkrun::core::{Event, RunStatus, StepState, Workflow};
use checkrun::execution::{DispatchOutcome, RunEngine};
use std::path::Path;
use tempfile::TempDir;

/// Build a throwaway source repository from (path, contents) pairs
pub fn fixture_source(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("failed to create fixture directory");
    for (path, contents) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture subdirectory");
        }
        std::fs::write(full, contents).expect("failed to write fixture file");
    }
    dir
}

/// Parse a workflow, deliver an event, and collect the result
pub async fn run_workflow_with_event(yaml: &str, event: Event, source: &Path) -> RunTestResult {
    let config = WorkflowConfig::from_yaml(yaml).expect("workflow should parse");
    let mut workflow = config.to_workflow();

    let engine = RunEngine::new();
    let outcome = engine
        .dispatch(&mut workflow, &event, source)
        .await
        .expect("engine should not error");

    RunTestResult { workflow, outcome }
}

/// Result of a test run
pub struct RunTestResult {
    pub workflow: Workflow,
    pub outcome: DispatchOutcome,
}

impl RunTestResult {
    /// Check whether the event started a run at all
    pub fn was_triggered(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Ran { .. })
    }

    /// Check if the run succeeded
    pub fn is_success(&self) -> bool {
        self.workflow.state.status == RunStatus::Succeeded
    }

    /// Check if the run failed
    pub fn is_failed(&self) -> bool {
        self.workflow.state.status == RunStatus::Failed
    }

    /// Get the state of a specific step
    pub fn step_state(&self, step_id: &str) -> &StepState {
        &self
            .workflow
            .step(step_id)
            .unwrap_or_else(|| panic!("no step '{}'", step_id))
            .state
    }

    /// Get the captured output of a finished step
    pub fn step_output(&self, step_id: &str) -> Option<&str> {
        self.step_state(step_id).output()
    }

    pub fn assert_step_succeeded(&self, step_id: &str) {
        assert!(
            matches!(self.step_state(step_id), StepState::Succeeded { .. }),
            "step '{}' should have succeeded, was {:?}",
            step_id,
            self.step_state(step_id)
        );
    }

    pub fn assert_step_failed(&self, step_id: &str) {
        assert!(
            matches!(self.step_state(step_id), StepState::Failed { .. }),
            "step '{}' should have failed, was {:?}",
            step_id,
            self.step_state(step_id)
        );
    }

    pub fn assert_step_skipped(&self, step_id: &str) {
        assert!(
            matches!(self.step_state(step_id), StepState::Skipped { .. }),
            "step '{}' should have been skipped, was {:?}",
            step_id,
            self.step_state(step_id)
        );
    }
}

/// Push event to the given branch
pub fn push_to(branch: &str) -> Event {
    Event::Push {
        branch: branch.to_string(),
        commit: None,
    }
}

/// Pull-request event targeting the given base branch
pub fn pull_request_into(base: &str) -> Event {
    Event::PullRequest {
        base: base.to_string(),
        head: Some("feature/change".to_string()),
    }
}
