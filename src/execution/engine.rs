//! Run engine - matches an event against a workflow and runs its steps

use crate::{
    core::{Event, RunContext, RunStatus, StepState, Workflow},
    execution::{
        executor::{StepExecutor, StepOutcome},
        workspace::{Workspace, WorkspaceError},
    },
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Events that occur while a run executes
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        workflow_name: String,
        trigger: String,
    },
    StepStarted {
        step_id: String,
    },
    StepOutput {
        step_id: String,
        output: String,
    },
    StepCompleted {
        step_id: String,
    },
    StepSkipped {
        step_id: String,
        reason: String,
    },
    StepFailed {
        step_id: String,
        error: String,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// What delivering an event to a workflow produced
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The event matched no trigger; no run was started
    NotTriggered,
    /// A run executed; its result is in the workflow's run state
    Ran {
        /// Workspace path, when the engine was told to preserve it
        kept_workspace: Option<PathBuf>,
    },
}

/// Errors that prevent a run from executing at all
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

/// Executes workflow runs: one ephemeral workspace, strictly sequential
/// steps, abort at the first fatal failure.
pub struct RunEngine {
    executor: StepExecutor,
    event_handlers: Mutex<Vec<EventHandler>>,
    keep_workspace: bool,
}

impl RunEngine {
    pub fn new() -> Self {
        Self {
            executor: StepExecutor::new(),
            event_handlers: Mutex::new(Vec::new()),
            keep_workspace: false,
        }
    }

    /// Preserve run workspaces instead of removing them, for debugging
    pub fn keep_workspaces(mut self) -> Self {
        self.keep_workspace = true;
        self
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(RunEvent) + Send + Sync + 'static,
    {
        self.event_handlers
            .lock()
            .expect("event handler lock poisoned")
            .push(Arc::new(handler));
    }

    fn emit(&self, event: RunEvent) {
        let handlers = self
            .event_handlers
            .lock()
            .expect("event handler lock poisoned");
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Deliver an event to a workflow. If a trigger matches, execute the
    /// run; otherwise do nothing (a non-matching event is not an error).
    pub async fn dispatch(
        &self,
        workflow: &mut Workflow,
        event: &Event,
        source_dir: &Path,
    ) -> Result<DispatchOutcome, EngineError> {
        if !workflow.accepts(event) {
            debug!(
                "Event '{}' matches no trigger of workflow '{}'",
                event.describe(),
                workflow.name
            );
            return Ok(DispatchOutcome::NotTriggered);
        }

        let run_id = workflow.state.run_id;
        info!(
            "Starting run {} of '{}' ({})",
            run_id,
            workflow.name,
            event.describe()
        );

        workflow.state.start(workflow.steps.len());
        self.emit(RunEvent::RunStarted {
            run_id,
            workflow_name: workflow.name.clone(),
            trigger: event.describe(),
        });

        let mut workspace = match Workspace::create(run_id) {
            Ok(workspace) => workspace,
            Err(e) => {
                // Provisioning failure: the run fails before any step starts.
                workflow.state.fail();
                self.emit(RunEvent::RunCompleted {
                    run_id,
                    status: RunStatus::Failed,
                });
                return Err(e.into());
            }
        };
        if self.keep_workspace {
            workspace.keep();
        }

        let mut context = RunContext::new(
            source_dir.to_path_buf(),
            workspace.path().to_path_buf(),
            event,
            workflow.env.clone(),
        );

        let mut aborted_by: Option<String> = None;
        for index in 0..workflow.steps.len() {
            if let Some(failed_id) = &aborted_by {
                let reason = format!("step '{}' failed", failed_id);
                let step_id = workflow.steps[index].id.clone();
                workflow.steps[index].state = StepState::Skipped {
                    reason: reason.clone(),
                };
                self.emit(RunEvent::StepSkipped { step_id, reason });
                continue;
            }

            let step = workflow.steps[index].clone();
            let started_at = Utc::now();
            workflow.steps[index].state = StepState::Running { started_at };
            self.emit(RunEvent::StepStarted {
                step_id: step.id.clone(),
            });

            let outcome = self.executor.execute(&step, &mut context, &workspace).await;

            match outcome {
                StepOutcome::Succeeded { exit_code, output } => {
                    if !output.is_empty() {
                        self.emit(RunEvent::StepOutput {
                            step_id: step.id.clone(),
                            output: output.clone(),
                        });
                    }
                    workflow.steps[index].state = StepState::Succeeded {
                        exit_code,
                        output,
                        started_at,
                        completed_at: Utc::now(),
                    };
                    self.emit(RunEvent::StepCompleted {
                        step_id: step.id.clone(),
                    });
                }
                StepOutcome::Failed {
                    error,
                    exit_code,
                    output,
                } => {
                    if !output.is_empty() {
                        self.emit(RunEvent::StepOutput {
                            step_id: step.id.clone(),
                            output: output.clone(),
                        });
                    }
                    workflow.steps[index].state = StepState::Failed {
                        error: error.clone(),
                        exit_code,
                        output,
                        started_at,
                        failed_at: Utc::now(),
                    };
                    self.emit(RunEvent::StepFailed {
                        step_id: step.id.clone(),
                        error,
                    });
                    if !step.continue_on_error {
                        aborted_by = Some(step.id.clone());
                    }
                }
                StepOutcome::Skipped { reason } => {
                    workflow.steps[index].state = StepState::Skipped {
                        reason: reason.clone(),
                    };
                    self.emit(RunEvent::StepSkipped {
                        step_id: step.id.clone(),
                        reason,
                    });
                }
            }
        }

        let (succeeded, failed, skipped) = workflow.count_states();
        workflow.state.update_counts(succeeded, failed, skipped);

        if workflow.has_fatal_failure() {
            workflow.state.fail();
        } else {
            workflow.state.succeed();
        }
        info!(
            "Run {} finished: {:?} ({} succeeded, {} failed, {} skipped)",
            run_id, workflow.state.status, succeeded, failed, skipped
        );
        self.emit(RunEvent::RunCompleted {
            run_id,
            status: workflow.state.status,
        });

        let kept_workspace = if workspace.is_kept() {
            Some(workspace.path().to_path_buf())
        } else {
            None
        };
        // Workspace drops here; the run directory is removed unless kept.
        Ok(DispatchOutcome::Ran { kept_workspace })
    }
}

impl Default for RunEngine {
    fn default() -> Self {
        Self::new()
    }
}
