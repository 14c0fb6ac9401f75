//! Step executor - dispatches on the step action and reports an outcome

use crate::{
    core::{Action, RunContext, Step},
    execution::{
        command::{CommandError, CommandRunner},
        toolchain::PythonProvisioner,
        workspace::Workspace,
    },
};
use tracing::{debug, info, warn};

/// Result of executing a single step
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// Step finished with exit code 0
    Succeeded { exit_code: i32, output: String },
    /// Step failed; the run engine decides whether the run aborts
    Failed {
        error: String,
        exit_code: Option<i32>,
        output: String,
    },
    /// Step was not executed because its file condition was unmet
    Skipped { reason: String },
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

/// Executes a single step inside a run's workspace
#[derive(Debug, Default)]
pub struct StepExecutor {
    runner: CommandRunner,
    provisioner: PythonProvisioner,
}

impl StepExecutor {
    pub fn new() -> Self {
        Self {
            runner: CommandRunner::new(),
            provisioner: PythonProvisioner::new(),
        }
    }

    /// Execute a step and return its outcome.
    ///
    /// Provisioning steps mutate the context (checkout directory, PATH
    /// prepends) so later steps see their effects.
    pub async fn execute(
        &self,
        step: &Step,
        context: &mut RunContext,
        workspace: &Workspace,
    ) -> StepOutcome {
        if let Some(file) = &step.if_exists {
            if !context.file_in_checkout(file) {
                info!("Skipping step {}: {} not present", step.id, file);
                return StepOutcome::Skipped {
                    reason: format!("{} not present", file),
                };
            }
        }

        info!("Executing step: {} ({})", step.id, step.action.label());

        match &step.action {
            Action::Checkout => self.checkout(context, workspace),
            Action::SetupPython { version } => self.setup_python(version, context, workspace).await,
            Action::Run { command, shell } => self.run_command(step, command, shell, context).await,
        }
    }

    fn checkout(&self, context: &mut RunContext, workspace: &Workspace) -> StepOutcome {
        match workspace.checkout_into(&context.source_dir) {
            Ok(repo) => StepOutcome::Succeeded {
                exit_code: 0,
                output: format!(
                    "Checked out {} into {}",
                    context.source_dir.display(),
                    repo.display()
                ),
            },
            Err(e) => StepOutcome::Failed {
                error: e.to_string(),
                exit_code: None,
                output: String::new(),
            },
        }
    }

    async fn setup_python(
        &self,
        version: &str,
        context: &mut RunContext,
        workspace: &Workspace,
    ) -> StepOutcome {
        match self.provisioner.provision(version, workspace.path()).await {
            Ok(toolchain) => {
                // Later steps resolve python/pip from the venv.
                context.prepend_path(toolchain.venv_bin.clone());
                StepOutcome::Succeeded {
                    exit_code: 0,
                    output: format!(
                        "Python {} ({}), venv at {}",
                        toolchain.version,
                        toolchain.interpreter.display(),
                        toolchain.venv_dir.display()
                    ),
                }
            }
            Err(e) => {
                warn!("Interpreter provisioning failed: {}", e);
                StepOutcome::Failed {
                    error: e.to_string(),
                    exit_code: None,
                    output: String::new(),
                }
            }
        }
    }

    async fn run_command(
        &self,
        step: &Step,
        command: &str,
        shell: &str,
        context: &mut RunContext,
    ) -> StepOutcome {
        let working_dir = context.working_dir();
        let env = context.command_env(&step.env);

        let result = self
            .runner
            .run_shell(shell, command, &working_dir, &env, step.timeout_secs)
            .await;

        match result {
            Ok(output) if output.success() => {
                let combined = output.combined();
                context.set_step_output(&step.id, combined.clone());
                StepOutcome::Succeeded {
                    exit_code: output.exit_code,
                    output: combined,
                }
            }
            Ok(output) => {
                debug!("Step {} exited with code {}", step.id, output.exit_code);
                let combined = output.combined();
                context.set_step_output(&step.id, combined.clone());
                StepOutcome::Failed {
                    error: format!("command exited with code {}", output.exit_code),
                    exit_code: Some(output.exit_code),
                    output: combined,
                }
            }
            Err(e @ CommandError::Timeout(_)) => StepOutcome::Failed {
                error: e.to_string(),
                exit_code: None,
                output: String::new(),
            },
            Err(e) => StepOutcome::Failed {
                error: e.to_string(),
                exit_code: None,
                output: String::new(),
            },
        }
    }
}
