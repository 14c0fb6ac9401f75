//! Step domain model

use crate::core::{config::StepConfig, state::StepState};
use std::collections::HashMap;

/// Default shell for run steps
pub const DEFAULT_SHELL: &str = "sh";

/// The action a step performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Copy the source repository into the workspace
    Checkout,
    /// Provision a Python interpreter and a workspace virtual environment
    SetupPython { version: String },
    /// Run a shell command in the checkout directory
    Run { command: String, shell: String },
}

impl Action {
    /// Short label for logs and summaries
    pub fn label(&self) -> String {
        match self {
            Action::Checkout => "checkout".to_string(),
            Action::SetupPython { version } => format!("setup-python {}", version),
            Action::Run { .. } => "run".to_string(),
        }
    }
}

/// A single step in a workflow run
#[derive(Debug, Clone)]
pub struct Step {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    pub name: Option<String>,

    /// What this step does
    pub action: Action,

    /// Skip this step unless the named file exists in the checkout
    pub if_exists: Option<String>,

    /// Extra environment variables for this step
    pub env: HashMap<String, String>,

    /// Record a failure without aborting the run
    pub continue_on_error: bool,

    /// Timeout for this step's command (seconds); None means unbounded
    pub timeout_secs: Option<u64>,

    /// Runtime state
    pub state: StepState,
}

impl Step {
    /// Create a step from a step config. Assumes the config has been
    /// validated, so exactly one action is declared.
    pub fn from_config(config: &StepConfig) -> Self {
        let action = if let Some(command) = &config.run {
            Action::Run {
                command: command.clone(),
                shell: config
                    .shell
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SHELL.to_string()),
            }
        } else if let Some(version) = &config.setup_python {
            Action::SetupPython {
                version: version.clone(),
            }
        } else {
            Action::Checkout
        };

        Step {
            id: config.id.clone(),
            name: config.name.clone(),
            action,
            if_exists: config.if_exists.clone(),
            env: config.env.clone(),
            continue_on_error: config.continue_on_error,
            timeout_secs: config.timeout_secs,
            state: StepState::Pending,
        }
    }

    /// Display name: the explicit name, or the step id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
