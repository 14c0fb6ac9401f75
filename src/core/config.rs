//! Workflow configuration from YAML

use crate::core::Workflow;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Top-level workflow configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow name
    pub name: String,

    /// Triggers this workflow reacts to
    #[serde(rename = "on")]
    pub on: TriggersConfig,

    /// Environment variables available to all steps
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// The single job this workflow runs
    pub job: JobConfig,
}

/// Trigger table: which repository events start a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggersConfig {
    /// Run on pushes, optionally filtered by branch
    #[serde(default, deserialize_with = "declared_trigger")]
    pub push: Option<BranchFilterConfig>,

    /// Run on pull requests, filtered by the target branch
    #[serde(default, deserialize_with = "declared_trigger")]
    pub pull_request: Option<BranchFilterConfig>,

    /// Run on manual dispatch (no parameters)
    #[serde(default, deserialize_with = "declared_trigger")]
    pub dispatch: Option<DispatchConfig>,
}

impl TriggersConfig {
    /// True if at least one trigger is declared
    pub fn any_declared(&self) -> bool {
        self.push.is_some() || self.pull_request.is_some() || self.dispatch.is_some()
    }
}

/// Branch filter for push / pull_request triggers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchFilterConfig {
    /// Branch names to match; empty matches every branch.
    /// A trailing or embedded `*` acts as a wildcard (e.g. `releases/*`).
    #[serde(default)]
    pub branches: Vec<String>,
}

/// Manual dispatch trigger (carries no parameters)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {}

/// A trigger key present with a null value still declares the trigger,
/// so `dispatch:` and `dispatch: {}` read the same.
fn declared_trigger<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(Some(value.unwrap_or_default()))
}

/// The job: an ordered list of steps run in a single workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Human-readable job name
    #[serde(default)]
    pub name: Option<String>,

    /// Steps, executed strictly in order
    pub steps: Vec<StepConfig>,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    #[serde(default)]
    pub name: Option<String>,

    /// Shell command to run
    #[serde(default)]
    pub run: Option<String>,

    /// Shell used for `run` (default `sh`)
    #[serde(default)]
    pub shell: Option<String>,

    /// Copy the source repository into the workspace
    #[serde(default)]
    pub checkout: Option<bool>,

    /// Provision a Python interpreter at the given major.minor version
    #[serde(default)]
    pub setup_python: Option<String>,

    /// Skip this step unless the named file exists in the checkout
    #[serde(default)]
    pub if_exists: Option<String>,

    /// Extra environment variables for this step
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Record a failure without aborting the run
    #[serde(default)]
    pub continue_on_error: bool,

    /// Timeout for this step's command (seconds)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl StepConfig {
    /// Number of actions this step declares; a valid step has exactly one
    fn action_count(&self) -> usize {
        let mut count = 0;
        if self.run.is_some() {
            count += 1;
        }
        if self.checkout == Some(true) {
            count += 1;
        }
        if self.setup_python.is_some() {
            count += 1;
        }
        count
    }
}

impl WorkflowConfig {
    /// Load workflow configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse workflow configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: WorkflowConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the workflow configuration
    pub fn validate(&self) -> Result<()> {
        if !self.on.any_declared() {
            anyhow::bail!(
                "Workflow '{}' declares no triggers (expected push, pull_request or dispatch under 'on')",
                self.name
            );
        }

        if self.job.steps.is_empty() {
            anyhow::bail!("Workflow '{}' has no steps", self.name);
        }

        // Check that all step IDs are unique
        let mut seen_ids = std::collections::HashSet::new();
        for step in &self.job.steps {
            if !seen_ids.insert(&step.id) {
                anyhow::bail!("Duplicate step ID: {}", step.id);
            }
        }

        for step in &self.job.steps {
            // Exactly one action per step
            match step.action_count() {
                1 => {}
                0 => anyhow::bail!(
                    "Step '{}' declares no action (expected one of run, checkout, setup_python)",
                    step.id
                ),
                _ => anyhow::bail!(
                    "Step '{}' declares more than one action (run, checkout and setup_python are mutually exclusive)",
                    step.id
                ),
            }

            // A shell override only makes sense for run steps
            if step.shell.is_some() && step.run.is_none() {
                anyhow::bail!("Step '{}' sets 'shell' without a 'run' command", step.id);
            }

            // Version must look like "3" or "3.10"
            if let Some(version) = &step.setup_python {
                let shape = regex::Regex::new(r"^\d+(\.\d+)?$")?;
                if !shape.is_match(version) {
                    anyhow::bail!(
                        "Step '{}' requests invalid Python version '{}' (expected e.g. \"3.10\")",
                        step.id,
                        version
                    );
                }
            }
        }

        Ok(())
    }

    /// Convert config to a Workflow domain model
    pub fn to_workflow(&self) -> Workflow {
        Workflow::from_config(self)
    }
}
