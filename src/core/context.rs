//! Run context: per-run paths and environment

use crate::core::event::Event;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Execution context for a single run
///
/// Carries the source location, the workspace paths, and the environment
/// overlay every step command executes with.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Repository the checkout step copies from
    pub source_dir: PathBuf,

    /// Workspace root for this run
    pub workspace_dir: PathBuf,

    /// Environment variables applied to every step command
    pub env: HashMap<String, String>,

    /// Directories prepended to PATH, in insertion order
    path_prepends: Vec<PathBuf>,

    /// Outputs captured from finished steps (step_id -> output)
    pub step_outputs: HashMap<String, String>,
}

impl RunContext {
    /// Create a context for one run. The triggering event is surfaced to
    /// step commands as CHECKRUN_EVENT / CHECKRUN_REF / CHECKRUN_SHA.
    pub fn new(
        source_dir: PathBuf,
        workspace_dir: PathBuf,
        event: &Event,
        workflow_env: HashMap<String, String>,
    ) -> Self {
        let mut env = workflow_env;
        env.insert("CHECKRUN_EVENT".to_string(), event.kind().to_string());
        if let Some(branch) = event.branch() {
            env.insert("CHECKRUN_REF".to_string(), branch.to_string());
        }
        if let Some(commit) = event.commit() {
            env.insert("CHECKRUN_SHA".to_string(), commit.to_string());
        }

        Self {
            source_dir,
            workspace_dir,
            env,
            path_prepends: Vec::new(),
            step_outputs: HashMap::new(),
        }
    }

    /// The directory the source tree is checked out into
    pub fn repo_dir(&self) -> PathBuf {
        self.workspace_dir.join("repo")
    }

    /// Working directory for run steps: the checkout once it exists,
    /// the workspace root before that
    pub fn working_dir(&self) -> PathBuf {
        let repo = self.repo_dir();
        if repo.is_dir() {
            repo
        } else {
            self.workspace_dir.clone()
        }
    }

    /// Set an environment variable for all later steps
    pub fn set_env(&mut self, key: String, value: String) {
        self.env.insert(key, value);
    }

    /// Get an environment variable from the overlay
    pub fn get_env(&self, key: &str) -> Option<&String> {
        self.env.get(key)
    }

    /// Prepend a directory to PATH for all later steps
    pub fn prepend_path(&mut self, dir: PathBuf) {
        self.path_prepends.push(dir);
    }

    /// The PATH value step commands run with
    pub fn effective_path(&self) -> String {
        let base = std::env::var("PATH").unwrap_or_default();
        if self.path_prepends.is_empty() {
            return base;
        }
        let mut parts: Vec<String> = self
            .path_prepends
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        if !base.is_empty() {
            parts.push(base);
        }
        parts.join(":")
    }

    /// Full environment for one step: the run overlay extended by the
    /// step's own variables, with PATH rewritten when provisioning
    /// prepended anything
    pub fn command_env(&self, step_env: &HashMap<String, String>) -> HashMap<String, String> {
        let mut env = self.env.clone();
        for (key, value) in step_env {
            env.insert(key.clone(), value.clone());
        }
        if !self.path_prepends.is_empty() {
            env.insert("PATH".to_string(), self.effective_path());
        }
        env
    }

    /// Record the output of a finished step
    pub fn set_step_output(&mut self, step_id: &str, output: String) {
        self.step_outputs.insert(step_id.to_string(), output);
    }

    /// Get the recorded output of a finished step
    pub fn get_step_output(&self, step_id: &str) -> Option<&String> {
        self.step_outputs.get(step_id)
    }

    /// Check whether a path exists relative to the checkout
    pub fn file_in_checkout(&self, relative: &str) -> bool {
        self.working_dir().join(Path::new(relative)).exists()
    }
}
