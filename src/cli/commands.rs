//! CLI command definitions

use crate::core::Event;
use anyhow::{Context, Result};
use clap::Args;

/// Deliver an event to a workflow and run it if a trigger matches
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to the workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Event kind to deliver
    #[arg(long, value_enum, default_value_t = EventKindArg::Dispatch)]
    pub event: EventKindArg,

    /// Branch for push events
    #[arg(long)]
    pub branch: Option<String>,

    /// Commit SHA for push events
    #[arg(long)]
    pub commit: Option<String>,

    /// Base (target) branch for pull-request events
    #[arg(long)]
    pub base: Option<String>,

    /// Head branch for pull-request events
    #[arg(long)]
    pub head: Option<String>,

    /// Read the event from a JSON payload file instead of flags
    #[arg(long, conflicts_with_all = ["event", "branch", "commit", "base", "head"])]
    pub payload: Option<String>,

    /// Repository directory the checkout step copies from
    #[arg(long, default_value = ".")]
    pub source: String,

    /// Extra environment variables for all steps (KEY=VALUE)
    #[arg(long, value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Preserve the run workspace for debugging
    #[arg(long)]
    pub keep_workspace: bool,

    /// Don't record the run in history
    #[arg(long)]
    pub no_history: bool,

    /// Print captured step output after the run
    #[arg(long)]
    pub show_output: bool,
}

impl RunCommand {
    /// Build the event to deliver from the payload file or the flags
    pub fn to_event(&self) -> Result<Event> {
        if let Some(payload) = &self.payload {
            let json = std::fs::read_to_string(payload)
                .with_context(|| format!("Failed to read event payload {}", payload))?;
            return Event::from_json(&json).context("Failed to parse event payload");
        }

        match self.event {
            EventKindArg::Push => {
                let branch = self
                    .branch
                    .clone()
                    .context("--event push requires --branch")?;
                Ok(Event::Push {
                    branch,
                    commit: self.commit.clone(),
                })
            }
            EventKindArg::PullRequest => {
                let base = self
                    .base
                    .clone()
                    .context("--event pull-request requires --base")?;
                Ok(Event::PullRequest {
                    base,
                    head: self.head.clone(),
                })
            }
            EventKindArg::Dispatch => Ok(Event::Dispatch),
        }
    }
}

/// Validate a workflow file
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to the workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Write a starter workflow file
#[derive(Debug, Args, Clone)]
pub struct InitCommand {
    /// Where to write the workflow file
    #[arg(default_value = "checkrun.yml")]
    pub path: String,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// List workflows with recorded runs
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Show run counts per workflow
    #[arg(long)]
    pub with_counts: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Workflow name to filter by
    #[arg(short, long)]
    pub workflow: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show full details
    #[arg(long)]
    pub verbose: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a specific run by ID
    #[arg(long)]
    pub run_id: Option<String>,
}

/// Event kind argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EventKindArg {
    Push,
    #[clap(name = "pull-request")]
    PullRequest,
    Dispatch,
}

/// Parse KEY=VALUE pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid KEY=VALUE pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
