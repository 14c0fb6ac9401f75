//! Repository events and trigger matching

use crate::core::config::{BranchFilterConfig, TriggersConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A repository event delivered to the runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A commit was pushed to a branch
    Push {
        branch: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        commit: Option<String>,
    },
    /// A pull request was opened or updated against a base branch
    PullRequest {
        base: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        head: Option<String>,
    },
    /// A manual dispatch, carrying no parameters
    Dispatch,
}

impl Event {
    /// Parse an event from its JSON payload form
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the event as a JSON payload
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The event kind as a stable lowercase name
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Push { .. } => "push",
            Event::PullRequest { .. } => "pull_request",
            Event::Dispatch => "dispatch",
        }
    }

    /// The branch a trigger filter is matched against, if the event has one.
    /// Pull requests match on their base (target) branch.
    pub fn branch(&self) -> Option<&str> {
        match self {
            Event::Push { branch, .. } => Some(branch),
            Event::PullRequest { base, .. } => Some(base),
            Event::Dispatch => None,
        }
    }

    /// The triggering commit, if the event carries one
    pub fn commit(&self) -> Option<&str> {
        match self {
            Event::Push { commit, .. } => commit.as_deref(),
            _ => None,
        }
    }

    /// One-line description for summaries and logs
    pub fn describe(&self) -> String {
        match self {
            Event::Push { branch, .. } => format!("push to {}", branch),
            Event::PullRequest { base, head } => match head {
                Some(head) => format!("pull request {} into {}", head, base),
                None => format!("pull request into {}", base),
            },
            Event::Dispatch => "manual dispatch".to_string(),
        }
    }
}

/// A single branch filter entry (not serializable due to Regex)
#[derive(Debug, Clone)]
pub enum BranchPattern {
    /// Exact branch name match
    Exact(String),
    /// Wildcard pattern compiled to an anchored regex
    Wildcard(Regex),
}

impl BranchPattern {
    /// Compile a filter entry; `*` matches any run of characters
    pub fn new(pattern: &str) -> Self {
        if pattern.contains('*') {
            let translated = format!(
                "^{}$",
                pattern
                    .split('*')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*")
            );
            match Regex::new(&translated) {
                Ok(regex) => BranchPattern::Wildcard(regex),
                Err(_) => BranchPattern::Exact(pattern.to_string()),
            }
        } else {
            BranchPattern::Exact(pattern.to_string())
        }
    }

    /// Check if the pattern matches the given branch
    pub fn matches(&self, branch: &str) -> bool {
        match self {
            BranchPattern::Exact(name) => branch == name,
            BranchPattern::Wildcard(regex) => regex.is_match(branch),
        }
    }
}

/// Compiled branch filter; an empty filter accepts every branch
#[derive(Debug, Clone, Default)]
pub struct BranchFilter {
    patterns: Vec<BranchPattern>,
}

impl BranchFilter {
    pub fn from_config(config: &BranchFilterConfig) -> Self {
        Self {
            patterns: config
                .branches
                .iter()
                .map(|p| BranchPattern::new(p))
                .collect(),
        }
    }

    /// Check if the filter accepts the given branch
    pub fn accepts(&self, branch: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(branch))
    }
}

/// Compiled trigger set for a workflow
#[derive(Debug, Clone, Default)]
pub struct Triggers {
    pub push: Option<BranchFilter>,
    pub pull_request: Option<BranchFilter>,
    pub dispatch: bool,
}

impl Triggers {
    pub fn from_config(config: &TriggersConfig) -> Self {
        Self {
            push: config.push.as_ref().map(BranchFilter::from_config),
            pull_request: config.pull_request.as_ref().map(BranchFilter::from_config),
            dispatch: config.dispatch.is_some(),
        }
    }

    /// Check whether the event starts a run of this workflow.
    /// A non-matching event is not an error; it simply produces no run.
    pub fn accepts(&self, event: &Event) -> bool {
        match event {
            Event::Push { branch, .. } => self
                .push
                .as_ref()
                .map(|filter| filter.accepts(branch))
                .unwrap_or(false),
            Event::PullRequest { base, .. } => self
                .pull_request
                .as_ref()
                .map(|filter| filter.accepts(base))
                .unwrap_or(false),
            Event::Dispatch => self.dispatch,
        }
    }
}
