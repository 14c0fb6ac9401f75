//! Python interpreter resolution and virtual environment provisioning

use crate::execution::command::{CommandError, CommandRunner};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors provisioning an interpreter for a setup step
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("no Python interpreter found for version {version} (tried {tried})")]
    InterpreterNotFound { version: String, tried: String },

    #[error("failed to create virtual environment: {0}")]
    VenvFailed(String),

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// A resolved interpreter plus the virtual environment it provisioned
#[derive(Debug, Clone)]
pub struct PythonToolchain {
    /// Interpreter the venv was created from
    pub interpreter: PathBuf,

    /// Version the interpreter reported, e.g. "3.10.12"
    pub version: String,

    /// The venv root inside the workspace
    pub venv_dir: PathBuf,

    /// The venv's bin directory, prepended to PATH for later steps
    pub venv_bin: PathBuf,
}

/// Provisions Python interpreters for setup steps
#[derive(Debug, Clone, Default)]
pub struct PythonProvisioner {
    runner: CommandRunner,
}

impl PythonProvisioner {
    pub fn new() -> Self {
        Self {
            runner: CommandRunner::new(),
        }
    }

    /// Candidate executable names for a requested version, most specific first
    fn candidates(version: &str) -> Vec<String> {
        vec![
            format!("python{}", version),
            "python3".to_string(),
            "python".to_string(),
        ]
    }

    /// Locate an interpreter whose reported version matches the requested
    /// `major.minor`. Candidates that are missing, fail to run, or report
    /// a different version are recorded in the error.
    pub async fn resolve(&self, version: &str) -> Result<(PathBuf, String), ToolchainError> {
        let mut tried = Vec::new();

        for name in Self::candidates(version) {
            let path = match which::which(&name) {
                Ok(path) => path,
                Err(_) => {
                    tried.push(format!("{}: not found", name));
                    continue;
                }
            };

            match self.query_version(&path).await {
                Some(reported) if version_matches(&reported, version) => {
                    debug!("Resolved {} -> {} ({})", name, path.display(), reported);
                    return Ok((path, reported));
                }
                Some(reported) => {
                    tried.push(format!("{}: {}", name, reported));
                }
                None => {
                    tried.push(format!("{}: version not recognized", name));
                }
            }
        }

        Err(ToolchainError::InterpreterNotFound {
            version: version.to_string(),
            tried: tried.join(", "),
        })
    }

    /// Ask an interpreter for its version; None if it does not answer
    /// like a Python
    async fn query_version(&self, interpreter: &Path) -> Option<String> {
        let output = self
            .runner
            .run_program(
                &interpreter.to_string_lossy(),
                &["--version"],
                Path::new("."),
                &HashMap::new(),
                Some(30),
            )
            .await
            .ok()?;

        if !output.success() {
            return None;
        }
        // Older interpreters print the version banner to stderr.
        parse_python_version(&output.combined())
    }

    /// Resolve an interpreter and create a virtual environment inside the
    /// workspace. Packages installed by later steps land in the venv and
    /// die with the workspace.
    pub async fn provision(
        &self,
        version: &str,
        workspace: &Path,
    ) -> Result<PythonToolchain, ToolchainError> {
        let (interpreter, reported) = self.resolve(version).await?;
        info!("Using {} ({})", interpreter.display(), reported);

        let venv_dir = workspace.join("venv");
        let output = self
            .runner
            .run_program(
                &interpreter.to_string_lossy(),
                &["-m", "venv", &venv_dir.to_string_lossy()],
                workspace,
                &HashMap::new(),
                None,
            )
            .await?;

        if !output.success() {
            return Err(ToolchainError::VenvFailed(output.combined()));
        }

        let venv_bin = venv_dir.join("bin");
        debug!("Created venv at {}", venv_dir.display());

        Ok(PythonToolchain {
            interpreter,
            version: reported,
            venv_dir,
            venv_bin,
        })
    }
}

/// "3.10" accepts "3.10" and "3.10.12", but not "3.1.x" or "3.100.x"
fn version_matches(reported: &str, requested: &str) -> bool {
    reported == requested || reported.starts_with(&format!("{}.", requested))
}

/// Extract "3.10.12" from a banner like "Python 3.10.12"
fn parse_python_version(text: &str) -> Option<String> {
    let banner = Regex::new(r"Python\s+(\d+\.\d+(?:\.\d+)?)").ok()?;
    banner
        .captures(text)
        .map(|captures| captures[1].to_string())
}
