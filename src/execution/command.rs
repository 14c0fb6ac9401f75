//! Shell command invocation for run steps

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Errors spawning or supervising a step command
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started at all
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command exceeded its configured timeout
    #[error("command timed out after {0} seconds")]
    Timeout(u64),
}

/// Captured result of a finished command.
///
/// A non-zero exit code is data, not an error; the executor decides what
/// it means for the step.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout and stderr joined for step records
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!(
                "{}\n{}",
                self.stdout.trim_end_matches('\n'),
                self.stderr.trim_end_matches('\n')
            ),
        }
    }
}

/// Runs commands in a working directory with an environment overlay
#[derive(Debug, Clone, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `shell -c command` and capture its output.
    ///
    /// The child is killed if the future is dropped, so an aborted run
    /// leaves no orphan linters behind.
    pub async fn run_shell(
        &self,
        shell: &str,
        command: &str,
        working_dir: &Path,
        env: &HashMap<String, String>,
        timeout_secs: Option<u64>,
    ) -> Result<CommandOutput, CommandError> {
        debug!(
            "Running `{}` via {} in {}",
            command.lines().next().unwrap_or(""),
            shell,
            working_dir.display()
        );

        let mut cmd = Command::new(shell);
        cmd.arg("-c").arg(command);
        self.spawn_and_capture(cmd, shell, working_dir, env, timeout_secs)
            .await
    }

    /// Run a program with explicit arguments (no shell interpretation)
    pub async fn run_program(
        &self,
        program: &str,
        args: &[&str],
        working_dir: &Path,
        env: &HashMap<String, String>,
        timeout_secs: Option<u64>,
    ) -> Result<CommandOutput, CommandError> {
        debug!("Running {} {:?} in {}", program, args, working_dir.display());

        let mut cmd = Command::new(program);
        cmd.args(args);
        self.spawn_and_capture(cmd, program, working_dir, env, timeout_secs)
            .await
    }

    async fn spawn_and_capture(
        &self,
        mut cmd: Command,
        program: &str,
        working_dir: &Path,
        env: &HashMap<String, String>,
        timeout_secs: Option<u64>,
    ) -> Result<CommandOutput, CommandError> {
        cmd.current_dir(working_dir);
        cmd.envs(env);
        cmd.kill_on_drop(true);

        let result = match timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), cmd.output())
                .await
                .map_err(|_| CommandError::Timeout(secs))?,
            None => cmd.output().await,
        };

        let output = result.map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let exit_code = output.status.code().unwrap_or(-1);
        debug!("{} exited with code {}", program, exit_code);

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[tokio::test]
    async fn test_run_shell_captures_stdout() {
        let runner = CommandRunner::new();
        let output = runner
            .run_shell("sh", "echo hello", Path::new("."), &no_env(), None)
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(output.exit_code, 0);
        assert!(output.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let runner = CommandRunner::new();
        let output = runner
            .run_shell("sh", "exit 3", Path::new("."), &no_env(), None)
            .await
            .unwrap();

        assert!(!output.success());
        assert_eq!(output.exit_code, 3);
    }

    #[tokio::test]
    async fn test_stderr_is_captured() {
        let runner = CommandRunner::new();
        let output = runner
            .run_shell("sh", "echo oops >&2; exit 1", Path::new("."), &no_env(), None)
            .await
            .unwrap();

        assert!(output.stderr.contains("oops"));
        assert!(output.combined().contains("oops"));
    }

    #[tokio::test]
    async fn test_env_overlay_is_visible() {
        let mut env = no_env();
        env.insert("CHECKRUN_EVENT".to_string(), "push".to_string());

        let runner = CommandRunner::new();
        let output = runner
            .run_shell("sh", "echo event=$CHECKRUN_EVENT", Path::new("."), &env, None)
            .await
            .unwrap();

        assert!(output.stdout.contains("event=push"));
    }

    #[tokio::test]
    async fn test_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CommandRunner::new();
        let output = runner
            .run_shell("sh", "pwd", dir.path(), &no_env(), None)
            .await
            .unwrap();

        let reported = output.stdout.trim();
        // Compare canonicalized paths; temp dirs are often behind symlinks.
        assert_eq!(
            std::fs::canonicalize(reported).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_timeout_kills_the_command() {
        let runner = CommandRunner::new();
        let result = runner
            .run_shell("sh", "sleep 30", Path::new("."), &no_env(), Some(1))
            .await;

        assert!(matches!(result, Err(CommandError::Timeout(1))));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_an_error() {
        let runner = CommandRunner::new();
        let result = runner
            .run_program(
                "definitely-not-a-real-binary",
                &["--version"],
                Path::new("."),
                &no_env(),
                None,
            )
            .await;

        assert!(matches!(result, Err(CommandError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_run_program() {
        let runner = CommandRunner::new();
        let output = runner
            .run_program("sh", &["-c", "echo direct"], Path::new("."), &no_env(), None)
            .await
            .unwrap();

        assert!(output.stdout.contains("direct"));
    }

    #[test]
    fn test_combined_joins_streams() {
        let output = CommandOutput {
            exit_code: 1,
            stdout: "app.py:5:1: E302 expected 2 blank lines\n".to_string(),
            stderr: "warning: something\n".to_string(),
        };
        let combined = output.combined();
        assert!(combined.contains("E302"));
        assert!(combined.contains("warning"));
    }
}
