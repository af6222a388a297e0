//! Execute shell commands inside the workspace.

use async_trait::async_trait;
use codesmith_core::command::{Command, CommandOutput};
use codesmith_core::error::CommandError;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command as ProcessCommand;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Execute a shell command with the workspace root as working directory.
///
/// Supports an optional allowlist of base commands and a wall-clock timeout.
pub struct ExecuteCommand {
    root: PathBuf,
    allowed_commands: Vec<String>,
    timeout: Duration,
}

impl ExecuteCommand {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            allowed_commands: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Restrict execution to the given base commands.
    pub fn with_allowlist(mut self, allowed: Vec<String>) -> Self {
        self.allowed_commands = allowed;
        self
    }

    /// Override the execution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        if self.allowed_commands.is_empty() {
            return true;
        }
        let base = command.split_whitespace().next().unwrap_or("").trim();
        self.allowed_commands.iter().any(|a| a == base)
    }
}

#[async_trait]
impl Command for ExecuteCommand {
    fn name(&self) -> &str {
        "execute"
    }

    fn signature(&self) -> &str {
        "execute \"<command>\""
    }

    fn description(&self) -> &str {
        "Run a shell command in the workspace root and return stdout/stderr with the exit code."
    }

    async fn execute(&self, args: &[String]) -> Result<CommandOutput, CommandError> {
        let command = args
            .first()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| CommandError::InvalidArguments {
                command: "execute".into(),
                reason: "missing command string".into(),
            })?;

        if !self.is_command_allowed(command) {
            return Err(CommandError::PermissionDenied {
                command: "execute".into(),
                reason: format!(
                    "'{}' is not in the allowlist",
                    command.split_whitespace().next().unwrap_or("")
                ),
            });
        }

        debug!(command = %command, "Executing workspace command");

        let child = ProcessCommand::new("sh")
            .args(["-c", command])
            .current_dir(&self.root)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CommandError::ExecutionFailed {
                    command: "execute".into(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!(command = %command, timeout_secs = self.timeout.as_secs(), "Command timed out");
                return Ok(CommandOutput::failed(format!(
                    "Command timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let success = output.status.success();

        let result_text = if success {
            if stderr.is_empty() {
                stdout
            } else {
                format!("{stdout}\n[stderr]: {stderr}")
            }
        } else {
            let code = output.status.code().unwrap_or(-1);
            format!("[exit code: {code}]\n{stdout}\n{stderr}")
        };

        Ok(CommandOutput {
            success,
            content: result_text.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_check() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ExecuteCommand::new(dir.path().to_path_buf())
            .with_allowlist(vec!["ls".into(), "cargo".into()]);
        assert!(cmd.is_command_allowed("ls -la"));
        assert!(cmd.is_command_allowed("cargo test"));
        assert!(!cmd.is_command_allowed("rm -rf /"));
    }

    #[tokio::test]
    async fn runs_in_workspace_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

        let cmd = ExecuteCommand::new(dir.path().to_path_buf());
        let output = cmd.execute(&["ls".into()]).await.unwrap();
        assert!(output.success);
        assert!(output.content.contains("marker.txt"));
    }

    #[tokio::test]
    async fn failure_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ExecuteCommand::new(dir.path().to_path_buf());
        let output = cmd.execute(&["exit 3".into()]).await.unwrap();
        assert!(!output.success);
        assert!(output.content.contains("[exit code: 3]"));
    }

    #[tokio::test]
    async fn timeout_is_an_observation() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ExecuteCommand::new(dir.path().to_path_buf())
            .with_timeout(Duration::from_millis(50));
        let output = cmd.execute(&["sleep 5".into()]).await.unwrap();
        assert!(!output.success);
        assert!(output.content.contains("timed out"));
    }

    #[tokio::test]
    async fn blocked_command_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let cmd =
            ExecuteCommand::new(dir.path().to_path_buf()).with_allowlist(vec!["echo".into()]);
        let err = cmd.execute(&["rm -rf /".into()]).await.unwrap_err();
        assert!(matches!(err, CommandError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn missing_command_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ExecuteCommand::new(dir.path().to_path_buf());
        let err = cmd.execute(&[]).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments { .. }));
    }
}
