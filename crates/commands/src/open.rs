//! Open a file into the editor view.

use crate::path::resolve_in_root;
use async_trait::async_trait;
use codesmith_core::command::{Command, CommandOutput};
use codesmith_core::error::CommandError;
use std::path::PathBuf;

/// Open a workspace file at a page.
///
/// The command validates the file and reports its size; the actual window
/// is rendered into every prompt by the agent's editor view, which tracks
/// the page cursor per file.
pub struct OpenCommand {
    root: PathBuf,
}

impl OpenCommand {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Command for OpenCommand {
    fn name(&self) -> &str {
        "open"
    }

    fn signature(&self) -> &str {
        "open \"<path>\" [<page>]"
    }

    fn description(&self) -> &str {
        "Open a file in the editor view at the given 1-based page. The opened window is shown in every following prompt."
    }

    async fn execute(&self, args: &[String]) -> Result<CommandOutput, CommandError> {
        let raw = args
            .first()
            .ok_or_else(|| CommandError::InvalidArguments {
                command: "open".into(),
                reason: "missing file path".into(),
            })?;

        if let Some(page) = args.get(1) {
            if page.parse::<usize>().is_err() {
                return Err(CommandError::InvalidArguments {
                    command: "open".into(),
                    reason: format!("page must be a positive integer, got '{page}'"),
                });
            }
        }

        let path = resolve_in_root(&self.root, raw).map_err(|reason| {
            CommandError::PermissionDenied {
                command: "open".into(),
                reason,
            }
        })?;

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let lines = content.lines().count();
                Ok(CommandOutput::ok(format!("Opened {raw} ({lines} lines).")))
            }
            Err(e) => Ok(CommandOutput::failed(format!("Cannot open '{raw}': {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}\n// two\n").unwrap();

        let cmd = OpenCommand::new(dir.path().to_path_buf());
        let output = cmd.execute(&["main.rs".into()]).await.unwrap();
        assert!(output.success);
        assert!(output.content.contains("Opened main.rs"));
        assert!(output.content.contains("2 lines"));
    }

    #[tokio::test]
    async fn missing_file_is_an_observation() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = OpenCommand::new(dir.path().to_path_buf());
        let output = cmd.execute(&["nope.rs".into()]).await.unwrap();
        assert!(!output.success);
        assert!(output.content.contains("Cannot open"));
    }

    #[tokio::test]
    async fn missing_path_argument() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = OpenCommand::new(dir.path().to_path_buf());
        let err = cmd.execute(&[]).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn non_numeric_page_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "x").unwrap();
        let cmd = OpenCommand::new(dir.path().to_path_buf());
        let err = cmd
            .execute(&["a.rs".into(), "two".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments { .. }));
    }
}
