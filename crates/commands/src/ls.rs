//! List directory contents inside the workspace.

use crate::path::resolve_in_root;
use async_trait::async_trait;
use codesmith_core::command::{Command, CommandOutput};
use codesmith_core::error::CommandError;
use std::path::PathBuf;

/// List the entries of a workspace directory.
///
/// Directories are suffixed with `/` so the model can tell them apart from
/// files. Output is sorted for determinism.
pub struct LsCommand {
    root: PathBuf,
}

impl LsCommand {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Command for LsCommand {
    fn name(&self) -> &str {
        "ls"
    }

    fn signature(&self) -> &str {
        "ls \"<path>\""
    }

    fn description(&self) -> &str {
        "List files and directories at the given path, relative to the workspace root. Use \"\" for the root. Directories end with /."
    }

    async fn execute(&self, args: &[String]) -> Result<CommandOutput, CommandError> {
        let raw = args.first().map(String::as_str).unwrap_or("");
        let path = resolve_in_root(&self.root, raw).map_err(|reason| {
            CommandError::PermissionDenied {
                command: "ls".into(),
                reason,
            }
        })?;

        let mut read_dir = match tokio::fs::read_dir(&path).await {
            Ok(rd) => rd,
            Err(e) => {
                return Ok(CommandOutput::failed(format!(
                    "Cannot list '{raw}': {e}"
                )));
            }
        };

        let mut entries: Vec<String> = Vec::new();
        while let Ok(Some(entry)) = read_dir.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(if is_dir { format!("{name}/") } else { name });
        }
        entries.sort();

        if entries.is_empty() {
            return Ok(CommandOutput::ok("(empty directory)"));
        }
        Ok(CommandOutput::ok(entries.join("\n")))
    }
}
