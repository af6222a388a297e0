//! Write a file inside the workspace.

use crate::path::resolve_in_root;
use async_trait::async_trait;
use codesmith_core::command::{Command, CommandOutput};
use codesmith_core::error::CommandError;
use std::path::PathBuf;
use tracing::debug;

/// Marker prefix of a failed write observation.
///
/// The stuck-loop recovery heuristic watches recent history for this
/// substring to detect repeated edit failures.
pub const WRITE_FAILURE_MARKER: &str = "File write failed";

/// Write (create or replace) a workspace file.
pub struct WriteFileCommand {
    root: PathBuf,
}

impl WriteFileCommand {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Command for WriteFileCommand {
    fn name(&self) -> &str {
        "write_file"
    }

    fn signature(&self) -> &str {
        "write_file \"<path>\" <<<content>>>"
    }

    fn description(&self) -> &str {
        "Create or overwrite a file with the raw-block content. Parent directories are created as needed."
    }

    async fn execute(&self, args: &[String]) -> Result<CommandOutput, CommandError> {
        let [raw_path, content] = args else {
            return Err(CommandError::InvalidArguments {
                command: "write_file".into(),
                reason: format!("expected a path and a content block, got {} args", args.len()),
            });
        };

        let path = resolve_in_root(&self.root, raw_path).map_err(|reason| {
            CommandError::PermissionDenied {
                command: "write_file".into(),
                reason,
            }
        })?;

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return Ok(CommandOutput::failed(format!(
                    "{WRITE_FAILURE_MARKER}: cannot create parent directory: {e}"
                )));
            }
        }

        match tokio::fs::write(&path, content).await {
            Ok(()) => {
                debug!(path = %raw_path, bytes = content.len(), "File written");
                Ok(CommandOutput::ok(format!(
                    "Wrote {} bytes to {raw_path}.",
                    content.len()
                )))
            }
            Err(e) => Ok(CommandOutput::failed(format!(
                "{WRITE_FAILURE_MARKER}: {e}"
            ))),
        }
    }
}
