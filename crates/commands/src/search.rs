//! Substring search across workspace files.

use crate::path::resolve_in_root;
use async_trait::async_trait;
use codesmith_core::command::{Command, CommandOutput};
use codesmith_core::error::CommandError;
use std::path::{Path, PathBuf};

const MAX_RESULTS: usize = 100;

/// Search workspace files for a substring.
///
/// Hidden entries (names starting with `.`) are skipped, as are files that
/// are not valid UTF-8. Results are capped; the cap is reported when hit.
pub struct SearchCommand {
    root: PathBuf,
    max_results: usize,
}

impl SearchCommand {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            max_results: MAX_RESULTS,
        }
    }

    /// Iterative directory walk, depth-first, sorted for determinism.
    fn walk_files(start: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut stack = vec![start.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            let mut children: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .map(|n| !n.to_string_lossy().starts_with('.'))
                        .unwrap_or(false)
                })
                .collect();
            children.sort();

            for child in children.into_iter().rev() {
                if child.is_dir() {
                    stack.push(child);
                } else {
                    files.push(child);
                }
            }
        }

        files.sort();
        files
    }
}

#[async_trait]
impl Command for SearchCommand {
    fn name(&self) -> &str {
        "search"
    }

    fn signature(&self) -> &str {
        "search \"<term>\" [<path>]"
    }

    fn description(&self) -> &str {
        "Search workspace files for a substring. Reports matches as path:line: text."
    }

    async fn execute(&self, args: &[String]) -> Result<CommandOutput, CommandError> {
        let term = args
            .first()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CommandError::InvalidArguments {
                command: "search".into(),
                reason: "missing search term".into(),
            })?;
        let raw_scope = args.get(1).map(String::as_str).unwrap_or("");

        let scope = resolve_in_root(&self.root, raw_scope).map_err(|reason| {
            CommandError::PermissionDenied {
                command: "search".into(),
                reason,
            }
        })?;

        if !scope.exists() {
            return Ok(CommandOutput::failed(format!(
                "Cannot search '{raw_scope}': no such path"
            )));
        }

        let files = if scope.is_file() {
            vec![scope.clone()]
        } else {
            Self::walk_files(&scope)
        };

        let mut matches: Vec<String> = Vec::new();
        let mut truncated = false;

        'outer: for file in &files {
            let Ok(content) = std::fs::read_to_string(file) else {
                continue;
            };
            for (idx, line) in content.lines().enumerate() {
                if line.contains(term.as_str()) {
                    if matches.len() >= self.max_results {
                        truncated = true;
                        break 'outer;
                    }
                    let rel = file.strip_prefix(&self.root).unwrap_or(file);
                    matches.push(format!("{}:{}: {}", rel.display(), idx + 1, line.trim()));
                }
            }
        }

        if matches.is_empty() {
            return Ok(CommandOutput::ok(format!("No matches for \"{term}\".")));
        }

        let mut content = matches.join("\n");
        if truncated {
            content.push_str(&format!(
                "\n(showing first {} matches)",
                self.max_results
            ));
        }
        Ok(CommandOutput::ok(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn alpha() {}\nfn beta() {}\n").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.rs"), "// alpha again\n").unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/config"), "alpha hidden\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn finds_matches_across_files() {
        let dir = fixture();
        let cmd = SearchCommand::new(dir.path().to_path_buf());
        let output = cmd.execute(&["alpha".into()]).await.unwrap();

        assert!(output.success);
        assert!(output.content.contains("a.rs:1:"));
        assert!(output.content.contains("sub/b.rs:1:"));
    }

    #[tokio::test]
    async fn hidden_directories_skipped() {
        let dir = fixture();
        let cmd = SearchCommand::new(dir.path().to_path_buf());
        let output = cmd.execute(&["alpha".into()]).await.unwrap();
        assert!(!output.content.contains(".git"));
    }

    #[tokio::test]
    async fn no_matches_reported() {
        let dir = fixture();
        let cmd = SearchCommand::new(dir.path().to_path_buf());
        let output = cmd.execute(&["zeta".into()]).await.unwrap();
        assert!(output.success);
        assert!(output.content.contains("No matches"));
    }

    #[tokio::test]
    async fn scoped_to_subdirectory() {
        let dir = fixture();
        let cmd = SearchCommand::new(dir.path().to_path_buf());
        let output = cmd
            .execute(&["alpha".into(), "sub".into()])
            .await
            .unwrap();
        assert!(output.content.contains("sub/b.rs"));
        assert!(!output.content.contains("a.rs:1"));
    }

    #[tokio::test]
    async fn missing_term_rejected() {
        let dir = fixture();
        let cmd = SearchCommand::new(dir.path().to_path_buf());
        let err = cmd.execute(&[]).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn result_cap_reported() {
        let dir = tempfile::tempdir().unwrap();
        let many: String = (0..50).map(|i| format!("needle {i}\n")).collect();
        std::fs::write(dir.path().join("big.txt"), many).unwrap();

        let mut cmd = SearchCommand::new(dir.path().to_path_buf());
        cmd.max_results = 10;
        let output = cmd.execute(&["needle".into()]).await.unwrap();
        assert!(output.content.contains("showing first 10 matches"));
    }
}
