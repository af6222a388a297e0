//! Workspace path confinement.

use std::path::{Component, Path, PathBuf};

/// Resolve a model-supplied path inside the workspace root.
///
/// The check is lexical: absolute paths and any `..` component are rejected
/// before touching the filesystem, so a path for a file that does not exist
/// yet (a new `write_file` target) still validates. An empty path resolves
/// to the root itself.
pub(crate) fn resolve_in_root(root: &Path, raw: &str) -> Result<PathBuf, String> {
    if raw.is_empty() || raw == "." {
        return Ok(root.to_path_buf());
    }

    let candidate = Path::new(raw);
    if candidate.is_absolute() {
        return Err(format!("absolute paths are not allowed: {raw}"));
    }

    for component in candidate.components() {
        if matches!(component, Component::ParentDir) {
            return Err(format!("path escapes the workspace: {raw}"));
        }
    }

    Ok(root.join(candidate))
}
