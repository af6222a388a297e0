//! Built-in command implementations for Codesmith.
//!
//! Commands give the agent the ability to act on its workspace: list
//! directories, open files into the editor view, write files, search, and
//! run programs. Every command is scoped to the session's workspace root
//! and refuses paths that escape it.

pub mod execute;
pub mod ls;
pub mod open;
pub mod search;
pub mod write_file;

mod path;

pub use write_file::WRITE_FAILURE_MARKER;

use codesmith_core::command::CommandRegistry;
use std::path::Path;

/// Create the default command registry for a workspace root.
pub fn default_registry(root: impl AsRef<Path>) -> CommandRegistry {
    let root = root.as_ref().to_path_buf();
    let mut registry = CommandRegistry::new();
    registry.register(Box::new(ls::LsCommand::new(root.clone())));
    registry.register(Box::new(open::OpenCommand::new(root.clone())));
    registry.register(Box::new(write_file::WriteFileCommand::new(root.clone())));
    registry.register(Box::new(search::SearchCommand::new(root.clone())));
    registry.register(Box::new(execute::ExecuteCommand::new(root)));
    registry
}
