//! Command trait — the abstraction over agent capabilities.
//!
//! Commands are what give the agent the ability to act on its workspace:
//! list directories, open and write files, search, run programs. Each one
//! registers declaratively with `{name, signature, docstring}` so the
//! system-prompt documentation is derived mechanically from the registered
//! set — there is no hand-maintained doc text to drift.

use crate::action::Action;
use crate::error::CommandError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The result of a command execution.
///
/// Expected failures (file missing, non-zero exit) are reported as
/// `success: false` with a descriptive `content` — they become observations,
/// not errors. `CommandError` is reserved for dispatch-level failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Whether the command achieved what it was asked to do
    pub success: bool,

    /// The observation text fed back to the model
    pub content: String,
}

impl CommandOutput {
    /// A successful output.
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
        }
    }

    /// A failed-but-expected output (becomes an observation, not an error).
    pub fn failed(content: impl Into<String>) -> Self {
        Self {
            success: false,
            content: content.into(),
        }
    }
}

/// The core Command trait.
///
/// Each workspace capability (ls, open, write_file, search, execute)
/// implements this trait and is registered in the `CommandRegistry`.
#[async_trait]
pub trait Command: Send + Sync {
    /// The unique verb for this command (e.g. "ls", "write_file").
    fn name(&self) -> &str;

    /// A single-line call signature shown to the model,
    /// e.g. `ls "<path>"`.
    fn signature(&self) -> &str;

    /// What this command does (shown to the model under the signature).
    fn description(&self) -> &str;

    /// Execute with the tokenized arguments (verb excluded).
    async fn execute(&self, args: &[String]) -> Result<CommandOutput, CommandError>;
}

/// A registry of available commands.
///
/// The agent loop uses this to:
/// 1. Generate the command documentation block of the system prompt
/// 2. Look up and dispatch commands when the model requests them
///
/// Storage is a `BTreeMap` so generated docs are stable across runs.
pub struct CommandRegistry {
    commands: BTreeMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, command: Box<dyn Command>) {
        let name = command.name().to_string();
        self.commands.insert(name, command);
    }

    /// Get a command by verb.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// List all registered verbs, in doc order.
    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(|s| s.as_str()).collect()
    }

    /// Mechanically generate the command documentation block for the
    /// system prompt from the registered set.
    pub fn command_docs(&self) -> String {
        let mut docs = String::new();
        for command in self.commands.values() {
            docs.push_str(command.signature());
            docs.push('\n');
            docs.push_str("    ");
            docs.push_str(command.description());
            docs.push('\n');
        }
        docs
    }

    /// Dispatch a parsed action.
    ///
    /// Fails with `UnknownCommand` if the verb is unregistered. Errors from
    /// the underlying command are propagated unchanged — the agent loop's
    /// per-turn boundary converts them to observations.
    pub async fn dispatch(&self, action: &Action) -> Result<CommandOutput, CommandError> {
        let command = self
            .commands
            .get(&action.verb)
            .ok_or_else(|| CommandError::UnknownCommand(action.verb.clone()))?;
        command.execute(&action.args).await
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
