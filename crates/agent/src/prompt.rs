//! Prompt construction.
//!
//! The system prompt is assembled from the command registry's mechanically
//! generated documentation plus a static behavioral block; the per-turn
//! user prompt carries the task, the latest observation (or interrupt),
//! the editor view, and the working directory.

use codesmith_core::command::CommandRegistry;

/// Static behavioral instructions, including the loop-interpreted verbs
/// that do not live in the registry.
const BEHAVIOR: &str = r#"You are a coding agent operating on a sandboxed workspace.

Respond to every prompt with exactly one reasoning block and one command:

<THOUGHT>
your reasoning here
</THOUGHT>
<COMMAND>
one command on a single line
</COMMAND>

Quote arguments with double quotes; wrap multi-line content in <<< and >>>.

In addition to the workspace commands below, these are always available:
submit ["<summary>"]
    Declare the task complete and end the session.
exit ["<reason>"]
    Abandon the task and end the session.
ask_user "<question>"
    Pause and ask the user a question; their reply becomes your next observation.
"#;

/// Builds the system and user prompts for every turn.
pub struct PromptBuilder {
    command_docs: String,
}

impl PromptBuilder {
    /// Capture the registry's documentation once; it cannot drift from the
    /// registered set because it is derived from it.
    pub fn new(registry: &CommandRegistry) -> Self {
        Self {
            command_docs: registry.command_docs(),
        }
    }

    /// The full system prompt.
    pub fn system_prompt(&self) -> String {
        format!("{BEHAVIOR}\nWorkspace commands:\n{}", self.command_docs)
    }

    /// The user-turn prompt for one step.
    pub fn user_prompt(
        &self,
        task: &str,
        observation: Option<&str>,
        editor: &str,
        cwd: &str,
    ) -> String {
        format!(
            "Task: {task}\n\nObservation:\n{}\n\nOpen files:\n{editor}\n\nWorking directory: {cwd}\n",
            observation.unwrap_or("(none yet — this is the first step)")
        )
    }
}
