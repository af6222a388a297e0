//! Action — a parsed verb + arguments instruction extracted from model output.

use serde::{Deserialize, Serialize};

/// A parsed command: the verb and its arguments, in order.
///
/// Produced by the protocol tokenizer from the single-line `<COMMAND>` body.
/// The verb either resolves in the `CommandRegistry` or is one of the
/// loop-interpreted built-ins (`submit`, `exit`, `ask_user`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The command verb (first token)
    pub verb: String,

    /// The remaining tokens, in order
    pub args: Vec<String>,
}

impl Action {
    /// Create a new action.
    pub fn new(verb: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            verb: verb.into(),
            args,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.verb)?;
        for arg in &self.args {
            // Multi-line or long args are elided in display form; the full
            // values travel in Action::args.
            let shown: String = if arg.contains('\n') || arg.len() > 60 {
                format!("<{} bytes>", arg.len())
            } else {
                format!("\"{arg}\"")
            };
            write!(f, " {shown}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_short_args() {
        let action = Action::new("open", vec!["src/main.rs".into(), "2".into()]);
        assert_eq!(action.to_string(), "open \"src/main.rs\" \"2\"");
    }

    #[test]
    fn display_elides_long_args() {
        let body = "x".repeat(200);
        let action = Action::new("write_file", vec!["a.txt".into(), body]);
        let shown = action.to_string();
        assert!(shown.starts_with("write_file \"a.txt\""));
        assert!(shown.contains("<200 bytes>"));
    }
}
