//! Delimiter extraction for the `<THOUGHT>`/`<COMMAND>` framing.

use codesmith_core::error::ProtocolError;

const THOUGHT_OPEN: &str = "<THOUGHT>";
const THOUGHT_CLOSE: &str = "</THOUGHT>";
const COMMAND_OPEN: &str = "<COMMAND>";
const COMMAND_CLOSE: &str = "</COMMAND>";

/// The two blocks extracted from a well-formed model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Content of the first `<THOUGHT>` block, surrounding whitespace trimmed.
    pub thought: String,

    /// Content of the first `<COMMAND>` block, surrounding whitespace trimmed.
    pub command: String,
}

/// Extract `(thought, command)` from raw model text.
///
/// Content is taken strictly between the first opening tag and the first
/// matching closing tag after it; inner content is returned verbatim apart
/// from trimming the whitespace that separates it from the delimiters.
///
/// Fails if either delimiter pair is absent, the command is empty, or the
/// command spans multiple non-empty lines. Newlines inside `<<<...>>>` raw
/// blocks are exempt from the single-line rule — raw blocks exist to carry
/// file bodies.
pub fn parse_response(text: &str) -> Result<ParsedResponse, ProtocolError> {
    let thought = extract_block(text, THOUGHT_OPEN, THOUGHT_CLOSE)
        .ok_or(ProtocolError::MissingThought)?;
    let command = extract_block(text, COMMAND_OPEN, COMMAND_CLOSE)
        .ok_or(ProtocolError::MissingCommand)?;

    let command = command.trim();
    if command.is_empty() {
        return Err(ProtocolError::EmptyCommand);
    }

    let masked = mask_raw_blocks(command)?;
    let lines = masked.lines().filter(|l| !l.trim().is_empty()).count();
    if lines > 1 {
        return Err(ProtocolError::MultilineCommand { lines });
    }

    Ok(ParsedResponse {
        thought: thought.trim().to_string(),
        command: command.to_string(),
    })
}

/// Content between the first `open` tag and the first `close` tag after it.
fn extract_block<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = text[start..].find(close)? + start;
    Some(&text[start..end])
}

/// Replace every `<<<...>>>` body with a newline-free placeholder so the
/// single-line check only sees the command structure.
fn mask_raw_blocks(command: &str) -> Result<String, ProtocolError> {
    let mut masked = String::with_capacity(command.len());
    let mut rest = command;

    while let Some(open) = rest.find("<<<") {
        masked.push_str(&rest[..open]);
        let after = &rest[open + 3..];
        let close = after
            .find(">>>")
            .ok_or(ProtocolError::UnterminatedRawBlock)?;
        masked.push_str("<<<raw>>>");
        rest = &after[close + 3..];
    }
    masked.push_str(rest);
    Ok(masked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_response() {
        let text = "<THOUGHT>\nI should look around first.\n</THOUGHT>\n<COMMAND>\nls \"\"\n</COMMAND>";
        let parsed = parse_response(text).unwrap();
        assert_eq!(parsed.thought, "I should look around first.");
        assert_eq!(parsed.command, "ls \"\"");
    }

    #[test]
    fn content_is_verbatim() {
        let text = "<THOUGHT>line one\nline two</THOUGHT><COMMAND>echo \"a  b\"</COMMAND>";
        let parsed = parse_response(text).unwrap();
        assert_eq!(parsed.thought, "line one\nline two");
        assert_eq!(parsed.command, "echo \"a  b\"");
    }

    #[test]
    fn uses_first_delimiter_pair() {
        let text = "<THOUGHT>first</THOUGHT><COMMAND>ls \"\"</COMMAND>\n<THOUGHT>second</THOUGHT><COMMAND>exit</COMMAND>";
        let parsed = parse_response(text).unwrap();
        assert_eq!(parsed.thought, "first");
        assert_eq!(parsed.command, "ls \"\"");
    }

    #[test]
    fn tolerates_prose_around_blocks() {
        let text = "Sure, here's my plan.\n<THOUGHT>plan</THOUGHT>\nnoise\n<COMMAND>submit</COMMAND>\ntrailing";
        let parsed = parse_response(text).unwrap();
        assert_eq!(parsed.thought, "plan");
        assert_eq!(parsed.command, "submit");
    }

    #[test]
    fn missing_thought_block() {
        let err = parse_response("<COMMAND>ls \"\"</COMMAND>").unwrap_err();
        assert_eq!(err, ProtocolError::MissingThought);
    }

    #[test]
    fn missing_command_block() {
        let err = parse_response("<THOUGHT>hm</THOUGHT>").unwrap_err();
        assert_eq!(err, ProtocolError::MissingCommand);
    }

    #[test]
    fn unclosed_thought_is_missing() {
        let err = parse_response("<THOUGHT>hm <COMMAND>ls</COMMAND>").unwrap_err();
        assert_eq!(err, ProtocolError::MissingThought);
    }

    #[test]
    fn empty_command_rejected() {
        let err = parse_response("<THOUGHT>hm</THOUGHT><COMMAND>\n  \n</COMMAND>").unwrap_err();
        assert_eq!(err, ProtocolError::EmptyCommand);
    }

    #[test]
    fn multiline_command_rejected() {
        let text = "<THOUGHT>hm</THOUGHT><COMMAND>\nls \"\"\ncat \"a\"\n</COMMAND>";
        let err = parse_response(text).unwrap_err();
        assert_eq!(err, ProtocolError::MultilineCommand { lines: 2 });
    }

    #[test]
    fn raw_block_newlines_do_not_count_as_lines() {
        let text =
            "<THOUGHT>write it</THOUGHT><COMMAND>\nwrite_file \"a.rs\" <<<fn main() {\n    println!(\"hi\");\n}\n>>>\n</COMMAND>";
        let parsed = parse_response(text).unwrap();
        assert!(parsed.command.starts_with("write_file"));
        assert!(parsed.command.contains("println!"));
    }

    #[test]
    fn unterminated_raw_block_rejected() {
        let text = "<THOUGHT>hm</THOUGHT><COMMAND>write_file \"a\" <<<body</COMMAND>";
        let err = parse_response(text).unwrap_err();
        assert_eq!(err, ProtocolError::UnterminatedRawBlock);
    }
}
