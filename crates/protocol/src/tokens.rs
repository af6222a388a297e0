//! Command-line tokenization: verb + arguments.
//!
//! Alternatives are tried in order at each position — quoted string, raw
//! block, bare token — scanning left to right. The first token is always
//! the verb.

use codesmith_core::action::Action;
use codesmith_core::error::ProtocolError;

/// Tokenize a single command line into an `Action`.
pub fn tokenize(command: &str) -> Result<Action, ProtocolError> {
    let mut tokens: Vec<String> = Vec::new();
    let bytes = command.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        // Skip whitespace between tokens
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if command[i..].starts_with("<<<") {
            let body_start = i + 3;
            let close = command[body_start..]
                .find(">>>")
                .ok_or(ProtocolError::UnterminatedRawBlock)?;
            tokens.push(command[body_start..body_start + close].to_string());
            i = body_start + close + 3;
        } else if bytes[i] == b'"' {
            let body_start = i + 1;
            let close = command[body_start..]
                .find('"')
                .ok_or(ProtocolError::UnterminatedQuote)?;
            tokens.push(command[body_start..body_start + close].to_string());
            i = body_start + close + 1;
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            tokens.push(command[start..i].to_string());
        }
    }

    if tokens.is_empty() {
        return Err(ProtocolError::EmptyCommand);
    }

    let verb = tokens.remove(0);
    Ok(Action::new(verb, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_tokens() {
        let action = tokenize("execute cargo test").unwrap();
        assert_eq!(action.verb, "execute");
        assert_eq!(action.args, vec!["cargo", "test"]);
    }

    #[test]
    fn quoted_argument_keeps_spaces() {
        let action = tokenize("search \"fn main\" src").unwrap();
        assert_eq!(action.verb, "search");
        assert_eq!(action.args, vec!["fn main", "src"]);
    }

    #[test]
    fn empty_quoted_argument() {
        let action = tokenize("ls \"\"").unwrap();
        assert_eq!(action.verb, "ls");
        assert_eq!(action.args, vec![""]);
    }

    #[test]
    fn raw_block_argument_keeps_newlines() {
        let action = tokenize("write_file \"a.rs\" <<<fn main() {}\n// done\n>>>").unwrap();
        assert_eq!(action.verb, "write_file");
        assert_eq!(action.args.len(), 2);
        assert_eq!(action.args[0], "a.rs");
        assert!(action.args[1].contains("fn main() {}"));
        assert!(action.args[1].contains("// done"));
    }

    #[test]
    fn raw_block_may_contain_quotes() {
        let action = tokenize("write_file \"a\" <<<say \"hi\">>>").unwrap();
        assert_eq!(action.args[1], "say \"hi\"");
    }

    #[test]
    fn verb_only() {
        let action = tokenize("submit").unwrap();
        assert_eq!(action.verb, "submit");
        assert!(action.args.is_empty());
    }

    #[test]
    fn unterminated_quote() {
        let err = tokenize("open \"a.rs").unwrap_err();
        assert_eq!(err, ProtocolError::UnterminatedQuote);
    }

    #[test]
    fn unterminated_raw_block() {
        let err = tokenize("write_file \"a\" <<<body").unwrap_err();
        assert_eq!(err, ProtocolError::UnterminatedRawBlock);
    }

    #[test]
    fn blank_command() {
        let err = tokenize("   ").unwrap_err();
        assert_eq!(err, ProtocolError::EmptyCommand);
    }
}
