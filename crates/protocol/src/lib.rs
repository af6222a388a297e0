//! Response-format parsing for the Codesmith agent protocol.
//!
//! The model must answer every prompt with exactly one reasoning block and
//! one command block:
//!
//! ```text
//! <THOUGHT>
//! The tests fail because the fixture path is wrong.
//! </THOUGHT>
//! <COMMAND>
//! open "tests/fixtures.rs"
//! </COMMAND>
//! ```
//!
//! Grammar (informal):
//! ```text
//! response = <THOUGHT> text </THOUGHT> ... <COMMAND> command </COMMAND> ...
//! command  = verb (arg)*           -- a single non-empty line
//! arg      = QUOTED | RAW_BLOCK | BARE
//! QUOTED   = '"' chars-except-quote '"'
//! RAW_BLOCK= '<<<' any-chars '>>>'  -- may span lines (file bodies)
//! BARE     = chars-except-whitespace
//! ```
//!
//! Anything that does not fit this grammar is a `ProtocolError`. The agent
//! loop recovers from every parse failure by feeding a corrective
//! observation back to the model — a malformed response is never fatal.

mod parser;
mod tokens;

pub use parser::{ParsedResponse, parse_response};
pub use tokens::tokenize;
