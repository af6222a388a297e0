//! Error types for the Codesmith domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Codesmith operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Response protocol errors ---
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    // --- Model gateway errors ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // --- Command dispatch errors ---
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    // --- Session lifecycle errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Persisted state errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Model output failed the response grammar. Always recoverable: the loop
/// feeds a corrective observation back into history and re-prompts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("response has no <THOUGHT>...</THOUGHT> block")]
    MissingThought,

    #[error("response has no <COMMAND>...</COMMAND> block")]
    MissingCommand,

    #[error("command block is empty")]
    EmptyCommand,

    #[error("command block spans {lines} non-empty lines, expected exactly one")]
    MultilineCommand { lines: usize },

    #[error("unterminated quoted string in command")]
    UnterminatedQuote,

    #[error("unterminated <<<...>>> raw block in command")]
    UnterminatedRawBlock,
}

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Retry budget exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("Infrastructure failure: {0}")]
    Infrastructure(String),
}

impl ModelError {
    /// Whether a bounded retry is worth attempting for this error.
    ///
    /// Rate limits, timeouts, network failures, empty responses, and 5xx
    /// statuses are transient. Authentication failures and 4xx statuses are
    /// not — retrying cannot fix them.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. }
            | Self::Timeout(_)
            | Self::Network(_)
            | Self::EmptyResponse => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("function not found: {0}")]
    UnknownCommand(String),

    #[error("invalid arguments for {command}: {reason}")]
    InvalidArguments { command: String, reason: String },

    #[error("{command} failed: {reason}")]
    ExecutionFailed { command: String, reason: String },

    #[error("permission denied for {command}: {reason}")]
    PermissionDenied { command: String, reason: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage failure: {0}")]
    Storage(String),

    #[error("serialization failure: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("session already exists: {0}")]
    AlreadyExists(String),

    #[error("session {0} is already running")]
    AlreadyRunning(String),

    #[error("session {0} is stopped")]
    Stopped(String),

    #[error("workspace path does not exist: {0}")]
    WorkspaceMissing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_displays_correctly() {
        let err = Error::Model(ModelError::Api {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn transient_classification() {
        assert!(ModelError::RateLimited { retry_after_secs: 5 }.is_transient());
        assert!(ModelError::Network("conn refused".into()).is_transient());
        assert!(
            ModelError::Api {
                status_code: 503,
                message: "overloaded".into()
            }
            .is_transient()
        );
        assert!(
            !ModelError::Api {
                status_code: 400,
                message: "bad request".into()
            }
            .is_transient()
        );
        assert!(!ModelError::AuthenticationFailed("bad key".into()).is_transient());
        assert!(!ModelError::Infrastructure("disk full".into()).is_transient());
    }

    #[test]
    fn command_error_displays_verb() {
        let err = CommandError::UnknownCommand("frobnicate".into());
        assert!(err.to_string().contains("function not found"));
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn session_error_displays_id() {
        let err = SessionError::AlreadyRunning("abc-123".into());
        assert!(err.to_string().contains("abc-123"));
        assert!(err.to_string().contains("already running"));
    }
}
