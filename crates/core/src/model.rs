//! ModelClient trait — the abstraction over the opaque inference capability.
//!
//! A `ModelClient` knows how to send a role-tagged message list plus a
//! system prompt to an LLM and return the generated text. Retry policy and
//! error-taxonomy mapping live above it, in the model gateway — clients
//! report what happened once.

use crate::error::ModelError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single inference request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g. "gpt-4o", "anthropic/claude-sonnet-4")
    pub model: String,

    /// The system prompt, sent ahead of the messages
    pub system: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Sampling temperature (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.0
}

/// A complete inference response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated text
    pub content: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core ModelClient trait.
///
/// Every LLM backend implements this trait. The agent loop calls through the
/// gateway without knowing which backend is in use.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// A human-readable name for this client (e.g. "openai", "mock").
    fn name(&self) -> &str;

    /// Send a request and block until the complete response arrives.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ModelError>;
}
