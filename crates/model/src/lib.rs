//! Model gateway and client implementations for Codesmith.
//!
//! The gateway wraps any `ModelClient` with the runtime's retry policy:
//! transient provider failures are retried with exponential backoff, and a
//! small error taxonomy separates "retry exhausted" from "infrastructure
//! broken" so the agent loop can end a session gracefully either way.

mod gateway;
mod openai_compat;

pub use gateway::{ModelGateway, RetryPolicy};
pub use openai_compat::OpenAiCompatClient;
