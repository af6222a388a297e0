//! # Codesmith Core
//!
//! Domain types, traits, and error definitions for the Codesmith coding-agent
//! runtime. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod action;
pub mod command;
pub mod error;
pub mod event;
pub mod message;
pub mod model;

// Re-export key types at crate root for ergonomics
pub use action::Action;
pub use command::{Command, CommandOutput, CommandRegistry};
pub use error::{CommandError, Error, ModelError, ProtocolError, Result, SessionError, StoreError};
pub use event::{Event, EventKind, EventLog};
pub use message::{History, Message, Role};
pub use model::{ChatRequest, ChatResponse, ModelClient, Usage};
