//! The Codesmith agent loop.
//!
//! One polymorphic turn loop drives every session: build the prompt from
//! history and the latest observation, call the model through the gateway,
//! parse the strict `<THOUGHT>`/`<COMMAND>` response, dispatch the action,
//! fold the result back in, and decide termination. Session-facing effects
//! (pause/stop, interrupts, user replies, event recording) go through the
//! [`LoopControl`] trait so agent variants are configuration, not separate
//! code paths — and so tests can drive the loop without a session.

pub mod control;
pub mod editor;
pub mod prompt;
pub mod recovery;
pub mod runner;

pub use control::{ControlSignal, LoopControl};
pub use editor::{EditorView, PAGE_SIZE, PageView, paginate};
pub use prompt::PromptBuilder;
pub use recovery::{RecoveryConfig, StuckLoopDetector};
pub use runner::{AgentLoop, LoopConfig, LoopOutcome};
