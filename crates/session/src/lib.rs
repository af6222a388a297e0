//! Session management for Codesmith.
//!
//! A `Session` binds one agent loop to one workspace: it owns the
//! conversation history, the append-only event log, the lifecycle state
//! machine (`Created → Running ⇄ Paused → …; → Stopped`), and the
//! cancellable background task that drives the loop. Sessions are fully
//! isolated from each other; the only shared structure is the explicit
//! `SessionRegistry` the server layer holds.

mod control;
mod registry;
mod reply;
mod session;

pub use registry::SessionRegistry;
pub use reply::ReplySlot;
pub use session::{AgentSpec, LifecycleState, Session, SessionSnapshot};
