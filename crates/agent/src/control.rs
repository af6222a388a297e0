//! The capability surface the loop needs from its host.

use async_trait::async_trait;
use codesmith_core::event::Event;

/// What the loop should do after a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Keep running the next turn.
    Continue,
    /// Halt promptly; the host asked for a stop.
    Stop,
}

/// Session-facing effects, abstracted so the loop runs under any host:
/// a full session with lifecycle state, or a bare test harness.
///
/// The loop calls `checkpoint` at the top of every turn — the natural
/// suspension point where pause and stop are observed. `take_interrupt`
/// drains at most one out-of-band message per turn; interrupts are data,
/// not signals. `await_reply` blocks indefinitely for a user reply and
/// resolves to `None` only if the host stops the session while waiting.
#[async_trait]
pub trait LoopControl: Send + Sync {
    /// Observe pause/stop. Blocks while the host is paused.
    async fn checkpoint(&self) -> ControlSignal;

    /// Take the oldest pending interrupt, if any.
    fn take_interrupt(&self) -> Option<String>;

    /// Block until the user replies to an `ask_user` request, or the host
    /// stops the session (`None`).
    async fn await_reply(&self) -> Option<String>;

    /// Append an event to the session's log.
    fn record(&self, event: Event);
}
