//! The user-reply side channel.
//!
//! One pending `ask_user` request per session, satisfied exactly once, with
//! no busy-waiting: the loop arms the slot and awaits a oneshot; the server
//! fulfills it. A reply posted before the loop asks is buffered
//! (last-write-wins) and delivered the moment the slot is armed.

use std::sync::Mutex;
use tokio::sync::oneshot;

enum ReplyState {
    Idle,
    Waiting(oneshot::Sender<String>),
    Ready(String),
}

/// A single-slot reply channel keyed to one session.
pub struct ReplySlot {
    inner: Mutex<ReplyState>,
}

impl ReplySlot {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ReplyState::Idle),
        }
    }

    /// Arm the slot for one pending request and return the receiver.
    ///
    /// If a reply was already buffered, the receiver resolves immediately.
    /// Arming replaces any previously armed (now stale) request.
    pub fn arm(&self) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match std::mem::replace(&mut *inner, ReplyState::Idle) {
            ReplyState::Ready(text) => {
                let _ = tx.send(text);
            }
            _ => {
                *inner = ReplyState::Waiting(tx);
            }
        }
        rx
    }

    /// Deliver a reply: to the pending request if one is armed, otherwise
    /// into the buffer (replacing any earlier unconsumed reply).
    pub fn fulfill(&self, text: String) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match std::mem::replace(&mut *inner, ReplyState::Idle) {
            ReplyState::Waiting(tx) => {
                let _ = tx.send(text);
            }
            _ => {
                *inner = ReplyState::Ready(text);
            }
        }
    }

    /// Drop any pending request or buffered reply.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *inner = ReplyState::Idle;
    }
}

impl Default for ReplySlot {
    fn default() -> Self {
        Self::new()
    }
}
