//! Session event log — ordered, append-only, streamable.
//!
//! Every session keeps a legible trace of what was attempted: tasks,
//! thoughts, commands, tool results, interrupts, stops, errors. Streaming
//! consumers hold a cursor (the log length at their last read) and wait on a
//! watch channel for growth; the log never mutates or reorders an entry once
//! appended.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

/// The kind of a session event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A task was assigned to the session
    Task,
    /// The model's reasoning for a turn
    Thought,
    /// The command the model chose to run
    Command,
    /// The observation produced by dispatching a command
    ToolResult,
    /// An out-of-band message that pre-empts the next observation
    Interrupt,
    /// A user reply to an `ask_user` request
    Response,
    /// The session was told to halt, or halted itself
    Stop,
    /// A turn-level failure (malformed output, exhausted retries, ...)
    Error,
    /// Lifecycle and housekeeping notices
    Status,
}

/// An immutable record in a session's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// What happened
    pub kind: EventKind,

    /// Event payload text
    pub content: String,

    /// Who produced the event (e.g. "client", "agent")
    pub producer: String,

    /// Who the event is addressed to (e.g. "agent", "client")
    pub consumer: String,
}

impl Event {
    /// Create a new event.
    pub fn new(
        kind: EventKind,
        content: impl Into<String>,
        producer: impl Into<String>,
        consumer: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            content: content.into(),
            producer: producer.into(),
            consumer: consumer.into(),
        }
    }
}

/// An append-only, ordered event log with push-based streaming support.
///
/// Appends are cheap synchronous operations; waiting readers are woken
/// through a `watch` channel carrying the log length. Events are shared as
/// `Arc<Event>` so snapshots never copy payloads.
///
/// `reset` is the one sanctioned clear, used only by the session `reset`
/// operation; it bumps a generation counter so streaming clients can detect
/// the discontinuity and restart their cursor.
pub struct EventLog {
    events: RwLock<Vec<Arc<Event>>>,
    len_tx: watch::Sender<usize>,
    generation: AtomicU64,
}

impl EventLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            events: RwLock::new(Vec::new()),
            len_tx,
            generation: AtomicU64::new(0),
        }
    }

    /// Append an event, returning the new log length.
    pub fn append(&self, event: Event) -> usize {
        let mut events = self.events.write().unwrap_or_else(|e| e.into_inner());
        events.push(Arc::new(event));
        let len = events.len();
        drop(events);
        let _ = self.len_tx.send(len);
        len
    }

    /// Current log length — the streaming cursor.
    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Generation counter, bumped on every `reset`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// All events from the start, in order.
    pub fn snapshot(&self) -> Vec<Arc<Event>> {
        self.events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Events appended after the given cursor, in order.
    pub fn since(&self, cursor: usize) -> Vec<Arc<Event>> {
        let events = self.events.read().unwrap_or_else(|e| e.into_inner());
        if cursor >= events.len() {
            return Vec::new();
        }
        events[cursor..].to_vec()
    }

    /// Wait until the log is longer than `cursor`.
    ///
    /// Returns immediately if it already is. Resilient to the log growing
    /// between the check and the wait.
    pub async fn wait_past(&self, cursor: usize) {
        let mut rx = self.len_tx.subscribe();
        // wait_for checks the current value before suspending
        let _ = rx.wait_for(|len| *len > cursor).await;
    }

    /// Clear the log and bump the generation counter.
    ///
    /// Only the session `reset` operation may call this.
    pub fn reset(&self) {
        let mut events = self.events.write().unwrap_or_else(|e| e.into_inner());
        events.clear();
        drop(events);
        self.generation.fetch_add(1, Ordering::Relaxed);
        let _ = self.len_tx.send(0);
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
