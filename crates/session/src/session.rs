//! One session: an agent loop bound to a workspace, with lifecycle.

use crate::control::SessionControl;
use crate::reply::ReplySlot;
use chrono::{DateTime, Utc};
use codesmith_agent::{AgentLoop, LoopConfig, LoopControl};
use codesmith_core::command::CommandRegistry;
use codesmith_core::error::SessionError;
use codesmith_core::event::{Event, EventKind, EventLog};
use codesmith_core::message::{History, Message};
use codesmith_core::model::ModelClient;
use codesmith_model::{ModelGateway, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Session lifecycle states.
///
/// `Created → Running ⇄ Paused → …; Running|Paused → Stopped (terminal)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Created,
    Running,
    Paused,
    Stopped,
}

/// Everything needed to build an agent loop for a session.
#[derive(Clone)]
pub struct AgentSpec {
    /// The inference backend.
    pub client: Arc<dyn ModelClient>,

    /// Retry policy for the model gateway.
    pub retry: RetryPolicy,

    /// Loop configuration (model, temperature, step budget, recovery).
    pub config: LoopConfig,
}

/// A serialized view of a session for the state-snapshot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub workspace: String,
    pub task: String,
    pub state: LifecycleState,
    pub created_at: DateTime<Utc>,
    pub event_count: usize,
    pub event_generation: u64,
    pub history: Vec<Message>,
}

/// One agent loop bound to one workspace.
///
/// The session exclusively owns its history, event log, and background
/// task. History is mutated only by the loop; the lock exists so snapshots
/// can read it concurrently.
pub struct Session {
    id: String,
    workspace: PathBuf,
    task_text: String,
    spec: AgentSpec,
    registry: Arc<CommandRegistry>,
    history: Arc<RwLock<History>>,
    events: Arc<EventLog>,
    state: watch::Sender<LifecycleState>,
    interrupts: Arc<Mutex<VecDeque<String>>>,
    reply: Arc<ReplySlot>,
    runner: AsyncMutex<Option<JoinHandle<()>>>,
    created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("workspace", &self.workspace)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session in the `Created` state.
    ///
    /// The workspace directory must already exist.
    pub fn new(
        id: impl Into<String>,
        workspace: PathBuf,
        task: impl Into<String>,
        spec: AgentSpec,
    ) -> Result<Self, SessionError> {
        let id = id.into();
        let task_text = task.into();

        if !workspace.is_dir() {
            return Err(SessionError::WorkspaceMissing(
                workspace.display().to_string(),
            ));
        }

        let (state, _) = watch::channel(LifecycleState::Created);
        let events = Arc::new(EventLog::new());
        events.append(Event::new(EventKind::Task, &task_text, "client", "agent"));

        let registry = Arc::new(codesmith_commands::default_registry(&workspace));

        info!(session = %id, workspace = %workspace.display(), "Session created");

        Ok(Self {
            id,
            workspace,
            task_text,
            spec,
            registry,
            history: Arc::new(RwLock::new(History::new())),
            events,
            state,
            interrupts: Arc::new(Mutex::new(VecDeque::new())),
            reply: Arc::new(ReplySlot::new()),
            runner: AsyncMutex::new(None),
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn workspace(&self) -> &PathBuf {
        &self.workspace
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// The session's event log.
    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    /// Start or resume the loop.
    ///
    /// Idempotent with respect to task spawning: a second `start` while
    /// running is a conflict and never spawns a duplicate loop. Resuming a
    /// paused session with a live task only flips the state back.
    pub async fn start(self: &Arc<Self>) -> Result<(), SessionError> {
        let mut runner = self.runner.lock().await;

        match self.state() {
            LifecycleState::Stopped => return Err(SessionError::Stopped(self.id.clone())),
            LifecycleState::Running => return Err(SessionError::AlreadyRunning(self.id.clone())),
            LifecycleState::Created | LifecycleState::Paused => {}
        }

        if let Some(handle) = runner.as_ref() {
            if !handle.is_finished() {
                // Live but paused task: resume without spawning
                self.state.send_replace(LifecycleState::Running);
                debug!(session = %self.id, "Session resumed");
                return Ok(());
            }
        }

        self.state.send_replace(LifecycleState::Running);
        let session = Arc::clone(self);
        let handle = tokio::spawn(async move {
            session.drive().await;
        });
        *runner = Some(handle);
        info!(session = %self.id, "Session started");
        Ok(())
    }

    /// Run the loop to completion and settle the terminal state.
    async fn drive(self: Arc<Self>) {
        let gateway =
            ModelGateway::new(self.spec.client.clone()).with_policy(self.spec.retry.clone());
        let agent = AgentLoop::new(
            gateway,
            self.registry.clone(),
            self.spec.config.clone(),
            self.workspace.clone(),
        );
        let control: Arc<dyn LoopControl> = Arc::new(SessionControl {
            events: self.events.clone(),
            state: self.state.clone(),
            interrupts: self.interrupts.clone(),
            reply: self.reply.clone(),
        });

        let outcome = agent
            .run(self.task_text.clone(), self.history.clone(), control)
            .await;

        // On a client-requested stop the Stop event is already in the log
        // and the state already terminal.
        if outcome.verb != "stop" {
            self.events.append(Event::new(
                EventKind::Stop,
                format!("session ended: {} ({})", outcome.verb, outcome.detail),
                "agent",
                "client",
            ));
            self.state.send_replace(LifecycleState::Stopped);
        }
        info!(
            session = %self.id,
            verb = %outcome.verb,
            steps = outcome.steps,
            "Session loop finished"
        );
    }

    /// Suspend further model calls; history and events stay intact.
    pub fn pause(&self) -> Result<(), SessionError> {
        if self.state() == LifecycleState::Stopped {
            return Err(SessionError::Stopped(self.id.clone()));
        }
        self.state.send_replace(LifecycleState::Paused);
        debug!(session = %self.id, "Session paused");
        Ok(())
    }

    /// Enqueue an out-of-band interrupt.
    ///
    /// Interrupts are data, not signals: the loop consumes them at its next
    /// prompt-construction step, ahead of the pending observation.
    pub fn interrupt(&self, message: impl Into<String>) -> Result<(), SessionError> {
        if self.state() == LifecycleState::Stopped {
            return Err(SessionError::Stopped(self.id.clone()));
        }
        let message = message.into();
        self.events.append(Event::new(
            EventKind::Interrupt,
            &message,
            "client",
            "agent",
        ));
        self.interrupts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(message);
        Ok(())
    }

    /// Deliver a user reply to a pending (or future) `ask_user`.
    pub fn post_response(&self, text: impl Into<String>) -> Result<(), SessionError> {
        if self.state() == LifecycleState::Stopped {
            return Err(SessionError::Stopped(self.id.clone()));
        }
        self.reply.fulfill(text.into());
        Ok(())
    }

    /// Request a stop. Terminal, idempotent; the running task observes it
    /// at its next suspension point. The Stop event is always the last
    /// entry in the log.
    pub fn stop(&self) -> Result<(), SessionError> {
        if self.state() == LifecycleState::Stopped {
            return Ok(());
        }
        // State flips first so nothing can be recorded after the Stop event
        self.state.send_replace(LifecycleState::Stopped);
        self.events
            .append(Event::new(EventKind::Stop, "stop requested", "client", "agent"));
        info!(session = %self.id, "Session stop requested");
        Ok(())
    }

    /// Clear history and events back to the creation state, keeping the
    /// session's identity and workspace binding. Leaves the state `Paused`.
    pub async fn reset(&self) {
        let mut runner = self.runner.lock().await;
        if let Some(handle) = runner.take() {
            handle.abort();
        }
        self.state.send_replace(LifecycleState::Paused);
        self.history.write().await.clear();
        self.interrupts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.reply.clear();
        self.events.reset();
        self.events
            .append(Event::new(EventKind::Task, &self.task_text, "client", "agent"));
        info!(session = %self.id, "Session reset");
    }

    /// Wait for the background task to finish, if one is running.
    pub async fn join(&self) {
        let handle = self.runner.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Serialized state for the snapshot endpoint.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let history = self.history.read().await;
        SessionSnapshot {
            id: self.id.clone(),
            workspace: self.workspace.display().to_string(),
            task: self.task_text.clone(),
            state: self.state(),
            created_at: self.created_at,
            event_count: self.events.len(),
            event_generation: self.events.generation(),
            history: history.messages().to_vec(),
        }
    }
}
