//! Bridges the agent loop's capability surface onto session state.

use crate::reply::ReplySlot;
use crate::session::LifecycleState;
use async_trait::async_trait;
use codesmith_agent::{ControlSignal, LoopControl};
use codesmith_core::event::{Event, EventLog};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::debug;

pub(crate) struct SessionControl {
    pub events: Arc<EventLog>,
    pub state: watch::Sender<LifecycleState>,
    pub interrupts: Arc<Mutex<VecDeque<String>>>,
    pub reply: Arc<ReplySlot>,
}

#[async_trait]
impl LoopControl for SessionControl {
    async fn checkpoint(&self) -> ControlSignal {
        let mut rx = self.state.subscribe();
        match rx
            .wait_for(|s| matches!(*s, LifecycleState::Running | LifecycleState::Stopped))
            .await
        {
            Ok(state) if *state == LifecycleState::Stopped => ControlSignal::Stop,
            Ok(_) => ControlSignal::Continue,
            // Sender dropped: the session is being torn down
            Err(_) => ControlSignal::Stop,
        }
    }

    fn take_interrupt(&self) -> Option<String> {
        self.interrupts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    async fn await_reply(&self) -> Option<String> {
        let rx = self.reply.arm();
        let mut state = self.state.subscribe();
        tokio::select! {
            reply = rx => reply.ok(),
            _ = state.wait_for(|s| *s == LifecycleState::Stopped) => None,
        }
    }

    fn record(&self, event: Event) {
        // A Stop event is always the log's last entry: anything the
        // in-flight turn tries to record after a stop request is dropped.
        if *self.state.borrow() == LifecycleState::Stopped {
            debug!(kind = ?event.kind, "Dropping event recorded after stop");
            return;
        }
        self.events.append(event);
    }
}
