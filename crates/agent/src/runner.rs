//! The turn-taking loop.

use crate::control::{ControlSignal, LoopControl};
use crate::editor::EditorView;
use crate::prompt::PromptBuilder;
use crate::recovery::{REFLECTIVE_THOUGHT, RecoveryConfig, StuckLoopDetector};
use codesmith_core::command::CommandRegistry;
use codesmith_core::error::{CommandError, ModelError};
use codesmith_core::event::{Event, EventKind};
use codesmith_core::message::{History, Message, Role};
use codesmith_core::model::ChatRequest;
use codesmith_model::ModelGateway;
use codesmith_protocol::{parse_response, tokenize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Verbs that end the loop.
const TERMINAL_VERBS: [&str; 2] = ["submit", "exit"];

/// Configuration for one agent loop instance.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Model name passed through to the gateway.
    pub model: String,

    /// Initial sampling temperature.
    pub temperature: f32,

    /// Max tokens per model response.
    pub max_tokens: Option<u32>,

    /// Step budget: maximum model calls before a forced submit.
    pub max_steps: u32,

    /// Stuck-loop recovery tunables.
    pub recovery: RecoveryConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            temperature: 0.0,
            max_tokens: Some(4096),
            max_steps: 50,
            recovery: RecoveryConfig::default(),
        }
    }
}

/// How a loop run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    /// The terminal verb: `submit`, `exit`, `exit_api`, `exit_error`, or
    /// `stop` when the host halted the loop.
    pub verb: String,

    /// The last thought the model produced.
    pub thought: String,

    /// Human-readable detail (submit summary, diagnostic, ...).
    pub detail: String,

    /// Model calls actually made.
    pub steps: u32,
}

/// The agent loop: one instance per running session task.
///
/// Turns execute strictly sequentially; the loop suspends only inside the
/// gateway round trip and while awaiting a user reply. Every per-turn
/// failure is converted to either a continuing observation or a graceful
/// terminal outcome — nothing escapes `run` as a panic or error.
pub struct AgentLoop {
    gateway: ModelGateway,
    registry: Arc<CommandRegistry>,
    config: LoopConfig,
    prompts: PromptBuilder,
    editor: EditorView,
    workspace: PathBuf,
}

impl AgentLoop {
    pub fn new(
        gateway: ModelGateway,
        registry: Arc<CommandRegistry>,
        config: LoopConfig,
        workspace: PathBuf,
    ) -> Self {
        let prompts = PromptBuilder::new(&registry);
        let editor = EditorView::new(workspace.clone());
        Self {
            gateway,
            registry,
            config,
            prompts,
            editor,
            workspace,
        }
    }

    /// Drive the loop until a terminal verb, budget exhaustion, or stop.
    pub async fn run(
        mut self,
        task: String,
        history: Arc<RwLock<History>>,
        control: Arc<dyn LoopControl>,
    ) -> LoopOutcome {
        let system_prompt = self.prompts.system_prompt();
        {
            let mut h = history.write().await;
            if !h.starts_with_system() {
                h.set_system(&system_prompt);
            }
        }

        let detector = StuckLoopDetector::new(self.config.recovery.clone());
        let cwd = self.workspace.display().to_string();
        let mut temperature = self.config.temperature;
        let mut observation: Option<String> = None;
        let mut last_thought = String::new();
        let mut steps: u32 = 0;

        info!(model = %self.config.model, max_steps = self.config.max_steps, "Agent loop starting");

        loop {
            if control.checkpoint().await == ControlSignal::Stop {
                debug!(steps, "Loop observed stop at checkpoint");
                return LoopOutcome {
                    verb: "stop".into(),
                    thought: last_thought,
                    detail: "stopped by request".into(),
                    steps,
                };
            }

            // Budget check precedes the model call so a zero budget still
            // produces exactly one forced submit.
            if steps >= self.config.max_steps {
                warn!(steps, "Step budget exhausted, forcing submit");
                let thought = if last_thought.is_empty() {
                    "Step budget exhausted before any turn completed.".to_string()
                } else {
                    last_thought
                };
                control.record(Event::new(
                    EventKind::Command,
                    "submit (forced: step budget exhausted)",
                    "agent",
                    "client",
                ));
                return LoopOutcome {
                    verb: "submit".into(),
                    thought,
                    detail: "step budget exhausted".into(),
                    steps,
                };
            }
            steps += 1;

            // Interrupts pre-empt the pending observation; the observation
            // still rides along below it so nothing is lost.
            let turn_observation = match control.take_interrupt() {
                Some(msg) => {
                    debug!("Consuming interrupt as next observation");
                    match observation.take() {
                        Some(obs) => Some(format!("[interrupt] {msg}\n\n{obs}")),
                        None => Some(format!("[interrupt] {msg}")),
                    }
                }
                None => observation.take(),
            };

            let user_prompt = self.prompts.user_prompt(
                &task,
                turn_observation.as_deref(),
                &self.editor.render(),
                &cwd,
            );

            {
                let mut h = history.write().await;
                h.push(Message::user(&user_prompt));

                if detector.is_stuck(&h) {
                    let old = temperature;
                    temperature = detector.bump_temperature(temperature);
                    let dropped = h.truncate_tail(detector.config().truncate);
                    let mut reflective = Message::assistant(REFLECTIVE_THOUGHT);
                    reflective.thought = Some(REFLECTIVE_THOUGHT.into());
                    h.push(reflective);
                    h.push(Message::user(&user_prompt));
                    warn!(
                        dropped,
                        old_temperature = old,
                        new_temperature = temperature,
                        "Stuck-loop recovery triggered"
                    );
                    control.record(Event::new(
                        EventKind::Status,
                        format!(
                            "stuck-loop recovery: dropped {dropped} history entries, temperature {old:.2} -> {temperature:.2}"
                        ),
                        "agent",
                        "client",
                    ));
                }
            }

            let request = {
                let h = history.read().await;
                ChatRequest {
                    model: self.config.model.clone(),
                    system: system_prompt.clone(),
                    messages: h
                        .messages()
                        .iter()
                        .filter(|m| m.role != Role::System)
                        .cloned()
                        .collect(),
                    temperature,
                    max_tokens: self.config.max_tokens,
                    stop: vec![],
                }
            };

            let response = match self.gateway.query(request).await {
                Ok(response) => response,
                Err(e) => {
                    let verb = match e {
                        ModelError::RetriesExhausted { .. } => "exit_api",
                        _ => "exit_error",
                    };
                    let detail = format!("Model call failed: {e}");
                    warn!(error = %e, verb, "Ending session on model failure");
                    control.record(Event::new(EventKind::Error, &detail, "agent", "client"));
                    control.record(Event::new(EventKind::Command, verb, "agent", "client"));
                    history.write().await.push(Message::assistant_turn(
                        &detail,
                        last_thought.clone(),
                        verb,
                    ));
                    return LoopOutcome {
                        verb: verb.into(),
                        thought: last_thought,
                        detail,
                        steps,
                    };
                }
            };

            // Parse failures are never fatal: surface a corrective
            // observation and re-prompt.
            let parsed = match parse_response(&response.content) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(error = %e, "Malformed model response");
                    control.record(Event::new(
                        EventKind::Error,
                        format!("malformed response: {e}"),
                        "agent",
                        "client",
                    ));
                    history.write().await.push(Message::assistant(&response.content));
                    observation = Some(format!(
                        "Your last response could not be processed: {e}. Respond with \
                         exactly one <THOUGHT> block and one <COMMAND> block containing \
                         a single command."
                    ));
                    continue;
                }
            };
            last_thought = parsed.thought.clone();

            let action = match tokenize(&parsed.command) {
                Ok(action) => action,
                Err(e) => {
                    warn!(error = %e, command = %parsed.command, "Command failed to tokenize");
                    control.record(Event::new(
                        EventKind::Error,
                        format!("malformed command: {e}"),
                        "agent",
                        "client",
                    ));
                    history.write().await.push(Message::assistant_turn(
                        &response.content,
                        &parsed.thought,
                        &parsed.command,
                    ));
                    observation = Some(format!(
                        "Your command could not be tokenized: {e}. Check quoting and raw blocks."
                    ));
                    continue;
                }
            };

            control.record(Event::new(
                EventKind::Thought,
                &parsed.thought,
                "agent",
                "client",
            ));
            control.record(Event::new(
                EventKind::Command,
                action.to_string(),
                "agent",
                "client",
            ));
            history.write().await.push(Message::assistant_turn(
                &response.content,
                &parsed.thought,
                &parsed.command,
            ));

            if TERMINAL_VERBS.contains(&action.verb.as_str()) {
                let detail = action.args.first().cloned().unwrap_or_default();
                info!(verb = %action.verb, steps, "Loop reached terminal action");
                control.record(Event::new(
                    EventKind::ToolResult,
                    if detail.is_empty() {
                        "Session complete.".to_string()
                    } else {
                        detail.clone()
                    },
                    "agent",
                    "client",
                ));
                return LoopOutcome {
                    verb: action.verb,
                    thought: last_thought,
                    detail,
                    steps,
                };
            }

            if action.verb == "ask_user" {
                let question = action
                    .args
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "The agent requests your input.".into());
                control.record(Event::new(
                    EventKind::Status,
                    format!("awaiting user response: {question}"),
                    "agent",
                    "client",
                ));
                match control.await_reply().await {
                    Some(reply) => {
                        control.record(Event::new(EventKind::Response, &reply, "user", "agent"));
                        observation = Some(format!("User replied: {reply}"));
                    }
                    None => {
                        debug!("Stopped while awaiting user reply");
                        return LoopOutcome {
                            verb: "stop".into(),
                            thought: last_thought,
                            detail: "stopped while awaiting user response".into(),
                            steps,
                        };
                    }
                }
                continue;
            }

            let obs = match self.registry.dispatch(&action).await {
                Ok(output) => {
                    if action.verb == "open" && output.success {
                        if let Some(path) = action.args.first() {
                            let page = action
                                .args
                                .get(1)
                                .and_then(|p| p.parse().ok())
                                .unwrap_or(1);
                            self.editor.open(path, page);
                        }
                    }
                    output.content
                }
                Err(CommandError::UnknownCommand(verb)) => {
                    format!("function not found: {verb}")
                }
                Err(e) => format!("Error: {e}"),
            };
            control.record(Event::new(EventKind::ToolResult, &obs, "environment", "agent"));
            observation = Some(obs);
        }
    }
}
