//! `codesmith run` — Drive one local session to completion.
//!
//! Runs the agent loop directly, without the session server: events print
//! to the terminal, and `ask_user` reads a line from stdin.

use async_trait::async_trait;
use codesmith_agent::{AgentLoop, ControlSignal, LoopControl};
use codesmith_config::AppConfig;
use codesmith_core::event::{Event, EventKind};
use codesmith_core::message::History;
use codesmith_gateway::{loop_config_from, retry_policy_from};
use codesmith_model::{ModelGateway, OpenAiCompatClient};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Prints events and reads `ask_user` replies from stdin.
struct TerminalControl;

#[async_trait]
impl LoopControl for TerminalControl {
    async fn checkpoint(&self) -> ControlSignal {
        ControlSignal::Continue
    }

    fn take_interrupt(&self) -> Option<String> {
        None
    }

    async fn await_reply(&self) -> Option<String> {
        tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .ok()
                .map(|_| line.trim().to_string())
        })
        .await
        .ok()
        .flatten()
    }

    fn record(&self, event: Event) {
        match event.kind {
            EventKind::Thought => println!("· {}", event.content),
            EventKind::Command => println!("> {}", event.content),
            EventKind::ToolResult => println!("{}", event.content),
            EventKind::Status => println!("[{}]", event.content),
            EventKind::Error => eprintln!("error: {}", event.content),
            _ => {}
        }
    }
}

pub async fn run(
    workspace: PathBuf,
    task: String,
    max_steps: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or("No API key configured — run `codesmith init` and set one")?;

    if !workspace.is_dir() {
        return Err(format!("workspace does not exist: {}", workspace.display()).into());
    }

    let client = Arc::new(OpenAiCompatClient::new(
        &config.provider,
        &config.base_url,
        api_key,
    )?);
    let gateway = ModelGateway::new(client).with_policy(retry_policy_from(&config));

    let mut loop_config = loop_config_from(&config);
    if let Some(max) = max_steps {
        loop_config.max_steps = max;
    }

    let registry = Arc::new(codesmith_commands::default_registry(&workspace));
    let agent = AgentLoop::new(gateway, registry, loop_config, workspace.clone());

    println!("Workspace: {}", workspace.display());
    println!("Task:      {task}\n");

    let history = Arc::new(RwLock::new(History::new()));
    let outcome = agent.run(task, history, Arc::new(TerminalControl)).await;

    println!(
        "\nFinished: {} after {} steps{}",
        outcome.verb,
        outcome.steps,
        if outcome.detail.is_empty() {
            String::new()
        } else {
            format!(" — {}", outcome.detail)
        }
    );
    Ok(())
}
