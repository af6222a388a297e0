//! Configuration loading, validation, and management for Codesmith.
//!
//! Loads configuration from `~/.codesmith/config.toml` with environment
//! variable overrides. Every setting has a serde default so a missing or
//! partial file still yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(String),

    #[error("failed to parse config file: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
///
/// Maps directly to `~/.codesmith/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider API key. Overridable via `CODESMITH_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider name (for logging and error messages).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// OpenAI-compatible endpoint base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default model.
    #[serde(default = "default_model")]
    pub model: String,

    /// Initial sampling temperature.
    #[serde(default)]
    pub temperature: f32,

    /// Max tokens per model response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Agent loop settings.
    #[serde(default)]
    pub agent: AgentSettings,

    /// Model gateway retry settings.
    #[serde(default)]
    pub retry: RetrySettings,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Persisted state settings.
    #[serde(default)]
    pub store: StoreSettings,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_max_tokens() -> u32 {
    4096
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Step budget: maximum model calls per session run.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Stuck-loop recovery tunables.
    #[serde(default)]
    pub recovery: RecoverySettings,
}

fn default_max_steps() -> u32 {
    50
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            recovery: RecoverySettings::default(),
        }
    }
}

/// Stuck-loop recovery tunables (see the agent crate for semantics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverySettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_window")]
    pub window: usize,

    #[serde(default = "default_truncate")]
    pub truncate: usize,

    #[serde(default = "default_temperature_step")]
    pub temperature_step: f32,

    #[serde(default = "default_max_temperature")]
    pub max_temperature: f32,
}

fn default_true() -> bool {
    true
}
fn default_window() -> usize {
    3
}
fn default_truncate() -> usize {
    6
}
fn default_temperature_step() -> f32 {
    0.1
}
fn default_max_temperature() -> f32 {
    1.0
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window: default_window(),
            truncate: default_truncate(),
            temperature_step: default_temperature_step(),
            max_temperature: default_max_temperature(),
        }
    }
}

/// Model gateway retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8315
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Persisted state settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Whether session metadata persists across restarts.
    #[serde(default)]
    pub enabled: bool,

    /// State file path; defaults to `~/.codesmith/state.jsonl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: None,
        }
    }
}

impl AppConfig {
    /// Load from the default location with environment overrides.
    ///
    /// A missing file yields the defaults — onboarding writes the scaffold
    /// separately.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_dir().join("config.toml");
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path (no environment overrides).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("CODESMITH_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("CODESMITH_BASE_URL") {
            if !url.is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(model) = std::env::var("CODESMITH_MODEL") {
            if !model.is_empty() {
                self.model = model;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be in [0.0, 2.0], got {}",
                self.temperature
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Configuration directory: `~/.codesmith`.
    pub fn config_dir() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".codesmith")
    }

    /// Resolved state file path.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("state.jsonl"))
    }

    /// Whether an API key is configured (file or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Scaffold written by `codesmith init`.
    pub fn default_toml() -> String {
        r#"# Codesmith configuration

# api_key = "sk-..."            # or set CODESMITH_API_KEY
provider = "openai"
base_url = "https://api.openai.com/v1"
model = "gpt-4o"
temperature = 0.0
max_tokens = 4096

[agent]
max_steps = 50

[agent.recovery]
enabled = true
window = 3
truncate = 6
temperature_step = 0.1
max_temperature = 1.0

[retry]
max_attempts = 3
base_delay_ms = 500
max_delay_ms = 8000

[server]
host = "127.0.0.1"
port = 8315

[store]
enabled = false
"#
        .to_string()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            agent: AgentSettings::default(),
            retry: RetrySettings::default(),
            server: ServerSettings::default(),
            store: StoreSettings::default(),
        }
    }
}

// Redact the API key from debug output.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("agent", &self.agent)
            .field("retry", &self.retry)
            .field("server", &self.server)
            .field("store", &self.store)
            .finish()
    }
}
