//! Stuck-loop detection and escape.
//!
//! When the model keeps attempting the same failing file edit, letting it
//! grind on rarely converges. The escape is heuristic, not a correctness
//! guarantee: drop the repetitive tail of the conversation, nudge the
//! sampling temperature up, and hand the model a reflective thought in
//! place of the discarded content. Every threshold is a tunable, and the
//! whole heuristic can be disabled.

use codesmith_core::message::History;
use serde::{Deserialize, Serialize};

/// Thought injected in place of the truncated tail.
pub const REFLECTIVE_THOUGHT: &str =
    "My recent file edits kept failing the same way. I am discarding that \
     approach and will try a different strategy.";

/// Tunables for the stuck-loop escape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Master switch; tests that script exact histories turn this off.
    pub enabled: bool,

    /// Substring that identifies a failed-edit observation.
    pub marker: String,

    /// Consecutive marker-carrying user turns that trigger the escape.
    pub window: usize,

    /// History entries dropped from the tail on trigger.
    pub truncate: usize,

    /// Temperature increment per trigger.
    pub temperature_step: f32,

    /// Temperature ceiling.
    pub max_temperature: f32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker: "File write failed".into(),
            window: 3,
            truncate: 6,
            temperature_step: 0.1,
            max_temperature: 1.0,
        }
    }
}

/// Detects the repeated-edit-failure pattern in typed history entries.
pub struct StuckLoopDetector {
    config: RecoveryConfig,
}

impl StuckLoopDetector {
    pub fn new(config: RecoveryConfig) -> Self {
        Self { config }
    }

    /// True when the most recent `window` user turns all carry the marker.
    pub fn is_stuck(&self, history: &History) -> bool {
        if !self.config.enabled {
            return false;
        }
        let recent = history.last_user_contents(self.config.window);
        recent.len() == self.config.window
            && recent.iter().all(|c| c.contains(&self.config.marker))
    }

    /// Temperature after one escalation step.
    pub fn bump_temperature(&self, current: f32) -> f32 {
        (current + self.config.temperature_step).min(self.config.max_temperature)
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }
}
