//! Bounded retry over a model client.

use codesmith_core::error::ModelError;
use codesmith_core::model::{ChatRequest, ChatResponse, ModelClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for transient provider failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1).
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles per attempt after that.
    pub base_delay: Duration,

    /// Ceiling for the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before the given attempt (attempts are 1-based;
    /// attempt 1 has no delay).
    fn delay_before(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(2).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exp);
        delay.min(self.max_delay)
    }
}

/// Wraps the opaque inference capability with retry policy and error
/// classification.
///
/// `query` blocks for the duration of the round trip(s). Transient errors
/// (rate limit, timeout, network, 5xx) are retried up to the policy's
/// budget; exhaustion surfaces `ModelError::RetriesExhausted` exactly once.
/// Non-transient errors pass through unchanged on the first occurrence.
pub struct ModelGateway {
    client: Arc<dyn ModelClient>,
    policy: RetryPolicy,
}

impl ModelGateway {
    /// Create a gateway with the default retry policy.
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
        }
    }

    /// Override the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The wrapped client's name.
    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    /// Send a request, retrying transient failures.
    pub async fn query(&self, request: ChatRequest) -> Result<ChatResponse, ModelError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<ModelError> = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.policy.delay_before(attempt);
                debug!(
                    client = %self.client.name(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying model call after transient failure"
                );
                tokio::time::sleep(delay).await;
            }

            match self.client.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() => {
                    warn!(
                        client = %self.client.name(),
                        attempt,
                        error = %e,
                        "Transient model error"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(ModelError::RetriesExhausted {
            attempts,
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".into()),
        })
    }
}
