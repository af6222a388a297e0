//! HTTP API gateway for Codesmith.
//!
//! Exposes the session-control surface: create/start/pause/interrupt/stop/
//! reset/delete sessions, post user responses, fetch state snapshots, and
//! read the event log — in full or as a live SSE stream.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::{Router, routing::get};
use codesmith_agent::{LoopConfig, RecoveryConfig};
use codesmith_config::AppConfig;
use codesmith_model::{OpenAiCompatClient, RetryPolicy};
use codesmith_session::{AgentSpec, SessionRegistry};
use codesmith_store::StateStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Shared application state for the gateway.
pub struct GatewayState {
    /// The explicit session registry — the only cross-session structure.
    pub sessions: Arc<SessionRegistry>,

    /// Template for new sessions' agent loops.
    pub spec: AgentSpec,

    /// Optional persisted session metadata.
    pub store: Option<Arc<StateStore>>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api::v1_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Map config sections onto the agent loop configuration.
pub fn loop_config_from(config: &AppConfig) -> LoopConfig {
    LoopConfig {
        model: config.model.clone(),
        temperature: config.temperature,
        max_tokens: Some(config.max_tokens),
        max_steps: config.agent.max_steps,
        recovery: RecoveryConfig {
            enabled: config.agent.recovery.enabled,
            window: config.agent.recovery.window,
            truncate: config.agent.recovery.truncate,
            temperature_step: config.agent.recovery.temperature_step,
            max_temperature: config.agent.recovery.max_temperature,
            ..RecoveryConfig::default()
        },
    }
}

/// Map config retry settings onto the gateway retry policy.
pub fn retry_policy_from(config: &AppConfig) -> RetryPolicy {
    RetryPolicy {
        max_attempts: config.retry.max_attempts,
        base_delay: Duration::from_millis(config.retry.base_delay_ms),
        max_delay: Duration::from_millis(config.retry.max_delay_ms),
    }
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or("No API key configured — set CODESMITH_API_KEY or api_key in config.toml")?;

    let client = Arc::new(OpenAiCompatClient::new(
        &config.provider,
        &config.base_url,
        api_key,
    )?);

    let spec = AgentSpec {
        client,
        retry: retry_policy_from(&config),
        config: loop_config_from(&config),
    };

    let store = if config.store.enabled {
        Some(Arc::new(StateStore::open(config.store_path())))
    } else {
        None
    };

    let state = Arc::new(GatewayState {
        sessions: Arc::new(SessionRegistry::new()),
        spec,
        store,
    });

    restore_persisted_sessions(&state).await;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Recreate sessions recorded in the state store (in the `Created` state).
///
/// Sessions whose workspace no longer exists are skipped with a warning and
/// dropped from the store.
async fn restore_persisted_sessions(state: &SharedState) {
    let Some(store) = &state.store else {
        return;
    };

    for key in store.keys().await {
        let Some(id) = key.strip_prefix("session:").map(str::to_string) else {
            continue;
        };
        let Some(value) = store.get(&key).await else {
            continue;
        };
        let workspace = value["workspace"].as_str().unwrap_or_default().to_string();
        let task = value["task"].as_str().unwrap_or_default().to_string();

        match state
            .sessions
            .create(
                Some(id.clone()),
                workspace.clone().into(),
                task,
                state.spec.clone(),
            )
            .await
        {
            Ok(_) => info!(session = %id, workspace = %workspace, "Restored persisted session"),
            Err(e) => {
                warn!(session = %id, error = %e, "Dropping unrestorable persisted session");
                let _ = store.remove(&key).await;
            }
        }
    }
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(api::tests::test_state());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn persisted_sessions_restored_on_start() {
        let dir = tempfile::tempdir().unwrap();
        let ws = dir.path().join("ws");
        std::fs::create_dir(&ws).unwrap();

        let store = Arc::new(StateStore::open(dir.path().join("state.jsonl")));
        store
            .put(
                "session:restored",
                serde_json::json!({"workspace": ws.display().to_string(), "task": "resume me"}),
            )
            .await
            .unwrap();
        store
            .put(
                "session:gone",
                serde_json::json!({"workspace": "/no/such/dir", "task": "lost"}),
            )
            .await
            .unwrap();

        let state = Arc::new(GatewayState {
            sessions: Arc::new(SessionRegistry::new()),
            spec: api::tests::test_spec(),
            store: Some(store.clone()),
        });

        restore_persisted_sessions(&state).await;

        assert_eq!(state.sessions.list().await, vec!["restored".to_string()]);
        // The unrestorable entry was dropped from the store
        assert!(store.get("session:gone").await.is_none());
        assert!(store.get("session:restored").await.is_some());
    }
}
