//! HTTP API v1 — the session-control surface.
//!
//! Endpoints:
//!
//! - `GET    /v1/sessions`                      — List session ids
//! - `POST   /v1/sessions`                      — Create a session
//! - `POST   /v1/sessions/{id}/start`           — Start or resume
//! - `POST   /v1/sessions/{id}/pause`           — Pause
//! - `POST   /v1/sessions/{id}/response`        — Deliver a user reply
//! - `POST   /v1/sessions/{id}/interrupt`       — Post an interrupt
//! - `POST   /v1/sessions/{id}/stop`            — Stop (terminal)
//! - `POST   /v1/sessions/{id}/reset`           — Clear history/log
//! - `GET    /v1/sessions/{id}/state`           — State snapshot
//! - `GET    /v1/sessions/{id}/events`          — Full event log
//! - `GET    /v1/sessions/{id}/events/stream`   — SSE stream from a cursor
//! - `DELETE /v1/sessions/{id}`                 — Remove the session

use crate::SharedState;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, Sse},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use codesmith_core::error::SessionError;
use codesmith_core::event::{Event, EventKind};
use codesmith_session::{LifecycleState, SessionSnapshot};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/sessions",
            get(list_sessions_handler).post(create_session_handler),
        )
        .route("/sessions/{id}", delete(delete_session_handler))
        .route("/sessions/{id}/start", post(start_session_handler))
        .route("/sessions/{id}/pause", post(pause_session_handler))
        .route("/sessions/{id}/response", post(post_response_handler))
        .route("/sessions/{id}/interrupt", post(post_interrupt_handler))
        .route("/sessions/{id}/stop", post(stop_session_handler))
        .route("/sessions/{id}/reset", post(reset_session_handler))
        .route("/sessions/{id}/state", get(session_state_handler))
        .route("/sessions/{id}/events", get(session_events_handler))
        .route("/sessions/{id}/events/stream", get(stream_events_handler))
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Uniform error mapping: every session-not-found condition is a 404,
/// every lifecycle conflict a 409.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match &e {
            SessionError::NotFound(_) | SessionError::WorkspaceMissing(_) => {
                StatusCode::NOT_FOUND
            }
            SessionError::AlreadyExists(_)
            | SessionError::AlreadyRunning(_)
            | SessionError::Stopped(_) => StatusCode::CONFLICT,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateSessionRequest {
    /// Explicit id; omitted means a generated UUID.
    id: Option<String>,
    workspace: String,
    task: String,
}

#[derive(Serialize)]
struct CreateSessionResponse {
    id: String,
}

#[derive(Serialize)]
struct SessionListResponse {
    sessions: Vec<String>,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

#[derive(Deserialize)]
struct ResponseRequest {
    text: String,
}

#[derive(Deserialize)]
struct InterruptRequest {
    message: String,
}

#[derive(Serialize)]
struct EventsResponse {
    /// Bumped on every session reset; a change invalidates cursors.
    generation: u64,
    events: Vec<Event>,
}

#[derive(Deserialize)]
struct StreamParams {
    cursor: Option<usize>,
}

// ── Session CRUD ──────────────────────────────────────────────────────────

async fn list_sessions_handler(State(state): State<SharedState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.sessions.list().await,
    })
}

async fn create_session_handler(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let session = state
        .sessions
        .create(
            payload.id,
            payload.workspace.clone().into(),
            payload.task.clone(),
            state.spec.clone(),
        )
        .await?;

    let id = session.id().to_string();
    info!(session = %id, workspace = %payload.workspace, "Session created via API");

    if let Some(store) = &state.store {
        let metadata = serde_json::json!({
            "workspace": payload.workspace,
            "task": payload.task,
        });
        if let Err(e) = store.put(format!("session:{id}"), metadata).await {
            warn!(session = %id, error = %e, "Failed to persist session metadata");
        }
    }

    Ok((StatusCode::CREATED, Json(CreateSessionResponse { id })))
}

async fn delete_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.sessions.remove(&id).await?;

    if let Some(store) = &state.store {
        let _ = store.remove(&format!("session:{id}")).await;
    }

    Ok(Json(StatusResponse { status: "deleted" }))
}

// ── Lifecycle ─────────────────────────────────────────────────────────────

async fn start_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    session.start().await?;
    Ok(Json(StatusResponse { status: "running" }))
}

async fn pause_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    session.pause()?;
    Ok(Json(StatusResponse { status: "paused" }))
}

async fn post_response_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<ResponseRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    session.post_response(payload.text)?;
    Ok(Json(StatusResponse { status: "accepted" }))
}

async fn post_interrupt_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<InterruptRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    session.interrupt(payload.message)?;
    Ok(Json(StatusResponse { status: "accepted" }))
}

async fn stop_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    session.stop()?;
    Ok(Json(StatusResponse { status: "stopped" }))
}

async fn reset_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    session.reset().await;
    Ok(Json(StatusResponse { status: "reset" }))
}

// ── State & events ────────────────────────────────────────────────────────

async fn session_state_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = state.sessions.get(&id).await?;
    Ok(Json(session.snapshot().await))
}

async fn session_events_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<EventsResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let events = session
        .events()
        .snapshot()
        .iter()
        .map(|e| (**e).clone())
        .collect();
    Ok(Json(EventsResponse {
        generation: session.events().generation(),
        events,
    }))
}

fn sse_event_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Task => "task",
        EventKind::Thought => "thought",
        EventKind::Command => "command",
        EventKind::ToolResult => "tool_result",
        EventKind::Interrupt => "interrupt",
        EventKind::Response => "response",
        EventKind::Stop => "stop",
        EventKind::Error => "error",
        EventKind::Status => "status",
    }
}

/// `GET /v1/sessions/{id}/events/stream?cursor=N` — lazy, unbounded stream
/// of events appended after the cursor.
///
/// The stream ends once the session is stopped and fully drained; a client
/// reconnecting with its last cursor resumes exactly where it left off.
async fn stream_events_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(params): Query<StreamParams>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let (tx, rx) = mpsc::channel::<std::sync::Arc<Event>>(32);

    tokio::spawn(async move {
        let generation = session.events().generation();
        let mut cursor = params.cursor.unwrap_or(0);
        loop {
            // A reset invalidated every cursor; end the stream so the
            // client reconnects from zero.
            if session.events().generation() != generation {
                break;
            }
            let batch = session.events().since(cursor);
            if batch.is_empty() {
                if session.state() == LifecycleState::Stopped {
                    break;
                }
                // Wake on append; the sleep arm re-checks for a stop that
                // seals the log without growing it.
                tokio::select! {
                    _ = session.events().wait_past(cursor) => {}
                    _ = tx.closed() => break,
                    _ = tokio::time::sleep(Duration::from_millis(500)) => {}
                }
                continue;
            }
            for event in batch {
                cursor += 1;
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        }
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        let name = sse_event_name(event.kind);
        let data = serde_json::to_string(event.as_ref()).unwrap_or_default();
        Ok(SseEvent::default().event(name).data(data))
    });

    Ok(Sse::new(stream))
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{GatewayState, build_router};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use codesmith_agent::LoopConfig;
    use codesmith_core::error::ModelError;
    use codesmith_core::model::{ChatRequest, ChatResponse, ModelClient};
    use codesmith_model::RetryPolicy;
    use codesmith_session::{AgentSpec, SessionRegistry};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Loops on `ls ""` with a small delay, so sessions stay running until
    /// stopped by the test.
    struct LoopingClient;

    #[async_trait]
    impl ModelClient for LoopingClient {
        fn name(&self) -> &str {
            "looping"
        }
        async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, ModelError> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(ChatResponse {
                content: "<THOUGHT>\nlooking\n</THOUGHT>\n<COMMAND>\nls \"\"\n</COMMAND>".into(),
                model: "looping".into(),
                usage: None,
            })
        }
    }

    pub(crate) fn test_spec() -> AgentSpec {
        AgentSpec {
            client: Arc::new(LoopingClient),
            retry: RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
            },
            config: LoopConfig::default(),
        }
    }

    pub(crate) fn test_state() -> SharedState {
        Arc::new(GatewayState {
            sessions: Arc::new(SessionRegistry::new()),
            spec: test_spec(),
            store: None,
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn create_session(app: &Router, workspace: &str, id: &str) -> Response {
        app.clone()
            .oneshot(post_json(
                "/v1/sessions",
                serde_json::json!({"id": id, "workspace": workspace, "task": "do it"}),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_and_list_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state());

        let response = create_session(&app, dir.path().to_str().unwrap(), "s1").await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["id"], "s1");

        let response = app.clone().oneshot(get_req("/v1/sessions")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["sessions"], serde_json::json!(["s1"]));
    }

    #[tokio::test]
    async fn missing_workspace_is_404() {
        let app = build_router(test_state());
        let response = create_session(&app, "/no/such/workspace", "s1").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_session_id_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state());

        create_session(&app, dir.path().to_str().unwrap(), "dup").await;
        let response = create_session(&app, dir.path().to_str().unwrap(), "dup").await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_session_is_uniform_404() {
        let app = build_router(test_state());

        for req in [
            post_json("/v1/sessions/ghost/start", serde_json::json!({})),
            post_json("/v1/sessions/ghost/pause", serde_json::json!({})),
            post_json("/v1/sessions/ghost/stop", serde_json::json!({})),
            post_json(
                "/v1/sessions/ghost/interrupt",
                serde_json::json!({"message": "m"}),
            ),
            post_json(
                "/v1/sessions/ghost/response",
                serde_json::json!({"text": "t"}),
            ),
            get_req("/v1/sessions/ghost/state"),
            get_req("/v1/sessions/ghost/events"),
            get_req("/v1/sessions/ghost/events/stream"),
        ] {
            let response = app.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/v1/sessions/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn double_start_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state();
        let app = build_router(state.clone());

        create_session(&app, dir.path().to_str().unwrap(), "s1").await;

        let response = app
            .clone()
            .oneshot(post_json("/v1/sessions/s1/start", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(post_json("/v1/sessions/s1/start", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // Clean shutdown
        let session = state.sessions.get("s1").await.unwrap();
        session.stop().unwrap();
        session.join().await;
    }

    #[tokio::test]
    async fn events_endpoint_returns_ordered_log() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state());

        create_session(&app, dir.path().to_str().unwrap(), "s1").await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/sessions/s1/interrupt",
                serde_json::json!({"message": "use python"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_req("/v1/sessions/s1/events"))
            .await
            .unwrap();
        let body = body_json(response).await;

        let events = body["events"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["kind"], "task");
        assert_eq!(events[1]["kind"], "interrupt");
        assert_eq!(events[1]["content"], "use python");
    }

    #[tokio::test]
    async fn state_snapshot_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state());

        create_session(&app, dir.path().to_str().unwrap(), "s1").await;

        let response = app
            .clone()
            .oneshot(get_req("/v1/sessions/s1/state"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], "s1");
        assert_eq!(body["state"], "created");
        assert_eq!(body["task"], "do it");
    }

    #[tokio::test]
    async fn stop_after_interrupt_seals_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state();
        let app = build_router(state.clone());

        create_session(&app, dir.path().to_str().unwrap(), "s1").await;
        app.clone()
            .oneshot(post_json("/v1/sessions/s1/start", serde_json::json!({})))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        app.clone()
            .oneshot(post_json(
                "/v1/sessions/s1/interrupt",
                serde_json::json!({"message": "use python"}),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(post_json("/v1/sessions/s1/stop", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let session = state.sessions.get("s1").await.unwrap();
        session.join().await;

        let response = app
            .clone()
            .oneshot(get_req("/v1/sessions/s1/events"))
            .await
            .unwrap();
        let body = body_json(response).await;
        let events = body["events"].as_array().unwrap();
        assert_eq!(events.last().unwrap()["kind"], "stop");
        assert!(events.iter().any(|e| e["kind"] == "interrupt"
            && e["content"].as_str().unwrap().contains("use python")));

        // Posting to a stopped session is a conflict
        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/sessions/s1/interrupt",
                serde_json::json!({"message": "late"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn delete_session_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state());

        create_session(&app, dir.path().to_str().unwrap(), "s1").await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/v1/sessions/s1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_req("/v1/sessions/s1/state"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reset_clears_events_and_pauses() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state());

        create_session(&app, dir.path().to_str().unwrap(), "s1").await;
        app.clone()
            .oneshot(post_json(
                "/v1/sessions/s1/interrupt",
                serde_json::json!({"message": "noise"}),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(post_json("/v1/sessions/s1/reset", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_req("/v1/sessions/s1/events"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["generation"], 1);
        let events = body["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["kind"], "task");

        let response = app
            .clone()
            .oneshot(get_req("/v1/sessions/s1/state"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["state"], "paused");
    }
}
