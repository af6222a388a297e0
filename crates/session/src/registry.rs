//! The process-wide session registry.
//!
//! An explicit object owned by the server layer — not an ambient global.
//! Sessions are otherwise fully isolated from each other.

use crate::session::{AgentSpec, Session};
use codesmith_core::error::SessionError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Maps session id → session. Created at process start, dropped at
/// shutdown.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create and register a session. A missing id gets a fresh UUID.
    pub async fn create(
        &self,
        id: Option<String>,
        workspace: PathBuf,
        task: impl Into<String>,
        spec: AgentSpec,
    ) -> Result<Arc<Session>, SessionError> {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(SessionError::AlreadyExists(id));
        }

        let session = Arc::new(Session::new(id.clone(), workspace, task, spec)?);
        sessions.insert(id, session.clone());
        Ok(session)
    }

    /// Look up a session.
    pub async fn get(&self, id: &str) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// All session ids, sorted.
    pub async fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Stop and remove a session.
    pub async fn remove(&self, id: &str) -> Result<(), SessionError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        let _ = session.stop();
        session.join().await;
        info!(session = %id, "Session removed");
        Ok(())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codesmith_agent::LoopConfig;
    use codesmith_core::error::ModelError;
    use codesmith_core::model::{ChatRequest, ChatResponse, ModelClient};
    use codesmith_model::RetryPolicy;

    struct SubmitClient;

    #[async_trait]
    impl ModelClient for SubmitClient {
        fn name(&self) -> &str {
            "submit"
        }
        async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, ModelError> {
            Ok(ChatResponse {
                content: "<THOUGHT>\ndone\n</THOUGHT>\n<COMMAND>\nsubmit\n</COMMAND>".into(),
                model: "submit".into(),
                usage: None,
            })
        }
    }

    fn spec() -> AgentSpec {
        AgentSpec {
            client: Arc::new(SubmitClient),
            retry: RetryPolicy::default(),
            config: LoopConfig::default(),
        }
    }

    #[tokio::test]
    async fn create_get_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new();

        let session = registry
            .create(Some("a".into()), dir.path().to_path_buf(), "task", spec())
            .await
            .unwrap();
        assert_eq!(session.id(), "a");

        registry
            .create(Some("b".into()), dir.path().to_path_buf(), "task", spec())
            .await
            .unwrap();

        assert_eq!(registry.list().await, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.get("a").await.unwrap().id(), "a");

        registry.remove("a").await.unwrap();
        assert!(matches!(
            registry.get("a").await.unwrap_err(),
            SessionError::NotFound(_)
        ));
        assert_eq!(registry.list().await, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new();

        registry
            .create(Some("dup".into()), dir.path().to_path_buf(), "task", spec())
            .await
            .unwrap();
        let err = registry
            .create(Some("dup".into()), dir.path().to_path_buf(), "task", spec())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn generated_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new();

        let a = registry
            .create(None, dir.path().to_path_buf(), "task", spec())
            .await
            .unwrap();
        let b = registry
            .create(None, dir.path().to_path_buf(), "task", spec())
            .await
            .unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn missing_workspace_rejected() {
        let registry = SessionRegistry::new();
        let err = registry
            .create(
                Some("x".into()),
                PathBuf::from("/no/such/workspace"),
                "task",
                spec(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::WorkspaceMissing(_)));
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_uniform_not_found() {
        let registry = SessionRegistry::new();
        assert!(matches!(
            registry.get("ghost").await.unwrap_err(),
            SessionError::NotFound(_)
        ));
        assert!(matches!(
            registry.remove("ghost").await.unwrap_err(),
            SessionError::NotFound(_)
        ));
    }
}
