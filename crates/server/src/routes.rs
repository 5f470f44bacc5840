//! The chat API surface.
//!
//! One endpoint: POST /api/v1/chat. The handler owns request validation,
//! correlation ids, and persistence; the pipeline itself lives in mira-agent.
//! A persistence failure is logged and never fails the request, since the
//! customer already has their answer.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use mira_agent::Orchestrator;
use mira_core::errors::{ApplicationError, InterfaceError};
use mira_core::UserContext;
use mira_db::{InteractionRecord, InteractionRepository};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub repository: Arc<dyn InteractionRepository>,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/api/v1/chat", post(chat)).with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<std::collections::BTreeMap<String, Value>>,
}

#[derive(Debug, Serialize)]
struct ChatSuccess {
    success: bool,
    interaction_id: String,
    response: String,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct ChatFailure {
    success: bool,
    error: String,
    correlation_id: String,
}

pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let interaction_id = Uuid::new_v4().to_string();

    let mut context: UserContext =
        request.metadata.as_ref().cloned().unwrap_or_default().into_iter().collect();
    if let Some(session_id) = &request.session_id {
        context = context.with("session_id", session_id.as_str());
    }

    let outcome = match state.orchestrator.process_query(&request.message, &context).await {
        Ok(outcome) => outcome,
        Err(domain_error) => {
            let interface = ApplicationError::from(domain_error).into_interface(&interaction_id);
            return failure_response(&interface, interaction_id);
        }
    };

    let record = InteractionRecord::from_outcome(
        &interaction_id,
        &request.user_id,
        request.session_id.clone(),
        &request.message,
        &outcome,
    );
    if let Err(error) = state.repository.insert(record).await {
        warn!(
            event_name = "chat.persist_failed",
            interaction_id = %interaction_id,
            error = %error,
            "interaction could not be persisted; response still served"
        );
    }

    info!(
        event_name = "chat.served",
        interaction_id = %interaction_id,
        failed = outcome.classification.is_failed(),
    );

    (
        StatusCode::OK,
        Json(ChatSuccess {
            success: true,
            interaction_id,
            response: outcome.response,
            timestamp: outcome.timestamp.to_rfc3339(),
        }),
    )
        .into_response()
}

fn failure_response(interface: &InterfaceError, correlation_id: String) -> Response {
    let status = match interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ChatFailure {
            success: false,
            error: interface.user_message().to_string(),
            correlation_id,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use mira_agent::{KnowledgeRetriever, LlmClient, LlmError, Orchestrator, PromptLibrary};
    use mira_db::repositories::InteractionRepository;
    use mira_db::{connect_with_settings, migrations, SqlInteractionRepository};

    use super::{router, AppState};

    /// Returns label JSON for classification calls, a fixed reply otherwise.
    struct CannedLlm;

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn generate(
            &self,
            system_instruction: &str,
            _user_prompt: &str,
            _temperature: f32,
        ) -> Result<String, LlmError> {
            if system_instruction.contains("label customer queries") {
                Ok(r#"{"primary_agent": "education", "intent": "question"}"#.to_string())
            } else {
                Ok("Brown period blood is usually just older blood.".to_string())
            }
        }
    }

    async fn state() -> (AppState, Arc<SqlInteractionRepository>) {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let repository = Arc::new(SqlInteractionRepository::new(pool));

        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(CannedLlm),
            Arc::new(KnowledgeRetriever::stub()),
            Arc::new(PromptLibrary::new().expect("templates compile")),
        ));

        (AppState { orchestrator, repository: repository.clone() }, repository)
    }

    async fn post_chat(state: AppState, payload: Value) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("handler responds");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        (status, body)
    }

    #[tokio::test]
    async fn chat_returns_bundle_and_persists_the_interaction() {
        let (state, repository) = state().await;

        let (status, body) = post_chat(
            state,
            json!({
                "user_id": "user-1",
                "message": "why is my period blood brown?",
                "session_id": "session-9"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert!(!body["interaction_id"].as_str().expect("id").is_empty());
        // Response text mentions a medical topic, so the disclaimer applies.
        let text = body["response"].as_str().expect("response text");
        assert!(text.contains("older blood"));
        assert!(text.contains("not a doctor"));

        let stored = repository.recent(10).await.expect("recent");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, "user-1");
        assert_eq!(stored[0].session_id.as_deref(), Some("session-9"));
        assert_eq!(stored[0].query, "why is my period blood brown?");
    }

    #[tokio::test]
    async fn empty_message_is_a_bad_request_and_is_not_persisted() {
        let (state, repository) = state().await;

        let (status, body) = post_chat(
            state,
            json!({ "user_id": "user-1", "message": "   " }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(!body["error"].as_str().expect("error text").is_empty());

        assert!(repository.recent(10).await.expect("recent").is_empty());
    }

    #[tokio::test]
    async fn metadata_flows_into_the_user_context() {
        let (state, _repository) = state().await;

        let (status, body) = post_chat(
            state,
            json!({
                "user_id": "user-2",
                "message": "I feel anxious about all this",
                "metadata": { "conversation_stage": "retention" }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
    }
}
