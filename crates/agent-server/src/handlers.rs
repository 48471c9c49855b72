//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use agent_core::{Message, Session, SessionId};
use staking_advisor::{AccountReport, AdvisorError, AdvisorState, Decision};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub account_source: String,
    pub llm_enabled: bool,
    pub llm_connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    #[serde(flatten)]
    pub report: AccountReport,
    pub markdown: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn session_error(e: &agent_core::AgentError) -> ApiError {
    tracing::error!("Session store error: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "SESSION_ERROR", e.user_message())
}

fn advisor_error(e: &AdvisorError) -> ApiError {
    let status = match e {
        AdvisorError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        AdvisorError::InvalidAccountId(_) => StatusCode::BAD_REQUEST,
        AdvisorError::Retrieval { .. } | AdvisorError::Network(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.code(), e.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_connected = match &state.provider {
        Some(provider) => provider.health_check().await.unwrap_or(false),
        None => false,
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        account_source: state.advisor.source_name().to_string(),
        llm_enabled: state.provider.is_some(),
        llm_connected,
    })
}

/// Chat endpoint: one message in, one advisor reply out
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "EMPTY_MESSAGE", "Message must not be empty"));
    }

    let mut session = match payload.session_id {
        Some(raw) => {
            let id = SessionId::parse(raw)
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_SESSION_ID", e.to_string()))?;
            state
                .sessions
                .load(&id)
                .map_err(|e| session_error(&e))?
                .unwrap_or_else(|| Session::<AdvisorState>::with_id(id))
        }
        None => Session::new(),
    };

    session.conversation.push(Message::user(payload.message.clone()));
    let reply = state.advisor.handle_message(&payload.message, &mut session.state).await;
    let message = reply.message();
    session.conversation.push(Message::assistant(message.clone()));
    session.conversation.truncate_to_fit();
    session.touch();

    state.sessions.save(&session).map_err(|e| session_error(&e))?;

    tracing::info!(
        session = %session.id,
        turns = session.message_count(),
        decision = ?reply.decision(),
        "Chat turn complete"
    );

    Ok(Json(ChatResponse {
        message,
        session_id: session.id.to_string(),
        decision: reply.decision(),
    }))
}

/// Structured recommendation for one account
pub async fn account_recommendation(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let mut scratch = AdvisorState::default();
    let report = state
        .advisor
        .analyze_account(&account_id, &mut scratch)
        .await
        .map_err(|e| {
            tracing::error!(account_id = %account_id, error = %e, "Recommendation failed");
            advisor_error(&e)
        })?;

    let markdown = report.to_markdown();
    Ok(Json(RecommendationResponse { report, markdown }))
}
