use crate::agent::ChatAgent;
use crate::error::ChatError;
use crate::models::api::{ AnalyticsResponse, ChatRequest, ErrorResponse, HealthResponse };
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Json,
    Router,
    extract::{ State, rejection::JsonRejection },
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use log::{ debug, error };

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<ChatAgent>,
    pub app_env: String,
}

impl AppState {
    pub fn new(agent: Arc<ChatAgent>, app_env: impl Into<String>) -> Self {
        Self { agent, app_env: app_env.into() }
    }

    fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }
}

/// API routes, mounted by the server under `/api`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/analytics", get(analytics_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        env: state.app_env.clone(),
    })
}

async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    // an unreadable body is treated like one without a message
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!("Rejected chat body: {}", rejection);
            ChatRequest::default()
        }
    };

    match state.agent.handle_message(req.message.as_deref(), req.conversation_id()).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(ChatError::Validation(msg)) => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))).into_response()
        }
        Err(e) => {
            error!("Chat error: {}", e);
            let details = state.is_development().then(|| e.to_string());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("failed to process message").with_details(details)),
            ).into_response()
        }
    }
}

async fn analytics_handler(State(state): State<AppState>) -> Json<AnalyticsResponse> {
    let stats = state.agent.stats().await;
    Json(AnalyticsResponse {
        total_conversations: stats.conversation_count,
        total_messages: stats.message_count,
        average_messages: stats.average_messages,
    })
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("API route not found")))
}
