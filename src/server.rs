//! HTTP API for the study assistant.
//!
//! Every route is served at the root and again under `/api`.

use crate::error::EduError;
use crate::rag::{ConversationService, DEFAULT_SESSION};
use crate::summary::DataSummary;
use crate::timefmt::{format_in, DUE_DATE_FORMAT};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

/// Shared application state, built once at startup.
pub struct AppState {
    pub service: ConversationService,
    pub summary: DataSummary,
}

impl AppState {
    pub fn new(service: ConversationService, summary: DataSummary) -> Self {
        Self { service, summary }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        .route("/chat", post(chat))
        .route("/reset-chat", post(reset_chat))
        .route("/data/summary", get(data_summary))
        .route("/health", get(health));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

fn default_session() -> String {
    DEFAULT_SESSION.to_string()
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_session")]
    pub session_id: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetRequest {
    #[serde(default = "default_session")]
    pub session_id: String,
}

impl Default for ResetRequest {
    fn default() -> Self {
        Self {
            session_id: default_session(),
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub documents_count: usize,
    pub index_size: usize,
    pub current_datetime: String,
    pub timezone: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Error body with a status derived from the failure kind.
pub struct ApiError(EduError);

impl From<EduError> for ApiError {
    fn from(e: EduError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            EduError::InvalidInput(message) => {
                warn!("Rejected request: {}", message);
                (StatusCode::BAD_REQUEST, message)
            }
            e => {
                error!("Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// === Handlers ===

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| EduError::InvalidInput(rejection.body_text()))?;
    let turn = state.service.chat(&req.session_id, &req.message).await?;
    Ok(Json(ChatResponse {
        response: turn.response,
    }))
}

/// Always answers 200. An empty body resets the default session; a body that
/// does not parse resets nothing.
pub async fn reset_chat(State(state): State<Arc<AppState>>, body: Bytes) -> Json<StatusResponse> {
    let req = if body.trim_ascii().is_empty() {
        ResetRequest::default()
    } else {
        match serde_json::from_slice::<ResetRequest>(&body) {
            Ok(req) => req,
            Err(e) => {
                warn!("Ignoring reset request with unreadable body: {}", e);
                return Json(StatusResponse {
                    status: format!("No chat history reset: {}", e),
                });
            }
        }
    };
    state.service.reset(&req.session_id).await;
    Json(StatusResponse {
        status: format!("Chat history reset for session {}", req.session_id),
    })
}

pub async fn data_summary(State(state): State<Arc<AppState>>) -> Json<DataSummary> {
    Json(state.summary.clone())
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let knowledge = state.service.knowledge();
    let tz = state.service.timezone();
    Json(HealthResponse {
        status: "ok".to_string(),
        documents_count: knowledge.document_count(),
        index_size: knowledge.index_size(),
        current_datetime: format_in(Utc::now(), tz, DUE_DATE_FORMAT),
        timezone: tz.name().to_string(),
    })
}
