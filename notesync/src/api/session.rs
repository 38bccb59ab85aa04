//! Session command endpoints
//!
//! Every handler translates a SessionManager call into JSON over HTTP.
//! Engine-internal failures (a rejected autosave, a dropped realtime
//! channel) never show up here - those are status-line state streamed over
//! the WebSocket. The errors below are the caller's: commanding a session
//! that is not open, or the store failing during open.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use shared_types::EntityKey;

use crate::api::ApiState;
use crate::error::SessionError;

/// Machine-readable error codes for API responses
#[derive(Debug, Clone)]
pub enum ApiErrorCode {
    NoSession,
    StoreError,
    Internal,
}

impl ApiErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::NoSession => "NO_SESSION",
            ApiErrorCode::StoreError => "STORE_ERROR",
            ApiErrorCode::Internal => "INTERNAL",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiErrorCode::NoSession => StatusCode::NOT_FOUND,
            ApiErrorCode::StoreError => StatusCode::BAD_GATEWAY,
            ApiErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

fn api_error(code: ApiErrorCode, message: impl Into<String>) -> axum::response::Response {
    let status = code.status_code();
    let body = Json(ApiErrorResponse {
        error: ApiErrorDetail {
            code: code.as_str().to_string(),
            message: message.into(),
        },
    });
    (status, body).into_response()
}

fn session_error(error: SessionError) -> axum::response::Response {
    match &error {
        SessionError::NoSession => api_error(ApiErrorCode::NoSession, error.to_string()),
        SessionError::Store(_) => api_error(ApiErrorCode::StoreError, error.to_string()),
        SessionError::Mailbox(_) => api_error(ApiErrorCode::Internal, error.to_string()),
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub entity: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct CloseResponse {
    pub closed: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Open a session for an entity, closing any session already open
pub async fn open_session(
    State(state): State<ApiState>,
    Json(req): Json<OpenSessionRequest>,
) -> impl IntoResponse {
    let entity = EntityKey::from(req.entity);

    if let Err(error) = state.manager.open(entity).await {
        return session_error(error);
    }

    match state.manager.state().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(error) => session_error(error),
    }
}

pub async fn close_session(State(state): State<ApiState>) -> impl IntoResponse {
    let closed = state.manager.close().await;
    (StatusCode::OK, Json(CloseResponse { closed }))
}

pub async fn edit(
    State(state): State<ApiState>,
    Json(req): Json<EditRequest>,
) -> impl IntoResponse {
    match state.manager.edit(req.text).await {
        Ok(()) => (StatusCode::OK, Json(AckResponse { ok: true })).into_response(),
        Err(error) => session_error(error),
    }
}

pub async fn focus(State(state): State<ApiState>) -> impl IntoResponse {
    match state.manager.focus().await {
        Ok(()) => (StatusCode::OK, Json(AckResponse { ok: true })).into_response(),
        Err(error) => session_error(error),
    }
}

pub async fn blur(State(state): State<ApiState>) -> impl IntoResponse {
    match state.manager.blur().await {
        Ok(()) => (StatusCode::OK, Json(AckResponse { ok: true })).into_response(),
        Err(error) => session_error(error),
    }
}

/// Explicit save, skipping the debounce wait
pub async fn flush(State(state): State<ApiState>) -> impl IntoResponse {
    match state.manager.flush().await {
        Ok(()) => (StatusCode::OK, Json(AckResponse { ok: true })).into_response(),
        Err(error) => session_error(error),
    }
}

/// Empty the note and persist immediately
pub async fn clear(State(state): State<ApiState>) -> impl IntoResponse {
    match state.manager.clear().await {
        Ok(()) => (StatusCode::OK, Json(AckResponse { ok: true })).into_response(),
        Err(error) => session_error(error),
    }
}

pub async fn session_state(State(state): State<ApiState>) -> impl IntoResponse {
    match state.manager.state().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(error) => session_error(error),
    }
}
