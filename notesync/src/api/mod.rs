//! HTTP API routes for the notesync engine
//!
//! Thin facade over SessionManager: stateless HTTP for session commands,
//! a WebSocket for the render-event stream back to the frontend.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use shared_types::RenderEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

pub mod session;
pub mod websocket;

use crate::actors::SessionManager;

#[derive(Clone)]
pub struct ApiState {
    pub manager: Arc<SessionManager>,
    /// Sender side of the surface broadcast; WebSocket connections subscribe
    pub render: broadcast::Sender<RenderEvent>,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::ws_handler))
        .route("/session/open", post(session::open_session))
        .route("/session/close", post(session::close_session))
        .route("/session/edit", post(session::edit))
        .route("/session/focus", post(session::focus))
        .route("/session/blur", post(session::blur))
        .route("/session/flush", post(session::flush))
        .route("/session/clear", post(session::clear))
        .route("/session/state", get(session::session_state))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
