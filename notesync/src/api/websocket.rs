//! WebSocket stream of render events
//!
//! The engine's surface broadcasts `RenderEvent`s (text re-renders and
//! status-line changes); every connected WebSocket client gets the same
//! stream. Client-to-server traffic is ignored except for close frames -
//! commands go over the HTTP routes.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast;

use crate::api::ApiState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_render_events(socket, state))
}

async fn stream_render_events(mut socket: WebSocket, state: ApiState) {
    let mut rx = state.render.subscribe();
    tracing::debug!("render-event stream attached");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(error) => {
                            tracing::error!(error = %error, "failed to serialize render event");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Slow client; the next event carries the current state
                    tracing::warn!(skipped, "render-event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // commands go over HTTP
                Some(Err(_)) => break,
            },
        }
    }

    tracing::debug!("render-event stream detached");
}
