use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use notesync::api::{self, ApiState};
use notesync::store::MemoryStore;
use notesync::surface::BroadcastSurface;
use notesync::{SessionManager, SyncConfig};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load .env before reading configuration
    if let Ok(path) = dotenvy::dotenv() {
        tracing::info!(path = %path.display(), "Loaded environment from .env");
    }

    let config = SyncConfig::from_env();
    tracing::info!(
        debounce_ms = config.debounce.as_millis() as u64,
        bind = %config.bind_addr,
        "Starting notesync engine"
    );

    // In-memory reference backend; production deployments swap in a real
    // document-store adapter behind the same trait
    let store = Arc::new(MemoryStore::new());
    let surface = Arc::new(BroadcastSurface::new(config.render_buffer));
    let render = surface.sender();

    let manager = Arc::new(SessionManager::new(store, surface, config.clone()));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(
            HeaderValue::from_str("http://localhost:3000").expect("valid origin"),
        ))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app = api::router()
        .with_state(ApiState { manager, render })
        .layer(cors);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "notesync API listening");

    axum::serve(listener, app).await
}
