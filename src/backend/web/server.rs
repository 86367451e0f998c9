use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use super::webhook::{eventsub_handler, WebhookState};
use super::websocket::{websocket_handler, WebSocketState};

/// Everything the HTTP routes need
#[derive(Clone)]
pub struct ServerState {
    pub ui: WebSocketState,
    pub webhook: WebhookState,
}

impl FromRef<ServerState> for WebSocketState {
    fn from_ref(state: &ServerState) -> Self {
        state.ui.clone()
    }
}

impl FromRef<ServerState> for WebhookState {
    fn from_ref(state: &ServerState) -> Self {
        state.webhook.clone()
    }
}

/// Bind the local HTTP server. Binding happens before serving so callers can
/// be sure the webhook callback is reachable before creating subscriptions.
pub async fn bind_server(port: u16) -> std::io::Result<tokio::net::TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);
    Ok(listener)
}

/// Serve webhook, UI websocket and overlay assets until the listener fails
pub async fn serve(
    listener: tokio::net::TcpListener,
    assets_dir: PathBuf,
    state: ServerState,
) -> std::io::Result<()> {
    if !assets_dir.exists() {
        log::warn!(
            "Overlay directory does not exist: {:?}. Creating it...",
            assets_dir
        );
        std::fs::create_dir_all(&assets_dir)?;
    }

    axum::serve(listener, create_router(assets_dir, state)).await
}

/// Create the axum router with all routes
fn create_router(assets_dir: PathBuf, state: ServerState) -> Router {
    // CORS configuration for OBS browser source
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket_handler))
        .route("/eventsub", post(eventsub_handler))
        .fallback_service(ServeDir::new(assets_dir))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(ui): State<WebSocketState>) -> impl IntoResponse {
    let clients = ui.client_count().await;
    (
        StatusCode::OK,
        format!("Stream companion is running ({} UI clients)", clients),
    )
}
