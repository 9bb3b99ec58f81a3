//! HTTP server: Telegram webhook, REST file API and static downloads.

pub mod error;
pub mod files;
pub mod webhook;

use axum::{
    extract::DefaultBodyLimit,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::core::config;
use crate::storage::files::{FileStore, URL_PREFIX};
use crate::telegram::{CommandRouter, Messenger};

/// Shared state for every HTTP handler
pub struct AppState {
    pub router: Arc<CommandRouter>,
    pub store: Arc<FileStore>,
    pub messenger: Arc<dyn Messenger>,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

/// Builds the full route table.
pub fn create_router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(state.store.root());
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route(config::telegram::WEBHOOK_PATH, post(webhook::telegram_webhook))
        .route("/setup-webhook", post(webhook::setup_webhook))
        .route("/remove-webhook", post(webhook::remove_webhook))
        .route(
            "/api/upload",
            post(files::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/files", get(files::list_files))
        .route("/api/files/{filename}", delete(files::delete_file))
        .route("/health", get(health_handler))
        .nest_service(URL_PREFIX, uploads)
        .with_state(state)
}

/// Binds the port and serves until `shutdown` resolves.
pub async fn start_web_server<F>(state: Arc<AppState>, port: u16, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = create_router(state);

    log::info!("Starting web server on http://{}", addr);
    log::info!("  POST   {}  - Telegram updates", config::telegram::WEBHOOK_PATH);
    log::info!("  POST   /api/upload        - Upload a file");
    log::info!("  GET    /api/files         - List files");
    log::info!("  DELETE /api/files/:name   - Delete a file");
    log::info!("  GET    {}/:name       - Download a file", URL_PREFIX);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    Ok(())
}

/// GET /health: simple health check.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "docudrop"
    }))
}
