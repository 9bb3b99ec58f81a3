//! Telegram webhook endpoint and its registration control plane

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::core::config;
use crate::telegram::types::TelegramUpdate;
use crate::web::error::ApiError;
use crate::web::AppState;

fn acknowledge() -> Response {
    (StatusCode::OK, Json(json!({ "ok": true }))).into_response()
}

/// POST /webhook/telegram
///
/// Always answers 200 once the update is handled, including when the reply
/// could not be delivered. Undecodable bodies are acknowledged too so that
/// Telegram stops redelivering them. Only unexpected failures (store I/O)
/// produce a 500.
pub async fn telegram_webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            log::warn!("Ignoring undecodable webhook payload: {}", e);
            return acknowledge();
        }
    };

    let update_id = update.update_id;
    let Some(command) = update.into_command() else {
        log::debug!("Update {} has no text message, ignoring", update_id);
        return acknowledge();
    };

    // Dispatch runs on its own task so that a dropped inbound connection
    // does not cancel an in-flight reply or delegate run.
    let router = Arc::clone(&state.router);
    let handle = tokio::spawn(async move { router.dispatch(&command).await });

    match handle.await {
        Ok(Ok(())) => acknowledge(),
        Ok(Err(e)) => {
            log::error!("Failed to handle update {}: {}", update_id, e);
            internal_error()
        }
        Err(e) => {
            log::error!("Handler task for update {} did not complete: {}", update_id, e);
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": "Internal server error" })),
    )
        .into_response()
}

/// POST /setup-webhook - register `<public url>/webhook/telegram` with Telegram
pub async fn setup_webhook(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let url = config::telegram::webhook_url(&state.public_base_url);
    state.messenger.set_webhook(&url).await?;
    log::info!("Webhook set to {}", url);

    Ok(Json(json!({
        "success": true,
        "webhookUrl": url,
    })))
}

/// POST /remove-webhook - unregister the webhook
pub async fn remove_webhook(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    state.messenger.delete_webhook().await?;
    log::info!("Webhook removed");

    Ok(Json(json!({
        "success": true,
        "message": "Webhook removed",
    })))
}
