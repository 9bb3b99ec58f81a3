//! TelegramMessenger against a mock Bot API server

use docudrop::core::error::AppError;
use docudrop::telegram::{Messenger, TelegramMessenger};
use serde_json::json;
use teloxide::prelude::*;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn message_json(message_id: i32, text: &str) -> serde_json::Value {
    json!({
        "ok": true,
        "result": {
            "message_id": message_id,
            "date": 1700000000,
            "chat": { "id": 42, "type": "private", "first_name": "Ada" },
            "text": text
        }
    })
}

async fn messenger_for(server: &MockServer) -> TelegramMessenger {
    let bot = Bot::new("test_token_12345:ABCDEF").set_api_url(server.uri().parse().unwrap());
    TelegramMessenger::new(bot)
}

#[tokio::test]
async fn test_send_text_returns_message_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/bot[^/]+/(?i)sendMessage$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json(77, "hi")))
        .expect(1)
        .mount(&server)
        .await;

    let messenger = messenger_for(&server).await;
    let id = messenger.send_text(42, "hi").await.unwrap();

    assert_eq!(id, 77);
}

#[tokio::test]
async fn test_send_text_surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/bot[^/]+/(?i)sendMessage$"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let messenger = messenger_for(&server).await;
    let err = messenger.send_text(42, "hi").await.unwrap_err();

    assert!(matches!(err, AppError::Telegram(_)));
}

#[tokio::test]
async fn test_send_document_uploads_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/bot[^/]+/(?i)sendDocument$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json(78, "")))
        .expect(1)
        .mount(&server)
        .await;

    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"hello").unwrap();

    let messenger = messenger_for(&server).await;
    messenger
        .send_document(42, file.path(), "report.pdf", "📄 report.pdf (5.00 B)")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_edit_and_webhook_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/bot[^/]+/(?i)editMessageText$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json(77, "done")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/bot[^/]+/(?i)(setWebhook|deleteWebhook)$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })))
        .expect(2)
        .mount(&server)
        .await;

    let messenger = messenger_for(&server).await;
    messenger.edit_text(42, 77, "done").await.unwrap();
    messenger.set_webhook("https://files.example.com/webhook/telegram").await.unwrap();
    messenger.delete_webhook().await.unwrap();
}

#[tokio::test]
async fn test_set_webhook_rejects_bad_url() {
    let server = MockServer::start().await;
    let messenger = messenger_for(&server).await;

    let err = messenger.set_webhook("not a url").await.unwrap_err();

    assert!(matches!(err, AppError::Url(_)));
}
