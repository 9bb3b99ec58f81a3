//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use docudrop::core::error::{AppError, AppResult};
use docudrop::search::{SearchDelegate, SearchError};
use docudrop::storage::FileStore;
use docudrop::telegram::{CommandRouter, Messenger};
use docudrop::web::AppState;

pub const TEST_CHAT_ID: i64 = 123456789;
pub const PUBLIC_URL: &str = "http://files.test";

/// One outbound Bot API call seen by the recording messenger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    Document { chat_id: i64, file_name: String, caption: String },
    Edit { chat_id: i64, message_id: i32, text: String },
    SetWebhook(String),
    DeleteWebhook,
}

/// Messenger that records every call and can be told to fail some of them
#[derive(Default)]
pub struct RecordingMessenger {
    calls: Mutex<Vec<Sent>>,
    next_message_id: AtomicI32,
    fail_documents: bool,
    fail_text: bool,
    fail_edits: bool,
    send_delay: Option<Duration>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_documents(mut self) -> Self {
        self.fail_documents = true;
        self
    }

    pub fn failing_text(mut self) -> Self {
        self.fail_text = true;
        self
    }

    pub fn failing_edits(mut self) -> Self {
        self.fail_edits = true;
        self
    }

    /// Makes every `send_text` take this long before it is recorded
    pub fn slow_text(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Sent> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Sent::Text { text, .. } | Sent::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn documents_sent(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Sent::Document { .. }))
            .count()
    }

    fn record(&self, call: Sent) {
        self.calls.lock().unwrap().push(call);
    }
}

fn transport_error() -> AppError {
    AppError::Io(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "transport down"))
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<i32> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        if self.fail_text {
            return Err(transport_error());
        }
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn send_document(&self, chat_id: i64, path: &Path, file_name: &str, caption: &str) -> AppResult<()> {
        assert!(path.exists(), "document path {} should exist", path.display());
        self.record(Sent::Document {
            chat_id,
            file_name: file_name.to_string(),
            caption: caption.to_string(),
        });
        if self.fail_documents {
            return Err(transport_error());
        }
        Ok(())
    }

    async fn edit_text(&self, chat_id: i64, message_id: i32, text: &str) -> AppResult<()> {
        self.record(Sent::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        if self.fail_edits {
            return Err(transport_error());
        }
        Ok(())
    }

    async fn set_webhook(&self, url: &str) -> AppResult<()> {
        self.record(Sent::SetWebhook(url.to_string()));
        Ok(())
    }

    async fn delete_webhook(&self) -> AppResult<()> {
        self.record(Sent::DeleteWebhook);
        Ok(())
    }
}

type SearchFn = dyn Fn(&str) -> Result<Vec<String>, SearchError> + Send + Sync;

/// Search delegate answering from a closure
pub struct StubSearch {
    answer: Box<SearchFn>,
}

impl StubSearch {
    pub fn new(answer: impl Fn(&str) -> Result<Vec<String>, SearchError> + Send + Sync + 'static) -> Self {
        Self {
            answer: Box::new(answer),
        }
    }
}

#[async_trait]
impl SearchDelegate for StubSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        (self.answer)(query)
    }
}

/// Store, messenger and router wired together over a temporary directory
pub struct TestEnvironment {
    pub dir: TempDir,
    pub store: Arc<FileStore>,
    pub messenger: Arc<RecordingMessenger>,
    pub router: Arc<CommandRouter>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with(RecordingMessenger::new(), None, 50 * 1024 * 1024)
    }

    pub fn with(
        messenger: RecordingMessenger,
        search: Option<Arc<dyn SearchDelegate>>,
        max_document_bytes: u64,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::new(dir.path(), PUBLIC_URL).unwrap());
        let messenger = Arc::new(messenger);
        let router = Arc::new(CommandRouter::new(
            Arc::clone(&store),
            Arc::clone(&messenger) as Arc<dyn Messenger>,
            search,
            max_document_bytes,
        ));
        Self {
            dir,
            store,
            messenger,
            router,
        }
    }

    /// Writes a file straight into the storage directory
    pub fn seed(&self, storage_name: &str, size: usize) {
        std::fs::write(self.dir.path().join(storage_name), vec![b'a'; size]).unwrap();
    }

    pub fn app_state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            router: Arc::clone(&self.router),
            store: Arc::clone(&self.store),
            messenger: Arc::clone(&self.messenger) as Arc<dyn Messenger>,
            public_base_url: PUBLIC_URL.to_string(),
            max_upload_bytes: 1024 * 1024,
        })
    }
}

/// Builds a webhook delivery carrying a text message
pub fn update_json(text: &str) -> serde_json::Value {
    serde_json::json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "date": 1700000000,
            "chat": { "id": TEST_CHAT_ID, "type": "private" },
            "from": { "id": TEST_CHAT_ID, "is_bot": false, "first_name": "Ada" },
            "text": text
        }
    })
}
