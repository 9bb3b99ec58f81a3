//! Command routing
//!
//! Each inbound message is classified, turned into exactly one reply and
//! delivered through the `Messenger`. Delivery failures never reach the
//! webhook: they are logged and, for documents, degrade to a link.

use std::sync::Arc;

use crate::core::error::AppResult;
use crate::core::utils::{format_file_size, truncate_chars};
use crate::search::SearchDelegate;
use crate::storage::files::{display_name_of, FileStore, StoredFile};
use crate::telegram::commands::{help_text, Command};
use crate::telegram::messenger::Messenger;
use crate::telegram::types::InboundCommand;

/// Reply for an empty store
pub const NO_FILES_TEXT: &str = "📂 No files stored yet.";

/// Longest delegate error or echoed query shown to a user
const MAX_ERROR_CHARS: usize = 200;

/// Maximum message length for Telegram (with margin)
const MAX_MESSAGE_LENGTH: usize = 4000;

/// Room kept free for the "...and N more" tail
const TAIL_RESERVE: usize = 32;

/// What the bot answers with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Send the file itself as an attachment
    Document(StoredFile),
    /// File is too large to attach; send its download link instead
    Link(StoredFile),
}

/// Routes chat commands to the file store and sends the replies
pub struct CommandRouter {
    store: Arc<FileStore>,
    messenger: Arc<dyn Messenger>,
    search: Option<Arc<dyn SearchDelegate>>,
    max_document_bytes: u64,
}

impl CommandRouter {
    pub fn new(
        store: Arc<FileStore>,
        messenger: Arc<dyn Messenger>,
        search: Option<Arc<dyn SearchDelegate>>,
        max_document_bytes: u64,
    ) -> Self {
        Self {
            store,
            messenger,
            search,
            max_document_bytes,
        }
    }

    /// Handles one inbound message end to end.
    ///
    /// Only store I/O failures are returned; messaging failures are absorbed.
    pub async fn dispatch(&self, inbound: &InboundCommand) -> AppResult<()> {
        let command = Command::parse(&inbound.raw_text);
        log::info!("Chat {}: {:?}", inbound.chat_id, command);

        if let Command::Semantic(ref query) = command {
            self.run_semantic_search(inbound.chat_id, query).await;
            return Ok(());
        }

        let reply = self.plan(&command, inbound.first_name.as_deref()).await?;
        self.deliver(inbound.chat_id, reply).await;
        Ok(())
    }

    /// Computes the reply for a command without sending anything.
    ///
    /// `Semantic` is answered with a text pointing at the delegate state, since
    /// the actual delegated search runs through `dispatch`.
    pub async fn plan(&self, command: &Command, first_name: Option<&str>) -> AppResult<Reply> {
        let reply = match command {
            Command::Help => Reply::Text(help_text(first_name)),
            Command::List => {
                let files = self.store.list().await?;
                if files.is_empty() {
                    Reply::Text(NO_FILES_TEXT.to_string())
                } else {
                    let header = format!("📁 Stored files ({}):\n", files.len());
                    Reply::Text(capped_list(header, files.iter().map(file_line)))
                }
            }
            Command::Count => {
                let files = self.store.list().await?;
                let total: u64 = files.iter().map(|f| f.size_bytes).sum();
                Reply::Text(format!(
                    "📊 Files: {}\n💾 Total size: {}",
                    files.len(),
                    format_file_size(total)
                ))
            }
            Command::Search(keyword) => {
                let files = self.store.search(keyword).await?;
                if files.is_empty() {
                    Reply::Text(format!("🔍 No files found matching \"{}\".", keyword))
                } else {
                    let header = format!(
                        "🔍 Found {} file(s) matching \"{}\":\n",
                        files.len(),
                        truncate_chars(keyword, MAX_ERROR_CHARS)
                    );
                    Reply::Text(capped_list(header, files.iter().map(file_line)))
                }
            }
            Command::Get(name) => match self.store.resolve(name).await? {
                Some(file) if file.size_bytes <= self.max_document_bytes => Reply::Document(file),
                Some(file) => Reply::Link(file),
                None => Reply::Text(format!("❌ File not found: \"{}\"", name)),
            },
            Command::Semantic(_) if self.search.is_none() => Reply::Text(SEARCH_DISABLED_TEXT.to_string()),
            Command::Semantic(query) => Reply::Text(searching_text(query)),
            Command::Unknown(raw) => Reply::Text(format!(
                "❓ Unknown command: {}\nSend /help to see what I can do.",
                raw
            )),
        };
        Ok(reply)
    }

    /// Sends a reply with a single outbound call, falling back to a link
    /// message when a document upload fails.
    pub async fn deliver(&self, chat_id: i64, reply: Reply) {
        match reply {
            Reply::Text(text) => self.send_text_logged(chat_id, &text).await,
            Reply::Link(file) => {
                let text = format!(
                    "📎 {} ({}) is too large to send here.\nDownload: {}",
                    file.display_name,
                    format_file_size(file.size_bytes),
                    file.download_url
                );
                self.send_text_logged(chat_id, &text).await;
            }
            Reply::Document(file) => {
                let caption = format!("📄 {} ({})", file.display_name, format_file_size(file.size_bytes));
                let path = self.store.path_of(&file);
                if let Err(e) = self
                    .messenger
                    .send_document(chat_id, &path, &file.display_name, &caption)
                    .await
                {
                    log::warn!(
                        "sendDocument failed for {} in chat {}: {}; sending link instead",
                        file.storage_name,
                        chat_id,
                        e
                    );
                    let text = format!("{}\nDownload: {}", caption, file.download_url);
                    self.send_text_logged(chat_id, &text).await;
                }
            }
        }
    }

    async fn send_text_logged(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.messenger.send_text(chat_id, text).await {
            log::error!("Failed to send message to chat {}: {}", chat_id, e);
        }
    }

    /// Delegated search: post a placeholder, run the delegate, then edit the
    /// placeholder with the outcome.
    async fn run_semantic_search(&self, chat_id: i64, query: &str) {
        let Some(ref delegate) = self.search else {
            self.send_text_logged(chat_id, SEARCH_DISABLED_TEXT).await;
            return;
        };

        let placeholder = searching_text(query);
        let placeholder_id = match self.messenger.send_text(chat_id, &placeholder).await {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Failed to send search placeholder to chat {}: {}", chat_id, e);
                None
            }
        };

        let text = match delegate.search(query).await {
            Ok(names) => self.render_search_results(query, &names).await,
            Err(e) => {
                log::error!("Search delegate failed for {:?}: {}", query, e);
                format!("⚠️ Search failed: {}", truncate_chars(&e.to_string(), MAX_ERROR_CHARS))
            }
        };

        match placeholder_id {
            Some(message_id) => {
                if let Err(e) = self.messenger.edit_text(chat_id, message_id, &text).await {
                    log::warn!("editMessageText failed in chat {}: {}; sending a new message", chat_id, e);
                    self.send_text_logged(chat_id, &text).await;
                }
            }
            None => self.send_text_logged(chat_id, &text).await,
        }
    }

    async fn render_search_results(&self, query: &str, names: &[String]) -> String {
        if names.is_empty() {
            return format!("🧠 No matching files found for \"{}\".", query);
        }

        let known = match self.store.list().await {
            Ok(files) => files,
            Err(e) => {
                log::warn!("Could not list files while rendering search results: {}", e);
                Vec::new()
            }
        };

        let lines = names.iter().map(|name| {
            let matched = known
                .iter()
                .find(|f| f.storage_name == *name || f.display_name == *name);
            match matched {
                Some(file) => file_line(file),
                None => display_name_of(name).to_string(),
            }
        });

        let header = format!("🧠 Results for \"{}\":\n", truncate_chars(query, MAX_ERROR_CHARS));
        capped_list(header, lines)
    }
}

const SEARCH_DISABLED_TEXT: &str = "⚠️ Semantic search is not configured on this server.";

fn searching_text(query: &str) -> String {
    format!("🔍 Searching file contents for \"{}\"...", query)
}

fn file_line(file: &StoredFile) -> String {
    format!("{} ({})", file.display_name, format_file_size(file.size_bytes))
}

/// Appends numbered lines to `header` until the Telegram message limit is
/// near, then closes with a count of the lines left out.
fn capped_list(header: String, lines: impl ExactSizeIterator<Item = String>) -> String {
    let total = lines.len();
    let mut text = header;
    let mut length = text.chars().count();

    for (i, line) in lines.enumerate() {
        let entry = format!("\n{}. {}", i + 1, line);
        let entry_length = entry.chars().count();
        if length + entry_length + TAIL_RESERVE > MAX_MESSAGE_LENGTH {
            text.push_str(&format!("\n\n...and {} more", total - i));
            break;
        }
        length += entry_length;
        text.push_str(&entry);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    struct SilentMessenger;

    #[async_trait]
    impl Messenger for SilentMessenger {
        async fn send_text(&self, _chat_id: i64, _text: &str) -> AppResult<i32> {
            Ok(1)
        }
        async fn send_document(&self, _: i64, _: &Path, _: &str, _: &str) -> AppResult<()> {
            Ok(())
        }
        async fn edit_text(&self, _: i64, _: i32, _: &str) -> AppResult<()> {
            Ok(())
        }
        async fn set_webhook(&self, _: &str) -> AppResult<()> {
            Err(AppError::Validation("not used".to_string()))
        }
        async fn delete_webhook(&self) -> AppResult<()> {
            Ok(())
        }
    }

    fn router(dir: &TempDir, max_document_bytes: u64) -> CommandRouter {
        let store = Arc::new(FileStore::new(dir.path(), "http://files.test").unwrap());
        CommandRouter::new(store, Arc::new(SilentMessenger), None, max_document_bytes)
    }

    fn seed(dir: &TempDir, name: &str, size: usize) {
        std::fs::write(dir.path().join(name), vec![0u8; size]).unwrap();
    }

    fn text(reply: Reply) -> String {
        match reply {
            Reply::Text(text) => text,
            other => panic!("expected text reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let dir = TempDir::new().unwrap();
        let reply = router(&dir, 1024).plan(&Command::List, None).await.unwrap();
        assert_eq!(text(reply), NO_FILES_TEXT);
    }

    #[tokio::test]
    async fn test_list_numbers_every_file() {
        let dir = TempDir::new().unwrap();
        seed(&dir, "1700000000000-a.txt", 10);
        seed(&dir, "1700000000001-b.txt", 2048);
        seed(&dir, "1700000000002-c.txt", 1);

        let body = text(router(&dir, 1024).plan(&Command::List, None).await.unwrap());
        let numbered: Vec<&str> = body
            .lines()
            .filter(|l| l.split_once(". ").is_some_and(|(n, _)| n.parse::<usize>().is_ok()))
            .collect();
        assert_eq!(numbered.len(), 3);
        assert!(body.contains("2. b.txt (2.00 KB)"));
    }

    #[test]
    fn test_capped_list_stops_before_message_limit() {
        let lines = (0..500).map(|i| format!("scan-{:03}.pdf (1.00 MB)", i)).collect::<Vec<_>>();
        let text = capped_list("📁 Stored files (500):\n".to_string(), lines.into_iter());

        assert!(text.chars().count() <= MAX_MESSAGE_LENGTH);
        let shown = text.lines().filter(|l| l.contains(". scan-")).count();
        assert!(shown > 0 && shown < 500);
        assert!(text.ends_with(&format!("...and {} more", 500 - shown)));
    }

    #[tokio::test]
    async fn test_count_sums_sizes() {
        let dir = TempDir::new().unwrap();
        seed(&dir, "1700000000000-a.bin", 1024);
        seed(&dir, "1700000000001-b.bin", 1024);

        let body = text(router(&dir, 1024).plan(&Command::Count, None).await.unwrap());
        assert_eq!(body, "📊 Files: 2\n💾 Total size: 2.00 KB");
    }

    #[tokio::test]
    async fn test_get_picks_document_or_link_by_size() {
        let dir = TempDir::new().unwrap();
        seed(&dir, "1700000000000-report.pdf", 2048);
        seed(&dir, "1700000000001-video.mp4", 4096);
        let router = router(&dir, 3000);

        match router.plan(&Command::Get("report".into()), None).await.unwrap() {
            Reply::Document(file) => {
                assert_eq!(file.display_name, "report.pdf");
                assert_eq!(format_file_size(file.size_bytes), "2.00 KB");
            }
            other => panic!("expected document, got {other:?}"),
        }

        assert!(matches!(
            router.plan(&Command::Get("VIDEO".into()), None).await.unwrap(),
            Reply::Link(_)
        ));

        let body = text(router.plan(&Command::Get("missing".into()), None).await.unwrap());
        assert_eq!(body, "❌ File not found: \"missing\"");
    }

    #[tokio::test]
    async fn test_unknown_echoes_raw_text() {
        let dir = TempDir::new().unwrap();
        let body = text(
            router(&dir, 1024)
                .plan(&Command::parse("/delete everything"), None)
                .await
                .unwrap(),
        );
        assert!(body.starts_with("❓ Unknown command: /delete everything"));
    }

    #[tokio::test]
    async fn test_semantic_without_delegate() {
        let dir = TempDir::new().unwrap();
        let body = text(
            router(&dir, 1024)
                .plan(&Command::Semantic("cv".into()), None)
                .await
                .unwrap(),
        );
        assert_eq!(body, SEARCH_DISABLED_TEXT);
    }
}
