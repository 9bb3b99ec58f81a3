//! Outbound messaging transport
//!
//! The router only talks to Telegram through the `Messenger` trait, so
//! delivery can be swapped for a recording fake in tests.

use async_trait::async_trait;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};

use crate::core::error::AppResult;

/// Bot API calls the service makes
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a plain text message and returns its message id.
    async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<i32>;

    /// Uploads a file from disk as a document attachment.
    async fn send_document(&self, chat_id: i64, path: &Path, file_name: &str, caption: &str) -> AppResult<()>;

    /// Replaces the text of a previously sent message.
    async fn edit_text(&self, chat_id: i64, message_id: i32, text: &str) -> AppResult<()>;

    /// Points Telegram at our webhook URL.
    async fn set_webhook(&self, url: &str) -> AppResult<()>;

    /// Unregisters the webhook.
    async fn delete_webhook(&self) -> AppResult<()>;
}

/// `Messenger` backed by a teloxide `Bot`
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<i32> {
        let message = self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(message.id.0)
    }

    async fn send_document(&self, chat_id: i64, path: &Path, file_name: &str, caption: &str) -> AppResult<()> {
        let document = InputFile::file(path.to_path_buf()).file_name(file_name.to_string());
        self.bot
            .send_document(ChatId(chat_id), document)
            .caption(caption)
            .await?;
        Ok(())
    }

    async fn edit_text(&self, chat_id: i64, message_id: i32, text: &str) -> AppResult<()> {
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
            .await?;
        Ok(())
    }

    async fn set_webhook(&self, url: &str) -> AppResult<()> {
        let url = url::Url::parse(url)?;
        self.bot.set_webhook(url).await?;
        Ok(())
    }

    async fn delete_webhook(&self) -> AppResult<()> {
        self.bot.delete_webhook().await?;
        Ok(())
    }
}
