//! Inbound webhook payloads
//!
//! Only the fields the bot reads are modelled; everything else Telegram
//! sends is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// One webhook delivery
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from: Option<Sender>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Sender {
    #[serde(default)]
    pub first_name: Option<String>,
}

/// A chat message reduced to what the command router needs.
/// Built once per delivery and dropped after the reply is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub raw_text: String,
    pub chat_id: i64,
    pub first_name: Option<String>,
}

impl TelegramUpdate {
    /// Extracts the command, or `None` when the update carries no text message.
    pub fn into_command(self) -> Option<InboundCommand> {
        let message = self.message?;
        let raw_text = message.text?;
        Some(InboundCommand {
            raw_text,
            chat_id: message.chat.id,
            first_name: message.from.and_then(|f| f.first_name),
        })
    }
}
