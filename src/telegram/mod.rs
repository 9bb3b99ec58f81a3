//! Telegram bot integration: inbound payloads, command routing, outbound calls

pub mod bot;
pub mod commands;
pub mod messenger;
pub mod router;
pub mod types;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands};
pub use commands::Command;
pub use messenger::{Messenger, TelegramMessenger};
pub use router::{CommandRouter, Reply};
pub use types::{InboundCommand, TelegramUpdate};
