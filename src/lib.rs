//! docudrop - Telegram bot that keeps uploaded files and sends them back on request
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, and small utilities
//! - `storage`: The flat-directory file store
//! - `search`: External semantic search delegate
//! - `telegram`: Command parsing, routing, and Bot API calls
//! - `web`: Webhook, REST API, and static file serving

pub mod cli;
pub mod core;
pub mod search;
pub mod storage;
pub mod telegram;
pub mod web;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use storage::{FileStore, StoredFile};
pub use telegram::{CommandRouter, Messenger};
