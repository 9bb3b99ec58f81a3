use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration read from the environment.
/// Every value is read once, on first access.

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
/// Empty when neither is set; the binary refuses to start in that case
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_default()
});

/// HTTP port for the webhook, REST API and static file serving
/// Read from PORT environment variable
/// Default: 3000
pub static PORT: Lazy<u16> = Lazy::new(|| env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000));

/// Public base URL override (e.g. `https://files.example.com`)
/// Read from PUBLIC_URL environment variable
/// When unset, `http://localhost:<PORT>` is used
pub static PUBLIC_URL: Lazy<Option<String>> =
    Lazy::new(|| env::var("PUBLIC_URL").ok().filter(|s| !s.trim().is_empty()));

/// Directory holding stored files
/// Read from UPLOAD_DIR environment variable
/// Default: uploads
pub static UPLOAD_DIR: Lazy<String> = Lazy::new(|| env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: docudrop.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "docudrop.log".to_string()));

/// Custom Bot API server URL (local telegram-bot-api)
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> =
    Lazy::new(|| env::var("BOT_API_URL").ok().filter(|s| !s.trim().is_empty()));

/// Maximum accepted upload body size in bytes
/// Read from MAX_UPLOAD_BYTES environment variable
/// Default: 100 MiB
pub static MAX_UPLOAD_BYTES: Lazy<usize> = Lazy::new(|| {
    env::var("MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(100 * 1024 * 1024)
});

/// Returns the public base URL without a trailing slash
pub fn public_base_url() -> String {
    match PUBLIC_URL.as_deref() {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => format!("http://localhost:{}", *PORT),
    }
}

/// Telegram delivery configuration
pub mod telegram {
    /// Bot API refuses documents larger than this over `sendDocument`
    pub const MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;

    /// Path the webhook is mounted on
    pub const WEBHOOK_PATH: &str = "/webhook/telegram";

    /// Builds the full webhook URL for a public base URL
    pub fn webhook_url(base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), WEBHOOK_PATH)
    }
}

/// External search delegate configuration
pub mod search {
    use once_cell::sync::Lazy;
    use std::env;
    use std::time::Duration;

    /// Interpreter used to run the search script
    /// Read from SEARCH_COMMAND environment variable
    /// Default: python3
    pub static COMMAND: Lazy<String> =
        Lazy::new(|| env::var("SEARCH_COMMAND").unwrap_or_else(|_| "python3".to_string()));

    /// Search script path; semantic search is disabled when unset
    /// Read from SEARCH_SCRIPT environment variable
    pub static SCRIPT: Lazy<Option<String>> =
        Lazy::new(|| env::var("SEARCH_SCRIPT").ok().filter(|s| !s.trim().is_empty()));

    /// API key forwarded to the search process
    /// Read from SEARCH_API_KEY environment variable
    pub static API_KEY: Lazy<Option<String>> =
        Lazy::new(|| env::var("SEARCH_API_KEY").ok().filter(|s| !s.is_empty()));

    /// Hard limit on a single search run (in seconds)
    pub const TIMEOUT_SECS: u64 = 30;

    /// Search timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    /// Generous because sendDocument uploads up to 50 MB
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Snapshot of the settings a running bot needs, passed explicitly into components.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub bot_token: String,
    pub port: u16,
    pub public_base_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_document_bytes: u64,
    pub search_command: String,
    pub search_script: Option<String>,
    pub search_api_key: Option<String>,
    pub search_timeout: Duration,
}

impl BotSettings {
    /// Collects settings from the environment-backed statics.
    pub fn from_env() -> Self {
        Self {
            bot_token: BOT_TOKEN.clone(),
            port: *PORT,
            public_base_url: public_base_url(),
            upload_dir: PathBuf::from(UPLOAD_DIR.as_str()),
            max_upload_bytes: *MAX_UPLOAD_BYTES,
            max_document_bytes: telegram::MAX_DOCUMENT_BYTES,
            search_command: search::COMMAND.clone(),
            search_script: search::SCRIPT.clone(),
            search_api_key: search::API_KEY.clone(),
            search_timeout: search::timeout(),
        }
    }

    /// Fails when the bot token is missing.
    pub fn validate(&self) -> Result<(), crate::core::error::AppError> {
        if self.bot_token.trim().is_empty() {
            return Err(crate::core::error::AppError::Config(
                "BOT_TOKEN environment variable not set".to_string(),
            ));
        }
        Ok(())
    }
}
