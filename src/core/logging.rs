//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup configuration summary

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config::BotSettings;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at startup.
///
/// The bot token itself is never logged.
pub fn log_startup_configuration(settings: &BotSettings) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("📦 docudrop configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Port:            {}", settings.port);
    log::info!("Public URL:      {}", settings.public_base_url);
    log::info!("Upload dir:      {}", settings.upload_dir.display());
    log::info!("Max upload size: {} bytes", settings.max_upload_bytes);

    match settings.search_script {
        Some(ref script) => {
            log::info!("✅ Semantic search: {} {}", settings.search_command, script);
            if settings.search_api_key.is_none() {
                log::warn!("⚠️  SEARCH_API_KEY not set; the search script may refuse to run");
            }
        }
        None => log::info!("Semantic search disabled (SEARCH_SCRIPT unset)"),
    }

    if settings.public_base_url.starts_with("http://localhost") {
        log::warn!("⚠️  PUBLIC_URL not set; download links and the webhook will point at localhost");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::NamedTempFile;

    #[test]
    fn test_init_logger_creates_log_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        // A second init in the same test binary fails; both outcomes are fine here
        let _ = init_logger(path);

        assert!(temp_file.path().exists());
    }
}
