use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;

use docudrop::cli::{Cli, Commands};
use docudrop::core::config::{self, BotSettings};
use docudrop::core::{init_logger, log_startup_configuration};
use docudrop::search::{ScriptSearch, SearchDelegate};
use docudrop::storage::FileStore;
use docudrop::telegram::{create_bot, setup_bot_commands, CommandRouter, Messenger, TelegramMessenger};
use docudrop::web::{start_web_server, AppState};

/// Main entry point
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, missing token, bot creation, server bind).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    let settings = BotSettings::from_env();
    if let Err(e) = settings.validate() {
        log::error!("{}", e);
        return Err(e.into());
    }

    let bot = create_bot(&settings.bot_token)?;
    let messenger = Arc::new(TelegramMessenger::new(bot));

    match cli.command {
        Some(Commands::Serve { register_webhook }) => run_server(settings, messenger, register_webhook).await,
        Some(Commands::SetWebhook { url }) => {
            let url = url.unwrap_or_else(|| config::telegram::webhook_url(&settings.public_base_url));
            messenger.set_webhook(&url).await?;
            log::info!("Webhook set to {}", url);
            Ok(())
        }
        Some(Commands::RemoveWebhook) => {
            messenger.delete_webhook().await?;
            log::info!("Webhook removed");
            Ok(())
        }
        None => {
            log::info!("No command specified, running server");
            run_server(settings, messenger, false).await
        }
    }
}

/// Wires the store, search delegate and router together and serves HTTP until Ctrl-C.
async fn run_server(settings: BotSettings, messenger: Arc<TelegramMessenger>, register_webhook: bool) -> Result<()> {
    log_startup_configuration(&settings);

    let store = Arc::new(FileStore::new(&settings.upload_dir, &settings.public_base_url)?);

    let search: Option<Arc<dyn SearchDelegate>> = settings.search_script.as_ref().map(|script| {
        Arc::new(ScriptSearch::new(
            &settings.search_command,
            script,
            &settings.upload_dir,
            settings.search_api_key.clone(),
            settings.search_timeout,
        )) as Arc<dyn SearchDelegate>
    });

    if let Err(e) = setup_bot_commands(messenger.bot()).await {
        log::warn!("Failed to publish bot commands: {}. Continuing anyway.", e);
    }

    if register_webhook {
        let url = config::telegram::webhook_url(&settings.public_base_url);
        match messenger.set_webhook(&url).await {
            Ok(()) => log::info!("Webhook set to {}", url),
            Err(e) => log::error!("Failed to set webhook {}: {}", url, e),
        }
    }

    let messenger: Arc<dyn Messenger> = messenger;
    let router = Arc::new(CommandRouter::new(
        Arc::clone(&store),
        Arc::clone(&messenger),
        search,
        settings.max_document_bytes,
    ));

    let state = Arc::new(AppState {
        router,
        store,
        messenger,
        public_base_url: settings.public_base_url.clone(),
        max_upload_bytes: settings.max_upload_bytes,
    });

    start_web_server(state, settings.port, async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        log::info!("Shutting down gracefully...");
    })
    .await
}
