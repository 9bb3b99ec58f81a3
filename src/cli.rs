use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "docudrop")]
#[command(author, version, about = "Telegram bot that stores files and sends them back on command", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (webhook, REST API, downloads)
    Serve {
        /// Register the webhook with Telegram on startup
        #[arg(long)]
        register_webhook: bool,
    },

    /// Register the webhook with Telegram and exit
    SetWebhook {
        /// Webhook URL; defaults to <PUBLIC_URL>/webhook/telegram
        #[arg(long)]
        url: Option<String>,
    },

    /// Remove the webhook and exit
    RemoveWebhook,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
