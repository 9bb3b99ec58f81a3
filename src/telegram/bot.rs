//! Bot instance creation and command menu setup

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::BotCommand;

use crate::core::config;
use crate::telegram::commands::COMMAND_DESCRIPTIONS;

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to create bot (invalid URL, client build failure)
pub fn create_bot(token: &str) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token, client);

    // Check if local Bot API server is configured
    let bot = if let Some(ref bot_api_url) = *config::BOT_API_URL {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        bot.set_api_url(url)
    } else {
        bot
    };

    Ok(bot)
}

/// Publishes the command menu shown in Telegram clients
///
/// # Returns
/// * `Ok(())` - Commands set successfully
/// * `Err(RequestError)` - Failed to set commands
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    let commands: Vec<BotCommand> = COMMAND_DESCRIPTIONS
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect();

    bot.set_my_commands(commands).await?;
    Ok(())
}
