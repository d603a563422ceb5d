//! Bot construction and chat-id parsing from [`TelegramConfig`].

use std::time::Duration;

use {
    buran_config::TelegramConfig,
    secrecy::ExposeSecret,
    teloxide::{
        Bot,
        types::{ChatId, Recipient},
    },
};

use crate::{Error, Result};

/// Bot API requests use `timeout = 0`, so this only bounds a stuck connection.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the bot client, or `None` when no token is configured.
pub fn build_bot(config: &TelegramConfig) -> Result<Option<Bot>> {
    if !config.is_configured() {
        return Ok(None);
    }

    let client = teloxide::net::default_reqwest_settings()
        .timeout(HTTP_TIMEOUT)
        .build()?;
    let mut bot = Bot::with_client(config.token.expose_secret().trim(), client);

    if let Some(url) = config.api_url.as_deref() {
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::external(format!("invalid telegram api_url {url:?}"), e))?;
        bot = bot.set_api_url(url);
    }

    Ok(Some(bot))
}

/// Parse a configured chat: numeric ids become [`ChatId`], anything else is
/// treated as a public `@channel` username.
pub fn parse_recipient(chat_id: &str) -> Option<Recipient> {
    let chat_id = chat_id.trim();
    if chat_id.is_empty() {
        return None;
    }
    Some(match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => {
            let name = if chat_id.starts_with('@') {
                chat_id.to_string()
            } else {
                format!("@{chat_id}")
            };
            Recipient::ChannelUsername(name)
        },
    })
}

/// Numeric operator chat id, used to filter inbound updates. `None` for
/// username-addressed chats, which cannot be matched against update chat ids.
pub fn numeric_chat_id(chat_id: &str) -> Option<i64> {
    chat_id.trim().parse().ok()
}
