//! Telegram notification channel.

use crate::notifier::{NotificationChannel, NotifyError};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, ParseMode};

/// Parse a chat id as configured (a signed integer).
pub fn parse_chat_id(destination: &str) -> Result<ChatId, NotifyError> {
    destination
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| NotifyError::InvalidDestination(destination.to_string()))
}

/// Message options with link previews turned off.
pub fn no_link_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// Telegram bot wrapper.
#[derive(Clone)]
pub struct TelegramBot {
    bot: Bot,
}

impl TelegramBot {
    /// Create a new bot with the given token.
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    /// Get the underlying bot, e.g. for the command dispatcher.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Send an HTML message to a chat, without link previews.
    pub async fn send_html(&self, chat_id: ChatId, message: &str) -> Result<(), NotifyError> {
        self.bot
            .send_message(chat_id, message)
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_link_preview())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for TelegramBot {
    async fn send(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
        let chat_id = parse_chat_id(destination)?;
        self.send_html(chat_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_id() {
        assert_eq!(parse_chat_id("1371753467").unwrap(), ChatId(1371753467));
        assert_eq!(parse_chat_id(" -100200300 ").unwrap(), ChatId(-100200300));
        assert!(matches!(
            parse_chat_id("@channel"),
            Err(NotifyError::InvalidDestination(_))
        ));
    }

    #[test]
    fn test_link_previews_disabled() {
        let options = no_link_preview();
        assert!(options.is_disabled);
        assert!(options.url.is_none());
    }

    #[tokio::test]
    async fn test_invalid_destination_fails_before_request() {
        let bot = TelegramBot::new("123:TEST");
        let err = bot.send("not-a-chat", "hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidDestination(_)));
    }
}
