//! Chat transport seam
//!
//! Handlers talk to the chat through [`ChatTransport`] so the dispatch path
//! can run against an in-memory transport in tests.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};
use teloxide::Bot;

use super::resilient::{delete_message_resilient, edit_message_resilient, send_message_resilient};

/// Address of a message the bot has sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    /// Chat the message lives in
    pub chat_id: i64,
    /// Message id within the chat
    pub message_id: i32,
}

/// Outbound chat operations used by the handlers
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain-text message
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageHandle>;

    /// Replace the text of a previously sent message
    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<()>;

    /// Delete a previously sent message
    async fn delete_message(&self, handle: MessageHandle) -> Result<()>;

    /// Username of the bot, used to recognise commands addressed to it
    fn bot_username(&self) -> Option<&str> {
        None
    }
}

/// [`ChatTransport`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    username: Option<String>,
}

impl TelegramTransport {
    /// Wrap a configured bot client
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self {
            bot,
            username: None,
        }
    }

    /// Set the username commands must be addressed to
    #[must_use]
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageHandle> {
        let sent = send_message_resilient(&self.bot, ChatId(chat_id), text).await?;
        Ok(MessageHandle {
            chat_id,
            message_id: sent.id.0,
        })
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<()> {
        edit_message_resilient(
            &self.bot,
            ChatId(handle.chat_id),
            MessageId(handle.message_id),
            text,
        )
        .await?;
        Ok(())
    }

    async fn delete_message(&self, handle: MessageHandle) -> Result<()> {
        delete_message_resilient(
            &self.bot,
            ChatId(handle.chat_id),
            MessageId(handle.message_id),
        )
        .await
    }

    fn bot_username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}
