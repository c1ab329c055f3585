//! Telegram API calls with automatic retry on transient failures.
//!
//! Each wrapper goes through [`tubetutor_core::utils::retry_telegram_operation`]
//! (exponential backoff with jitter). Errors that retrying cannot fix, such as
//! an edit with unchanged text or deleting a message that is already gone,
//! are reported as `Ok` instead.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Message, MessageId};
use tracing::debug;
use tubetutor_core::utils::{retry_telegram_operation, truncate_str, MESSAGE_CHUNK_CHARS};

const ERROR_NOT_MODIFIED: &str = "message is not modified";
const ERROR_DELETE_NOT_FOUND: &str = "message to delete not found";
const ERROR_EDIT_NOT_FOUND: &str = "message to edit not found";

/// Send a plain-text message with automatic retry on network failures.
///
/// # Errors
///
/// Returns the last error once all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
) -> Result<Message> {
    let text = text.into();
    retry_telegram_operation(|| async {
        bot.send_message(chat_id, text.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Replace the text of a message with automatic retry.
///
/// Text longer than one message is truncated. Returns `Ok(None)` when the
/// message already shows this text.
///
/// # Errors
///
/// Returns the last error once all retries are exhausted.
pub async fn edit_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    text: &str,
) -> Result<Option<Message>> {
    let text = truncate_str(text, MESSAGE_CHUNK_CHARS);
    retry_telegram_operation(|| async {
        match bot.edit_message_text(chat_id, msg_id, text.clone()).await {
            Ok(msg) => Ok(Some(msg)),
            Err(e) if e.to_string().contains(ERROR_NOT_MODIFIED) => Ok(None),
            Err(e) if e.to_string().contains(ERROR_EDIT_NOT_FOUND) => {
                debug!("Message to edit is gone: {e}");
                Ok(None)
            }
            Err(e) => Err(anyhow::anyhow!("Telegram edit error: {e}")),
        }
    })
    .await
}

/// Delete a message with automatic retry.
///
/// A message that no longer exists counts as deleted.
///
/// # Errors
///
/// Returns the last error once all retries are exhausted.
pub async fn delete_message_resilient(bot: &Bot, chat_id: ChatId, msg_id: MessageId) -> Result<()> {
    retry_telegram_operation(|| async {
        match bot.delete_message(chat_id, msg_id).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains(ERROR_DELETE_NOT_FOUND) => {
                debug!("Message already deleted: {e}");
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!("Telegram delete error: {e}")),
        }
    })
    .await
}
