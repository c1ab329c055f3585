use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};
use tubetutor_core::pipeline::TutorialPipeline;
use tubetutor_core::utils::{chunk_message, MESSAGE_CHUNK_CHARS};

use super::transport::{ChatTransport, MessageHandle};
use super::update::{Intent, TextMessage};

/// Greeting sent for `/start`
pub const WELCOME_MESSAGE: &str = "👋 Welcome! I create tutorials from YouTube videos.\n\n\
Simply send me a YouTube URL, and I'll:\n\
1. Extract the video transcript\n\
2. Generate an actionable tutorial\n\n\
Try it now by sending a YouTube URL!";

/// Transient message shown while a tutorial is being produced
pub const STATUS_MESSAGE: &str = "Processing your request... This may take a minute. 🐵";

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the welcome message
    #[command(description = "Show how to use the bot.")]
    Start,
}

/// Business logic for text messages
pub struct TutorHandler {
    pipeline: Arc<TutorialPipeline>,
    cleanup_timeout: Duration,
}

impl TutorHandler {
    /// Create a handler around the tutorial pipeline
    #[must_use]
    pub fn new(pipeline: Arc<TutorialPipeline>, cleanup_timeout: Duration) -> Self {
        Self {
            pipeline,
            cleanup_timeout,
        }
    }

    /// Handle one text message.
    ///
    /// Failures of the tutorial itself are reported to the chat; only
    /// transport failures surface as errors.
    ///
    /// # Errors
    ///
    /// Returns an error if a required chat message cannot be sent.
    pub async fn handle(&self, transport: &dyn ChatTransport, message: &TextMessage) -> Result<()> {
        match message.intent(transport.bot_username()) {
            Intent::Command(Command::Start) => {
                info!(chat_id = message.chat_id, "Sending welcome message");
                transport.send_text(message.chat_id, WELCOME_MESSAGE).await?;
            }
            Intent::UnknownCommand(name) => {
                debug!(chat_id = message.chat_id, command = %name, "Ignoring unknown command");
            }
            Intent::Text(url) => {
                self.create_tutorial(transport, message.chat_id, &url)
                    .await?;
            }
        }
        Ok(())
    }

    async fn create_tutorial(
        &self,
        transport: &dyn ChatTransport,
        chat_id: i64,
        url: &str,
    ) -> Result<()> {
        let status = transport.send_text(chat_id, STATUS_MESSAGE).await?;

        match self.pipeline.create_tutorial(url).await {
            Ok(tutorial) => {
                self.remove_status(transport, status).await;

                let chunks = chunk_message(&tutorial, MESSAGE_CHUNK_CHARS);
                info!(chat_id, chunks = chunks.len(), "Delivering tutorial");
                for chunk in chunks {
                    transport.send_text(chat_id, &chunk).await?;
                }
            }
            Err(e) => {
                warn!(chat_id, "Tutorial request failed: {e}");
                transport.edit_text(status, &e.user_message()).await?;
            }
        }
        Ok(())
    }

    /// Best-effort, bounded removal of the status message
    async fn remove_status(&self, transport: &dyn ChatTransport, status: MessageHandle) {
        match tokio::time::timeout(self.cleanup_timeout, transport.delete_message(status)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to delete status message: {e}"),
            Err(_) => warn!(
                timeout_secs = self.cleanup_timeout.as_secs(),
                "Timed out deleting status message"
            ),
        }
    }
}
