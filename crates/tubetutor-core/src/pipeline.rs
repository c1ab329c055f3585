//! Link-to-tutorial pipeline
//!
//! Parses the video link, fetches the transcript through rotating proxies,
//! builds the prompt and asks the model for the tutorial text.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::llm::{LlmError, LlmProvider};
use crate::prompt::build_tutorial_prompt;
use crate::transcript::{join_segments, FetchError, RetryingFetcher};
use crate::video_id::{extract_video_id, VideoIdError};

/// Message shown for links that are not YouTube videos
pub const INVALID_LINK_MESSAGE: &str = "Invalid YouTube URL. Please check and try again.";
/// Message shown when tutorial generation fails
pub const GENERATION_FAILED_MESSAGE: &str =
    "Could not generate a tutorial for this video right now. Please try again later.";

/// Failure of the tutorial pipeline
#[derive(Debug, Error)]
pub enum TutorialError {
    /// The text is not a supported video link
    #[error(transparent)]
    InvalidReference(#[from] VideoIdError),
    /// The transcript could not be retrieved
    #[error(transparent)]
    Transcript(#[from] FetchError),
    /// The model call failed
    #[error("tutorial generation failed: {0}")]
    Generation(#[from] LlmError),
}

impl TutorialError {
    /// Text to show in the chat. Never contains raw upstream errors.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidReference(_) => INVALID_LINK_MESSAGE.to_string(),
            Self::Transcript(FetchError::Unavailable { .. }) => self.to_string(),
            Self::Transcript(FetchError::Config(_)) | Self::Generation(_) => {
                GENERATION_FAILED_MESSAGE.to_string()
            }
        }
    }
}

/// Turns a video link into tutorial text
pub struct TutorialPipeline {
    fetcher: RetryingFetcher,
    generator: Arc<dyn LlmProvider>,
}

impl TutorialPipeline {
    /// Create a pipeline from a transcript fetcher and a text generator
    #[must_use]
    pub fn new(fetcher: RetryingFetcher, generator: Arc<dyn LlmProvider>) -> Self {
        Self { fetcher, generator }
    }

    /// Produce a tutorial for the video at `url`.
    ///
    /// # Errors
    ///
    /// Returns a `TutorialError` naming the failed stage; use
    /// [`TutorialError::user_message`] for chat output.
    #[instrument(skip(self))]
    pub async fn create_tutorial(&self, url: &str) -> Result<String, TutorialError> {
        let video_id = extract_video_id(url).inspect_err(|e| warn!("Rejected link: {e}"))?;

        let segments = self.fetcher.fetch(&video_id).await?;
        let transcript = join_segments(&segments);
        info!(
            video_id = %video_id,
            segments = segments.len(),
            transcript_chars = transcript.len(),
            "Transcript ready"
        );

        let prompt = build_tutorial_prompt(&transcript);
        let tutorial = self
            .generator
            .generate(&prompt)
            .await
            .inspect_err(|e| error!(video_id = %video_id, "Tutorial generation failed: {e}"))?;

        info!(video_id = %video_id, tutorial_chars = tutorial.len(), "Tutorial generated");
        Ok(tutorial)
    }
}
