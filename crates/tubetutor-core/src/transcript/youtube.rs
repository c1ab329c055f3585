use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{TranscriptError, TranscriptSegment, TranscriptSource};
use crate::config::TutorSettings;
use crate::proxy::ProxyIdentity;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const CAPTIONS_MARKER: &str = "\"captions\":";
const RECAPTCHA_MARKER: &str = "class=\"g-recaptcha\"";

/// One caption track advertised by the watch page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptionTrack {
    /// Download URL of the track
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    /// BCP-47 language code, e.g. `en` or `pt-BR`
    #[serde(rename = "languageCode")]
    pub language_code: String,
    /// `asr` for automatically generated tracks
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    /// Whether the track was produced by speech recognition
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches_language(&self, language: &str) -> bool {
        let code = self.language_code.to_lowercase();
        code == language
            || code
                .strip_prefix(language)
                .is_some_and(|rest| rest.starts_with('-'))
    }
}

#[derive(Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Transcript source reading YouTube caption tracks
#[derive(Debug, Clone)]
pub struct YoutubeTranscriptSource {
    timeout: Duration,
    languages: Vec<String>,
}

impl YoutubeTranscriptSource {
    /// Create a source with a per-request timeout and preferred languages
    #[must_use]
    pub fn new(timeout: Duration, languages: Vec<String>) -> Self {
        Self { timeout, languages }
    }

    /// Create a source from settings
    #[must_use]
    pub fn from_settings(settings: &TutorSettings) -> Self {
        Self::new(
            Duration::from_secs(settings.transcript_http_timeout_secs),
            settings.transcript_languages(),
        )
    }

    fn client_for(&self, proxy: &ProxyIdentity) -> Result<Client, TranscriptError> {
        let proxy = reqwest::Proxy::all(proxy.url())?.basic_auth(proxy.username(), proxy.password());
        Ok(Client::builder()
            .proxy(proxy)
            .timeout(self.timeout)
            .cookie_store(true)
            .build()?)
    }

    async fn get_text(client: &Client, url: &str) -> Result<String, TranscriptError> {
        let response = client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscriptError::Blocked);
        }
        if !status.is_success() {
            return Err(TranscriptError::Network(format!("HTTP {status}")));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    async fn fetch(
        &self,
        video_id: &str,
        proxy: &ProxyIdentity,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let client = self.client_for(proxy)?;

        let page = Self::get_text(&client, &format!("{WATCH_URL}{video_id}")).await?;
        let tracks = extract_caption_tracks(&page)?;
        let track = select_track(&tracks, &self.languages).ok_or_else(|| {
            TranscriptError::NotAvailable("no caption tracks listed".to_string())
        })?;

        debug!(
            language = %track.language_code,
            generated = track.is_generated(),
            "Selected caption track"
        );

        let body = Self::get_text(&client, &format!("{}&fmt=json3", track.base_url)).await?;
        parse_json3(&body)
    }
}

/// Reads the caption track list embedded in a watch page.
///
/// # Errors
///
/// Returns `Blocked` for the bot-check page, `NotAvailable` when the page
/// carries no caption data and `Parse` when the embedded JSON is malformed.
pub fn extract_caption_tracks(page: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    if page.contains(RECAPTCHA_MARKER) {
        return Err(TranscriptError::Blocked);
    }

    let Some(offset) = page.find(CAPTIONS_MARKER) else {
        return Err(TranscriptError::NotAvailable(
            "captions are disabled for this video".to_string(),
        ));
    };

    let rest = &page[offset + CAPTIONS_MARKER.len()..];
    let captions: Value = serde_json::Deserializer::from_str(rest)
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| TranscriptError::Parse("truncated captions object".to_string()))?
        .map_err(|e| TranscriptError::Parse(e.to_string()))?;

    let tracks = captions
        .pointer("/playerCaptionsTracklistRenderer/captionTracks")
        .cloned()
        .ok_or_else(|| TranscriptError::NotAvailable("no caption tracks listed".to_string()))?;

    serde_json::from_value(tracks).map_err(|e| TranscriptError::Parse(e.to_string()))
}

/// Picks a track: a manual one in a preferred language, then a generated one
/// in a preferred language, then whatever is listed first.
#[must_use]
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    let preferred = |generated: bool| {
        languages.iter().find_map(|language| {
            tracks
                .iter()
                .find(|t| t.is_generated() == generated && t.matches_language(language))
        })
    };

    preferred(false)
        .or_else(|| preferred(true))
        .or_else(|| tracks.first())
}

/// Parses a `json3` caption document into segments.
///
/// # Errors
///
/// Returns `Parse` for malformed JSON and `NotAvailable` for a track with no
/// text.
pub fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
    let document: Json3 =
        serde_json::from_str(body).map_err(|e| TranscriptError::Parse(e.to_string()))?;

    #[allow(clippy::cast_precision_loss)]
    let segments: Vec<TranscriptSegment> = document
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|seg| seg.utf8.as_str()).collect();
            let text = text.replace('\n', " ").trim().to_string();
            (!text.is_empty()).then(|| TranscriptSegment {
                text,
                start: event.start_ms as f64 / 1000.0,
                duration: event.duration_ms as f64 / 1000.0,
            })
        })
        .collect();

    if segments.is_empty() {
        return Err(TranscriptError::NotAvailable(
            "caption track is empty".to_string(),
        ));
    }
    Ok(segments)
}
