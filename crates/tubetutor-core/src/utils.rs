//! Text helpers for chat delivery and a Telegram retry wrapper.

use anyhow::Result;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Maximum characters per outgoing chat message
pub const MESSAGE_CHUNK_CHARS: usize = 4000;

/// Splits `text` into consecutive pieces of at most `max_chars` characters.
///
/// Pieces are cut on grapheme cluster boundaries so combined emoji and
/// accented letters are never torn apart. Concatenating the pieces gives back
/// the input exactly; nothing is trimmed or re-wrapped. Empty input yields no
/// pieces.
///
/// # Examples
///
/// ```
/// use tubetutor_core::utils::chunk_message;
/// let parts = chunk_message("abcdefg", 3);
/// assert_eq!(parts, vec!["abc", "def", "g"]);
/// assert_eq!(parts.concat(), "abcdefg");
/// ```
#[must_use]
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for grapheme in text.graphemes(true) {
        let width = grapheme.chars().count();

        if current_chars + width > max_chars && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        // A single cluster wider than the limit is cut by scalar value
        if width > max_chars {
            for c in grapheme.chars() {
                if current_chars == max_chars {
                    parts.push(std::mem::take(&mut current));
                    current_chars = 0;
                }
                current.push(c);
                current_chars += 1;
            }
            continue;
        }

        current.push_str(grapheme);
        current_chars += width;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Safely truncates a string to a maximum character length (not bytes).
///
/// # Examples
///
/// ```
/// use tubetutor_core::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Retry a Telegram API call with exponential backoff and jitter.
///
/// Delays start at 500ms, are capped at 4s, and at most three retries are
/// made (see the `TELEGRAM_API_*` constants in `config`).
///
/// # Examples
///
/// ```no_run
/// use tubetutor_core::utils::retry_telegram_operation;
/// use anyhow::Result;
///
/// async fn send() -> Result<i32> {
///     Ok(1)
/// }
///
/// # async fn example() -> Result<()> {
/// let message_id = retry_telegram_operation(|| async { send().await }).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns the last error once every retry has failed.
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Telegram API operation failed after {} retries: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}
