//! YouTube video URL parsing

// lazy_regex! statics are once_cell based
#![allow(clippy::non_std_lazy_statics)]

use lazy_regex::lazy_regex;
use reqwest::Url;
use thiserror::Error;

static RE_VIDEO_ID: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"^[A-Za-z0-9_-]+$");

/// Error raised for links that do not point at a YouTube video
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VideoIdError {
    /// The text is not a recognised YouTube video URL
    #[error("not a YouTube video URL: {0}")]
    InvalidUrl(String),
}

/// Extracts the video id from a YouTube link.
///
/// Accepted forms:
/// - `https://youtu.be/<id>`
/// - `https://{www.,m.,}youtube.com/watch?v=<id>`
/// - `https://{www.,m.,}youtube.com/{embed,v,shorts}/<id>`
///
/// # Examples
///
/// ```
/// use tubetutor_core::video_id::extract_video_id;
/// assert_eq!(extract_video_id("https://youtu.be/abc123").unwrap(), "abc123");
/// assert!(extract_video_id("https://example.com/watch?v=abc123").is_err());
/// ```
///
/// # Errors
///
/// Returns `VideoIdError::InvalidUrl` for anything else.
pub fn extract_video_id(url: &str) -> Result<String, VideoIdError> {
    let invalid = || VideoIdError::InvalidUrl(url.to_string());
    let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }

    let host = parsed.host_str().ok_or_else(invalid)?;
    let mut segments = parsed.path_segments().ok_or_else(invalid)?;

    let id = match host {
        "youtu.be" => segments.next().map(ToString::to_string),
        "youtube.com" | "www.youtube.com" | "m.youtube.com" => match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed" | "v" | "shorts") => segments.next().map(ToString::to_string),
            _ => None,
        },
        _ => None,
    };

    id.filter(|id| is_plausible_id(id)).ok_or_else(invalid)
}

fn is_plausible_id(id: &str) -> bool {
    RE_VIDEO_ID.is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_forms() {
        let cases = [
            ("https://youtu.be/abc123", "abc123"),
            ("https://youtu.be/abc123?t=42", "abc123"),
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtube.com/watch?feature=share&v=a-b_c", "a-b_c"),
            ("http://m.youtube.com/watch?v=xyz", "xyz"),
            ("https://www.youtube.com/embed/emb1", "emb1"),
            ("https://www.youtube.com/v/old1", "old1"),
            ("https://youtube.com/shorts/short1", "short1"),
            ("  https://youtu.be/trimmed  ", "trimmed"),
        ];
        for (url, expected) in cases {
            assert_eq!(extract_video_id(url).as_deref(), Ok(expected), "{url}");
        }
    }

    #[test]
    fn test_rejected_forms() {
        let cases = [
            "not a url",
            "https://example.com/watch?v=abc",
            "https://youtu.be/",
            "https://www.youtube.com/watch",
            "https://www.youtube.com/watch?v=",
            "https://www.youtube.com/channel/UC123",
            "ftp://youtu.be/abc",
            "https://youtu.be/a%20b",
        ];
        for url in cases {
            assert!(
                matches!(extract_video_id(url), Err(VideoIdError::InvalidUrl(_))),
                "{url}"
            );
        }
    }
}
