//! Transcript acquisition
//!
//! A [`TranscriptSource`] performs one retrieval through one proxy. The
//! [`RetryingFetcher`] wraps a source with the rotation policy so that each
//! attempt leaves through a different egress identity, and normalizes the
//! terminal failure into a message fit for end users.

/// YouTube caption-track source
pub mod youtube;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::lazy::LazyResource;
use crate::proxy::{ProxyError, ProxyIdentity, ProxyPool};
use crate::retry::RotationPolicy;

pub use youtube::YoutubeTranscriptSource;

/// One timed caption line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text
    pub text: String,
    /// Start offset in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
}

/// Failure of a single retrieval attempt
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// Connection, proxy or HTTP status failure
    #[error("network error: {0}")]
    Network(String),
    /// Upstream answered with its bot-check page
    #[error("request blocked by upstream bot check")]
    Blocked,
    /// The video has no usable caption track
    #[error("no transcript available: {0}")]
    NotAvailable(String),
    /// The upstream payload could not be understood
    #[error("unexpected upstream payload: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TranscriptError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

/// Retrieves the transcript of one video through one proxy
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the caption segments of `video_id`, routing traffic through `proxy`
    async fn fetch(
        &self,
        video_id: &str,
        proxy: &ProxyIdentity,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}

/// Terminal failure of a transcript fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt failed
    #[error("Could not get the transcript. The video likely has no captions or the link is invalid.")]
    Unavailable {
        /// Attempts made
        attempts: usize,
        /// Cause reported by the last attempt, for logs only
        last_cause: String,
    },
    /// The proxy pool could not be built
    #[error("proxy configuration error: {0}")]
    Config(#[from] ProxyError),
}

/// Transcript fetcher that rotates proxies between attempts
pub struct RetryingFetcher {
    source: Arc<dyn TranscriptSource>,
    proxies: Arc<LazyResource<ProxyPool, ProxyError>>,
    policy: RotationPolicy,
}

impl RetryingFetcher {
    /// Compose a source, a lazily built proxy pool and a rotation policy
    #[must_use]
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        proxies: Arc<LazyResource<ProxyPool, ProxyError>>,
        policy: RotationPolicy,
    ) -> Self {
        Self {
            source,
            proxies,
            policy,
        }
    }

    /// Fetch a transcript, drawing a fresh proxy for every attempt.
    ///
    /// Attempts run back to back and stop at the first success.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Unavailable` once the attempt budget is spent and
    /// `FetchError::Config` if the proxy pool cannot be built.
    #[instrument(skip(self))]
    pub async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, FetchError> {
        let pool = self.proxies.get_or_init().await?;
        let source = &self.source;

        info!(
            max_attempts = self.policy.max_attempts(),
            proxies = pool.len(),
            "Fetching transcript"
        );

        self.policy
            .run(pool.as_ref(), |_, proxy| async move {
                source.fetch(video_id, &proxy).await
            })
            .await
            .map_err(|exhausted| {
                error!(
                    attempts = exhausted.attempts,
                    last_error = %exhausted.last_error,
                    "Transcript fetch exhausted all attempts"
                );
                FetchError::Unavailable {
                    attempts: exhausted.attempts,
                    last_cause: exhausted.last_error.to_string(),
                }
            })
    }
}

/// Joins caption lines into one space-separated text
#[must_use]
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::proxy_pool as pool;
    use mockall::predicate::{always, eq};
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn segment(text: &str) -> TranscriptSegment {
        TranscriptSegment {
            text: text.to_string(),
            start: 0.0,
            duration: 1.0,
        }
    }

    #[test]
    fn test_join_segments() {
        let joined = join_segments(&[segment("hello"), segment("world")]);
        assert_eq!(joined, "hello world");
        assert_eq!(join_segments(&[]), "");
    }

    #[tokio::test]
    async fn test_exhaustion_is_normalized() {
        let used = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&used);

        let mut source = MockTranscriptSource::new();
        source
            .expect_fetch()
            .with(eq("vid"), always())
            .times(10)
            .returning(move |_, proxy| {
                if let Ok(mut used) = recorder.lock() {
                    used.push(proxy.host().to_string());
                }
                Err(TranscriptError::Network("HTTP 429".to_string()))
            });

        let fetcher = RetryingFetcher::new(
            Arc::new(source),
            pool("a:1:u:p,b:2:u:p,c:3:u:p"),
            RotationPolicy::new(10),
        );

        let (attempts, last_cause) = match fetcher.fetch("vid").await {
            Err(FetchError::Unavailable {
                attempts,
                last_cause,
            }) => (attempts, last_cause),
            other => panic!("expected Unavailable, got {other:?}"),
        };
        assert_eq!(attempts, 10);
        assert!(last_cause.contains("429"));

        let message = FetchError::Unavailable {
            attempts,
            last_cause,
        }
        .to_string();
        assert!(!message.contains("429"));

        let used = used.lock().map(|u| u.clone()).unwrap_or_default();
        assert_eq!(used.len(), 10);
        let distinct: HashSet<&String> = used.iter().collect();
        assert!(distinct.len() > 1);
    }

    #[tokio::test]
    async fn test_success_after_two_failures() {
        let mut source = MockTranscriptSource::new();
        let mut sequence = mockall::Sequence::new();
        source
            .expect_fetch()
            .times(2)
            .in_sequence(&mut sequence)
            .returning(|_, _| Err(TranscriptError::Blocked));
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(vec![segment("hi")]));

        let fetcher =
            RetryingFetcher::new(Arc::new(source), pool("a:1:u:p"), RotationPolicy::new(10));

        let segments = fetcher.fetch("vid").await;
        assert!(matches!(segments.as_deref(), Ok([s]) if s.text == "hi"));
    }

    #[tokio::test]
    async fn test_invalid_proxy_config_surfaces() {
        let source = MockTranscriptSource::new();
        let fetcher =
            RetryingFetcher::new(Arc::new(source), pool("broken"), RotationPolicy::default());

        let result = fetcher.fetch("vid").await;
        assert!(matches!(
            result,
            Err(FetchError::Config(ProxyError::NoValidProxies { .. }))
        ));
    }
}
