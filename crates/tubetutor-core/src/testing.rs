//! Testing helpers and mock constructors.

use std::sync::Arc;

use crate::lazy::LazyResource;
use crate::llm::MockLlmProvider;
use crate::proxy::{ProxyError, ProxyPool};
use crate::transcript::{MockTranscriptSource, TranscriptSegment};

/// Create a mock generator that answers every prompt with `response_text`.
#[must_use]
pub fn mock_llm_fixed(response_text: &'static str) -> MockLlmProvider {
    let mut mock = MockLlmProvider::new();
    mock.expect_generate()
        .returning(move |_| Ok(response_text.to_string()));
    mock
}

/// Create a mock transcript source that always succeeds with `lines`.
#[must_use]
pub fn mock_transcript_fixed(lines: &[&str]) -> MockTranscriptSource {
    let segments: Vec<TranscriptSegment> = lines
        .iter()
        .zip(0u32..)
        .map(|(text, index)| TranscriptSegment {
            text: (*text).to_string(),
            start: f64::from(index),
            duration: 1.0,
        })
        .collect();

    let mut mock = MockTranscriptSource::new();
    mock.expect_fetch()
        .returning(move |_, _| Ok(segments.clone()));
    mock
}

/// Lazily parsed proxy pool over a static configuration string.
#[must_use]
pub fn proxy_pool(entries: &'static str) -> Arc<LazyResource<ProxyPool, ProxyError>> {
    Arc::new(LazyResource::new("proxy_pool", move || async move {
        ProxyPool::parse(entries).map(Arc::new)
    }))
}
