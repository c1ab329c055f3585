#![deny(missing_docs)]
//! Tubetutor core library.
//!
//! Transcript acquisition through rotating proxies, tutorial generation,
//! duplicate-delivery suppression and lazily constructed shared resources.

/// Configuration management.
pub mod config;
/// Bounded duplicate-delivery suppression.
pub mod idempotency;
/// Exactly-once lazy construction of shared resources.
pub mod lazy;
/// LLM providers.
pub mod llm;
/// Transcript-to-tutorial pipeline.
pub mod pipeline;
/// Tutorial prompt template.
pub mod prompt;
/// Egress proxy pool.
pub mod proxy;
/// Identity-rotating retry policy.
pub mod retry;
/// Transcript sources and the retrying fetcher.
pub mod transcript;
/// Utility functions.
pub mod utils;
/// YouTube URL parsing.
pub mod video_id;

#[cfg(test)]
pub mod testing;
