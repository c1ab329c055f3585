//! In-memory chat, upstream and model used by the dispatch tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tubetutor_core::idempotency::IdempotencyCache;
use tubetutor_core::lazy::LazyResource;
use tubetutor_core::llm::{LlmError, LlmProvider};
use tubetutor_core::pipeline::TutorialPipeline;
use tubetutor_core::proxy::{ProxyIdentity, ProxyPool};
use tubetutor_core::retry::RotationPolicy;
use tubetutor_core::transcript::{
    RetryingFetcher, TranscriptError, TranscriptSegment, TranscriptSource,
};
use tubetutor_transport_telegram::bot::handlers::TutorHandler;
use tubetutor_transport_telegram::bot::{ChatTransport, MessageHandle};
use tubetutor_transport_telegram::dispatcher::{SharedTransport, WebhookDispatcher};

/// One outbound chat operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOp {
    Sent(MessageHandle, String),
    Edited(MessageHandle, String),
    Deleted(MessageHandle),
}

/// How `delete_message` behaves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteBehaviour {
    #[default]
    Succeed,
    Fail,
    Hang,
}

pub const BOT_USERNAME: &str = "tubetutor_bot";

/// Chat transport that records every call
#[derive(Default)]
pub struct RecordingChat {
    next_id: AtomicI32,
    ops: Mutex<Vec<ChatOp>>,
    delete: DeleteBehaviour,
    username: Option<String>,
}

impl RecordingChat {
    pub fn new(delete: DeleteBehaviour) -> Self {
        Self {
            delete,
            username: Some(BOT_USERNAME.to_string()),
            ..Self::default()
        }
    }

    pub fn ops(&self) -> Vec<ChatOp> {
        self.ops.lock().map(|ops| ops.clone()).unwrap_or_default()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                ChatOp::Sent(_, text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: ChatOp) {
        if let Ok(mut ops) = self.ops.lock() {
            ops.push(op);
        }
    }
}

#[async_trait]
impl ChatTransport for RecordingChat {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageHandle> {
        let handle = MessageHandle {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.record(ChatOp::Sent(handle, text.to_string()));
        Ok(handle)
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<()> {
        self.record(ChatOp::Edited(handle, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, handle: MessageHandle) -> Result<()> {
        self.record(ChatOp::Deleted(handle));
        match self.delete {
            DeleteBehaviour::Succeed => Ok(()),
            DeleteBehaviour::Fail => Err(anyhow::anyhow!("Bad Request: message can't be deleted")),
            DeleteBehaviour::Hang => std::future::pending().await,
        }
    }

    fn bot_username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

/// Upstream that returns fixed captions after an optional delay
pub struct FixedUpstream {
    pub lines: Vec<&'static str>,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FixedUpstream {
    pub fn new(lines: Vec<&'static str>) -> Self {
        Self {
            lines,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TranscriptSource for FixedUpstream {
    async fn fetch(
        &self,
        _video_id: &str,
        _proxy: &ProxyIdentity,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self
            .lines
            .iter()
            .map(|text| TranscriptSegment {
                text: (*text).to_string(),
                start: 0.0,
                duration: 1.0,
            })
            .collect())
    }
}

/// Model that answers with a fixed tutorial and records prompts
pub struct FixedModel {
    pub tutorial: String,
    pub prompts: Mutex<Vec<String>>,
}

impl FixedModel {
    pub fn new(tutorial: String) -> Self {
        Self {
            tutorial,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for FixedModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.tutorial.clone())
    }
}

/// A dispatcher wired to in-memory collaborators
pub struct Harness {
    pub dispatcher: Arc<WebhookDispatcher>,
    pub chat: Arc<RecordingChat>,
    pub upstream: Arc<FixedUpstream>,
    pub model: Arc<FixedModel>,
    pub bot_constructions: Arc<AtomicUsize>,
}

pub fn harness(upstream: FixedUpstream, tutorial: String) -> Harness {
    harness_with(
        upstream,
        tutorial,
        RecordingChat::new(DeleteBehaviour::Succeed),
        Duration::from_secs(3),
    )
}

pub fn harness_with(
    upstream: FixedUpstream,
    tutorial: String,
    chat: RecordingChat,
    cleanup_timeout: Duration,
) -> Harness {
    let chat = Arc::new(chat);
    let upstream = Arc::new(upstream);
    let model = Arc::new(FixedModel::new(tutorial));
    let bot_constructions = Arc::new(AtomicUsize::new(0));

    let proxies = Arc::new(LazyResource::new("proxy_pool", || async {
        ProxyPool::parse("p1:8001:u:p,p2:8002:u:p").map(Arc::new)
    }));
    let fetcher = RetryingFetcher::new(upstream.clone(), proxies, RotationPolicy::default());
    let pipeline = Arc::new(TutorialPipeline::new(fetcher, model.clone()));
    let handler = Arc::new(TutorHandler::new(pipeline, cleanup_timeout));

    let transport: SharedTransport = {
        let chat = Arc::clone(&chat);
        let constructions = Arc::clone(&bot_constructions);
        LazyResource::new("bot_client", move || {
            let chat = Arc::clone(&chat);
            constructions.fetch_add(1, Ordering::SeqCst);
            async move { Ok(chat as Arc<dyn ChatTransport>) }
        })
    };

    let dispatcher = Arc::new(WebhookDispatcher::new(
        Arc::new(IdempotencyCache::new(1000)),
        Arc::new(transport),
        handler,
    ));

    Harness {
        dispatcher,
        chat,
        upstream,
        model,
        bot_constructions,
    }
}

pub fn text_update(update_id: i64, chat_id: i64, text: &str) -> Vec<u8> {
    serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": 1,
            "date": 0,
            "chat": {"id": chat_id, "type": "private"},
            "text": text
        }
    })
    .to_string()
    .into_bytes()
}
