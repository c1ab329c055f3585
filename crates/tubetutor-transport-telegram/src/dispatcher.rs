//! Webhook event dispatcher
//!
//! Every delivery goes through the same steps: parse, suppress duplicates,
//! resolve the shared bot client, hand the message to the handler. Whatever
//! happens, the caller acknowledges the delivery; failures end here as logs
//! or chat messages.

use std::sync::Arc;

use anyhow::Error;
use tracing::{debug, error, info, instrument, warn};
use tubetutor_core::idempotency::IdempotencyCache;
use tubetutor_core::lazy::LazyResource;

use crate::bot::handlers::TutorHandler;
use crate::bot::transport::ChatTransport;
use crate::bot::update::parse_update;

/// Lazily constructed chat client shared by all deliveries
pub type SharedTransport = LazyResource<dyn ChatTransport, Error>;

/// What happened to one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The body was not a valid update
    Malformed,
    /// The update id was already dispatched
    Duplicate,
    /// The update carries nothing the bot acts on
    Ignored,
    /// The handler ran to completion
    Handled,
    /// The bot client or the handler failed
    Failed,
}

/// Routes webhook deliveries to the handler at most once per update id
pub struct WebhookDispatcher {
    seen: Arc<IdempotencyCache<i64>>,
    transport: Arc<SharedTransport>,
    handler: Arc<TutorHandler>,
}

impl WebhookDispatcher {
    /// Create a dispatcher
    #[must_use]
    pub fn new(
        seen: Arc<IdempotencyCache<i64>>,
        transport: Arc<SharedTransport>,
        handler: Arc<TutorHandler>,
    ) -> Self {
        Self {
            seen,
            transport,
            handler,
        }
    }

    /// Process one webhook body.
    ///
    /// The update id is marked before the handler runs, so a redelivery that
    /// arrives while the first copy is still in progress is dropped too.
    #[instrument(skip_all, fields(event_id))]
    pub async fn dispatch(&self, body: &[u8]) -> DispatchOutcome {
        let event = match parse_update(body) {
            Ok(event) => event,
            Err(e) => {
                warn!("Rejected malformed update: {e}");
                return DispatchOutcome::Malformed;
            }
        };
        tracing::Span::current().record("event_id", event.event_id);

        if !self.seen.check_and_mark(event.event_id).await {
            info!("Duplicate delivery acknowledged without processing");
            return DispatchOutcome::Duplicate;
        }

        let transport = match self.transport.get_or_init().await {
            Ok(transport) => transport,
            Err(e) => {
                error!("Bot client unavailable: {e:#}");
                return DispatchOutcome::Failed;
            }
        };

        let Some(message) = event.message else {
            debug!("Update carries no text message");
            return DispatchOutcome::Ignored;
        };

        match self.handler.handle(transport.as_ref(), &message).await {
            Ok(()) => DispatchOutcome::Handled,
            Err(e) => {
                error!(chat_id = message.chat_id, "Handler failed: {e:#}");
                DispatchOutcome::Failed
            }
        }
    }
}
