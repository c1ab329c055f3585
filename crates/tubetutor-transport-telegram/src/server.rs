//! HTTP routes
//!
//! - `POST /webhook`, `POST /api/webhook`: Telegram deliveries, always 200
//!   once the optional secret header checks out
//! - `GET /webhook`, `GET /api/webhook`: health probe
//! - `GET /`: liveness banner

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::dispatcher::WebhookDispatcher;

/// Header Telegram uses to echo the webhook secret
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Shared state of the HTTP layer
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<WebhookDispatcher>,
    webhook_secret: Option<Arc<str>>,
}

impl AppState {
    /// Create router state; `webhook_secret` enables header verification
    #[must_use]
    pub fn new(dispatcher: Arc<WebhookDispatcher>, webhook_secret: Option<&str>) -> Self {
        Self {
            dispatcher,
            webhook_secret: webhook_secret.map(Arc::from),
        }
    }
}

/// Creates the router with all routes and request tracing.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tubetutor_transport_telegram::dispatcher::WebhookDispatcher;
/// use tubetutor_transport_telegram::server::{create_router, AppState};
///
/// async fn start(dispatcher: Arc<WebhookDispatcher>) -> std::io::Result<()> {
///     let app = create_router(AppState::new(dispatcher, None));
///     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
///     axum::serve(listener, app).await
/// }
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/webhook", get(webhook_health).post(receive_webhook))
        .route("/api/webhook", get(webhook_health).post(receive_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({"status": "Bot webhook is running"}))
}

async fn webhook_health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected) {
            warn!("Rejected webhook call with a missing or wrong secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let outcome = state.dispatcher.dispatch(&body).await;
    debug!(?outcome, "Webhook delivery processed");

    // Anything but 200 makes Telegram redeliver
    StatusCode::OK
}
