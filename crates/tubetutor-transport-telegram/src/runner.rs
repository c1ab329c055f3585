use crate::bot::handlers::{Command, TutorHandler};
use crate::bot::transport::{ChatTransport, TelegramTransport};
use crate::config::BotSettings;
use crate::dispatcher::{SharedTransport, WebhookDispatcher};
use crate::server::{create_router, AppState};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tubetutor_core::idempotency::IdempotencyCache;
use tubetutor_core::lazy::LazyResource;
use tubetutor_core::llm::providers::GeminiProvider;
use tubetutor_core::pipeline::TutorialPipeline;
use tubetutor_core::proxy::{ProxyError, ProxyPool};
use tubetutor_core::retry::RotationPolicy;
use tubetutor_core::transcript::{RetryingFetcher, YoutubeTranscriptSource};

/// Run the webhook server until Ctrl-C or SIGTERM.
///
/// The proxy pool is built before the listener opens so that a bad proxy
/// list stops the process at startup.
///
/// # Errors
///
/// Returns an error if the proxy list has no valid entry or the listener
/// cannot be bound.
pub async fn run_server(settings: Arc<BotSettings>) -> Result<()> {
    let proxies = init_proxy_pool(&settings);
    let pool = proxies
        .get_or_init()
        .await
        .context("invalid PROXY_LIST")?;
    info!("Proxy pool initialized with {} proxies.", pool.len());

    let pipeline = Arc::new(init_pipeline(&settings, proxies));
    let handler = Arc::new(TutorHandler::new(
        pipeline,
        Duration::from_secs(settings.telegram.cleanup_timeout_secs),
    ));
    let seen = init_idempotency_cache(&settings);
    let transport = Arc::new(init_bot_client(&settings));

    let dispatcher = Arc::new(WebhookDispatcher::new(seen, transport, handler));
    let app = create_router(AppState::new(
        dispatcher,
        settings.telegram.webhook_secret(),
    ));

    let address = settings.telegram.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Webhook server listening on {}", listener.local_addr()?);

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("webhook server failed")?;

    info!("Webhook server stopped.");
    Ok(())
}

fn init_proxy_pool(settings: &BotSettings) -> Arc<LazyResource<ProxyPool, ProxyError>> {
    let proxy_list = settings.tutor.proxy_list.clone();
    Arc::new(LazyResource::new("proxy_pool", move || {
        let proxy_list = proxy_list.clone();
        async move { ProxyPool::parse(&proxy_list).map(Arc::new) }
    }))
}

fn init_pipeline(
    settings: &BotSettings,
    proxies: Arc<LazyResource<ProxyPool, ProxyError>>,
) -> TutorialPipeline {
    let source = Arc::new(YoutubeTranscriptSource::from_settings(&settings.tutor));
    let policy = RotationPolicy::new(settings.tutor.fetch_max_attempts);
    let fetcher = RetryingFetcher::new(source, proxies, policy);
    let generator = Arc::new(GeminiProvider::from_settings(&settings.tutor));

    info!(
        "Tutorial pipeline ready (model: {}, attempts: {}).",
        settings.tutor.gemini_model,
        policy.max_attempts()
    );
    TutorialPipeline::new(fetcher, generator)
}

fn init_idempotency_cache(settings: &BotSettings) -> Arc<IdempotencyCache<i64>> {
    let max_size = settings.telegram.idempotency_cache_max_size;
    info!("Initializing IdempotencyCache (max_size: {})", max_size);
    Arc::new(IdempotencyCache::new(max_size))
}

/// Bot client built on first delivery; registers the command list once
fn init_bot_client(settings: &BotSettings) -> SharedTransport {
    let token = settings.telegram.telegram_bot_token.clone();
    LazyResource::new("bot_client", move || {
        let bot = Bot::new(token.clone());
        async move {
            if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
                warn!("Failed to register bot commands: {e}");
            }
            let username = match bot.get_me().await {
                Ok(me) => me.user.username,
                Err(e) => {
                    warn!("Failed to fetch bot username, accepting any command suffix: {e}");
                    None
                }
            };
            let transport = TelegramTransport::new(bot).with_username(username);
            Ok(Arc::new(transport) as Arc<dyn ChatTransport>)
        }
    })
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down."),
        () = terminate => info!("Received SIGTERM, shutting down."),
    }
    shutdown.cancel();
}
