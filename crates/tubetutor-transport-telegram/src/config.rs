//! Telegram transport settings.

use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tubetutor_core::config::TutorSettings;
use tubetutor_core::idempotency::IDEMPOTENCY_CACHE_MAX_SIZE;

/// Default bind host
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
/// Default bind port
pub const DEFAULT_SERVER_PORT: u16 = 8080;
/// Upper bound on deleting the transient status message, in seconds
pub const CLEANUP_TIMEOUT_SECS: u64 = 3;

/// Telegram transport settings loaded from environment variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramSettings {
    /// Telegram Bot API token.
    pub telegram_bot_token: String,
    /// Secret echoed by Telegram in `X-Telegram-Bot-Api-Secret-Token`.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Address the webhook server binds to.
    #[serde(default = "default_server_host")]
    pub server_host: String,
    /// Port the webhook server binds to.
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    /// Number of recent update ids remembered for duplicate suppression.
    #[serde(default = "default_idempotency_cache_max_size")]
    pub idempotency_cache_max_size: usize,
    /// Timeout for deleting the status message.
    #[serde(default = "default_cleanup_timeout_secs")]
    pub cleanup_timeout_secs: u64,
}

fn default_server_host() -> String {
    DEFAULT_SERVER_HOST.to_string()
}

const fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

const fn default_idempotency_cache_max_size() -> usize {
    IDEMPOTENCY_CACHE_MAX_SIZE
}

const fn default_cleanup_timeout_secs() -> u64 {
    CLEANUP_TIMEOUT_SECS
}

impl TelegramSettings {
    /// Create new settings by loading from environment and files.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(tubetutor_core::config::build_config()?)
    }

    /// Deserialize settings from an already built configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the token is missing or a value is malformed.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        if settings.telegram_bot_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "TELEGRAM_BOT_TOKEN is empty".to_string(),
            ));
        }
        Ok(settings)
    }

    /// Webhook secret, if one is configured and non-blank.
    #[must_use]
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret
            .as_deref()
            .map(str::trim)
            .filter(|secret| !secret.is_empty())
    }

    /// `host:port` the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Combined settings used by the Telegram transport layer.
#[derive(Clone)]
pub struct BotSettings {
    /// Transcript and generation settings.
    pub tutor: Arc<TutorSettings>,
    /// Telegram-specific settings.
    pub telegram: Arc<TelegramSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(tutor: TutorSettings, telegram: TelegramSettings) -> Self {
        Self {
            tutor: Arc::new(tutor),
            telegram: Arc::new(telegram),
        }
    }
}
