//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the policy constants shared by the fetch and generation layers.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Build the layered configuration used by every settings struct.
///
/// Sources, later ones overriding earlier ones:
/// `config/default`, `config/{RUN_MODE}`, `config/local`, `APP__*` variables
/// and finally plain environment variables (empty values are treated as unset).
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Settings for transcript acquisition and tutorial generation
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TutorSettings {
    /// Gemini API key
    pub gemini_api_key: String,

    /// Gemini model identifier
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Proxy list, entries `host:port:user:pass` separated by commas,
    /// semicolons or whitespace
    #[serde(default)]
    pub proxy_list: String,

    /// Preferred caption languages, in order of preference
    #[serde(default = "default_transcript_languages")]
    pub transcript_languages: String,

    /// Attempts per transcript fetch, each through a freshly drawn proxy
    #[serde(default = "default_fetch_max_attempts")]
    pub fetch_max_attempts: usize,

    /// Timeout for a single proxied transcript request
    #[serde(default = "default_transcript_http_timeout_secs")]
    pub transcript_http_timeout_secs: u64,
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_transcript_languages() -> String {
    "en".to_string()
}

const fn default_fetch_max_attempts() -> usize {
    FETCH_MAX_ATTEMPTS
}

const fn default_transcript_http_timeout_secs() -> u64 {
    TRANSCRIPT_HTTP_TIMEOUT_SECS
}

impl TutorSettings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tubetutor_core::config::TutorSettings;
    ///
    /// let settings = TutorSettings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required key is missing.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(build_config()?)
    }

    /// Deserialize settings from an already built configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required key is missing or malformed.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        if settings.gemini_api_key.trim().is_empty() {
            return Err(ConfigError::Message("GEMINI_API_KEY is empty".to_string()));
        }
        Ok(settings)
    }

    /// Returns the preferred caption languages
    #[must_use]
    pub fn transcript_languages(&self) -> Vec<String> {
        self.transcript_languages
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-8b";
/// Sampling temperature for tutorial generation
pub const GEMINI_TEMPERATURE: f32 = 0.5;
/// Nucleus sampling threshold
pub const GEMINI_TOP_P: f32 = 0.95;
/// Top-k sampling
pub const GEMINI_TOP_K: u32 = 40;
/// Maximum output tokens for a tutorial
pub const GEMINI_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Transcript fetch attempts, one proxy draw each
pub const FETCH_MAX_ATTEMPTS: usize = 10;
/// Timeout for a single proxied transcript request
pub const TRANSCRIPT_HTTP_TIMEOUT_SECS: u64 = 20;

/// Default LLM HTTP timeout in seconds
pub const LLM_HTTP_TIMEOUT_SECS: u64 = 120;

// Telegram API retry policy (used by `utils::retry_telegram_operation`)
/// Initial backoff in milliseconds
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Maximum backoff in milliseconds
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Maximum retries for a Telegram API call
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

/// Get LLM HTTP timeout from env or default.
///
/// Environment variable: `LLM_HTTP_TIMEOUT_SECS`.
#[must_use]
pub fn get_llm_http_timeout_secs() -> u64 {
    std::env::var("LLM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LLM_HTTP_TIMEOUT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError>
    {
        Config::builder().set_override("gemini_api_key", "test-key")
    }

    #[test]
    fn test_defaults_applied() -> Result<(), Box<dyn std::error::Error>> {
        let settings = TutorSettings::from_config(base_config()?.build()?)?;

        assert_eq!(settings.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(settings.fetch_max_attempts, FETCH_MAX_ATTEMPTS);
        assert_eq!(
            settings.transcript_http_timeout_secs,
            TRANSCRIPT_HTTP_TIMEOUT_SECS
        );
        assert!(settings.proxy_list.is_empty());
        assert_eq!(settings.transcript_languages(), vec!["en".to_string()]);
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<(), Box<dyn std::error::Error>> {
        let config = base_config()?
            .set_override("fetch_max_attempts", 3)?
            .set_override("proxy_list", "h:1:u:p")?
            .set_override("transcript_languages", "de, EN;fr")?
            .build()?;
        let settings = TutorSettings::from_config(config)?;

        assert_eq!(settings.fetch_max_attempts, 3);
        assert_eq!(settings.proxy_list, "h:1:u:p");
        assert_eq!(settings.transcript_languages(), vec!["de", "en", "fr"]);
        Ok(())
    }

    #[test]
    fn test_missing_api_key_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let missing = Config::builder().build()?;
        assert!(TutorSettings::from_config(missing).is_err());

        let blank = Config::builder()
            .set_override("gemini_api_key", "  ")?
            .build()?;
        assert!(TutorSettings::from_config(blank).is_err());
        Ok(())
    }
}
