//! Webhook registration with the Telegram Bot API

use anyhow::{bail, Context, Result};
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::Bot;
use tracing::info;

/// Path the server accepts deliveries on when registered by [`update_webhook`]
pub const WEBHOOK_PATH: &str = "/api/webhook";

/// Build the delivery URL for a public base URL.
///
/// The base must be an `http` or `https` URL with a host. The delivery path
/// replaces any path the base carries.
///
/// # Examples
///
/// ```
/// use tubetutor_transport_telegram::webhook::webhook_url_for;
///
/// let url = webhook_url_for("https://bot.example.com/").unwrap();
/// assert_eq!(url.as_str(), "https://bot.example.com/api/webhook");
/// ```
///
/// # Errors
///
/// Returns an error for anything that is not an absolute http(s) URL.
pub fn webhook_url_for(base: &str) -> Result<Url> {
    let base = Url::parse(base.trim()).with_context(|| format!("invalid URL: {base}"))?;

    if !matches!(base.scheme(), "http" | "https") {
        bail!("webhook URL must use http or https, got {}", base.scheme());
    }
    if base.host_str().is_none_or(str::is_empty) {
        bail!("webhook URL has no host");
    }

    base.join(WEBHOOK_PATH)
        .context("failed to build webhook URL")
}

/// Replace the bot's webhook and verify the change.
///
/// Deletes the current webhook, registers `<base>/api/webhook` (with the
/// secret token when one is given) and reads the registration back.
///
/// # Errors
///
/// Returns an error if the URL is invalid, an API call fails, or Telegram
/// reports a different URL afterwards.
pub async fn update_webhook(bot: &Bot, base: &str, secret: Option<&str>) -> Result<Url> {
    let url = webhook_url_for(base)?;

    bot.delete_webhook()
        .await
        .context("failed to delete existing webhook")?;
    info!("Existing webhook deleted");

    let mut request = bot.set_webhook(url.clone());
    if let Some(secret) = secret {
        request = request.secret_token(secret.to_string());
    }
    request.await.context("failed to set webhook")?;

    let info = bot
        .get_webhook_info()
        .await
        .context("could not verify webhook")?;
    let registered = info.url.as_ref().map(Url::as_str);
    if registered != Some(url.as_str()) {
        bail!(
            "webhook verification failed: Telegram reports {}",
            registered.unwrap_or("no URL")
        );
    }

    info!(url = %url, "Webhook updated");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url_for() -> Result<()> {
        assert_eq!(
            webhook_url_for("https://bot.example.com")?.as_str(),
            "https://bot.example.com/api/webhook"
        );
        assert_eq!(
            webhook_url_for("http://127.0.0.1:8080/")?.as_str(),
            "http://127.0.0.1:8080/api/webhook"
        );
        assert_eq!(
            webhook_url_for("https://host.example/app/")?.as_str(),
            "https://host.example/api/webhook"
        );
        Ok(())
    }

    #[test]
    fn test_webhook_url_rejects_bad_input() {
        assert!(webhook_url_for("bot.example.com").is_err());
        assert!(webhook_url_for("ftp://bot.example.com").is_err());
        assert!(webhook_url_for("").is_err());
        assert!(webhook_url_for("mailto:admin@example.com").is_err());
    }
}
