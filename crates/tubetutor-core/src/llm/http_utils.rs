//! HTTP helpers shared by provider implementations

use crate::config::get_llm_http_timeout_secs;
use crate::llm::LlmError;
use crate::utils::truncate_str;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Creates an HTTP client with the LLM request timeout.
///
/// Uses `LLM_HTTP_TIMEOUT_SECS` or the 120s default.
#[must_use]
pub fn create_http_client() -> HttpClient {
    let timeout = Duration::from_secs(get_llm_http_timeout_secs());
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}

/// Sends a JSON POST and returns the parsed JSON response.
///
/// # Errors
///
/// Returns `LlmError::NetworkError` on connectivity issues,
/// `LlmError::RateLimit` on 429, `LlmError::ApiError` on other non-success
/// statuses and `LlmError::JsonError` if the body is not JSON.
pub async fn send_json_request(
    client: &HttpClient,
    url: &str,
    body: &Value,
    headers: &[(&str, &str)],
) -> Result<Value, LlmError> {
    let mut request = client.post(url).json(body);
    for (key, value) in headers {
        request = request.header(*key, *value);
    }

    let response = request
        .send()
        .await
        .map_err(|e| LlmError::NetworkError(e.without_url().to_string()))?;

    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| LlmError::JsonError(e.to_string()));
    }

    let wait_secs = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    let error_text = response.text().await.unwrap_or_default();
    let message = describe_error_body(status, &error_text);

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimit { wait_secs, message });
    }
    Err(LlmError::ApiError(message))
}

fn describe_error_body(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim_start();
    // Proxies in front of the API sometimes answer with an HTML page
    if trimmed.starts_with("<!DOCTYPE") || trimmed.to_ascii_lowercase().starts_with("<html") {
        return format!("{status} (server returned an HTML error page)");
    }
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        return format!(
            "{status} - {}... (truncated)",
            truncate_str(body, MAX_ERROR_BODY_CHARS)
        );
    }
    format!("{status} - {body}")
}

/// Extracts a string from a JSON response by walking a path.
///
/// Numeric segments index arrays, other segments look up object keys.
///
/// # Errors
///
/// Returns `LlmError::ApiError` if the path is missing or does not end in a
/// string.
pub fn extract_text_content(response: &Value, path: &[&str]) -> Result<String, LlmError> {
    let mut current = response;

    for segment in path {
        current = match segment.parse::<usize>() {
            Ok(index) => current.get(index),
            Err(_) => current.get(*segment),
        }
        .ok_or_else(|| LlmError::ApiError(format!("Invalid path: missing {segment}")))?;
    }

    current
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| LlmError::ApiError(format!("Expected string at path, got: {current}")))
}
