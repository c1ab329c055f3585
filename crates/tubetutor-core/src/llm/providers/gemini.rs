use crate::config::{
    TutorSettings, GEMINI_MAX_OUTPUT_TOKENS, GEMINI_TEMPERATURE, GEMINI_TOP_K, GEMINI_TOP_P,
};
use crate::llm::http_utils::{create_http_client, extract_text_content, send_json_request};
use crate::llm::{LlmError, LlmProvider};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use tracing::{debug, instrument};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// LLM provider implementation for Google Gemini
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider instance
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http_client: create_http_client(),
            api_key,
            model,
        }
    }

    /// Create a provider from settings
    #[must_use]
    pub fn from_settings(settings: &TutorSettings) -> Self {
        Self::new(
            settings.gemini_api_key.clone(),
            settings.gemini_model.clone(),
        )
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "temperature": GEMINI_TEMPERATURE,
                "topP": GEMINI_TOP_P,
                "topK": GEMINI_TOP_K,
                "maxOutputTokens": GEMINI_MAX_OUTPUT_TOKENS,
                "responseMimeType": "text/plain"
            }
        })
    }
}

fn response_text(response: &Value) -> Result<String, LlmError> {
    if let Some(reason) = response
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(LlmError::EmptyResponse(format!("prompt blocked: {reason}")));
    }

    let text = extract_text_content(
        response,
        &["candidates", "0", "content", "parts", "0", "text"],
    )
    .map_err(|_| {
        let finish = response
            .pointer("/candidates/0/finishReason")
            .and_then(Value::as_str)
            .unwrap_or("no candidates");
        LlmError::EmptyResponse(finish.to_string())
    })?;

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse("blank text".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let body = Self::request_body(prompt);

        let res_json = send_json_request(
            &self.http_client,
            &url,
            &body,
            &[("x-goog-api-key", self.api_key.as_str())],
        )
        .await?;

        let text = response_text(&res_json)?;
        debug!(response_chars = text.len(), "Gemini generation finished");
        Ok(text)
    }
}
