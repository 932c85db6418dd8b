use async_trait::async_trait;
use chrono::DateTime;
use log::warn;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ProviderClient, RateLimitInfo, check_alignment, transport_error};
use crate::engine_config::ProviderId;
use crate::errors::ProviderError;
use crate::placeholders;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI client translating via the chat completions API.
///
/// Unlike the dedicated MT vendors, a chat model will happily "translate" a
/// placeholder token. The outbound prompt therefore enumerates every
/// placeholder found in the batch and demands verbatim preservation, and the
/// output is re-checked afterwards; a drifted placeholder set is logged as a
/// warning, never treated as a failure.
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for bearer authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// The model to use
    model: String,
    /// Rate limit standing learned from the most recent response headers
    last_rate_limit: Mutex<RateLimitInfo>,
}

impl std::fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_key deliberately omitted
        f.debug_struct("OpenAI")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    /// The model to use
    model: String,
    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,
    /// Temperature for generation
    temperature: f32,
}

/// OpenAI message format
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    /// Completion choices; the first one carries the translation payload
    choices: Vec<OpenAIChoice>,
}

/// Individual choice in an OpenAI response
#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let model = model.into();
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: if model.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                model
            },
            last_rate_limit: Mutex::new(RateLimitInfo::default()),
        }
    }

    fn api_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/v1/chat/completions", base)
    }

    /// Build the system prompt, enumerating every placeholder in the batch
    fn system_prompt(texts: &[String], source_lang: &str, target_lang: &str) -> String {
        let mut names: Vec<String> = Vec::new();
        for text in texts {
            for name in placeholders::extract(text) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let mut prompt = format!(
            "You are a translation engine. Translate each string in the JSON array \
             from {} to {}. Respond with a JSON array of the translated strings, \
             same length and order as the input, and nothing else.",
            source_lang, target_lang
        );
        if !names.is_empty() {
            let listed = names
                .iter()
                .map(|n| format!("{{{}}}", n))
                .collect::<Vec<_>>()
                .join(", ");
            prompt.push_str(&format!(
                " The strings contain the placeholders {}. Placeholders may also \
                 appear in double braces. Copy every placeholder into the \
                 translation verbatim, braces included; never translate or rename \
                 the name inside.",
                listed
            ));
        }
        prompt
    }

    /// Parse the model output into a string array, tolerating code fences
    fn parse_translations(content: &str) -> Result<Vec<String>, ProviderError> {
        let trimmed = content.trim();
        let body = if trimmed.starts_with("```") {
            trimmed
                .trim_start_matches("```json")
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim()
        } else {
            trimmed
        };

        serde_json::from_str::<Vec<String>>(body)
            .map_err(|e| ProviderError::InvalidResponse(format!("expected JSON array: {}", e)))
    }

    fn record_rate_limit_headers(&self, headers: &reqwest::header::HeaderMap) {
        let parse = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };
        let limit = parse("x-ratelimit-limit-requests");
        let remaining = parse("x-ratelimit-remaining-requests");
        let reset_at = parse("x-ratelimit-reset-requests")
            .and_then(|secs| DateTime::from_timestamp(secs as i64, 0));
        if limit.is_some() || remaining.is_some() {
            *self.last_rate_limit.lock() = RateLimitInfo {
                limit,
                remaining,
                reset_at,
            };
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAI {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAI
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let payload = serde_json::to_string(texts)
            .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;
        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: Self::system_prompt(texts, source_lang, target_lang),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: payload,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(self.api_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        self.record_rate_limit_headers(response.headers());

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let parsed = response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ProviderError::InvalidResponse("response had no choices".to_string()))?;

        let translations = Self::parse_translations(content)?;
        check_alignment(self.id(), texts.len(), translations.len())?;

        // Placeholder drift is reported, not enforced
        for (source, translated) in texts.iter().zip(&translations) {
            if let Some(warning) = placeholders::validate("", source, translated) {
                warn!(
                    "OpenAI translation altered placeholders (missing [{}], unexpected [{}])",
                    warning.missing.join(", "),
                    warning.unexpected.join(", ")
                );
            }
        }

        Ok(translations)
    }

    async fn rate_limit_info(&self) -> Result<RateLimitInfo, ProviderError> {
        Ok(self.last_rate_limit.lock().clone())
    }
}
