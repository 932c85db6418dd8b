use async_trait::async_trait;
use chrono::DateTime;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ProviderClient, RateLimitInfo, check_alignment, transport_error};
use crate::engine_config::ProviderId;
use crate::errors::ProviderError;

const DEFAULT_ENDPOINT: &str = "https://api-platform.systran.net";

/// Systran client for the translation REST API
pub struct Systran {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication, sent in the `Key` header
    api_key: String,
    /// API endpoint URL (optional, defaults to the public platform)
    endpoint: String,
    /// Rate limit standing learned from the most recent response headers
    last_rate_limit: Mutex<RateLimitInfo>,
}

impl std::fmt::Debug for Systran {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_key deliberately omitted
        f.debug_struct("Systran")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Systran batch translation request
#[derive(Debug, Serialize)]
struct SystranRequest<'a> {
    /// Texts to translate, one output per input
    input: &'a [String],
    /// Source language code
    source: &'a str,
    /// Target language code
    target: &'a str,
}

/// Systran batch translation response
#[derive(Debug, Deserialize)]
struct SystranResponse {
    /// One output per input, in request order
    outputs: Vec<SystranOutput>,
}

/// Individual output in a Systran response
#[derive(Debug, Deserialize)]
struct SystranOutput {
    /// The translated text
    output: String,
}

impl Systran {
    /// Create a new Systran client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            last_rate_limit: Mutex::new(RateLimitInfo::default()),
        }
    }

    fn api_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/translation/text/translate", base)
    }

    fn record_rate_limit_headers(&self, headers: &reqwest::header::HeaderMap) {
        let parse = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };
        let limit = parse("x-ratelimit-limit");
        let remaining = parse("x-ratelimit-remaining");
        let reset_at = parse("x-ratelimit-reset")
            .and_then(|secs| DateTime::from_timestamp(secs as i64, 0));
        if limit.is_some() || remaining.is_some() || reset_at.is_some() {
            *self.last_rate_limit.lock() = RateLimitInfo {
                limit,
                remaining,
                reset_at,
            };
        }
    }
}

#[async_trait]
impl ProviderClient for Systran {
    fn id(&self) -> ProviderId {
        ProviderId::Systran
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let request = SystranRequest {
            input: texts,
            source: source_lang,
            target: target_lang,
        };

        let response = self
            .client
            .post(self.api_url())
            .header("Key", &self.api_key)
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
            .json::<SystranResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        check_alignment(self.id(), texts.len(), parsed.outputs.len())?;
        Ok(parsed.outputs.into_iter().map(|o| o.output).collect())
    }

    async fn rate_limit_info(&self) -> Result<RateLimitInfo, ProviderError> {
        Ok(self.last_rate_limit.lock().clone())
    }
}
