use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ProviderClient, RateLimitInfo, check_alignment, transport_error};
use crate::engine_config::ProviderId;
use crate::errors::ProviderError;

const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com";

/// Google Cloud Translation v2 client
pub struct GoogleTranslate {
    /// HTTP client for API requests
    client: Client,
    /// API key, passed as the `key` query parameter
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
}

impl std::fmt::Debug for GoogleTranslate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_key deliberately omitted
        f.debug_struct("GoogleTranslate")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Google batch translation request
#[derive(Debug, Serialize)]
struct GoogleRequest<'a> {
    /// Texts to translate, one translation per element
    q: &'a [String],
    /// Source language code
    source: &'a str,
    /// Target language code
    target: &'a str,
    /// Plain-text mode; html mode would entity-escape the output
    format: &'static str,
}

/// Google batch translation response envelope
#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    /// One translation per input text, in request order
    translations: Vec<GoogleTranslation>,
}

/// Individual translation in a Google response
#[derive(Debug, Deserialize)]
struct GoogleTranslation {
    /// The translated text
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl GoogleTranslate {
    /// Create a new Google Translation client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn api_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/language/translate/v2", base)
    }
}

#[async_trait]
impl ProviderClient for GoogleTranslate {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let request = GoogleRequest {
            q: texts,
            source: source_lang,
            target: target_lang,
            format: "text",
        };

        let response = self
            .client
            .post(self.api_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let parsed = response
            .json::<GoogleResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        check_alignment(self.id(), texts.len(), parsed.data.translations.len())?;
        Ok(parsed
            .data
            .translations
            .into_iter()
            .map(|t| t.translated_text)
            .collect())
    }

    async fn rate_limit_info(&self) -> Result<RateLimitInfo, ProviderError> {
        // The v2 API exposes no usage surface; quotas live in the Cloud console
        Ok(RateLimitInfo::default())
    }
}
