use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ProviderClient, RateLimitInfo, check_alignment, transport_error};
use crate::engine_config::ProviderId;
use crate::errors::ProviderError;

const PAID_ENDPOINT: &str = "https://api.deepl.com";
const FREE_ENDPOINT: &str = "https://api-free.deepl.com";

/// DeepL client for the v2 REST API
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// API key, sent as `DeepL-Auth-Key` in the Authorization header
    api_key: String,
    /// API endpoint URL (optional; keys ending in `:fx` route to the free API)
    endpoint: String,
}

impl std::fmt::Debug for DeepL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_key deliberately omitted
        f.debug_struct("DeepL")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// DeepL batch translation request
#[derive(Debug, Serialize)]
struct DeepLRequest<'a> {
    /// Texts to translate, one translation per element
    text: &'a [String],
    /// Source language code
    source_lang: String,
    /// Target language code
    target_lang: String,
}

/// DeepL batch translation response
#[derive(Debug, Deserialize)]
struct DeepLResponse {
    /// One translation per input text, in request order
    translations: Vec<DeepLTranslation>,
}

/// Individual translation in a DeepL response
#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    /// The translated text
    text: String,
}

/// DeepL account usage, backing the rate limit report
#[derive(Debug, Deserialize)]
struct DeepLUsage {
    /// Characters consumed in the current period
    character_count: u64,
    /// Character allowance for the current period
    character_limit: u64,
}

impl DeepL {
    /// Create a new DeepL client
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

    fn base_url(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.trim_end_matches('/').to_string();
        }
        // Free-plan keys carry the `:fx` suffix and live on a separate host
        if self.api_key.ends_with(":fx") {
            FREE_ENDPOINT.to_string()
        } else {
            PAID_ENDPOINT.to_string()
        }
    }
}

#[async_trait]
impl ProviderClient for DeepL {
    fn id(&self) -> ProviderId {
        ProviderId::DeepL
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let request = DeepLRequest {
            text: texts,
            source_lang: source_lang.to_uppercase(),
            target_lang: target_lang.to_uppercase(),
        };

        let response = self
            .client
            .post(format!("{}/v2/translate", self.base_url()))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
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
            .json::<DeepLResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        check_alignment(self.id(), texts.len(), parsed.translations.len())?;
        Ok(parsed.translations.into_iter().map(|t| t.text).collect())
    }

    async fn rate_limit_info(&self) -> Result<RateLimitInfo, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v2/usage", self.base_url()))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let usage = response
            .json::<DeepLUsage>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(RateLimitInfo {
            limit: Some(usage.character_limit),
            remaining: Some(usage.character_limit.saturating_sub(usage.character_count)),
            reset_at: None,
        })
    }
}
