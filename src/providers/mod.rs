/*!
 * Provider implementations for the translation services.
 *
 * This module contains client implementations for the supported vendors:
 * - Systran: professional machine translation API
 * - DeepL: DeepL REST API
 * - Google: Google Cloud Translation v2
 * - OpenAI: chat-completion based translation with placeholder prompting
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::time::Duration;

use crate::engine_config::{ProviderId, TierConfig};
use crate::errors::ProviderError;

/// Rate limit standing as reported by a provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitInfo {
    /// Total allowance in the provider's accounting unit, if known
    pub limit: Option<u64>,

    /// Remaining allowance, if known
    pub remaining: Option<u64>,

    /// When the allowance resets, if the provider reports it
    pub reset_at: Option<DateTime<Utc>>,
}

/// Common trait for all translation providers
///
/// This trait defines the interface that all provider implementations must
/// follow, allowing them to be used interchangeably by the fallback router.
/// The router only ever sees this trait; wire formats, batch limits and
/// authentication shapes stay inside each implementation.
#[async_trait]
pub trait ProviderClient: Send + Sync + Debug {
    /// Which provider this client talks to
    fn id(&self) -> ProviderId;

    /// Translate an ordered batch of texts.
    ///
    /// The returned list must have exactly the same length and order as the
    /// input; implementations return [`ProviderError::InvalidResponse`]
    /// otherwise rather than guessing an alignment.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Current rate limit standing.
    ///
    /// Vendors without a usage surface return whatever was learned from
    /// response headers, or an empty report.
    async fn rate_limit_info(&self) -> Result<RateLimitInfo, ProviderError>;
}

/// Build the concrete client for a tier.
///
/// The router calls this once per enabled tier and then only interacts with
/// the returned trait object.
pub fn build_client(tier: &TierConfig) -> Box<dyn ProviderClient> {
    let api_key = tier.api_key.clone().unwrap_or_default();
    let endpoint = tier.endpoint.clone().unwrap_or_default();
    let timeout = Duration::from_secs(tier.timeout_secs);

    match tier.provider {
        ProviderId::Systran => Box::new(systran::Systran::new(api_key, endpoint, timeout)),
        ProviderId::DeepL => Box::new(deepl::DeepL::new(api_key, endpoint, timeout)),
        ProviderId::Google => Box::new(google::GoogleTranslate::new(api_key, endpoint, timeout)),
        ProviderId::OpenAI => Box::new(openai::OpenAI::new(
            api_key,
            endpoint,
            tier.model.clone().unwrap_or_default(),
            timeout,
        )),
    }
}

/// Map a reqwest transport error to the engine's provider error taxonomy
pub(crate) fn transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(error.to_string())
    } else {
        ProviderError::ConnectionError(error.to_string())
    }
}

/// Check that a provider returned one output per input, in order
pub(crate) fn check_alignment(
    provider: ProviderId,
    inputs: usize,
    outputs: usize,
) -> Result<(), ProviderError> {
    if inputs == outputs {
        Ok(())
    } else {
        Err(ProviderError::InvalidResponse(format!(
            "{} returned {} translations for {} inputs",
            provider.display_name(),
            outputs,
            inputs
        )))
    }
}

pub mod deepl;
pub mod google;
pub mod mock;
pub mod openai;
pub mod systran;
