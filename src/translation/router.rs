/*!
 * Fallback orchestration across provider tiers.
 *
 * One router owns the full delivery pipeline for a resource tree: flatten,
 * consult the cache, walk the tier chain in priority order for whatever is
 * left, write successes through to the cache, and reconstruct the tree.
 * Tier-local failures are converted into advancement to the next tier; only
 * total exhaustion is surfaced, and even then the partial result is kept.
 */

use log::{error, info, warn};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::engine_config::{EngineConfig, ProviderId, TierConfig};
use crate::errors::{EngineError, ProviderError, RetryError};
use crate::placeholders::{self, PlaceholderWarning};
use crate::providers::{ProviderClient, build_client};
use crate::resource::{self, PluralForm, TranslationUnit};
use crate::translation::cache::{CacheEntry, TranslationCache};
use crate::translation::rate_limit::RateLimiter;
use crate::translation::retry::{RetryExecutor, RetryPolicy};

/// Per-run options supplied by the caller
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Force a single tier, disabling fallback entirely
    pub provider: Option<ProviderId>,

    /// Tiers to exclude from this run
    pub disabled_providers: HashSet<ProviderId>,

    /// Namespace the keys belong to; partitions the cache
    pub namespace: String,

    /// Signal that aborts rate-limit waits, backoff sleeps and network calls
    pub cancel: CancellationToken,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            provider: None,
            disabled_providers: HashSet::new(),
            namespace: "default".to_string(),
            cancel: CancellationToken::new(),
        }
    }
}

impl RunOptions {
    /// Options for the given namespace, everything else default
    pub fn for_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }
}

/// Usage statistics for one tier over one translation run
#[derive(Debug, Clone)]
pub struct TierUsage {
    /// Which provider the tier talks to
    pub provider: ProviderId,

    /// Chunk requests submitted (retries within a request not counted)
    pub requests: usize,

    /// Units this tier translated successfully
    pub units_translated: usize,

    /// Chunk requests that failed after exhausting their retry budget
    pub failed_requests: usize,
}

impl TierUsage {
    fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            requests: 0,
            units_translated: 0,
            failed_requests: 0,
        }
    }
}

/// Result of one `translate_resource` run
#[derive(Debug)]
pub struct TranslationOutcome {
    /// The reconstructed tree; untranslated leaves keep their source text
    pub tree: Value,

    /// Per-tier usage, in the order tiers were attempted
    pub usage: Vec<TierUsage>,

    /// Keys no tier managed to translate (empty on full success)
    pub unresolved_keys: Vec<String>,

    /// Placeholder mismatches observed in accepted translations
    pub placeholder_warnings: Vec<PlaceholderWarning>,
}

impl TranslationOutcome {
    /// The exhaustion error for this run, when keys remain unresolved.
    ///
    /// The partial tree is still in `self.tree`; this is the reportable
    /// error naming what is missing.
    pub fn exhaustion_error(&self) -> Option<EngineError> {
        if self.unresolved_keys.is_empty() {
            None
        } else {
            Some(EngineError::AllProvidersExhausted {
                keys: self.unresolved_keys.clone(),
            })
        }
    }
}

/// One tier of the fallback chain with its runtime companions.
///
/// The limiter and retry executor live as long as the router so rate-limit
/// accounting carries across runs when the router is reused.
struct TierRuntime {
    config: TierConfig,
    client: Box<dyn ProviderClient>,
    limiter: RateLimiter,
    retry: RetryExecutor,
}

impl TierRuntime {
    fn new(config: TierConfig, client: Box<dyn ProviderClient>) -> Self {
        let limiter = RateLimiter::new(config.requests_per_second);
        let retry = RetryExecutor::new(RetryPolicy::with_max_attempts(config.max_retries));
        Self {
            config,
            client,
            limiter,
            retry,
        }
    }

    /// One network call under the tier's timeout; a timeout classifies
    /// exactly like an upstream 504.
    async fn call_chunk(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(
            timeout,
            self.client.translate_batch(texts, source_lang, target_lang),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "no response within {}s",
                self.config.timeout_secs
            ))),
        }
    }
}

/// Orchestrates cache, rate limiting, retries and tier fallback for
/// translation runs. Construct once and reuse; all mutable state lives in
/// explicit members, never in process-wide globals.
pub struct FallbackRouter {
    config: EngineConfig,
    cache: TranslationCache,
    /// Enabled tiers, sorted by ascending priority
    tiers: Vec<TierRuntime>,
}

impl FallbackRouter {
    /// Build a router with real provider clients per enabled tier
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let tiers = config
            .enabled_tiers()
            .into_iter()
            .cloned()
            .map(|tier| {
                let client = build_client(&tier);
                TierRuntime::new(tier, client)
            })
            .collect();
        let cache = TranslationCache::new(config.cache.dir.clone(), config.cache.enabled);
        Ok(Self {
            config,
            cache,
            tiers,
        })
    }

    /// Build a router with injected clients, matched to enabled tiers by
    /// provider identity. Used by tests and by callers that stub vendors.
    pub fn with_clients(
        config: EngineConfig,
        clients: Vec<Box<dyn ProviderClient>>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let mut by_id: HashMap<ProviderId, Box<dyn ProviderClient>> =
            clients.into_iter().map(|c| (c.id(), c)).collect();
        let tiers = config
            .enabled_tiers()
            .into_iter()
            .cloned()
            .map(|tier| {
                let client = by_id
                    .remove(&tier.provider)
                    .ok_or_else(|| EngineError::ProviderNotConfigured(tier.provider.to_string()))?;
                Ok(TierRuntime::new(tier, client))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        let cache = TranslationCache::new(config.cache.dir.clone(), config.cache.enabled);
        Ok(Self {
            config,
            cache,
            tiers,
        })
    }

    /// The cache, shared read-only with validation tooling
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Resolve the tier order for one run.
    ///
    /// Base order is ascending priority. Tiers that declare the target
    /// language as preferred move ahead of those that do not, preserving
    /// relative order within each group. A forced provider collapses the
    /// chain to that single tier.
    fn resolve_tier_order(
        &self,
        target_lang: &str,
        options: &RunOptions,
    ) -> Result<Vec<usize>, EngineError> {
        if let Some(forced) = options.provider {
            let index = self
                .tiers
                .iter()
                .position(|t| t.config.provider == forced)
                .ok_or_else(|| EngineError::ProviderNotConfigured(forced.to_string()))?;
            return Ok(vec![index]);
        }

        let (preferred, rest): (Vec<usize>, Vec<usize>) = (0..self.tiers.len())
            .partition(|&i| self.tiers[i].config.prefers_language(target_lang));
        Ok(preferred.into_iter().chain(rest).collect())
    }

    /// Translate a resource tree into `target_lang`.
    ///
    /// Returns a [`TranslationOutcome`] even when some or all units could
    /// not be translated; check [`TranslationOutcome::exhaustion_error`]
    /// for the partial-failure report. Only cancellation and configuration
    /// problems surface as `Err`.
    pub async fn translate_resource(
        &self,
        tree: &Value,
        source_lang: &str,
        target_lang: &str,
        options: &RunOptions,
    ) -> Result<TranslationOutcome, EngineError> {
        let units = resource::flatten(tree);

        // Cache hits resolve immediately; the rest is the work batch
        let mut resolved: HashMap<String, String> = HashMap::new();
        let mut work: Vec<TranslationUnit> = Vec::new();
        for unit in units {
            match self.cache.get(
                &unit.key,
                target_lang,
                &options.namespace,
                &unit.source_text,
            ) {
                Some(translated) => {
                    resolved.insert(unit.key.clone(), translated);
                }
                None => work.push(unit),
            }
        }

        let order = self.resolve_tier_order(target_lang, options)?;
        let mut usage: Vec<TierUsage> = Vec::new();
        let mut warnings: Vec<PlaceholderWarning> = Vec::new();

        for tier_index in order {
            if work.is_empty() && self.config.fallback.stop_on_first_success {
                break;
            }

            let tier = &self.tiers[tier_index];
            let provider = tier.config.provider;

            if options.disabled_providers.contains(&provider) {
                info!("tier {} disabled for this run, skipping", provider);
                continue;
            }
            if !tier.config.has_credentials() && self.config.fallback.skip_on_missing_key {
                if self.config.fallback.log_fallback_events {
                    info!("tier {} has no credentials, skipping", provider);
                }
                continue;
            }

            let mut tier_usage = TierUsage::new(provider);
            let chunks: Vec<Vec<TranslationUnit>> = work
                .chunks(tier.config.batch_size.max(1))
                .map(|c| c.to_vec())
                .collect();

            for chunk in &chunks {
                tier.limiter
                    .acquire(1, &options.cancel)
                    .await
                    .map_err(|_| EngineError::Cancelled)?;

                let texts: Vec<String> = chunk.iter().map(|u| u.source_text.clone()).collect();
                tier_usage.requests += 1;

                let result = tier
                    .retry
                    .execute(&options.cancel, || {
                        tier.call_chunk(&texts, source_lang, target_lang)
                    })
                    .await;

                match result {
                    // Clients verify alignment themselves; re-check here so a
                    // misbehaving implementation cannot mispair key and text
                    Ok(translations) if translations.len() != chunk.len() => {
                        tier_usage.failed_requests += 1;
                        if self.config.fallback.log_fallback_events {
                            warn!(
                                "tier {} returned {} translations for {} units, advancing",
                                provider,
                                translations.len(),
                                chunk.len()
                            );
                        }
                        break;
                    }
                    Ok(translations) => {
                        let entries = self.accept_chunk(
                            chunk,
                            &translations,
                            provider,
                            target_lang,
                            &options.namespace,
                            &mut resolved,
                            &mut warnings,
                        );
                        tier_usage.units_translated += entries.len();
                        // Cache trouble costs a future hit, never this run
                        if let Err(e) = self.cache.set_batch(entries) {
                            warn!("cache write-through failed: {}", e);
                        }
                    }
                    Err(RetryError::Cancelled) => {
                        usage.push(tier_usage);
                        return Err(EngineError::Cancelled);
                    }
                    Err(e) => {
                        tier_usage.failed_requests += 1;
                        if self.config.fallback.log_fallback_events {
                            warn!(
                                "tier {} abandoned after chunk failure ({}), advancing",
                                provider, e
                            );
                        }
                        break;
                    }
                }
            }

            work.retain(|unit| !resolved.contains_key(&unit.key));
            usage.push(tier_usage);
        }

        let unresolved_keys: Vec<String> = work.iter().map(|u| u.key.clone()).collect();
        if !unresolved_keys.is_empty() {
            error!(
                "all providers exhausted, {} keys untranslated: {}",
                unresolved_keys.len(),
                unresolved_keys.join(", ")
            );
        }

        Ok(TranslationOutcome {
            tree: resource::reconstruct(tree, &resolved),
            usage,
            unresolved_keys,
            placeholder_warnings: warnings,
        })
    }

    /// Fold one successful chunk into the run state and produce its cache
    /// entries. Placeholder drift is recorded against the unit, both in the
    /// run warnings and in the entry metadata.
    #[allow(clippy::too_many_arguments)]
    fn accept_chunk(
        &self,
        chunk: &[TranslationUnit],
        translations: &[String],
        provider: ProviderId,
        target_lang: &str,
        namespace: &str,
        resolved: &mut HashMap<String, String>,
        warnings: &mut Vec<PlaceholderWarning>,
    ) -> Vec<CacheEntry> {
        let mut entries = Vec::with_capacity(chunk.len());
        for (unit, translated) in chunk.iter().zip(translations) {
            let mut metadata = BTreeMap::new();
            if unit.plural_form != PluralForm::None {
                metadata.insert("plural_form".to_string(), unit.plural_form.as_str().to_string());
            }
            if let Some(warning) =
                placeholders::validate(&unit.key, &unit.source_text, translated)
            {
                warn!("{}", warning);
                metadata.insert("placeholder_mismatch".to_string(), warning.to_string());
                warnings.push(warning);
            }

            resolved.insert(unit.key.clone(), translated.clone());
            entries.push(CacheEntry {
                key: unit.key.clone(),
                target_lang: target_lang.to_string(),
                namespace: namespace.to_string(),
                source_text: unit.source_text.clone(),
                translated_text: translated.clone(),
                provider: provider.to_string(),
                metadata,
            });
        }
        entries
    }
}
