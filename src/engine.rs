/*!
 * Engine entrypoint.
 *
 * Thin facade over the fallback router, consumed by the CLI and tooling
 * layers: one call per (tree, target language), plus a convenience that
 * fans out over several target languages concurrently. Runs for different
 * languages are independent; their completion order carries no guarantee.
 */

use futures::future::join_all;
use serde_json::Value;

use crate::engine_config::EngineConfig;
use crate::errors::EngineError;
use crate::providers::ProviderClient;
use crate::translation::cache::TranslationCache;
use crate::translation::router::{FallbackRouter, RunOptions, TranslationOutcome};

/// The translation delivery engine
pub struct Engine {
    router: FallbackRouter,
}

impl Engine {
    /// Create an engine from resolved configuration
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            router: FallbackRouter::new(config)?,
        })
    }

    /// Create an engine with injected provider clients (stubs, mocks)
    pub fn with_clients(
        config: EngineConfig,
        clients: Vec<Box<dyn ProviderClient>>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            router: FallbackRouter::with_clients(config, clients)?,
        })
    }

    /// Translate a resource tree into one target language
    pub async fn translate(
        &self,
        tree: &Value,
        source_lang: &str,
        target_lang: &str,
        options: &RunOptions,
    ) -> Result<TranslationOutcome, EngineError> {
        self.router
            .translate_resource(tree, source_lang, target_lang, options)
            .await
    }

    /// Translate a resource tree into several target languages, one
    /// concurrent task per language. Rate limiters are shared across the
    /// tasks, so the per-tier request rate holds for the whole fan-out.
    pub async fn translate_many(
        &self,
        tree: &Value,
        source_lang: &str,
        target_langs: &[String],
        options: &RunOptions,
    ) -> Result<Vec<(String, TranslationOutcome)>, EngineError> {
        let runs = target_langs.iter().map(|target| async move {
            let outcome = self
                .router
                .translate_resource(tree, source_lang, target, options)
                .await?;
            Ok::<_, EngineError>((target.clone(), outcome))
        });

        join_all(runs).await.into_iter().collect()
    }

    /// The underlying cache, shared read-only with validation tooling
    pub fn cache(&self) -> &TranslationCache {
        self.router.cache()
    }
}
