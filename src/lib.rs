/*!
 * # lingoflow
 *
 * A Rust library for delivering translated resource trees through a chain
 * of third-party translation providers.
 *
 * ## Features
 *
 * - Flatten nested resource trees (maps, arrays, plural groups) into
 *   translation batches and reconstruct them losslessly
 * - Translate through multiple providers behind one interface:
 *   - Systran
 *   - DeepL
 *   - Google Cloud Translation
 *   - OpenAI (with placeholder-preserving prompting)
 * - Priority-ordered fallback with per-tier rate limiting and retries
 * - Durable on-disk caching with source-text staleness detection
 * - Placeholder validation across translation
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `engine_config`: Resolved tier, fallback and cache configuration
 * - `engine`: Entry point facade used by the CLI and tooling layers
 * - `resource`: Flattening and reconstruction of nested resource trees
 * - `placeholders`: Placeholder extraction and validation
 * - `translation`: Delivery machinery:
 *   - `translation::router`: Fallback orchestration across tiers
 *   - `translation::cache`: Durable translation cache
 *   - `translation::rate_limit`: Token bucket rate limiting
 *   - `translation::retry`: Classification-driven backoff
 * - `providers`: Client implementations for the translation vendors:
 *   - `providers::systran`, `providers::deepl`, `providers::google`,
 *     `providers::openai`, plus a scriptable `providers::mock`
 * - `errors`: Custom error types for the engine
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod engine;
pub mod engine_config;
pub mod errors;
pub mod placeholders;
pub mod providers;
pub mod resource;
pub mod translation;

// Re-export main types for easier usage
pub use engine::Engine;
pub use engine_config::{EngineConfig, FallbackConfig, ProviderId, TierConfig};
pub use errors::{CacheError, EngineError, ProviderError, RetryError};
pub use placeholders::PlaceholderWarning;
pub use resource::{PluralForm, TranslationUnit, flatten, reconstruct};
pub use translation::{FallbackRouter, RunOptions, TierUsage, TranslationCache, TranslationOutcome};
