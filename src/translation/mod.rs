/*!
 * Translation delivery across rate-limited provider tiers.
 *
 * This module contains the moving parts the engine composes for one
 * translation run. It is split into several submodules:
 *
 * - `router`: Fallback orchestration across provider tiers
 * - `cache`: Durable on-disk caching of translations
 * - `rate_limit`: Per-tier token bucket rate limiting
 * - `retry`: Classification-driven exponential backoff
 */

// Re-export main types for easier usage
pub use self::cache::{CacheEntry, CacheStats, TranslationCache};
pub use self::rate_limit::RateLimiter;
pub use self::retry::{RetryExecutor, RetryPolicy};
pub use self::router::{FallbackRouter, RunOptions, TierUsage, TranslationOutcome};

// Submodules
pub mod cache;
pub mod rate_limit;
pub mod retry;
pub mod router;
