use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::EngineError;

/// Engine configuration module
/// This module holds the resolved configuration the engine consumes: the
/// provider tiers of the fallback chain, the fallback policy and the cache
/// location. Precedence resolution (files, environment) happens upstream;
/// the engine only validates what it is handed.
/// Identifies one of the supported translation providers
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    // @provider: Systran professional MT
    #[default]
    Systran,
    // @provider: DeepL
    DeepL,
    // @provider: Google Cloud Translation
    Google,
    // @provider: OpenAI chat-completion translation
    OpenAI,
}

impl ProviderId {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Systran => "Systran",
            Self::DeepL => "DeepL",
            Self::Google => "Google",
            Self::OpenAI => "OpenAI",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Systran => "systran",
            Self::DeepL => "deepl",
            Self::Google => "google",
            Self::OpenAI => "openai",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "systran" => Ok(Self::Systran),
            "deepl" => Ok(Self::DeepL),
            "google" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAI),
            _ => Err(anyhow!("Invalid provider identifier: {}", s)),
        }
    }
}

/// Configuration for one tier of the fallback chain
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TierConfig {
    /// Which provider this tier talks to
    pub provider: ProviderId,

    /// Whether the tier participates in the fallback chain
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Rank in the fallback chain, lower is tried first.
    /// Values need not be contiguous; ordering is total.
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum network attempts per request (including the first)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum number of strings sent in one provider request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Sustained request rate; also the burst capacity (one second worth)
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Target languages this tier is preferred for
    #[serde(default)]
    pub preferred_languages: Vec<String>,

    /// API key, already resolved by the configuration layer
    #[serde(default)]
    pub api_key: Option<String>,

    /// Endpoint override, defaults to the vendor's public API
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model name, only meaningful for the OpenAI tier
    #[serde(default)]
    pub model: Option<String>,
}

impl TierConfig {
    // @param provider: Provider enum
    // @returns: Tier config with vendor-appropriate defaults
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            enabled: true,
            priority: default_priority(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            batch_size: match provider {
                ProviderId::Systran | ProviderId::DeepL => 50,
                ProviderId::Google => 100,
                // The API accepts arbitrary batch sizes; chunk for practicality
                ProviderId::OpenAI => 25,
            },
            requests_per_second: default_requests_per_second(),
            preferred_languages: Vec::new(),
            api_key: None,
            endpoint: None,
            model: None,
        }
    }

    /// Whether this tier has usable credentials
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Whether this tier declares the given target language as preferred
    pub fn prefers_language(&self, target_lang: &str) -> bool {
        self.preferred_languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(target_lang))
    }
}

/// Fallback chain behavior
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Skip a tier without any network call when its credentials are absent
    #[serde(default = "default_enabled")]
    pub skip_on_missing_key: bool,

    /// Stop consulting further tiers once the work batch is empty
    #[serde(default = "default_enabled")]
    pub stop_on_first_success: bool,

    /// Emit an info log each time the chain advances to the next tier
    #[serde(default = "default_enabled")]
    pub log_fallback_events: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            skip_on_missing_key: true,
            stop_on_first_success: true,
            log_fallback_events: true,
        }
    }
}

/// On-disk translation cache settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Whether lookups and write-through are performed at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Root directory holding one file per (language, namespace) partition
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
        }
    }
}

/// Resolved configuration for one engine instance
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Provider tiers; order here is irrelevant, `priority` decides
    pub tiers: Vec<TierConfig>,

    /// Fallback chain behavior
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

impl EngineConfig {
    /// Build a config from tiers, keeping default fallback and cache settings
    pub fn new(tiers: Vec<TierConfig>) -> Self {
        Self {
            tiers,
            fallback: FallbackConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Fail fast unless at least one enabled tier exists
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.tiers.iter().any(|t| t.enabled) {
            Ok(())
        } else {
            Err(EngineError::NoTiersEnabled)
        }
    }

    /// Enabled tiers sorted by ascending priority
    pub fn enabled_tiers(&self) -> Vec<&TierConfig> {
        let mut tiers: Vec<&TierConfig> = self.tiers.iter().filter(|t| t.enabled).collect();
        tiers.sort_by_key(|t| t.priority);
        tiers
    }
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> u8 {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_batch_size() -> usize {
    50
}

fn default_requests_per_second() -> f64 {
    5.0
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".lingoflow-cache")
}
