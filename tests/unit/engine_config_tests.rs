/*!
 * Tests for engine configuration defaults and validation
 */

use std::str::FromStr;

use lingoflow::engine_config::{EngineConfig, FallbackConfig, ProviderId, TierConfig};
use lingoflow::errors::EngineError;

#[test]
fn test_tier_new_withSystran_shouldUseVendorBatchSize() {
    assert_eq!(TierConfig::new(ProviderId::Systran).batch_size, 50);
    assert_eq!(TierConfig::new(ProviderId::DeepL).batch_size, 50);
    assert_eq!(TierConfig::new(ProviderId::Google).batch_size, 100);
    assert_eq!(TierConfig::new(ProviderId::OpenAI).batch_size, 25);
}

#[test]
fn test_config_validate_withNoEnabledTiers_shouldFailFast() {
    let mut tier = TierConfig::new(ProviderId::DeepL);
    tier.enabled = false;
    let config = EngineConfig::new(vec![tier]);

    let result = config.validate();
    assert!(matches!(result, Err(EngineError::NoTiersEnabled)));
}

#[test]
fn test_config_validate_withOneEnabledTier_shouldSucceed() {
    let config = EngineConfig::new(vec![TierConfig::new(ProviderId::Google)]);
    assert!(config.validate().is_ok());
}

#[test]
fn test_enabled_tiers_withNonContiguousPriorities_shouldSortAscending() {
    let mut a = TierConfig::new(ProviderId::OpenAI);
    a.priority = 9;
    let mut b = TierConfig::new(ProviderId::Systran);
    b.priority = 2;
    let mut c = TierConfig::new(ProviderId::DeepL);
    c.priority = 5;
    c.enabled = false;
    let config = EngineConfig::new(vec![a, b, c]);

    let order: Vec<ProviderId> = config.enabled_tiers().iter().map(|t| t.provider).collect();
    assert_eq!(order, vec![ProviderId::Systran, ProviderId::OpenAI]);
}

#[test]
fn test_provider_id_from_str_shouldParseAllVendors() {
    assert_eq!(ProviderId::from_str("systran").unwrap(), ProviderId::Systran);
    assert_eq!(ProviderId::from_str("DeepL").unwrap(), ProviderId::DeepL);
    assert_eq!(ProviderId::from_str("google").unwrap(), ProviderId::Google);
    assert_eq!(ProviderId::from_str("OPENAI").unwrap(), ProviderId::OpenAI);
    assert!(ProviderId::from_str("babelfish").is_err());
}

#[test]
fn test_provider_id_display_shouldBeLowercase() {
    assert_eq!(ProviderId::DeepL.to_string(), "deepl");
    assert_eq!(ProviderId::OpenAI.to_string(), "openai");
}

#[test]
fn test_has_credentials_withBlankKey_shouldBeFalse() {
    let mut tier = TierConfig::new(ProviderId::Systran);
    assert!(!tier.has_credentials());
    tier.api_key = Some("   ".to_string());
    assert!(!tier.has_credentials());
    tier.api_key = Some("k".to_string());
    assert!(tier.has_credentials());
}

#[test]
fn test_prefers_language_shouldIgnoreCase() {
    let mut tier = TierConfig::new(ProviderId::DeepL);
    tier.preferred_languages = vec!["FR".to_string(), "de".to_string()];
    assert!(tier.prefers_language("fr"));
    assert!(tier.prefers_language("DE"));
    assert!(!tier.prefers_language("ja"));
}

#[test]
fn test_fallback_config_defaults_shouldMatchDocumentedPolicy() {
    let fallback = FallbackConfig::default();
    assert!(fallback.skip_on_missing_key);
    assert!(fallback.stop_on_first_success);
    assert!(fallback.log_fallback_events);
}

#[test]
fn test_tier_deserialize_withMinimalJson_shouldApplyDefaults() {
    let tier: TierConfig = serde_json::from_str(r#"{"provider": "deepl"}"#).unwrap();
    assert!(tier.enabled);
    assert_eq!(tier.priority, 1);
    assert_eq!(tier.timeout_secs, 30);
    assert_eq!(tier.max_retries, 3);
    assert!(tier.api_key.is_none());
    assert!(tier.preferred_languages.is_empty());
}
