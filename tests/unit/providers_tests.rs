/*!
 * Tests for provider client construction and the mock provider
 */

use lingoflow::engine_config::{ProviderId, TierConfig};
use lingoflow::providers::mock::{MockClient, ScriptedResponse};
use lingoflow::providers::{ProviderClient, RateLimitInfo, build_client};

fn tier_with_key(provider: ProviderId) -> TierConfig {
    let mut tier = TierConfig::new(provider);
    tier.api_key = Some("sk-very-secret-key".to_string());
    tier
}

#[test]
fn test_build_client_shouldMatchTierProvider() {
    for provider in [
        ProviderId::Systran,
        ProviderId::DeepL,
        ProviderId::Google,
        ProviderId::OpenAI,
    ] {
        let client = build_client(&tier_with_key(provider));
        assert_eq!(client.id(), provider);
    }
}

#[test]
fn test_client_debug_shouldNeverLeakCredentials() {
    for provider in [
        ProviderId::Systran,
        ProviderId::DeepL,
        ProviderId::Google,
        ProviderId::OpenAI,
    ] {
        let client = build_client(&tier_with_key(provider));
        let rendered = format!("{:?}", client);
        assert!(
            !rendered.contains("sk-very-secret-key"),
            "{:?} leaked its API key: {}",
            provider,
            rendered
        );
    }
}

#[tokio::test]
async fn test_mock_withEmptyScript_shouldEchoWithTargetLanguage() {
    let mock = MockClient::new(ProviderId::DeepL);
    let texts = vec!["Hello".to_string(), "Bye".to_string()];

    let result = mock.translate_batch(&texts, "en", "fr").await.unwrap();

    assert_eq!(result, vec!["[fr] Hello", "[fr] Bye"]);
    assert_eq!(mock.calls(), 1);
    assert_eq!(mock.last_batch(), Some(texts));
}

#[tokio::test]
async fn test_mock_withScript_shouldPlayResponsesInOrder() {
    let mock = MockClient::scripted(
        ProviderId::Systran,
        vec![
            ScriptedResponse::Status(503),
            ScriptedResponse::Exact(vec!["Bonjour".to_string()]),
        ],
    );
    let texts = vec!["Hello".to_string()];

    assert!(mock.translate_batch(&texts, "en", "fr").await.is_err());
    let second = mock.translate_batch(&texts, "en", "fr").await.unwrap();
    assert_eq!(second, vec!["Bonjour"]);
    // Script exhausted: back to echoing
    let third = mock.translate_batch(&texts, "en", "fr").await.unwrap();
    assert_eq!(third, vec!["[fr] Hello"]);
}

#[tokio::test]
async fn test_mock_rate_limit_info_shouldTrackCalls() {
    let mock = MockClient::new(ProviderId::Google);
    let texts = vec!["Hello".to_string()];
    mock.translate_batch(&texts, "en", "fr").await.unwrap();

    let info = mock.rate_limit_info().await.unwrap();
    assert_eq!(info.limit, Some(1000));
    assert_eq!(info.remaining, Some(999));
}

#[test]
fn test_rate_limit_info_default_shouldBeUnknown() {
    let info = RateLimitInfo::default();
    assert!(info.limit.is_none());
    assert!(info.remaining.is_none());
    assert!(info.reset_at.is_none());
}
