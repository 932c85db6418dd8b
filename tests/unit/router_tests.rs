/*!
 * Tests for the fallback router: tier ordering, skipping, chunking,
 * partial success and exhaustion reporting
 */

use serde_json::json;
use std::collections::BTreeMap;

use lingoflow::engine_config::ProviderId;
use lingoflow::errors::EngineError;
use lingoflow::providers::mock::{MockClient, ScriptedResponse};
use lingoflow::translation::cache::CacheEntry;
use lingoflow::translation::router::{FallbackRouter, RunOptions};

use crate::common::{create_temp_dir, sample_tree, test_config, test_tier};

#[tokio::test]
async fn test_translate_withSingleTier_shouldTranslateAllUnits() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(vec![test_tier(ProviderId::DeepL, 1)], &dir);
    let router =
        FallbackRouter::with_clients(config, vec![Box::new(MockClient::new(ProviderId::DeepL))])
            .unwrap();

    let outcome = router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    assert!(outcome.unresolved_keys.is_empty());
    assert_eq!(outcome.tree["app"]["title"], "[fr] Hello");
    assert_eq!(outcome.usage.len(), 1);
    assert_eq!(outcome.usage[0].units_translated, 3);
}

#[tokio::test]
async fn test_translate_withMissingCredentials_shouldSkipTierWithoutAnyCall() {
    let dir = create_temp_dir().unwrap();
    let mut tier1 = test_tier(ProviderId::Systran, 1);
    tier1.api_key = None;
    let tier2 = test_tier(ProviderId::DeepL, 2);
    let config = test_config(vec![tier1, tier2], &dir);

    let systran = MockClient::new(ProviderId::Systran);
    let systran_calls = systran.call_counter();
    let deepl = MockClient::new(ProviderId::DeepL);
    let deepl_calls = deepl.call_counter();

    let router =
        FallbackRouter::with_clients(config, vec![Box::new(systran), Box::new(deepl)]).unwrap();
    let outcome = router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(systran_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(deepl_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(outcome.unresolved_keys.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_translate_withFailingFirstTier_shouldFallBackToSecond() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(
        vec![
            test_tier(ProviderId::Systran, 1),
            test_tier(ProviderId::DeepL, 2),
        ],
        &dir,
    );

    let systran = MockClient::always_status(ProviderId::Systran, 503);
    let systran_calls = systran.call_counter();
    let deepl = MockClient::new(ProviderId::DeepL);
    let deepl_calls = deepl.call_counter();

    let router =
        FallbackRouter::with_clients(config, vec![Box::new(systran), Box::new(deepl)]).unwrap();
    let outcome = router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    // Retry budget is 3 attempts, then the whole batch moves to the next tier
    assert_eq!(systran_calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    assert_eq!(deepl_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(outcome.unresolved_keys.is_empty());
    assert_eq!(outcome.usage[0].failed_requests, 1);
    assert_eq!(outcome.usage[1].units_translated, 3);
}

#[tokio::test]
async fn test_translate_withAuthFailure_shouldAbandonTierAfterOneAttempt() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(
        vec![
            test_tier(ProviderId::Systran, 1),
            test_tier(ProviderId::DeepL, 2),
        ],
        &dir,
    );

    let systran = MockClient::always_status(ProviderId::Systran, 401);
    let systran_calls = systran.call_counter();
    let deepl = MockClient::new(ProviderId::DeepL);

    let router =
        FallbackRouter::with_clients(config, vec![Box::new(systran), Box::new(deepl)]).unwrap();
    let outcome = router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    // Non-retryable: exactly one attempt, no retry budget consumed
    assert_eq!(systran_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(outcome.unresolved_keys.is_empty());
}

#[tokio::test]
async fn test_translate_withPreferredLanguageTier_shouldPromoteIt() {
    let dir = create_temp_dir().unwrap();
    let tier1 = test_tier(ProviderId::Systran, 1);
    let mut tier2 = test_tier(ProviderId::DeepL, 2);
    tier2.preferred_languages = vec!["fr".to_string()];
    let config = test_config(vec![tier1, tier2], &dir);

    let systran = MockClient::new(ProviderId::Systran);
    let systran_calls = systran.call_counter();
    let deepl = MockClient::new(ProviderId::DeepL);
    let deepl_calls = deepl.call_counter();

    let router =
        FallbackRouter::with_clients(config, vec![Box::new(systran), Box::new(deepl)]).unwrap();
    router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    // DeepL declares fr, so it moves ahead of the lower-priority Systran tier
    assert_eq!(systran_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(deepl_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_translate_withForcedProvider_shouldDisableFallback() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(
        vec![
            test_tier(ProviderId::Systran, 1),
            test_tier(ProviderId::Google, 2),
        ],
        &dir,
    );

    let systran = MockClient::new(ProviderId::Systran);
    let systran_calls = systran.call_counter();
    let google = MockClient::new(ProviderId::Google);
    let google_calls = google.call_counter();

    let router =
        FallbackRouter::with_clients(config, vec![Box::new(systran), Box::new(google)]).unwrap();
    let options = RunOptions {
        provider: Some(ProviderId::Google),
        ..RunOptions::default()
    };
    router
        .translate_resource(&sample_tree(), "en", "fr", &options)
        .await
        .unwrap();

    assert_eq!(systran_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(google_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_translate_withForcedUnknownProvider_shouldError() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(vec![test_tier(ProviderId::Systran, 1)], &dir);
    let router =
        FallbackRouter::with_clients(config, vec![Box::new(MockClient::new(ProviderId::Systran))])
            .unwrap();

    let options = RunOptions {
        provider: Some(ProviderId::OpenAI),
        ..RunOptions::default()
    };
    let result = router
        .translate_resource(&sample_tree(), "en", "fr", &options)
        .await;

    assert!(matches!(result, Err(EngineError::ProviderNotConfigured(_))));
}

#[tokio::test]
async fn test_translate_withDisabledProvider_shouldExcludeIt() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(
        vec![
            test_tier(ProviderId::Systran, 1),
            test_tier(ProviderId::DeepL, 2),
        ],
        &dir,
    );

    let systran = MockClient::new(ProviderId::Systran);
    let systran_calls = systran.call_counter();
    let deepl = MockClient::new(ProviderId::DeepL);

    let router =
        FallbackRouter::with_clients(config, vec![Box::new(systran), Box::new(deepl)]).unwrap();
    let options = RunOptions {
        disabled_providers: [ProviderId::Systran].into_iter().collect(),
        ..RunOptions::default()
    };
    let outcome = router
        .translate_resource(&sample_tree(), "en", "fr", &options)
        .await
        .unwrap();

    assert_eq!(systran_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(outcome.unresolved_keys.is_empty());
}

#[tokio::test]
async fn test_translate_withSmallBatchSize_shouldChunkTheWorkBatch() {
    let dir = create_temp_dir().unwrap();
    let mut tier = test_tier(ProviderId::DeepL, 1);
    tier.batch_size = 2;
    let config = test_config(vec![tier], &dir);

    let deepl = MockClient::new(ProviderId::DeepL);
    let deepl_calls = deepl.call_counter();

    let router = FallbackRouter::with_clients(config, vec![Box::new(deepl)]).unwrap();
    router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    // 3 units with batch_size 2: two chunks
    assert_eq!(deepl_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withMidTierFailure_shouldKeepEarlierChunkSuccesses() {
    let dir = create_temp_dir().unwrap();
    let mut tier1 = test_tier(ProviderId::Systran, 1);
    tier1.batch_size = 1;
    let tier2 = test_tier(ProviderId::DeepL, 2);
    let config = test_config(vec![tier1, tier2], &dir);

    // First chunk succeeds, second chunk burns its whole retry budget
    let systran = MockClient::scripted(
        ProviderId::Systran,
        vec![
            ScriptedResponse::Echo,
            ScriptedResponse::Status(500),
            ScriptedResponse::Status(500),
            ScriptedResponse::Status(500),
        ],
    );
    let systran_calls = systran.call_counter();
    let deepl = MockClient::new(ProviderId::DeepL);
    let deepl_calls = deepl.call_counter();

    let router =
        FallbackRouter::with_clients(config, vec![Box::new(systran), Box::new(deepl)]).unwrap();
    let outcome = router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    // Chunk 1 succeeded and stays; the remaining two units move to DeepL
    assert_eq!(systran_calls.load(std::sync::atomic::Ordering::SeqCst), 4);
    assert_eq!(deepl_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(outcome.unresolved_keys.is_empty());
    assert_eq!(outcome.usage[0].units_translated, 1);
    assert_eq!(outcome.usage[1].units_translated, 2);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withAllTiersFailing_shouldReportUnresolvedKeys() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(vec![test_tier(ProviderId::Systran, 1)], &dir);

    let router = FallbackRouter::with_clients(
        config,
        vec![Box::new(MockClient::always_status(ProviderId::Systran, 500))],
    )
    .unwrap();

    // One key is already cached and must survive the exhaustion untouched
    router
        .cache()
        .set_batch(vec![CacheEntry {
            key: "app.title".to_string(),
            target_lang: "fr".to_string(),
            namespace: "default".to_string(),
            source_text: "Hello".to_string(),
            translated_text: "Bonjour".to_string(),
            provider: "deepl".to_string(),
            metadata: BTreeMap::new(),
        }])
        .unwrap();

    let outcome = router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(
        outcome.unresolved_keys,
        vec!["app.count_one".to_string(), "app.count_other".to_string()]
    );
    assert!(matches!(
        outcome.exhaustion_error(),
        Some(EngineError::AllProvidersExhausted { .. })
    ));
    // Cache-resolved and untranslated leaves both keep a value, never null
    assert_eq!(outcome.tree["app"]["title"], "Bonjour");
    assert_eq!(outcome.tree["app"]["count_one"], "{{n}} item");
}

#[tokio::test]
async fn test_translate_secondRun_shouldResolveFromCacheWithoutCalls() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(vec![test_tier(ProviderId::DeepL, 1)], &dir);

    let deepl = MockClient::new(ProviderId::DeepL);
    let deepl_calls = deepl.call_counter();

    let router = FallbackRouter::with_clients(config, vec![Box::new(deepl)]).unwrap();
    router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(deepl_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    let outcome = router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    // Everything came from the cache, no further provider traffic
    assert_eq!(deepl_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(outcome.tree["app"]["title"], "[fr] Hello");
    assert!(outcome.usage.iter().all(|u| u.requests == 0));
}

#[tokio::test]
async fn test_translate_withChangedSource_shouldRefreshOnlyThatKey() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(vec![test_tier(ProviderId::DeepL, 1)], &dir);

    let deepl = MockClient::new(ProviderId::DeepL);
    let deepl_calls = deepl.call_counter();

    let router = FallbackRouter::with_clients(config, vec![Box::new(deepl)]).unwrap();
    router
        .translate_resource(&sample_tree(), "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    let mut changed = sample_tree();
    changed["app"]["title"] = json!("Hello!");
    let outcome = router
        .translate_resource(&changed, "en", "fr", &RunOptions::default())
        .await
        .unwrap();

    // One more call, carrying only the stale key
    assert_eq!(deepl_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(outcome.tree["app"]["title"], "[fr] Hello!");
    assert_eq!(outcome.tree["app"]["count_one"], "[fr] {{n}} item");
    assert_eq!(outcome.usage[0].units_translated, 1);
}

#[tokio::test]
async fn test_translate_withCancelledToken_shouldReturnCancelled() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(vec![test_tier(ProviderId::DeepL, 1)], &dir);
    let router =
        FallbackRouter::with_clients(config, vec![Box::new(MockClient::new(ProviderId::DeepL))])
            .unwrap();

    let options = RunOptions::default();
    options.cancel.cancel();
    let result = router
        .translate_resource(&sample_tree(), "en", "fr", &options)
        .await;

    assert!(matches!(result, Err(EngineError::Cancelled)));
}
