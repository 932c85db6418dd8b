/*!
 * Mock provider client for testing.
 *
 * The mock plays back a script of queued responses, one per
 * `translate_batch` call, and falls back to echo translations once the
 * script is exhausted. Call counts and the last batch received are
 * recorded so tests can assert on traffic, not just results.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ProviderClient, RateLimitInfo};
use crate::engine_config::ProviderId;
use crate::errors::ProviderError;

/// One scripted reaction to a `translate_batch` call
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Succeed, echoing each input as `[lang] input`
    Echo,
    /// Succeed with exactly these texts
    Exact(Vec<String>),
    /// Fail with the given HTTP status
    Status(u16),
    /// Fail with a timeout
    Timeout,
    /// Fail with a connection error
    Connection,
    /// Succeed but return the wrong number of outputs
    Misaligned,
    /// Sleep this many milliseconds, then echo
    Slow(u64),
}

/// Scriptable in-memory provider client
#[derive(Debug)]
pub struct MockClient {
    id: ProviderId,
    script: Mutex<VecDeque<ScriptedResponse>>,
    /// Number of translate_batch calls received
    calls: Arc<AtomicUsize>,
    /// The most recent batch received
    last_batch: Mutex<Option<Vec<String>>>,
}

impl MockClient {
    /// Create a mock that always echoes
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            script: Mutex::new(VecDeque::new()),
            calls: Arc::new(AtomicUsize::new(0)),
            last_batch: Mutex::new(None),
        }
    }

    /// Create a mock that plays the given responses in order, then echoes
    pub fn scripted(id: ProviderId, responses: Vec<ScriptedResponse>) -> Self {
        let mock = Self::new(id);
        *mock.script.lock() = responses.into();
        mock
    }

    /// Create a mock that fails every call with the given status
    pub fn always_status(id: ProviderId, status: u16) -> Self {
        let mock = Self::new(id);
        mock.script
            .lock()
            .extend(std::iter::repeat_n(ScriptedResponse::Status(status), 64));
        mock
    }

    /// Shared handle to the call counter
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Number of translate_batch calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent batch received, if any
    pub fn last_batch(&self) -> Option<Vec<String>> {
        self.last_batch.lock().clone()
    }

    fn echo(texts: &[String], target_lang: &str) -> Vec<String> {
        texts
            .iter()
            .map(|t| format!("[{}] {}", target_lang, t))
            .collect()
    }
}

#[async_trait]
impl ProviderClient for MockClient {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_batch.lock() = Some(texts.to_vec());

        let next = self.script.lock().pop_front();
        match next {
            None | Some(ScriptedResponse::Echo) => Ok(Self::echo(texts, target_lang)),
            Some(ScriptedResponse::Exact(out)) => Ok(out),
            Some(ScriptedResponse::Status(code)) => {
                Err(ProviderError::from_status(code, "scripted failure"))
            }
            Some(ScriptedResponse::Timeout) => {
                Err(ProviderError::Timeout("scripted timeout".to_string()))
            }
            Some(ScriptedResponse::Connection) => {
                Err(ProviderError::ConnectionError("scripted refusal".to_string()))
            }
            Some(ScriptedResponse::Misaligned) => {
                let mut out = Self::echo(texts, target_lang);
                out.push("stray".to_string());
                Ok(out)
            }
            Some(ScriptedResponse::Slow(delay_ms)) => {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                Ok(Self::echo(texts, target_lang))
            }
        }
    }

    async fn rate_limit_info(&self) -> Result<RateLimitInfo, ProviderError> {
        Ok(RateLimitInfo {
            limit: Some(1000),
            remaining: Some(1000 - self.calls() as u64),
            reset_at: None,
        })
    }
}
