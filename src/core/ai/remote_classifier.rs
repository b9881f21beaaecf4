// Remote classifier - asks a hosted model for a verdict when the patterns
// are inconclusive.
//
// Never returns an error: when every attempt fails the verdict is
// `Uncertain` with reason `remote-unavailable`, and the decision engine
// deletes without flagging.

use super::credential_pool::{Acquire, CredentialPool};
use super::models::{AiConfig, AiMessage, ProviderError};
use super::prompt::{build_messages, parse_verdict};
use super::provider::AiProvider;
use super::usage_tracker::{UsageEvent, UsageTracker};
use crate::core::age_check::{AgeCheckError, ChannelKind, DetectionVerdict, RemoteAgeClassifier};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

pub const REASON_REMOTE_UNAVAILABLE: &str = "remote-unavailable";
pub const REASON_REMOTE_UNCONFIGURED: &str = "remote-unconfigured";
pub const REASON_REMOTE_LIMIT: &str = "remote-limit-reached";

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RemoteClassifier<P: AiProvider> {
    provider: P,
    config: AiConfig,
    pool: Arc<CredentialPool>,
    usage: Arc<UsageTracker>,
    call_timeout: Duration,
    usage_alerts: Option<UnboundedSender<UsageEvent>>,
}

impl<P: AiProvider> RemoteClassifier<P> {
    pub fn new(
        provider: P,
        config: AiConfig,
        pool: Arc<CredentialPool>,
        usage: Arc<UsageTracker>,
    ) -> Self {
        Self {
            provider,
            config,
            pool,
            usage,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            usage_alerts: None,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Forward budget threshold crossings to whoever wants to announce them.
    pub fn with_usage_alerts(mut self, sender: UnboundedSender<UsageEvent>) -> Self {
        self.usage_alerts = Some(sender);
        self
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn emit(&self, event: Option<UsageEvent>) {
        if let (Some(event), Some(sender)) = (event, &self.usage_alerts) {
            if sender.send(event).is_err() {
                tracing::debug!("Usage alert receiver dropped");
            }
        }
    }

    /// One bounded call with a single credential, parsed into a verdict.
    async fn attempt(
        &self,
        messages: &[AiMessage],
        api_key: &str,
    ) -> Result<DetectionVerdict, ProviderError> {
        let call = self.provider.chat_complete(messages, &self.config, api_key);
        let content = tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| ProviderError::Timeout)??;

        parse_verdict(&content)
    }

    /// Classify `text`, rotating through the credential pool on failure.
    pub async fn classify(&self, text: &str, channel_kind: ChannelKind) -> DetectionVerdict {
        if self.pool.is_empty() {
            return DetectionVerdict::uncertain(REASON_REMOTE_UNCONFIGURED);
        }
        if self.usage.is_exhausted() {
            return DetectionVerdict::uncertain(REASON_REMOTE_LIMIT);
        }

        let messages = build_messages(text, channel_kind);
        let max_attempts = self.pool.max_attempts();
        let backoff = self.pool.policy().backoff;
        let mut pool_reset = false;
        let mut quota_exhausted: HashSet<usize> = HashSet::new();
        let mut attempts = 0;

        while attempts < max_attempts {
            let lease = match self.pool.acquire(Instant::now()).await {
                Acquire::Ready(lease) => lease,
                Acquire::AllCoolingDown if !pool_reset => {
                    tracing::warn!("All AI credentials cooling down, resetting pool");
                    self.pool.reset_cooldowns().await;
                    pool_reset = true;
                    continue;
                }
                Acquire::AllCoolingDown | Acquire::Empty => break,
            };
            attempts += 1;
            self.emit(self.usage.record_request());

            match self.attempt(&messages, &lease.key).await {
                Ok(verdict) => {
                    self.pool.record_success(lease.index).await;
                    tracing::debug!(
                        credential_index = lease.index,
                        attempts,
                        classification = ?verdict.classification,
                        "Remote classification succeeded"
                    );
                    return verdict;
                }
                Err(err) => {
                    let outcome = self
                        .pool
                        .record_failure(lease.index, &err, Instant::now())
                        .await;
                    tracing::warn!(
                        credential_index = lease.index,
                        error_kind = err.kind(),
                        credential_fault = err.is_credential_fault(),
                        consecutive_failures = outcome.consecutive_failures,
                        "Remote classification attempt failed: {}",
                        err
                    );
                    if outcome.entered_cooldown {
                        tracing::warn!(
                            credential_index = lease.index,
                            cooldown_secs = self.pool.policy().cooldown.as_secs(),
                            "AI credential put in cooldown"
                        );
                    }

                    if err.is_quota_exhausted() {
                        quota_exhausted.insert(lease.index);
                        if quota_exhausted.len() == self.pool.len() {
                            tracing::error!("Every AI credential reports an exhausted quota");
                            self.emit(self.usage.mark_exhausted());
                            break;
                        }
                    }

                    if self.usage.is_exhausted() {
                        tracing::error!(attempts, "AI usage limit reached mid-call, stopping retries");
                        break;
                    }

                    if attempts < max_attempts && !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        tracing::error!(attempts, "Remote classification unavailable, giving up");
        DetectionVerdict::uncertain(REASON_REMOTE_UNAVAILABLE)
    }
}

#[async_trait]
impl<P: AiProvider> RemoteAgeClassifier for RemoteClassifier<P> {
    async fn classify_remotely(
        &self,
        text: &str,
        channel_kind: ChannelKind,
    ) -> Result<DetectionVerdict, AgeCheckError> {
        Ok(self.classify(text, channel_kind).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::age_check::Classification;
    use crate::core::ai::credential_pool::PoolPolicy;
    use crate::core::ai::usage_tracker::UsageBudget;
    use std::sync::Mutex;

    const ADULT_REPLY: &str =
        r#"{"has_age_18_plus": true, "is_minor": false, "age": 30, "confidence": "high", "reason": "30f"}"#;

    /// Scripted transport: keys listed in `failing` always fail with `error`.
    struct ScriptedProvider {
        failing: Vec<&'static str>,
        error: fn() -> ProviderError,
        reply: &'static str,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(failing: Vec<&'static str>) -> Self {
            Self {
                failing,
                error: || ProviderError::Network("boom".to_string()),
                reply: ADULT_REPLY,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AiProvider for ScriptedProvider {
        async fn chat_complete(
            &self,
            _messages: &[AiMessage],
            _config: &AiConfig,
            api_key: &str,
        ) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(api_key.to_string());
            if self.failing.iter().any(|k| *k == api_key) {
                Err((self.error)())
            } else {
                Ok(self.reply.to_string())
            }
        }
    }

    #[async_trait]
    impl AiProvider for Arc<ScriptedProvider> {
        async fn chat_complete(
            &self,
            messages: &[AiMessage],
            config: &AiConfig,
            api_key: &str,
        ) -> Result<String, ProviderError> {
            (**self).chat_complete(messages, config, api_key).await
        }
    }

    /// Transport that never answers.
    struct HangingProvider;

    #[async_trait]
    impl AiProvider for HangingProvider {
        async fn chat_complete(
            &self,
            _messages: &[AiMessage],
            _config: &AiConfig,
            _api_key: &str,
        ) -> Result<String, ProviderError> {
            std::future::pending::<()>().await;
            Ok(String::new())
        }
    }

    fn fast_policy() -> PoolPolicy {
        PoolPolicy {
            backoff: Duration::ZERO,
            ..PoolPolicy::default()
        }
    }

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("k{}", i)).collect()
    }

    fn classifier(
        provider: Arc<ScriptedProvider>,
        pool: Arc<CredentialPool>,
        budget: UsageBudget,
    ) -> RemoteClassifier<Arc<ScriptedProvider>> {
        RemoteClassifier::new(
            provider,
            AiConfig::default(),
            pool,
            Arc::new(UsageTracker::new(budget)),
        )
    }

    #[tokio::test]
    async fn test_rotates_to_working_credential_and_sticks() {
        let provider = Arc::new(ScriptedProvider::new(vec!["k0", "k1", "k2", "k3"]));
        let pool = Arc::new(CredentialPool::new(keys(5), fast_policy()));
        let remote = classifier(provider.clone(), pool.clone(), UsageBudget::default());

        let verdict = remote.classify("30f", ChannelKind::Ordinary).await;
        assert_eq!(verdict.classification, Classification::Adult);
        assert_eq!(provider.calls(), vec!["k0", "k1", "k2", "k3", "k4"]);
        assert_eq!(pool.cursor().await, 4);

        remote.classify("30f", ChannelKind::Ordinary).await;
        assert_eq!(provider.calls().last().map(String::as_str), Some("k4"));
        assert_eq!(provider.calls().len(), 6);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_uncertain() {
        let provider = Arc::new(ScriptedProvider::new(vec!["k0", "k1"]));
        let pool = Arc::new(CredentialPool::new(keys(2), fast_policy()));
        let remote = classifier(provider.clone(), pool, UsageBudget::default());

        let verdict = remote.classify("hello", ChannelKind::Ordinary).await;
        assert_eq!(verdict.classification, Classification::Uncertain);
        assert_eq!(verdict.reason_code, REASON_REMOTE_UNAVAILABLE);
        assert_eq!(provider.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_pool_in_cooldown_is_reset_and_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let pool = Arc::new(CredentialPool::new(keys(1), fast_policy()));
        let auth = ProviderError::Auth("revoked".to_string());
        pool.record_failure(0, &auth, Instant::now()).await;

        let remote = classifier(provider.clone(), pool, UsageBudget::default());
        let verdict = remote.classify("30f", ChannelKind::Ordinary).await;

        assert_eq!(verdict.classification, Classification::Adult);
        assert_eq!(provider.calls(), vec!["k0"]);
    }

    #[tokio::test]
    async fn test_malformed_reply_counts_as_failure() {
        let mut scripted = ScriptedProvider::new(vec![]);
        scripted.reply = "Sure! The user is probably fine.";
        let provider = Arc::new(scripted);
        let pool = Arc::new(CredentialPool::new(keys(2), fast_policy()));
        let remote = classifier(provider.clone(), pool.clone(), UsageBudget::default());

        let verdict = remote.classify("hey", ChannelKind::Ordinary).await;
        assert_eq!(verdict.reason_code, REASON_REMOTE_UNAVAILABLE);
        assert_eq!(provider.calls().len(), 4);
        assert_eq!(pool.health(Instant::now()).await.total_failures, 4);
    }

    #[tokio::test]
    async fn test_empty_pool_never_calls_out() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let pool = Arc::new(CredentialPool::new(Vec::new(), fast_policy()));
        let remote = classifier(provider.clone(), pool, UsageBudget::default());

        let verdict = remote.classify("dms open", ChannelKind::Ordinary).await;
        assert_eq!(verdict.reason_code, REASON_REMOTE_UNCONFIGURED);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_usage_limit_switches_to_offline() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let pool = Arc::new(CredentialPool::new(keys(1), fast_policy()));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let remote = classifier(
            provider.clone(),
            pool,
            UsageBudget {
                warning: None,
                limit: Some(1),
            },
        )
        .with_usage_alerts(tx);

        let first = remote.classify("30f", ChannelKind::Ordinary).await;
        assert_eq!(first.classification, Classification::Adult);
        assert_eq!(rx.try_recv().ok(), Some(UsageEvent::LimitReached { requests: 1 }));

        let second = remote.classify("30f", ChannelKind::Ordinary).await;
        assert_eq!(second.reason_code, REASON_REMOTE_LIMIT);
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_quota_on_every_credential_stops_remote() {
        let mut scripted = ScriptedProvider::new(vec!["k0", "k1"]);
        scripted.error = || ProviderError::RateLimited {
            quota_exhausted: true,
            message: "monthly quota".to_string(),
        };
        let provider = Arc::new(scripted);
        let pool = Arc::new(CredentialPool::new(keys(2), fast_policy()));
        let usage = Arc::new(UsageTracker::new(UsageBudget::default()));
        let remote = RemoteClassifier::new(provider.clone(), AiConfig::default(), pool, usage.clone());

        let verdict = remote.classify("hey", ChannelKind::Ordinary).await;
        assert_eq!(verdict.reason_code, REASON_REMOTE_UNAVAILABLE);
        assert_eq!(provider.calls().len(), 2);
        assert!(usage.is_exhausted());
    }

    #[tokio::test]
    async fn test_limit_reached_mid_call_stops_retries() {
        let provider = Arc::new(ScriptedProvider::new(vec!["k0", "k1"]));
        let pool = Arc::new(CredentialPool::new(keys(2), fast_policy()));
        let usage = Arc::new(UsageTracker::new(UsageBudget {
            warning: None,
            limit: Some(1),
        }));
        let remote = RemoteClassifier::new(provider.clone(), AiConfig::default(), pool, usage.clone());

        let verdict = remote.classify("hey", ChannelKind::Ordinary).await;
        assert_eq!(verdict.reason_code, REASON_REMOTE_UNAVAILABLE);
        assert_eq!(provider.calls().len(), 1);
        assert_eq!(usage.snapshot().requests, 1);
        assert!(usage.is_exhausted());
    }

    #[tokio::test]
    async fn test_hung_transport_times_out_each_attempt() {
        let pool = Arc::new(CredentialPool::new(keys(2), fast_policy()));
        let remote = RemoteClassifier::new(
            HangingProvider,
            AiConfig::default(),
            pool.clone(),
            Arc::new(UsageTracker::new(UsageBudget::default())),
        )
        .with_call_timeout(Duration::from_millis(20));

        let verdict = remote.classify("hey", ChannelKind::Ordinary).await;
        assert_eq!(verdict.classification, Classification::Uncertain);
        assert_eq!(verdict.reason_code, REASON_REMOTE_UNAVAILABLE);

        let health = pool.health(Instant::now()).await;
        assert_eq!(health.total_failures, 4);
        assert_eq!(health.total_successes, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_share_pool_bookkeeping() {
        let provider = Arc::new(ScriptedProvider::new(vec!["k0", "k1", "k2"]));
        let pool = Arc::new(CredentialPool::new(keys(3), fast_policy()));
        let remote = Arc::new(classifier(provider.clone(), pool.clone(), UsageBudget::default()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let remote = Arc::clone(&remote);
                tokio::spawn(async move { remote.classify("hey", ChannelKind::Ordinary).await })
            })
            .collect();
        for handle in handles {
            let verdict = handle.await.unwrap();
            assert_eq!(verdict.reason_code, REASON_REMOTE_UNAVAILABLE);
        }

        let calls = provider.calls().len();
        assert!(calls > 0 && calls <= 8 * pool.max_attempts());
        let health = pool.health(Instant::now()).await;
        assert_eq!(health.total_failures, calls as u64);
        assert_eq!(health.total_successes, 0);
    }
}
