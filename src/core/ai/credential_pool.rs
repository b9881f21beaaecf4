// Credential pool - rotating API keys that survive per-key rate limits.
//
// Selection is sticky round-robin: every call starts at the credential that
// last succeeded and only moves on when it fails. Credentials are never
// removed; a key that keeps failing sits out a cooldown and comes back.
//
// All read-modify-write goes through one async mutex. The lock is never held
// across the remote call itself.

use super::models::ProviderError;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Tunables for rotation, cooldown and retry pacing.
#[derive(Debug, Clone)]
pub struct PoolPolicy {
    /// Consecutive failures before a credential is put in cooldown.
    pub failure_threshold: u32,
    /// How long a cooled-down credential is skipped.
    pub cooldown: Duration,
    /// Pause between two attempts of the same call.
    pub backoff: Duration,
    /// Attempts per call = this × pool size.
    pub attempts_per_credential: usize,
}

impl Default for PoolPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(5 * 60),
            backoff: Duration::from_millis(300),
            attempts_per_credential: 2,
        }
    }
}

#[derive(Debug)]
struct CredentialState {
    key: String,
    consecutive_failures: u32,
    cooldown_until: Option<Instant>,
    total_successes: u64,
    total_failures: u64,
}

impl CredentialState {
    fn is_cooling_down(&self, now: Instant) -> bool {
        matches!(self.cooldown_until, Some(until) if until > now)
    }
}

#[derive(Debug)]
struct PoolState {
    credentials: Vec<CredentialState>,
    /// Index the next call starts from (last success, or the one after the last failure).
    cursor: usize,
}

/// A credential handed out for one attempt.
#[derive(Debug, Clone)]
pub struct Lease {
    pub index: usize,
    pub key: String,
}

/// Outcome of asking the pool for a credential.
#[derive(Debug)]
pub enum Acquire {
    Ready(Lease),
    /// Every credential is in cooldown.
    AllCoolingDown,
    /// No credentials were configured.
    Empty,
}

/// What happened to a credential after a failure was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    pub consecutive_failures: u32,
    pub entered_cooldown: bool,
}

/// Snapshot of pool health for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolHealth {
    pub total: usize,
    pub available: usize,
    pub cooling_down: usize,
    pub total_successes: u64,
    pub total_failures: u64,
}

pub struct CredentialPool {
    state: Mutex<PoolState>,
    policy: PoolPolicy,
    size: usize,
}

impl CredentialPool {
    /// Build a pool from an ordered credential list. Blank entries are dropped.
    pub fn new(keys: Vec<String>, policy: PoolPolicy) -> Self {
        let credentials: Vec<CredentialState> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|key| CredentialState {
                key,
                consecutive_failures: 0,
                cooldown_until: None,
                total_successes: 0,
                total_failures: 0,
            })
            .collect();
        let size = credentials.len();

        Self {
            state: Mutex::new(PoolState {
                credentials,
                cursor: 0,
            }),
            policy,
            size,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn policy(&self) -> &PoolPolicy {
        &self.policy
    }

    /// Upper bound on attempts for one call.
    pub fn max_attempts(&self) -> usize {
        self.policy.attempts_per_credential * self.size
    }

    /// Hand out the first credential at or after the cursor that is not
    /// cooling down. Expired cooldowns are cleared on the way.
    pub async fn acquire(&self, now: Instant) -> Acquire {
        let mut state = self.state.lock().await;
        let len = state.credentials.len();
        if len == 0 {
            return Acquire::Empty;
        }

        let start = state.cursor % len;
        for offset in 0..len {
            let index = (start + offset) % len;
            let credential = &mut state.credentials[index];

            if credential.is_cooling_down(now) {
                continue;
            }
            credential.cooldown_until = None;

            return Acquire::Ready(Lease {
                index,
                key: credential.key.clone(),
            });
        }

        Acquire::AllCoolingDown
    }

    /// Clear every cooldown and failure counter. Used when the whole pool is
    /// cooling down so calls degrade instead of locking out.
    pub async fn reset_cooldowns(&self) {
        let mut state = self.state.lock().await;
        for credential in state.credentials.iter_mut() {
            credential.cooldown_until = None;
            credential.consecutive_failures = 0;
        }
    }

    pub async fn record_success(&self, index: usize) {
        let mut state = self.state.lock().await;
        if let Some(credential) = state.credentials.get_mut(index) {
            credential.consecutive_failures = 0;
            credential.cooldown_until = None;
            credential.total_successes += 1;
            state.cursor = index;
        }
    }

    /// Count a failure against a credential and advance the cursor past it.
    ///
    /// The credential enters cooldown after `failure_threshold` consecutive
    /// failures, or immediately when the key itself was rejected.
    pub async fn record_failure(
        &self,
        index: usize,
        error: &ProviderError,
        now: Instant,
    ) -> FailureOutcome {
        let threshold = self.policy.failure_threshold;
        let cooldown = self.policy.cooldown;

        let mut state = self.state.lock().await;
        let len = state.credentials.len();
        let Some(credential) = state.credentials.get_mut(index) else {
            return FailureOutcome {
                consecutive_failures: 0,
                entered_cooldown: false,
            };
        };

        credential.consecutive_failures += 1;
        credential.total_failures += 1;
        let consecutive_failures = credential.consecutive_failures;

        let entered_cooldown =
            consecutive_failures >= threshold || matches!(error, ProviderError::Auth(_));
        if entered_cooldown {
            credential.cooldown_until = Some(now + cooldown);
            credential.consecutive_failures = 0;
        }

        state.cursor = (index + 1) % len;

        FailureOutcome {
            consecutive_failures,
            entered_cooldown,
        }
    }

    pub async fn health(&self, now: Instant) -> PoolHealth {
        let state = self.state.lock().await;
        let cooling_down = state
            .credentials
            .iter()
            .filter(|c| c.is_cooling_down(now))
            .count();

        PoolHealth {
            total: state.credentials.len(),
            available: state.credentials.len() - cooling_down,
            cooling_down,
            total_successes: state.credentials.iter().map(|c| c.total_successes).sum(),
            total_failures: state.credentials.iter().map(|c| c.total_failures).sum(),
        }
    }

    /// Index the next call will start from.
    #[cfg(test)]
    pub async fn cursor(&self) -> usize {
        self.state.lock().await.cursor
    }
}
