// Usage tracker - counts remote requests against a budget.
//
// Once the hard limit is reached the remote classifier stops calling out and
// the bot runs on patterns alone until restart.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Request thresholds. `None` disables the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageBudget {
    pub warning: Option<u64>,
    pub limit: Option<u64>,
}

/// Threshold crossings, each reported exactly once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageEvent {
    WarningReached { requests: u64, limit: Option<u64> },
    LimitReached { requests: u64 },
    /// Every credential reported an exhausted quota.
    QuotaExhausted { requests: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub requests: u64,
    pub budget_warning: Option<u64>,
    pub budget_limit: Option<u64>,
    pub exhausted: bool,
}

impl UsageSnapshot {
    pub fn remaining(&self) -> Option<u64> {
        self.budget_limit
            .map(|limit| limit.saturating_sub(self.requests))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.budget_warning, Some(w) if self.requests >= w)
    }
}

#[derive(Debug, Default)]
pub struct UsageTracker {
    budget: UsageBudget,
    requests: AtomicU64,
    warning_sent: AtomicBool,
    exhausted: AtomicBool,
}

impl UsageTracker {
    pub fn new(budget: UsageBudget) -> Self {
        Self {
            budget,
            ..Default::default()
        }
    }

    /// Count one outgoing request and report a threshold crossing, if any.
    pub fn record_request(&self) -> Option<UsageEvent> {
        let requests = self.requests.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(limit) = self.budget.limit {
            if requests >= limit && !self.exhausted.swap(true, Ordering::SeqCst) {
                return Some(UsageEvent::LimitReached { requests });
            }
        }

        if let Some(warning) = self.budget.warning {
            if requests >= warning && !self.warning_sent.swap(true, Ordering::SeqCst) {
                return Some(UsageEvent::WarningReached {
                    requests,
                    limit: self.budget.limit,
                });
            }
        }

        None
    }

    /// Stop remote classification. Returns the event only the first time.
    pub fn mark_exhausted(&self) -> Option<UsageEvent> {
        if self.exhausted.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(UsageEvent::QuotaExhausted {
                requests: self.requests.load(Ordering::SeqCst),
            })
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            requests: self.requests.load(Ordering::SeqCst),
            budget_warning: self.budget.warning,
            budget_limit: self.budget.limit,
            exhausted: self.is_exhausted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_fire_once() {
        let tracker = UsageTracker::new(UsageBudget {
            warning: Some(2),
            limit: Some(4),
        });

        assert_eq!(tracker.record_request(), None);
        assert_eq!(
            tracker.record_request(),
            Some(UsageEvent::WarningReached {
                requests: 2,
                limit: Some(4)
            })
        );
        assert_eq!(tracker.record_request(), None);
        assert!(!tracker.is_exhausted());
        assert_eq!(
            tracker.record_request(),
            Some(UsageEvent::LimitReached { requests: 4 })
        );
        assert!(tracker.is_exhausted());
        assert_eq!(tracker.record_request(), None);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.requests, 5);
        assert_eq!(snapshot.remaining(), Some(0));
        assert!(snapshot.is_warning());
    }

    #[test]
    fn test_unlimited_budget() {
        let tracker = UsageTracker::new(UsageBudget::default());
        for _ in 0..100 {
            assert_eq!(tracker.record_request(), None);
        }
        assert!(!tracker.is_exhausted());
        assert_eq!(tracker.snapshot().remaining(), None);
    }

    #[test]
    fn test_mark_exhausted_reports_once() {
        let tracker = UsageTracker::new(UsageBudget::default());
        tracker.record_request();

        assert_eq!(
            tracker.mark_exhausted(),
            Some(UsageEvent::QuotaExhausted { requests: 1 })
        );
        assert_eq!(tracker.mark_exhausted(), None);
        assert!(tracker.is_exhausted());
    }
}
