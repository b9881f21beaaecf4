// Age check service - the moderation decision engine.
//
// This service handles:
// - Attachment gating for media-only channels
// - Offline pattern classification
// - Escalation to the remote classifier when patterns are inconclusive
//
// It never fails: every error path ends in "delete, do not flag".
// NO Discord dependencies here - just pure domain logic.

use super::age_check_models::{
    ChannelKind, Classification, Confidence, DetectionStrategy, DetectionVerdict,
    ModerationDecision, ModerationMessage,
};
use super::heuristic::classify_heuristically;
use async_trait::async_trait;
use thiserror::Error;

pub const REASON_MISSING_ATTACHMENT: &str = "missing-attachment";
pub const REASON_NO_ADULT_AGE: &str = "no-adult-age-confirmed";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AgeCheckError {
    #[error("Remote classifier error: {0}")]
    Remote(String),
}

// ============================================================================
// REMOTE CLASSIFIER TRAIT (PORT)
// ============================================================================

/// Fallback classifier consulted when the patterns are inconclusive.
#[async_trait]
pub trait RemoteAgeClassifier: Send + Sync {
    async fn classify_remotely(
        &self,
        text: &str,
        channel_kind: ChannelKind,
    ) -> Result<DetectionVerdict, AgeCheckError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct AgeCheckService<R: RemoteAgeClassifier> {
    strategy: DetectionStrategy,
    remote: R,
}

impl<R: RemoteAgeClassifier> AgeCheckService<R> {
    pub fn new(strategy: DetectionStrategy, remote: R) -> Self {
        Self { strategy, remote }
    }

    pub fn strategy(&self) -> DetectionStrategy {
        self.strategy
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Decide what happens to one message.
    pub async fn decide(&self, message: &ModerationMessage) -> ModerationDecision {
        if message.channel_kind == ChannelKind::AttachmentRequired
            && !message.has_qualifying_attachment
        {
            return ModerationDecision::Delete {
                confidence: Confidence::High,
                reason: REASON_MISSING_ATTACHMENT.to_string(),
            };
        }

        if self.strategy != DetectionStrategy::RemoteOnly {
            let verdict = classify_heuristically(&message.text);
            match verdict.classification {
                Classification::Minor => return flag(verdict),
                Classification::Adult => return allow(verdict),
                Classification::NoAgeStated => return delete_unconfirmed(),
                Classification::Uncertain => {}
            }

            if self.strategy == DetectionStrategy::HeuristicOnly {
                return delete_unconfirmed();
            }
        }

        let verdict = match self
            .remote
            .classify_remotely(&message.text, message.channel_kind)
            .await
        {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::warn!("Remote age check failed: {}", err);
                return delete_unconfirmed();
            }
        };

        match (verdict.classification, verdict.confidence) {
            (Classification::Minor, Confidence::High) => flag(verdict),
            (Classification::Adult, _) => allow(verdict),
            _ => delete_unconfirmed(),
        }
    }
}

fn flag(verdict: DetectionVerdict) -> ModerationDecision {
    ModerationDecision::DeleteAndFlag {
        apparent_age: verdict.apparent_age,
        reason: verdict.reason_code,
    }
}

fn allow(verdict: DetectionVerdict) -> ModerationDecision {
    ModerationDecision::Allow {
        confidence: Confidence::High,
        reason: verdict.reason_code,
    }
}

/// No confirmed 18+ declaration: remove it, but keep it out of the review queue.
fn delete_unconfirmed() -> ModerationDecision {
    ModerationDecision::Delete {
        confidence: Confidence::Low,
        reason: REASON_NO_ADULT_AGE.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
