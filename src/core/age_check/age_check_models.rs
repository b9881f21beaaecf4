// Age check domain models - data structures for the age-gate pipeline.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts gateway messages into `ModerationMessage`
// and turns a `ModerationDecision` back into Discord actions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of channel a message was posted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Regular channel - only the age declaration is checked.
    Ordinary,
    /// Channel where every post must carry an image or video.
    AttachmentRequired,
}

/// Immutable view of one inbound message, alive for one decision cycle.
#[derive(Debug, Clone)]
pub struct ModerationMessage {
    pub text: String,
    pub has_qualifying_attachment: bool,
    pub channel_kind: ChannelKind,
}

/// What a classifier concluded about the author's declared age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Adult,
    Minor,
    NoAgeStated,
    Uncertain,
}

/// How sure a classifier (or the engine) is about its conclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// Result of one classifier run. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionVerdict {
    pub classification: Classification,
    pub apparent_age: Option<u8>,
    pub confidence: Confidence,
    pub reason_code: String,
}

impl DetectionVerdict {
    pub fn adult(age: Option<u8>, reason_code: impl Into<String>) -> Self {
        Self {
            classification: Classification::Adult,
            apparent_age: age,
            confidence: Confidence::High,
            reason_code: reason_code.into(),
        }
    }

    pub fn minor(age: Option<u8>, reason_code: impl Into<String>) -> Self {
        Self {
            classification: Classification::Minor,
            apparent_age: age,
            confidence: Confidence::High,
            reason_code: reason_code.into(),
        }
    }

    pub fn no_age_stated() -> Self {
        Self {
            classification: Classification::NoAgeStated,
            apparent_age: None,
            confidence: Confidence::Low,
            reason_code: "no-age-stated".to_string(),
        }
    }

    pub fn uncertain(reason_code: impl Into<String>) -> Self {
        Self {
            classification: Classification::Uncertain,
            apparent_age: None,
            confidence: Confidence::Low,
            reason_code: reason_code.into(),
        }
    }

    /// Override the confidence (used for remote verdicts).
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Which classifiers the decision engine consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStrategy {
    /// Patterns only; an inconclusive message is deleted without a remote call.
    HeuristicOnly,
    /// Skip the patterns and always ask the remote classifier.
    RemoteOnly,
    /// Patterns first, remote classifier only when they are inconclusive.
    Hybrid,
}

impl std::str::FromStr for DetectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" | "heuristic-only" | "regex" => Ok(DetectionStrategy::HeuristicOnly),
            "remote" | "remote-only" | "ai" => Ok(DetectionStrategy::RemoteOnly),
            "hybrid" => Ok(DetectionStrategy::Hybrid),
            other => Err(format!("unknown detection strategy '{}'", other)),
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionStrategy::HeuristicOnly => write!(f, "heuristic"),
            DetectionStrategy::RemoteOnly => write!(f, "remote"),
            DetectionStrategy::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Final outcome for one message.
///
/// A confirmed minor is always a deletion, so "allowed but flagged" has no
/// variant to live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationDecision {
    /// Keep the message.
    Allow { confidence: Confidence, reason: String },
    /// Remove the message, no moderation case.
    Delete { confidence: Confidence, reason: String },
    /// Remove the message and open a reviewable case.
    DeleteAndFlag {
        apparent_age: Option<u8>,
        reason: String,
    },
}

impl ModerationDecision {
    pub fn should_delete(&self) -> bool {
        !matches!(self, ModerationDecision::Allow { .. })
    }

    pub fn is_confirmed_minor(&self) -> bool {
        matches!(self, ModerationDecision::DeleteAndFlag { .. })
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            ModerationDecision::Allow { confidence, .. }
            | ModerationDecision::Delete { confidence, .. } => *confidence,
            ModerationDecision::DeleteAndFlag { .. } => Confidence::High,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            ModerationDecision::Allow { reason, .. }
            | ModerationDecision::Delete { reason, .. }
            | ModerationDecision::DeleteAndFlag { reason, .. } => reason,
        }
    }

    pub fn apparent_age(&self) -> Option<u8> {
        match self {
            ModerationDecision::DeleteAndFlag { apparent_age, .. } => *apparent_age,
            _ => None,
        }
    }
}

impl fmt::Display for ModerationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModerationDecision::Allow { .. } => write!(f, "allow"),
            ModerationDecision::Delete { .. } => write!(f, "delete"),
            ModerationDecision::DeleteAndFlag { .. } => write!(f, "delete+flag"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flagged_decision_always_deletes() {
        let decision = ModerationDecision::DeleteAndFlag {
            apparent_age: Some(16),
            reason: "direct-minor-age".to_string(),
        };

        assert!(decision.should_delete());
        assert!(decision.is_confirmed_minor());
        assert_eq!(decision.confidence(), Confidence::High);
        assert_eq!(decision.apparent_age(), Some(16));
    }

    #[test]
    fn test_allow_is_never_flagged() {
        let decision = ModerationDecision::Allow {
            confidence: Confidence::High,
            reason: "adult-age".to_string(),
        };

        assert!(!decision.should_delete());
        assert!(!decision.is_confirmed_minor());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "hybrid".parse::<DetectionStrategy>().unwrap(),
            DetectionStrategy::Hybrid
        );
        assert_eq!(
            " Regex ".parse::<DetectionStrategy>().unwrap(),
            DetectionStrategy::HeuristicOnly
        );
        assert_eq!(
            "remote-only".parse::<DetectionStrategy>().unwrap(),
            DetectionStrategy::RemoteOnly
        );
        assert!("sometimes".parse::<DetectionStrategy>().is_err());
    }
}
