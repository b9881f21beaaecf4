// Case log - suspected-minor cases waiting for a moderator.
//
// Cases live in memory only: a restart drops open cases, and the Discord
// embed is left without working buttons. The case id is the id of the
// deleted message, which is unique per guild.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;

// Cap how many cases we keep so an unattended queue cannot grow unbounded.
const MAX_TRACKED_CASES: usize = 2_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaseError {
    #[error("Case {0} not found")]
    NotFound(u64),

    #[error("Case {case_id} was already resolved ({status})")]
    AlreadyResolved { case_id: u64, status: CaseStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    Open,
    Banned { moderator_id: u64 },
    Ignored { moderator_id: u64 },
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseStatus::Open => write!(f, "open"),
            CaseStatus::Banned { .. } => write!(f, "banned"),
            CaseStatus::Ignored { .. } => write!(f, "ignored"),
        }
    }
}

/// What a moderator chose to do with a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseAction {
    Ban,
    Ignore,
}

/// Everything needed to open a case.
#[derive(Debug, Clone)]
pub struct NewCase {
    pub message_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub user_id: u64,
    pub user_name: String,
    pub content: String,
    pub apparent_age: Option<u8>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct MinorCase {
    pub case_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub user_id: u64,
    pub user_name: String,
    pub content: String,
    pub apparent_age: Option<u8>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub status: CaseStatus,
}

#[derive(Default)]
pub struct CaseLog {
    cases: DashMap<u64, MinorCase>,
}

impl CaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, new_case: NewCase) -> MinorCase {
        let case = MinorCase {
            case_id: new_case.message_id,
            guild_id: new_case.guild_id,
            channel_id: new_case.channel_id,
            user_id: new_case.user_id,
            user_name: new_case.user_name,
            content: new_case.content,
            apparent_age: new_case.apparent_age,
            reason: new_case.reason,
            created_at: Utc::now(),
            status: CaseStatus::Open,
        };
        self.cases.insert(case.case_id, case.clone());
        self.evict_oldest();
        case
    }

    #[cfg(test)]
    pub fn get(&self, case_id: u64) -> Option<MinorCase> {
        self.cases.get(&case_id).map(|c| c.clone())
    }

    /// Close an open case. The record stays so a second click reports who
    /// already handled it.
    pub fn resolve(
        &self,
        case_id: u64,
        action: CaseAction,
        moderator_id: u64,
    ) -> Result<MinorCase, CaseError> {
        let mut case = self
            .cases
            .get_mut(&case_id)
            .ok_or(CaseError::NotFound(case_id))?;

        if case.status != CaseStatus::Open {
            return Err(CaseError::AlreadyResolved {
                case_id,
                status: case.status,
            });
        }

        case.status = match action {
            CaseAction::Ban => CaseStatus::Banned { moderator_id },
            CaseAction::Ignore => CaseStatus::Ignored { moderator_id },
        };
        Ok(case.clone())
    }

    /// Put a case back to open, used when the ban itself failed.
    pub fn reopen(&self, case_id: u64) {
        if let Some(mut case) = self.cases.get_mut(&case_id) {
            case.status = CaseStatus::Open;
        }
    }

    pub fn open_count(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.status == CaseStatus::Open)
            .count()
    }

    fn evict_oldest(&self) {
        if self.cases.len() <= MAX_TRACKED_CASES {
            return;
        }
        let oldest = self
            .cases
            .iter()
            .min_by_key(|c| c.created_at)
            .map(|c| c.case_id);
        if let Some(case_id) = oldest {
            self.cases.remove(&case_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_case(message_id: u64) -> NewCase {
        NewCase {
            message_id,
            guild_id: 1,
            channel_id: 2,
            user_id: 3,
            user_name: "someone".to_string(),
            content: "16m here".to_string(),
            apparent_age: Some(16),
            reason: "direct-minor-age".to_string(),
        }
    }

    #[test]
    fn test_open_and_resolve() {
        let log = CaseLog::new();
        let case = log.open(new_case(10));
        assert_eq!(case.case_id, 10);
        assert_eq!(log.open_count(), 1);

        let resolved = log.resolve(10, CaseAction::Ban, 99).unwrap();
        assert_eq!(resolved.status, CaseStatus::Banned { moderator_id: 99 });
        assert_eq!(log.open_count(), 0);
    }

    #[test]
    fn test_resolve_twice_is_rejected() {
        let log = CaseLog::new();
        log.open(new_case(10));
        log.resolve(10, CaseAction::Ignore, 5).unwrap();

        assert_eq!(
            log.resolve(10, CaseAction::Ban, 6).unwrap_err(),
            CaseError::AlreadyResolved {
                case_id: 10,
                status: CaseStatus::Ignored { moderator_id: 5 },
            }
        );
    }

    #[test]
    fn test_unknown_case() {
        let log = CaseLog::new();
        assert_eq!(
            log.resolve(42, CaseAction::Ban, 1).unwrap_err(),
            CaseError::NotFound(42)
        );
    }

    #[test]
    fn test_reopen_after_failed_ban() {
        let log = CaseLog::new();
        log.open(new_case(10));
        log.resolve(10, CaseAction::Ban, 1).unwrap();
        log.reopen(10);

        assert_eq!(log.get(10).map(|c| c.status), Some(CaseStatus::Open));
    }
}
