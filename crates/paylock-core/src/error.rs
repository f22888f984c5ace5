use crate::types::{JobId, MilestoneStatus, PartyId};
use thiserror::Error;

/// Paylock ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no current record for job {0}")]
    NotFound(JobId),

    #[error("store returned {count} current versions for job {job_id}")]
    AmbiguousState { job_id: JobId, count: usize },

    #[error("party '{party}' is not authorized to {action}")]
    Unauthorized { party: PartyId, action: String },

    #[error("milestone index {index} out of range for {len} milestones")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("milestone {index} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        index: usize,
        from: MilestoneStatus,
        to: MilestoneStatus,
    },

    #[error("transition validation failed: {0}")]
    ValidationFailed(String),

    #[error("predecessor version already consumed by another transition")]
    Conflict,

    #[error("commit failed: {0}")]
    CommitFailure(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    pub fn stage_violation(expected: &str, actual: &str) -> Self {
        Self::InvariantViolation(format!(
            "stage order violation: expected '{}', got '{}'",
            expected, actual
        ))
    }

    pub fn unauthorized(party: &PartyId, action: impl Into<String>) -> Self {
        Self::Unauthorized {
            party: party.clone(),
            action: action.into(),
        }
    }

    /// True only for outcomes a caller may retry by re-reading current state
    /// and rebuilding the transition.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}
