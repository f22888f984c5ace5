use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable logical identity of a job, shared by every version of its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque party identity (employer or contractor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milestone lifecycle statuses.
///
/// The set is closed and transitions are one-directional; legality lives in
/// [`MilestoneStatus::may_follow`] so the validator's check is a table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Unstarted,
    Started,
    Completed,
    Paid,
}

impl MilestoneStatus {
    /// Allowed-predecessor -> allowed-successor table.
    pub fn may_follow(prev: Self, next: Self) -> bool {
        matches!(
            (prev, next),
            (Self::Unstarted, Self::Started)
                | (Self::Started, Self::Completed)
                | (Self::Completed, Self::Paid)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One unit of deliverable work within a job record.
///
/// Position is the milestone's index in the record's sequence and is stable
/// for the record's lifetime. Amounts are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub status: MilestoneStatus,
    pub requested_amount_minor: u64,
    pub net_payment_minor: u64,
}

impl Milestone {
    pub fn unstarted() -> Self {
        Self {
            status: MilestoneStatus::Unstarted,
            requested_amount_minor: 0,
            net_payment_minor: 0,
        }
    }

    pub fn started() -> Self {
        Self {
            status: MilestoneStatus::Started,
            requested_amount_minor: 0,
            net_payment_minor: 0,
        }
    }
}

/// One version of a job's commercial state.
///
/// Records are never mutated in place: every change produces a brand-new
/// version through a transition, and the prior version is permanently
/// superseded. Identity (`job_id`) never changes across versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub employer: PartyId,
    pub contractor: PartyId,
    /// Fraction withheld from each milestone payment, in basis points.
    pub retention_bps: u16,
    pub milestones: Vec<Milestone>,
    /// Cumulative gross value requested so far, minor units.
    pub gross_cumulative_minor: u64,
    /// Cumulative net value remaining, minor units. Signed: the source
    /// arithmetic can legitimately drive this below zero.
    pub net_cumulative_minor: i64,
}

/// Reference to one stored version of a job record.
///
/// `record_hash` anchors the referenced version so a transition built against
/// a doctored copy of the predecessor cannot finalize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub version_id: Uuid,
    pub record_hash: String,
    pub record: JobRecord,
}

impl RecordRef {
    pub fn new(record: JobRecord) -> Result<Self, LedgerError> {
        let record_hash = record_hash(&record)?;
        Ok(Self {
            version_id: Uuid::new_v4(),
            record_hash,
            record,
        })
    }
}

/// Intent tag identifying which command a transition carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionIntent {
    FinishMilestone { milestone_index: usize },
}

impl TransitionIntent {
    pub fn describe(&self) -> String {
        match self {
            Self::FinishMilestone { milestone_index } => {
                format!("finish milestone at index {milestone_index}")
            }
        }
    }
}

/// Atomic proposed change from exactly one record version to exactly one
/// successor version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub input: RecordRef,
    pub output: JobRecord,
    pub intent: TransitionIntent,
    pub required_signer: PartyId,
}

/// Opaque authorization token attached to a transition by the signing
/// capability. The core only ever checks who the required signer is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationToken {
    pub key_id: String,
    pub nonce: String,
    pub signed_at: DateTime<Utc>,
    pub signature: String,
}

/// A transition plus the authorization token submitted for finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransition {
    pub transition: Transition,
    pub authorization: AuthorizationToken,
}

/// Canonical blake3 hex digest of a job record.
pub fn record_hash(record: &JobRecord) -> Result<String, LedgerError> {
    let bytes =
        serde_json::to_vec(record).map_err(|e| LedgerError::Serialization(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
