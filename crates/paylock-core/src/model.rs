//! Pure milestone advancement rules.
//!
//! Everything here is deterministic and side-effect free: no clocks, no id
//! generation, no storage. The same record and index always yield the same
//! successor, which is what lets the validator re-derive and compare.

use crate::error::LedgerError;
use crate::types::{JobRecord, Milestone, MilestoneStatus};

const BPS_SCALE: u128 = 10_000;

/// Outcome of advancing one milestone: the full successor record plus the
/// updated milestone snapshot and the signed change to cumulative net value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneAdvance {
    pub successor: JobRecord,
    pub milestone: Milestone,
    pub net_delta_minor: i64,
}

/// Advance the milestone at `index` from started to completed.
///
/// The completed milestone requests the record's current gross cumulative
/// amount; its net payment deducts retention as a percentage of the requested
/// amount; the record-level net cumulative value drops by the gross amount.
/// All arithmetic is exact integer math over minor units.
pub fn advance_milestone(record: &JobRecord, index: usize) -> Result<MilestoneAdvance, LedgerError> {
    let current = record
        .milestones
        .get(index)
        .ok_or(LedgerError::IndexOutOfRange {
            index,
            len: record.milestones.len(),
        })?;

    let target = MilestoneStatus::Completed;
    if !MilestoneStatus::may_follow(current.status, target) {
        return Err(LedgerError::InvalidStatusTransition {
            index,
            from: current.status,
            to: target,
        });
    }

    let requested_amount_minor = record.gross_cumulative_minor;
    let net_payment_minor = net_after_retention(requested_amount_minor, record.retention_bps)?;

    let gross_delta = i64::try_from(record.gross_cumulative_minor).map_err(|_| {
        LedgerError::InvariantViolation("gross cumulative amount exceeds i64 range".to_string())
    })?;
    let net_cumulative_minor = record
        .net_cumulative_minor
        .checked_sub(gross_delta)
        .ok_or_else(|| {
            LedgerError::InvariantViolation("net cumulative value underflow".to_string())
        })?;

    let milestone = Milestone {
        status: target,
        requested_amount_minor,
        net_payment_minor,
    };

    let mut milestones = record.milestones.clone();
    milestones[index] = milestone.clone();

    let successor = JobRecord {
        milestones,
        net_cumulative_minor,
        ..record.clone()
    };

    Ok(MilestoneAdvance {
        successor,
        milestone,
        net_delta_minor: -gross_delta,
    })
}

/// `amount * (10_000 - retention_bps) / 10_000`, carried out in u128 so the
/// product cannot overflow.
fn net_after_retention(amount_minor: u64, retention_bps: u16) -> Result<u64, LedgerError> {
    if u128::from(retention_bps) > BPS_SCALE {
        return Err(LedgerError::InvariantViolation(format!(
            "retention {retention_bps} bps exceeds 100%"
        )));
    }
    let kept = BPS_SCALE - u128::from(retention_bps);
    let net = u128::from(amount_minor) * kept / BPS_SCALE;
    u64::try_from(net)
        .map_err(|_| LedgerError::InvariantViolation("net payment exceeds u64 range".to_string()))
}
