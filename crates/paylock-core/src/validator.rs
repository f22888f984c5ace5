//! Independent transition verification.
//!
//! The validator never trusts the proposed successor: it re-derives the
//! successor from the predecessor and the intent tag, then demands structural
//! equality. A forged or stale output fails here, before anything reaches the
//! commit authority.

use crate::error::LedgerError;
use crate::model::advance_milestone;
use crate::types::{record_hash, Transition, TransitionIntent};

/// Structural bounds a transition must respect regardless of intent.
#[derive(Debug, Clone)]
pub struct ValidationLimits {
    /// Upper bound on milestones per record, guarding against malformed input.
    pub max_milestones: usize,
    /// Upper bound on retention, in basis points.
    pub max_retention_bps: u16,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_milestones: 64,
            max_retention_bps: 10_000,
        }
    }
}

/// Validate a candidate transition against structural and business rules.
///
/// Any mismatch aborts the whole operation; nothing is partially applied.
pub fn validate(transition: &Transition, limits: &ValidationLimits) -> Result<(), LedgerError> {
    let input = &transition.input.record;

    if input.milestones.len() > limits.max_milestones {
        return Err(LedgerError::ValidationFailed(format!(
            "record carries {} milestones, limit is {}",
            input.milestones.len(),
            limits.max_milestones
        )));
    }
    if input.retention_bps > limits.max_retention_bps {
        return Err(LedgerError::ValidationFailed(format!(
            "retention {} bps exceeds limit {}",
            input.retention_bps, limits.max_retention_bps
        )));
    }

    // The input reference must still describe the record it claims to.
    let input_hash = record_hash(input)?;
    if input_hash != transition.input.record_hash {
        return Err(LedgerError::ValidationFailed(
            "input reference hash does not match its record".to_string(),
        ));
    }

    // Identity is stable across versions.
    if transition.output.job_id != input.job_id {
        return Err(LedgerError::ValidationFailed(
            "transition changes the logical job identity".to_string(),
        ));
    }

    match transition.intent {
        TransitionIntent::FinishMilestone { milestone_index } => {
            // Authorization rule for this intent kind: the contractor signs.
            if transition.required_signer != input.contractor {
                return Err(LedgerError::ValidationFailed(format!(
                    "finish-milestone must be signed by contractor '{}', got '{}'",
                    input.contractor, transition.required_signer
                )));
            }

            let derived = advance_milestone(input, milestone_index)
                .map_err(|e| LedgerError::ValidationFailed(e.to_string()))?;
            if derived.successor != transition.output {
                return Err(LedgerError::ValidationFailed(
                    "proposed successor does not match re-derivation from predecessor".to_string(),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_finish_milestone;
    use crate::types::{JobId, JobRecord, Milestone, PartyId, RecordRef};

    fn current_ref() -> RecordRef {
        RecordRef::new(JobRecord {
            job_id: JobId::new(),
            employer: PartyId::new("employer-a"),
            contractor: PartyId::new("contractor-a"),
            retention_bps: 1_000,
            milestones: vec![Milestone::started()],
            gross_cumulative_minor: 1_000,
            net_cumulative_minor: 1_000,
        })
        .unwrap()
    }

    fn valid_transition() -> Transition {
        build_finish_milestone(current_ref(), &PartyId::new("contractor-a"), 0).unwrap()
    }

    #[test]
    fn accepts_honestly_built_transition() {
        validate(&valid_transition(), &ValidationLimits::default()).unwrap();
    }

    #[test]
    fn rejects_forged_successor() {
        let mut transition = valid_transition();
        transition.output.milestones[0].net_payment_minor += 1;

        let err = validate(&transition, &ValidationLimits::default()).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationFailed(_)));
    }

    #[test]
    fn rejects_identity_swap() {
        let mut transition = valid_transition();
        transition.output.job_id = JobId::new();

        let err = validate(&transition, &ValidationLimits::default()).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationFailed(_)));
    }

    #[test]
    fn rejects_wrong_required_signer() {
        let mut transition = valid_transition();
        transition.required_signer = PartyId::new("employer-a");

        let err = validate(&transition, &ValidationLimits::default()).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationFailed(_)));
    }

    #[test]
    fn rejects_tampered_input_reference() {
        let mut transition = valid_transition();
        transition.input.record.gross_cumulative_minor += 1;

        let err = validate(&transition, &ValidationLimits::default()).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationFailed(_)));
    }

    #[test]
    fn enforces_structural_limits() {
        let limits = ValidationLimits {
            max_milestones: 0,
            ..ValidationLimits::default()
        };
        let err = validate(&valid_transition(), &limits).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationFailed(_)));
    }
}
