//! Assembling candidate transitions.

use crate::error::LedgerError;
use crate::model::advance_milestone;
use crate::types::{PartyId, RecordRef, Transition, TransitionIntent};

/// Build a finish-milestone transition against the given current version.
///
/// Only the record's contractor may advance a milestone to completed; the
/// transition consumes exactly `current` and produces exactly one successor,
/// with the authorizer designated as the required signer.
pub fn build_finish_milestone(
    current: RecordRef,
    authorizer: &PartyId,
    milestone_index: usize,
) -> Result<Transition, LedgerError> {
    if &current.record.contractor != authorizer {
        return Err(LedgerError::unauthorized(
            authorizer,
            format!("finish milestone {milestone_index}"),
        ));
    }

    let advance = advance_milestone(&current.record, milestone_index)?;

    Ok(Transition {
        input: current,
        output: advance.successor,
        intent: TransitionIntent::FinishMilestone { milestone_index },
        required_signer: authorizer.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobId, JobRecord, Milestone, MilestoneStatus};

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

    #[test]
    fn contractor_builds_finish_transition() {
        let current = current_ref();
        let transition =
            build_finish_milestone(current.clone(), &PartyId::new("contractor-a"), 0).unwrap();

        assert_eq!(transition.input, current);
        assert_eq!(
            transition.intent,
            TransitionIntent::FinishMilestone { milestone_index: 0 }
        );
        assert_eq!(transition.required_signer, PartyId::new("contractor-a"));
        assert_eq!(
            transition.output.milestones[0].status,
            MilestoneStatus::Completed
        );
    }

    #[test]
    fn non_contractor_is_rejected_without_successor() {
        let err = build_finish_milestone(current_ref(), &PartyId::new("employer-a"), 0)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
    }

    #[test]
    fn model_failures_propagate() {
        let err = build_finish_milestone(current_ref(), &PartyId::new("contractor-a"), 7)
            .unwrap_err();
        assert!(matches!(err, LedgerError::IndexOutOfRange { .. }));
    }
}
