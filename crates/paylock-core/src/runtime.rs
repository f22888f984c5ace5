//! End-to-end orchestration for the complete-milestone operation.

use crate::builder::build_finish_milestone;
use crate::commit::CommitAuthority;
use crate::error::LedgerError;
use crate::flow::CompletionStageMachine;
use crate::locator::{find_current, JobVault};
use crate::signing::SigningAuthority;
use crate::types::{JobId, PartyId, SignedTransition};
use crate::validator::{validate, ValidationLimits};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub limits: ValidationLimits,
}

/// Orchestrator tying locator, builder, validator, signing, and commit
/// together for the authorized updater.
///
/// Each invocation is a single sequential procedure; the only concurrency
/// control lives in the [`CommitAuthority`], which serializes transitions
/// sharing a predecessor. A read here and a commit later are not atomic as a
/// pair: if another transition supersedes the record in between, the commit
/// surfaces [`LedgerError::Conflict`] and the caller may re-read and retry.
pub struct MilestoneEngine {
    vault: Arc<dyn JobVault>,
    signer: Arc<dyn SigningAuthority>,
    authority: Arc<dyn CommitAuthority>,
    config: EngineConfig,
}

impl MilestoneEngine {
    pub fn new(
        vault: Arc<dyn JobVault>,
        signer: Arc<dyn SigningAuthority>,
        authority: Arc<dyn CommitAuthority>,
        config: EngineConfig,
    ) -> Self {
        Self {
            vault,
            signer,
            authority,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Complete the milestone at `milestone_index` on the current version of
    /// `job_id`, as `authorizer`.
    ///
    /// Runs located -> built -> validated -> committed in strict sequence;
    /// any failure short-circuits with no partial effects. On success the
    /// prior version is permanently superseded and the stable logical
    /// identity is returned; re-invocation then operates on the new current
    /// version rather than retrying the same transition.
    pub async fn complete_milestone(
        &self,
        job_id: JobId,
        milestone_index: usize,
        authorizer: PartyId,
    ) -> Result<JobId, LedgerError> {
        let trace_id = Uuid::new_v4().to_string();
        let mut machine = CompletionStageMachine::new(trace_id.clone());
        info!(
            trace_id = %trace_id,
            job_id = %job_id,
            milestone_index,
            authorizer = %authorizer,
            "complete_milestone requested"
        );

        let current = find_current(self.vault.as_ref(), job_id).await?;
        machine.mark_located()?;
        debug!(trace_id = %trace_id, version_id = %current.version_id, "current version located");

        let transition = build_finish_milestone(current, &authorizer, milestone_index)?;
        machine.mark_built()?;

        validate(&transition, &self.config.limits)?;
        machine.mark_validated()?;

        let authorization = self.signer.sign(&authorizer, &transition)?;
        let signed = SignedTransition {
            transition,
            authorization,
        };

        let committed = match self.authority.finalize(&signed).await {
            Ok(committed) => committed,
            Err(err) => {
                if err.is_retryable() {
                    warn!(trace_id = %trace_id, job_id = %job_id, "commit lost the race: {err}");
                } else {
                    warn!(trace_id = %trace_id, job_id = %job_id, "commit rejected: {err}");
                }
                return Err(err);
            }
        };
        machine.mark_committed()?;

        info!(
            trace_id = %trace_id,
            job_id = %committed.record.job_id,
            version_id = %committed.version_id,
            "milestone completed"
        );
        Ok(committed.record.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitAuthority;
    use crate::types::{
        AuthorizationToken, JobRecord, Milestone, RecordRef, SignedTransition, Transition,
    };
    use async_trait::async_trait;
    use chrono::Utc;

    struct SingleVersionVault {
        current: RecordRef,
    }

    #[async_trait]
    impl JobVault for SingleVersionVault {
        async fn query_current(&self, job_id: JobId) -> Result<Vec<RecordRef>, LedgerError> {
            if self.current.record.job_id == job_id {
                Ok(vec![self.current.clone()])
            } else {
                Ok(Vec::new())
            }
        }
    }

    struct StaticSigner;

    impl SigningAuthority for StaticSigner {
        fn sign(
            &self,
            signer: &PartyId,
            _transition: &Transition,
        ) -> Result<AuthorizationToken, LedgerError> {
            Ok(AuthorizationToken {
                key_id: signer.to_string(),
                nonce: "nonce".to_string(),
                signed_at: Utc::now(),
                signature: "static".to_string(),
            })
        }

        fn verify(&self, _signed: &SignedTransition) -> Result<(), LedgerError> {
            Ok(())
        }
    }

    struct AcceptingAuthority;

    #[async_trait]
    impl CommitAuthority for AcceptingAuthority {
        async fn finalize(&self, signed: &SignedTransition) -> Result<RecordRef, LedgerError> {
            RecordRef::new(signed.transition.output.clone())
        }
    }

    struct RefusingAuthority;

    #[async_trait]
    impl CommitAuthority for RefusingAuthority {
        async fn finalize(&self, _signed: &SignedTransition) -> Result<RecordRef, LedgerError> {
            Err(LedgerError::Conflict)
        }
    }

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

    fn engine(current: RecordRef, authority: Arc<dyn CommitAuthority>) -> MilestoneEngine {
        MilestoneEngine::new(
            Arc::new(SingleVersionVault { current }),
            Arc::new(StaticSigner),
            authority,
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn completes_milestone_end_to_end() {
        let current = current_ref();
        let job_id = current.record.job_id;
        let engine = engine(current, Arc::new(AcceptingAuthority));

        let returned = engine
            .complete_milestone(job_id, 0, PartyId::new("contractor-a"))
            .await
            .unwrap();
        assert_eq!(returned, job_id);
    }

    #[tokio::test]
    async fn unknown_job_short_circuits_before_building() {
        let engine = engine(current_ref(), Arc::new(AcceptingAuthority));

        let err = engine
            .complete_milestone(JobId::new(), 0, PartyId::new("contractor-a"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn commit_conflict_propagates_as_retryable() {
        let current = current_ref();
        let job_id = current.record.job_id;
        let engine = engine(current, Arc::new(RefusingAuthority));

        let err = engine
            .complete_milestone(job_id, 0, PartyId::new("contractor-a"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn wrong_party_never_reaches_the_authority() {
        let current = current_ref();
        let job_id = current.record.job_id;
        let engine = engine(current, Arc::new(RefusingAuthority));

        let err = engine
            .complete_milestone(job_id, 0, PartyId::new("employer-a"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
    }
}
