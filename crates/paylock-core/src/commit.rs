//! Consensus commit contract.

use crate::error::LedgerError;
use crate::types::{RecordRef, SignedTransition};
use async_trait::async_trait;

/// Single consensus authority that finalizes transitions.
///
/// Contract required of implementations:
/// - **Atomicity**: a transition either fully applies or leaves no trace.
/// - **Single consumption**: of all concurrent submissions referencing the
///   same predecessor `version_id`, at most one succeeds; the rest fail with
///   [`LedgerError::Conflict`].
/// - **Durability**: the predecessor is marked superseded and the successor
///   recorded as current before success is returned.
///
/// The returned reference is the new current version of the job record.
#[async_trait]
pub trait CommitAuthority: Send + Sync {
    async fn finalize(&self, signed: &SignedTransition) -> Result<RecordRef, LedgerError>;
}
