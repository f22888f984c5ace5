//! Resolving a logical job identity to its unique current version.

use crate::error::LedgerError;
use crate::types::{JobId, RecordRef};
use async_trait::async_trait;

/// Queryable store of job record versions.
///
/// Implementations must return only unsuperseded versions; a well-formed
/// store yields zero or one match per identity. More than one match is a
/// store-consistency violation surfaced by [`find_current`].
#[async_trait]
pub trait JobVault: Send + Sync {
    async fn query_current(&self, job_id: JobId) -> Result<Vec<RecordRef>, LedgerError>;
}

/// Resolve `job_id` to its unique current version.
///
/// `AmbiguousState` is fatal: it means the store holds more than one
/// unsuperseded version of the same identity and must not be retried.
pub async fn find_current(vault: &dyn JobVault, job_id: JobId) -> Result<RecordRef, LedgerError> {
    let mut matches = vault.query_current(job_id).await?;
    match matches.len() {
        0 => Err(LedgerError::NotFound(job_id)),
        1 => Ok(matches.remove(0)),
        count => Err(LedgerError::AmbiguousState { job_id, count }),
    }
}
