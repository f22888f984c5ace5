//! Capability adapters for paylock.

#![deny(unsafe_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paylock_core::error::LedgerError;
use paylock_core::types::{
    record_hash, AuthorizationToken, JobId, JobRecord, PartyId, RecordRef, SignedTransition,
    Transition,
};
use paylock_core::{CommitAuthority, JobVault, SigningAuthority};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: Uuid,
    record_hash: String,
    record: JobRecord,
    consumed: bool,
    recorded_at: DateTime<Utc>,
}

impl StoredVersion {
    fn record_ref(&self) -> RecordRef {
        RecordRef {
            version_id: self.version_id,
            record_hash: self.record_hash.clone(),
            record: self.record.clone(),
        }
    }
}

/// In-memory notarizing vault: queryable store and commit authority in one.
///
/// The version log per job is append-only; superseded versions stay in the
/// log (consumed) for audit and can never be used as input again. All of
/// `finalize` runs under a single lock, which is the linearization point
/// guaranteeing at most one successful consumption per predecessor version.
#[derive(Default)]
pub struct InMemoryVault {
    state: Mutex<HashMap<JobId, Vec<StoredVersion>>>,
    verifier: Option<Arc<dyn SigningAuthority>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vault that checks authorization tokens before finalizing, the way a
    /// notary would.
    pub fn with_verifier(verifier: Arc<dyn SigningAuthority>) -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
            verifier: Some(verifier),
        }
    }

    /// Seed a genesis version for a job. Job creation itself is an external
    /// operation; tests and demos use this to admit the starting record.
    pub async fn admit_job(&self, record: JobRecord) -> Result<RecordRef, LedgerError> {
        let mut state = self.state.lock().await;
        let versions = state.entry(record.job_id).or_default();
        if versions.iter().any(|v| !v.consumed) {
            return Err(LedgerError::CommitFailure(format!(
                "job {} already has a current version",
                record.job_id
            )));
        }

        let stored = StoredVersion {
            version_id: Uuid::new_v4(),
            record_hash: record_hash(&record)?,
            record,
            consumed: false,
            recorded_at: Utc::now(),
        };
        let admitted = stored.record_ref();
        versions.push(stored);
        Ok(admitted)
    }

    /// Total number of versions ever recorded for a job, consumed included.
    pub async fn version_count(&self, job_id: JobId) -> usize {
        let state = self.state.lock().await;
        state.get(&job_id).map(Vec::len).unwrap_or(0)
    }

    /// Audit view of a job's version history, oldest first. Superseded
    /// versions stay in the log permanently.
    pub async fn version_history(&self, job_id: JobId) -> Vec<VersionEntry> {
        let state = self.state.lock().await;
        state
            .get(&job_id)
            .map(|versions| {
                versions
                    .iter()
                    .map(|v| VersionEntry {
                        version_id: v.version_id,
                        record_hash: v.record_hash.clone(),
                        recorded_at: v.recorded_at,
                        superseded: v.consumed,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One row of a job's audit history.
#[derive(Debug, Clone)]
pub struct VersionEntry {
    pub version_id: Uuid,
    pub record_hash: String,
    pub recorded_at: DateTime<Utc>,
    pub superseded: bool,
}

#[async_trait]
impl JobVault for InMemoryVault {
    async fn query_current(&self, job_id: JobId) -> Result<Vec<RecordRef>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .get(&job_id)
            .map(|versions| {
                versions
                    .iter()
                    .filter(|v| !v.consumed)
                    .map(StoredVersion::record_ref)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl CommitAuthority for InMemoryVault {
    async fn finalize(&self, signed: &SignedTransition) -> Result<RecordRef, LedgerError> {
        if let Some(verifier) = &self.verifier {
            verifier.verify(signed)?;
        }

        let transition = &signed.transition;
        let successor_hash = record_hash(&transition.output)?;

        let mut state = self.state.lock().await;
        let versions = state
            .get_mut(&transition.input.record.job_id)
            .ok_or_else(|| {
                LedgerError::CommitFailure("predecessor references an unknown job".to_string())
            })?;

        let predecessor = versions
            .iter_mut()
            .find(|v| v.version_id == transition.input.version_id)
            .ok_or_else(|| {
                LedgerError::CommitFailure("unknown predecessor version".to_string())
            })?;

        if predecessor.consumed {
            return Err(LedgerError::Conflict);
        }
        if predecessor.record_hash != transition.input.record_hash {
            return Err(LedgerError::CommitFailure(
                "predecessor hash does not match stored version".to_string(),
            ));
        }

        predecessor.consumed = true;

        let stored = StoredVersion {
            version_id: Uuid::new_v4(),
            record_hash: successor_hash,
            record: transition.output.clone(),
            consumed: false,
            recorded_at: Utc::now(),
        };
        let committed = stored.record_ref();
        versions.push(stored);
        Ok(committed)
    }
}

/// Keyed signing authority.
///
/// Deterministic keyed hashing keeps tests reproducible and audits stable;
/// production deployments should back this with asymmetric signatures and
/// HSM keys.
#[derive(Debug, Clone, Default)]
pub struct KeyedSigner {
    keys: HashMap<String, String>,
}

impl KeyedSigner {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    pub fn register_key(&mut self, party: &PartyId, secret: impl Into<String>) {
        self.keys.insert(party.to_string(), secret.into());
    }

    pub fn has_key(&self, party: &PartyId) -> bool {
        self.keys.contains_key(party.as_str())
    }

    fn digest(
        &self,
        secret: &str,
        transition: &Transition,
        nonce: &str,
        signed_at: DateTime<Utc>,
    ) -> Result<String, LedgerError> {
        let material = serde_json::json!({
            "secret": secret,
            "transition": transition,
            "nonce": nonce,
            "signed_at": signed_at,
        });
        let bytes = serde_json::to_vec(&material)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}

impl SigningAuthority for KeyedSigner {
    fn sign(
        &self,
        signer: &PartyId,
        transition: &Transition,
    ) -> Result<AuthorizationToken, LedgerError> {
        let secret = self.keys.get(signer.as_str()).ok_or_else(|| {
            LedgerError::Signing(format!("no key registered for party '{signer}'"))
        })?;

        let signed_at = Utc::now();
        let nonce = Uuid::new_v4().to_string();
        let signature = self.digest(secret, transition, &nonce, signed_at)?;

        Ok(AuthorizationToken {
            key_id: signer.to_string(),
            nonce,
            signed_at,
            signature,
        })
    }

    fn verify(&self, signed: &SignedTransition) -> Result<(), LedgerError> {
        let token = &signed.authorization;

        if token.key_id != signed.transition.required_signer.as_str() {
            return Err(LedgerError::Signing(format!(
                "token signed by '{}' but required signer is '{}'",
                token.key_id, signed.transition.required_signer
            )));
        }

        let secret = self.keys.get(&token.key_id).ok_or_else(|| {
            LedgerError::Signing(format!("unknown key_id '{}'", token.key_id))
        })?;

        let expected = self.digest(secret, &signed.transition, &token.nonce, token.signed_at)?;
        if expected != token.signature {
            return Err(LedgerError::Signing("signature mismatch".to_string()));
        }

        Ok(())
    }
}

/// Deterministic authority that loses every race, useful for retry-path
/// testing.
#[derive(Debug, Clone, Default)]
pub struct ConflictingAuthority;

#[async_trait]
impl CommitAuthority for ConflictingAuthority {
    async fn finalize(&self, _signed: &SignedTransition) -> Result<RecordRef, LedgerError> {
        Err(LedgerError::Conflict)
    }
}
