//! Opaque signing capability.

use crate::error::LedgerError;
use crate::types::{AuthorizationToken, PartyId, SignedTransition, Transition};

/// Produces and checks authorization tokens for transitions.
///
/// The core treats tokens opaquely: it designates the required signer and
/// hands the transition over, but never inspects signature material itself.
/// Production deployments back this with asymmetric keys; the in-tree adapter
/// uses deterministic keyed hashing for reproducible tests.
pub trait SigningAuthority: Send + Sync {
    fn sign(
        &self,
        signer: &PartyId,
        transition: &Transition,
    ) -> Result<AuthorizationToken, LedgerError>;

    fn verify(&self, signed: &SignedTransition) -> Result<(), LedgerError>;
}
