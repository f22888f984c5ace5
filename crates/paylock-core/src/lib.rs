//! Core milestone payment ledger.
//!
//! A job's commercial value is released incrementally as milestones complete.
//! Every change produces a brand-new record version through an atomic
//! transition referencing its exact predecessor; a single commit authority
//! guarantees each predecessor is consumed by at most one successor, so two
//! conflicting updates to the same record can never both succeed.

#![deny(unsafe_code)]

pub mod builder;
pub mod commit;
pub mod error;
pub mod flow;
pub mod locator;
pub mod model;
pub mod runtime;
pub mod signing;
pub mod types;
pub mod validator;

pub use builder::build_finish_milestone;
pub use commit::CommitAuthority;
pub use error::LedgerError;
pub use flow::{CompletionStage, CompletionStageMachine};
pub use locator::{find_current, JobVault};
pub use model::{advance_milestone, MilestoneAdvance};
pub use runtime::{EngineConfig, MilestoneEngine};
pub use signing::SigningAuthority;
pub use types::{
    record_hash, AuthorizationToken, JobId, JobRecord, Milestone, MilestoneStatus, PartyId,
    RecordRef, SignedTransition, Transition, TransitionIntent,
};
pub use validator::{validate, ValidationLimits};
