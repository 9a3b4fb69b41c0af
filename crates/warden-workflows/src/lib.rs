//! # warden-workflows
//!
//! Multi-step business workflows over the remote access-control directory.
//!
//! The remote system has no transactions: every workflow here is a sequence
//! of separate remote calls that must leave the directory consistent even
//! when a step fails partway through. Two pieces make that tractable:
//!
//! - [`escalation`]: the tiered recovery policy for downstream-controller
//!   synchronization — partial sync first, escalating to a full sync on a
//!   known set of inconsistency codes
//! - [`WorkflowOrchestrator`]: the workflows themselves — provision a
//!   person, issue a main card, delete a person, change a group, assign and
//!   unassign credentials, look up replacement credentials — each run as a
//!   single retry-once-on-expiry unit ending in a scoped sync
//!
//! Ordering inside a workflow is a correctness requirement: factors are
//! removed before their credential is deleted, and replacement credentials
//! are unassigned before a person delete can cascade into them.

#![deny(unsafe_code)]

pub mod escalation;
pub mod orchestrator;

pub use escalation::{ESCALATION_CODES, should_escalate, synchronize_full, synchronize_scoped};
pub use orchestrator::{
    DeletePersonOutcome, IssueCardOutcome, ProvisionOutcome, ProvisionRequest, ProvisioningPolicy,
    UpdateGroupOutcome, WorkflowOrchestrator,
};
