//! # warden-core
//!
//! Foundation types and utilities shared by all Warden crates.
//!
//! Warden mediates every interaction with a remote, stateful access-control
//! system through a single shared authentication session. This crate provides
//! the vocabulary the session and workflow layers are built on:
//!
//! - **Domain types**: `Person`, `Credential`, `Factor`, `Group` and their
//!   branded integer ids, plus the opaque `SessionToken`
//! - **Errors**: the `WardenError` taxonomy via `thiserror`
//! - **Failure classification**: pluggable session-expiry detection
//! - **Naming**: case-insensitive unique names and the replacement marker
//! - **Card values**: digits-only normalization
//! - **Backoff**: exponential delay math for the connect loop

#![deny(unsafe_code)]

pub mod backoff;
pub mod card;
pub mod classify;
pub mod errors;
pub mod logging;
pub mod naming;
pub mod types;

pub use card::{normalize_card_value, validate_card_value};
pub use classify::{FailureClassifier, FailureKind, TextHeuristicClassifier};
pub use errors::{Result, WardenError};
pub use naming::{REPLACEMENT_MARKER, is_replacement_name, unique_name};
pub use types::{
    Credential, CredentialId, Factor, FactorId, FactorType, FactorTypeId, Group, GroupId,
    NewFactor, NewPerson, Person, PersonId, SessionToken,
};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _token = SessionToken::new("tok");
        let _err = WardenError::operation("insert person", "rejected");
        assert!(is_replacement_name("Zastępcza-1"));
    }
}
