//! Capability traits for the remote access-control system.
//!
//! One canonical method signature per remote operation. Every directory and
//! synchronization call takes the current [`SessionToken`]; the session
//! layer owns obtaining and refreshing it.
//!
//! Remote result conventions:
//! - insert operations return the new entity's id; non-positive means rejected
//! - mutations return a result code where `0` is success
//! - partial sync returns an `i32` code (`0` = success)
//! - full sync returns a task id (positive = accepted)
//!
//! Interpretation of those codes belongs to the workflow layer; the client
//! reports them verbatim and only raises [`WardenError::Remote`] for
//! transport and fault failures.
//!
//! [`WardenError::Remote`]: warden_core::WardenError

use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{
    Credential, CredentialId, Factor, FactorId, FactorType, Group, NewFactor, NewPerson, Person,
    PersonId, Result, SessionToken,
};

/// Session lifecycle calls.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Establish a session with the service account, returning its token.
    async fn connect(&self, login: &str, password: &str) -> Result<SessionToken>;

    /// Terminate a session.
    async fn disconnect(&self, token: &SessionToken) -> Result<()>;

    /// Probe session liveness: the operator identity bound to the token,
    /// or `None` if the remote no longer recognizes it.
    async fn probe(&self, token: &SessionToken) -> Result<Option<String>>;
}

/// Identity, credential, factor, and group management calls.
#[allow(clippy::too_many_arguments)]
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Insert a person; returns the new remote id (non-positive = rejected).
    async fn insert_person(&self, token: &SessionToken, person: &NewPerson) -> Result<i64>;

    /// Fetch a person by remote id.
    async fn person_by_id(&self, token: &SessionToken, id: PersonId) -> Result<Option<Person>>;

    /// Fetch a person by external reference id (at most one match assumed).
    async fn person_by_external_ref(
        &self,
        token: &SessionToken,
        external_ref: &str,
    ) -> Result<Option<Person>>;

    /// Fetch all persons.
    async fn all_persons(&self, token: &SessionToken) -> Result<Vec<Person>>;

    /// Update a person record; returns a result code (`0` = success).
    async fn update_person(&self, token: &SessionToken, person: &Person) -> Result<i64>;

    /// Delete a person; `unlink_related` also unlinks and cascades related
    /// objects (assigned credentials). Returns a result code.
    async fn delete_person(
        &self,
        token: &SessionToken,
        id: PersonId,
        unlink_related: bool,
    ) -> Result<i64>;

    /// Credentials currently assigned to a person.
    async fn person_credentials(
        &self,
        token: &SessionToken,
        id: PersonId,
    ) -> Result<Vec<Credential>>;

    /// All credentials, assigned and unassigned.
    async fn all_credentials(&self, token: &SessionToken) -> Result<Vec<Credential>>;

    /// Insert a credential; returns the new remote id (non-positive = rejected).
    async fn insert_credential(&self, token: &SessionToken, name: &str) -> Result<i64>;

    /// Delete a credential; `unlink_related` auto-unlinks related objects.
    /// Returns a result code.
    async fn delete_credential(
        &self,
        token: &SessionToken,
        id: CredentialId,
        unlink_related: bool,
    ) -> Result<i64>;

    /// Assign a credential to a person. Returns a result code.
    async fn assign_credential(
        &self,
        token: &SessionToken,
        credential: CredentialId,
        person: PersonId,
    ) -> Result<i64>;

    /// Unassign a credential from a person without deleting it. Returns a
    /// result code.
    async fn unassign_credential(
        &self,
        token: &SessionToken,
        credential: CredentialId,
        person: PersonId,
    ) -> Result<i64>;

    /// Factor types the deployment supports.
    async fn factor_types(&self, token: &SessionToken) -> Result<Vec<FactorType>>;

    /// Insert an authentication factor; returns the new remote id.
    async fn insert_factor(&self, token: &SessionToken, factor: &NewFactor) -> Result<i64>;

    /// Remove an authentication factor. Returns a result code.
    async fn remove_factor(&self, token: &SessionToken, id: FactorId) -> Result<i64>;

    /// Factors bound to a credential.
    async fn factors_by_credential(
        &self,
        token: &SessionToken,
        id: CredentialId,
    ) -> Result<Vec<Factor>>;

    /// All factors across all credentials, if the deployment supports the
    /// bulk call. `None` means unsupported — callers fall back to
    /// per-credential queries. Support is decided once at construction.
    async fn all_factors(&self, token: &SessionToken) -> Result<Option<Vec<Factor>>>;

    /// Credentials not currently assigned to any person.
    async fn unassigned_credentials(&self, token: &SessionToken) -> Result<Vec<Credential>>;

    /// All access groups.
    async fn all_groups(&self, token: &SessionToken) -> Result<Vec<Group>>;

    /// The remote system's own message for the last failed call, if any.
    async fn last_error(&self, token: &SessionToken) -> Result<Option<String>>;
}

/// Downstream-controller synchronization calls.
#[async_trait]
pub trait SyncApi: Send + Sync {
    /// Push changes for specific credentials to downstream controllers.
    /// Returns the remote code: `0` = success.
    async fn synchronize_credentials(
        &self,
        token: &SessionToken,
        ids: &[CredentialId],
    ) -> Result<i32>;

    /// Re-push the entire configuration. Returns a task id: positive =
    /// accepted, non-positive = failure.
    async fn synchronize_full(&self, token: &SessionToken) -> Result<i64>;
}

/// Factory producing short-lived call handles bound to the remote endpoints.
///
/// The orchestration core holds one of these and asks for a handle per
/// concern; production hands out clones of shared HTTP clients, tests hand
/// out fakes.
pub trait ClientAccessors: Send + Sync {
    /// Handle for session lifecycle calls.
    fn session(&self) -> Arc<dyn SessionApi>;

    /// Handle for directory calls.
    fn directory(&self) -> Arc<dyn DirectoryApi>;

    /// Handle for synchronization calls.
    fn sync(&self) -> Arc<dyn SyncApi>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
