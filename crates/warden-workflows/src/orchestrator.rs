//! The multi-step business workflows.
//!
//! Every workflow runs as one retry-once-on-expiry unit: all remote calls
//! inside it share a single token fetch, and a mid-workflow session expiry
//! reruns the whole workflow body once against a fresh token. Each mutating
//! workflow ends with a synchronization scoped to the credential ids it
//! touched, with auto-escalation to a full sync.
//!
//! Step ordering within a workflow is a correctness requirement: factors
//! are removed before their credential, replacement credentials are
//! unassigned before a person delete, destructive steps precede additive
//! ones in card issuance.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use warden_client::ClientAccessors;
use warden_core::{
    Credential, CredentialId, Factor, FactorId, FactorTypeId, Group, GroupId, NewFactor, NewPerson,
    PersonId, Result, SessionToken, WardenError, is_replacement_name, normalize_card_value,
    unique_name, validate_card_value,
};
use warden_session::SessionRetryRunner;

use crate::escalation::synchronize_scoped;

// ─────────────────────────────────────────────────────────────────────────────
// Requests, outcomes, policy
// ─────────────────────────────────────────────────────────────────────────────

/// Input for [`WorkflowOrchestrator::provision_person`].
#[derive(Clone, Debug)]
pub struct ProvisionRequest {
    /// Business-system identifier of the new person.
    pub external_ref: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Access group, if any.
    pub group_id: Option<GroupId>,
    /// Raw card value; normalized to digits before use.
    pub card_value: String,
}

/// Ids created by a successful provisioning run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProvisionOutcome {
    /// The new person.
    pub person: PersonId,
    /// The new credential assigned to the person.
    pub credential: CredentialId,
    /// The card factor attached to the credential.
    pub factor: FactorId,
}

/// Ids created by a successful card issuance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssueCardOutcome {
    /// The new main credential.
    pub credential: CredentialId,
    /// The card factor attached to it.
    pub factor: FactorId,
}

/// Result of [`WorkflowOrchestrator::delete_person`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeletePersonOutcome {
    /// The person existed and was deleted.
    Deleted {
        /// The deleted person.
        person: PersonId,
        /// Non-replacement credentials removed with the person.
        removed_credentials: Vec<CredentialId>,
    },
    /// No person with that external reference exists; nothing was changed.
    NotFound,
}

/// Result of [`WorkflowOrchestrator::update_person_group`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateGroupOutcome {
    /// The person record was updated and the change synchronized.
    Updated,
    /// The person was already in the requested group; nothing was changed.
    AlreadyInGroup,
}

/// How provisioning picks the factor type for new card factors.
#[derive(Clone, Debug)]
pub struct ProvisioningPolicy {
    /// Preferred factor type name, matched case-insensitively.
    pub preferred_factor_type: String,
    /// Factor type id used when no type matches the preferred name.
    pub fallback_factor_type_id: FactorTypeId,
}

impl Default for ProvisioningPolicy {
    fn default() -> Self {
        Self {
            preferred_factor_type: "Card number (DEC)".to_owned(),
            fallback_factor_type_id: FactorTypeId::new(1),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Implements the compensating multi-step workflows over the remote
/// directory.
///
/// Holds the [`ClientAccessors`] factory for remote calls and the
/// [`SessionRetryRunner`] that gives each workflow its session envelope.
/// Workflows never inspect tokens or classify failures themselves.
pub struct WorkflowOrchestrator {
    accessors: Arc<dyn ClientAccessors>,
    runner: SessionRetryRunner,
    policy: ProvisioningPolicy,
}

impl WorkflowOrchestrator {
    /// Create an orchestrator over the given remote accessors.
    #[must_use]
    pub fn new(
        accessors: Arc<dyn ClientAccessors>,
        runner: SessionRetryRunner,
        policy: ProvisioningPolicy,
    ) -> Self {
        Self {
            accessors,
            runner,
            policy,
        }
    }

    // ── Mutating workflows ──────────────────────────────────────────────────

    /// Provision a person with a main credential and one card factor.
    ///
    /// Rejects a card value without digits before any remote call is made.
    #[instrument(skip(self, request), fields(external_ref = %request.external_ref))]
    pub async fn provision_person(&self, request: &ProvisionRequest) -> Result<ProvisionOutcome> {
        let card_value = validate_card_value(&request.card_value)?;
        self.runner
            .run_with_retry("provision person", |token| {
                self.provision_inner(token, request, &card_value)
            })
            .await
    }

    /// Replace a person's main credentials with one fresh card credential.
    ///
    /// Deletes every credential not carrying the replacement marker (factors
    /// first, then the credential with related-object unlink), synchronizes
    /// the deletions, then creates, assigns, and synchronizes the new
    /// credential. Replacement credentials survive untouched. Fatal if the
    /// person does not exist.
    #[instrument(skip(self))]
    pub async fn issue_main_card(
        &self,
        external_ref: &str,
        card_value: &str,
    ) -> Result<IssueCardOutcome> {
        let card_value = validate_card_value(card_value)?;
        self.runner
            .run_with_retry("issue main card", |token| {
                self.issue_main_card_inner(token, external_ref, &card_value)
            })
            .await
    }

    /// Delete a person and their non-replacement credentials.
    ///
    /// A no-op when no person matches. Replacement credentials are
    /// explicitly unassigned first so the remote cascade cannot delete them.
    #[instrument(skip(self))]
    pub async fn delete_person(&self, external_ref: &str) -> Result<DeletePersonOutcome> {
        self.runner
            .run_with_retry("delete person", |token| {
                self.delete_person_inner(token, external_ref)
            })
            .await
    }

    /// Move a person to another access group.
    ///
    /// A no-op when the person is already in that group. Otherwise updates
    /// the record and synchronizes the person's credentials; with no
    /// credentials to scope to, a full synchronization runs instead.
    #[instrument(skip(self))]
    pub async fn update_person_group(
        &self,
        person: PersonId,
        group: GroupId,
    ) -> Result<UpdateGroupOutcome> {
        self.runner
            .run_with_retry("update person group", |token| {
                self.update_group_inner(token, person, group)
            })
            .await
    }

    /// Unassign a credential from a person without deleting it.
    #[instrument(skip(self))]
    pub async fn unassign_credential_from_person(
        &self,
        credential: CredentialId,
        person: PersonId,
    ) -> Result<()> {
        self.runner
            .run_with_retry("unassign credential", |token| async move {
                let directory = self.accessors.directory();
                let code = directory
                    .unassign_credential(&token, credential, person)
                    .await?;
                if code != 0 {
                    return Err(self
                        .operation_failed(
                            &token,
                            "unassign credential",
                            format!("remote returned result {code}"),
                        )
                        .await);
                }
                synchronize_scoped(&*self.accessors.sync(), &token, &[credential], true).await
            })
            .await
    }

    /// Assign an existing credential to a person.
    #[instrument(skip(self))]
    pub async fn assign_credential_to_person(
        &self,
        credential: CredentialId,
        person: PersonId,
    ) -> Result<()> {
        self.runner
            .run_with_retry("assign credential", |token| async move {
                let directory = self.accessors.directory();
                let code = directory.assign_credential(&token, credential, person).await?;
                if code != 0 {
                    return Err(self
                        .operation_failed(
                            &token,
                            "assign credential",
                            format!("remote returned result {code}"),
                        )
                        .await);
                }
                synchronize_scoped(&*self.accessors.sync(), &token, &[credential], true).await
            })
            .await
    }

    // ── Lookups and projections ─────────────────────────────────────────────

    /// Find an unassigned replacement credential holding a card factor with
    /// the given value.
    ///
    /// Candidates are scanned in ascending id order; the bulk all-factors
    /// join is used when the deployment supports it, with per-candidate
    /// factor queries as the fallback.
    #[instrument(skip(self, value))]
    pub async fn find_unassigned_replacement_credential_by_card_value(
        &self,
        value: &str,
    ) -> Result<Option<Credential>> {
        let target = normalize_card_value(value);
        self.runner
            .run_with_retry("find replacement credential", |token| {
                self.find_replacement_inner(token, &target)
            })
            .await
    }

    /// All access groups, ordered by display name (case-insensitive).
    pub async fn all_groups(&self) -> Result<Vec<Group>> {
        self.runner
            .run_with_retry("list groups", |token| async move {
                let mut groups = self.accessors.directory().all_groups(&token).await?;
                groups.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
                Ok(groups)
            })
            .await
    }

    /// Credentials assigned to a person, in ascending id order.
    pub async fn person_credentials(&self, person: PersonId) -> Result<Vec<Credential>> {
        self.runner
            .run_with_retry("list person credentials", |token| async move {
                let mut credentials = self
                    .accessors
                    .directory()
                    .person_credentials(&token, person)
                    .await?;
                credentials.sort_by_key(|c| c.id);
                Ok(credentials)
            })
            .await
    }

    /// Factors bound to a credential, in ascending id order.
    pub async fn credential_factors(&self, credential: CredentialId) -> Result<Vec<Factor>> {
        self.runner
            .run_with_retry("list credential factors", |token| async move {
                let mut factors = self
                    .accessors
                    .directory()
                    .factors_by_credential(&token, credential)
                    .await?;
                factors.sort_by_key(|f| f.id);
                Ok(factors)
            })
            .await
    }

    // ── Workflow bodies ─────────────────────────────────────────────────────

    async fn provision_inner(
        &self,
        token: SessionToken,
        request: &ProvisionRequest,
        card_value: &str,
    ) -> Result<ProvisionOutcome> {
        let directory = self.accessors.directory();

        let new_person = NewPerson {
            external_ref: request.external_ref.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            group_id: request.group_id,
        };
        let raw = directory.insert_person(&token, &new_person).await?;
        if raw <= 0 {
            return Err(self
                .operation_failed(
                    &token,
                    "insert person",
                    format!("remote rejected insert with result {raw}"),
                )
                .await);
        }
        let person = PersonId::new(raw);
        debug!(%person, "person inserted");

        let (credential, factor) = self
            .create_card_credential(&token, person, &request.external_ref, card_value)
            .await?;

        synchronize_scoped(&*self.accessors.sync(), &token, &[credential], true).await?;
        info!(%person, %credential, "person provisioned");
        Ok(ProvisionOutcome {
            person,
            credential,
            factor,
        })
    }

    async fn issue_main_card_inner(
        &self,
        token: SessionToken,
        external_ref: &str,
        card_value: &str,
    ) -> Result<IssueCardOutcome> {
        let directory = self.accessors.directory();

        let person = directory
            .person_by_external_ref(&token, external_ref)
            .await?
            .ok_or_else(|| WardenError::not_found("person", external_ref))?;

        let assigned = directory.person_credentials(&token, person.id).await?;
        let (replacement, main) = split_replacement(assigned);
        debug!(
            kept = replacement.len(),
            removing = main.len(),
            "separating replacement credentials"
        );

        // Destructive phase: factors first, then each main credential.
        let mut deleted = Vec::with_capacity(main.len());
        for credential in &main {
            self.remove_credential_with_factors(&token, credential.id)
                .await?;
            deleted.push(credential.id);
        }
        if !deleted.is_empty() {
            synchronize_scoped(&*self.accessors.sync(), &token, &deleted, true).await?;
        }

        // Additive phase: the fresh main credential with its card factor.
        let (credential, factor) = self
            .create_card_credential(&token, person.id, external_ref, card_value)
            .await?;
        synchronize_scoped(&*self.accessors.sync(), &token, &[credential], true).await?;

        info!(person = %person.id, %credential, "main card issued");
        Ok(IssueCardOutcome { credential, factor })
    }

    async fn delete_person_inner(
        &self,
        token: SessionToken,
        external_ref: &str,
    ) -> Result<DeletePersonOutcome> {
        let directory = self.accessors.directory();

        let Some(person) = directory.person_by_external_ref(&token, external_ref).await? else {
            debug!(external_ref, "no matching person; nothing to delete");
            return Ok(DeletePersonOutcome::NotFound);
        };

        let assigned = directory.person_credentials(&token, person.id).await?;
        let (replacement, main) = split_replacement(assigned);

        // Safety net: the remote cascade must never reach a replacement
        // credential, so each one is unassigned (and synchronized) first.
        for credential in &replacement {
            let code = directory
                .unassign_credential(&token, credential.id, person.id)
                .await?;
            if code != 0 {
                return Err(self
                    .operation_failed(
                        &token,
                        "unassign replacement credential",
                        format!("remote returned result {code}"),
                    )
                    .await);
            }
            synchronize_scoped(&*self.accessors.sync(), &token, &[credential.id], true).await?;
        }

        let code = directory.delete_person(&token, person.id, true).await?;
        if code != 0 {
            return Err(self
                .operation_failed(
                    &token,
                    "delete person",
                    format!("remote returned result {code}"),
                )
                .await);
        }

        let removed: Vec<CredentialId> = main.iter().map(|c| c.id).collect();
        if !removed.is_empty() {
            synchronize_scoped(&*self.accessors.sync(), &token, &removed, true).await?;
        }

        info!(person = %person.id, removed = removed.len(), "person deleted");
        Ok(DeletePersonOutcome::Deleted {
            person: person.id,
            removed_credentials: removed,
        })
    }

    async fn update_group_inner(
        &self,
        token: SessionToken,
        person: PersonId,
        group: GroupId,
    ) -> Result<UpdateGroupOutcome> {
        let directory = self.accessors.directory();

        let Some(mut record) = directory.person_by_id(&token, person).await? else {
            return Err(WardenError::not_found("person", person.to_string()));
        };
        if record.group_id == Some(group) {
            debug!(%person, %group, "person already in group");
            return Ok(UpdateGroupOutcome::AlreadyInGroup);
        }

        record.group_id = Some(group);
        let code = directory.update_person(&token, &record).await?;
        if code != 0 {
            return Err(self
                .operation_failed(
                    &token,
                    "update person",
                    format!("remote returned result {code}"),
                )
                .await);
        }

        let scope: Vec<CredentialId> = directory
            .person_credentials(&token, person)
            .await?
            .iter()
            .map(|c| c.id)
            .collect();
        synchronize_scoped(&*self.accessors.sync(), &token, &scope, true).await?;
        Ok(UpdateGroupOutcome::Updated)
    }

    async fn find_replacement_inner(
        &self,
        token: SessionToken,
        target: &str,
    ) -> Result<Option<Credential>> {
        let directory = self.accessors.directory();

        let mut candidates: Vec<Credential> = directory
            .unassigned_credentials(&token)
            .await?
            .into_iter()
            .filter(|c| is_replacement_name(&c.name))
            .collect();
        candidates.sort_by_key(|c| c.id);
        if candidates.is_empty() {
            return Ok(None);
        }

        // Fast path: one bulk fetch joined locally against the candidates.
        if let Some(all_factors) = directory.all_factors(&token).await? {
            for candidate in &candidates {
                let hit = all_factors.iter().any(|f| {
                    f.credential_id == candidate.id && normalize_card_value(&f.value) == target
                });
                if hit {
                    return Ok(Some(candidate.clone()));
                }
            }
            return Ok(None);
        }

        // Fallback: per-candidate factor queries, still in ascending id order.
        for candidate in &candidates {
            let factors = directory.factors_by_credential(&token, candidate.id).await?;
            if factors.iter().any(|f| normalize_card_value(&f.value) == target) {
                return Ok(Some(candidate.clone()));
            }
        }
        Ok(None)
    }

    // ── Shared steps ────────────────────────────────────────────────────────

    /// Create a uniquely named credential, assign it, and attach one card
    /// factor with the already-normalized value.
    async fn create_card_credential(
        &self,
        token: &SessionToken,
        person: PersonId,
        base_name: &str,
        card_value: &str,
    ) -> Result<(CredentialId, FactorId)> {
        let directory = self.accessors.directory();

        let existing: Vec<String> = directory
            .all_credentials(token)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        let name = unique_name(base_name, &existing);

        let raw = directory.insert_credential(token, &name).await?;
        if raw <= 0 {
            return Err(self
                .operation_failed(
                    token,
                    "insert credential",
                    format!("remote rejected insert with result {raw}"),
                )
                .await);
        }
        let credential = CredentialId::new(raw);

        let code = directory.assign_credential(token, credential, person).await?;
        if code != 0 {
            return Err(self
                .operation_failed(
                    token,
                    "assign credential",
                    format!("remote returned result {code}"),
                )
                .await);
        }

        let factor_type = self.resolve_factor_type(token).await?;
        let new_factor = NewFactor {
            credential_id: credential,
            factor_type_id: factor_type,
            value: card_value.to_owned(),
        };
        let raw = directory.insert_factor(token, &new_factor).await?;
        if raw <= 0 {
            return Err(self
                .operation_failed(
                    token,
                    "insert factor",
                    format!("remote rejected insert with result {raw}"),
                )
                .await);
        }

        debug!(%credential, name = %name, "card credential created");
        Ok((credential, FactorId::new(raw)))
    }

    /// Remove all of a credential's factors, then the credential itself with
    /// related-object unlink. Factor removal must come first.
    async fn remove_credential_with_factors(
        &self,
        token: &SessionToken,
        credential: CredentialId,
    ) -> Result<()> {
        let directory = self.accessors.directory();

        for factor in directory.factors_by_credential(token, credential).await? {
            let code = directory.remove_factor(token, factor.id).await?;
            if code != 0 {
                return Err(self
                    .operation_failed(
                        token,
                        "remove factor",
                        format!("remote returned result {code}"),
                    )
                    .await);
            }
        }

        let code = directory.delete_credential(token, credential, true).await?;
        if code != 0 {
            return Err(self
                .operation_failed(
                    token,
                    "delete credential",
                    format!("remote returned result {code}"),
                )
                .await);
        }
        Ok(())
    }

    /// Resolve the factor type for new card factors: preferred name match,
    /// else the configured fallback id, else the first type on offer.
    async fn resolve_factor_type(&self, token: &SessionToken) -> Result<FactorTypeId> {
        let types = self.accessors.directory().factor_types(token).await?;

        let preferred = self.policy.preferred_factor_type.to_lowercase();
        if let Some(found) = types.iter().find(|t| t.name.to_lowercase() == preferred) {
            return Ok(found.id);
        }
        if let Some(found) = types
            .iter()
            .find(|t| t.id == self.policy.fallback_factor_type_id)
        {
            warn!(id = %found.id, "preferred factor type missing; using fallback id");
            return Ok(found.id);
        }
        if let Some(first) = types.first() {
            warn!(id = %first.id, name = %first.name, "using first available factor type");
            return Ok(first.id);
        }
        Err(WardenError::operation(
            "resolve factor type",
            "remote reports no factor types".to_owned(),
        ))
    }

    /// Build a descriptive operation failure, preferring the remote system's
    /// own last-error text over the generic fallback.
    async fn operation_failed(
        &self,
        token: &SessionToken,
        operation: &str,
        fallback: String,
    ) -> WardenError {
        match self.accessors.directory().last_error(token).await {
            Ok(Some(message)) if !message.is_empty() => WardenError::operation(operation, message),
            _ => WardenError::operation(operation, fallback),
        }
    }
}

/// Split credentials into (replacement, everything else).
fn split_replacement(credentials: Vec<Credential>) -> (Vec<Credential>, Vec<Credential>) {
    credentials
        .into_iter()
        .partition(|c| is_replacement_name(&c.name))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
