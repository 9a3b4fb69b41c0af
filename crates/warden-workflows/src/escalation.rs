//! Tiered synchronization recovery: partial sync → full sync → fatal.
//!
//! Workflows end by pushing their changes to downstream controllers with a
//! partial synchronization scoped to the affected credential ids. Certain
//! non-zero partial-sync codes mean the controller-side cache is
//! inconsistent and only a full re-push can fix it; those escalate to a
//! full synchronization when the caller opted in. Any other non-zero code
//! is an ordinary operation failure. A full-sync failure is always fatal.

use tracing::warn;

use warden_client::SyncApi;
use warden_core::{CredentialId, Result, SessionToken, WardenError};

/// Partial-sync result codes indicating an inconsistent controller cache.
///
/// Only these escalate to a full synchronization; every other non-zero
/// code is surfaced as an operation failure.
pub const ESCALATION_CODES: &[i32] = &[255, 257, 258, 259, 262];

/// Whether a non-zero partial-sync code warrants a full synchronization.
#[must_use]
pub fn should_escalate(code: i32) -> bool {
    ESCALATION_CODES.contains(&code)
}

/// Push changes for `scope` to downstream controllers, escalating per policy.
///
/// - An empty scope goes straight to a full sync: there is nothing to
///   target a partial sync at, but the controllers still need the change.
/// - Partial-sync code `0` is success.
/// - A code in [`ESCALATION_CODES`], or a partial-sync call failure, runs a
///   full sync when `auto_escalate` is set; otherwise the failure is
///   surfaced directly as [`WardenError::SyncDegraded`] (or the original
///   call error).
/// - Any other non-zero code is an operation failure, never escalated.
/// - A full sync returning a non-positive task id is [`WardenError::SyncFatal`].
pub async fn synchronize_scoped(
    sync: &dyn SyncApi,
    token: &SessionToken,
    scope: &[CredentialId],
    auto_escalate: bool,
) -> Result<()> {
    if scope.is_empty() {
        warn!("empty sync scope; running a full synchronization");
        return synchronize_full(sync, token).await;
    }

    match sync.synchronize_credentials(token, scope).await {
        Ok(0) => Ok(()),
        Ok(code) if should_escalate(code) => {
            if auto_escalate {
                warn!(code, "partial sync degraded; escalating to full sync");
                synchronize_full(sync, token).await
            } else {
                Err(WardenError::SyncDegraded { code })
            }
        }
        Ok(code) => Err(WardenError::operation(
            "partial synchronization",
            format!("remote returned code {code}"),
        )),
        Err(error) => {
            if auto_escalate {
                warn!(%error, "partial sync failed; escalating to full sync");
                synchronize_full(sync, token).await
            } else {
                Err(error)
            }
        }
    }
}

/// Re-push the entire configuration. Non-positive task id is fatal.
pub async fn synchronize_full(sync: &dyn SyncApi, token: &SessionToken) -> Result<()> {
    let result = sync.synchronize_full(token).await?;
    if result > 0 {
        Ok(())
    } else {
        Err(WardenError::SyncFatal { result })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
