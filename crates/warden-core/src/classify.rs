//! Failure classification for session-expiry recovery.
//!
//! The remote system does not report token expiry with a dedicated status;
//! it surfaces as a fault whose text (or fault code) mentions the session.
//! The retry layer needs a yes/no answer — "is this failure recoverable by
//! reconnecting?" — so classification is isolated behind one trait here.
//! The default implementation matches a fixed substring set; a deployment
//! with structured fault codes can swap in its own classifier without
//! touching session or workflow code.

use crate::errors::WardenError;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Classification of a workflow failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The shared session token went stale; recoverable by reconnecting once.
    SessionExpired,
    /// Any other failure; propagated to the caller.
    Operational,
}

/// Decides whether a failure indicates an expired session.
pub trait FailureClassifier: Send + Sync {
    /// Classify a failure raised by a remote operation.
    fn classify(&self, error: &WardenError) -> FailureKind;
}

// ─────────────────────────────────────────────────────────────────────────────
// Default textual heuristic
// ─────────────────────────────────────────────────────────────────────────────

/// Substrings (lowercase) in a failure's text that indicate an expired or
/// invalidated session. Known to be brittle across remote versions; kept
/// behind [`FailureClassifier`] for that reason.
const SESSION_EXPIRED_MARKERS: &[&str] = &[
    "session expired",
    "session has expired",
    "session is invalid",
    "invalid session",
    "session token",
    "session not found",
    "not logged in",
    "expired token",
];

/// Default classifier: substring heuristic over the failure's text, plus a
/// fault-code check for codes that mention the session.
#[derive(Clone, Debug, Default)]
pub struct TextHeuristicClassifier;

impl FailureClassifier for TextHeuristicClassifier {
    fn classify(&self, error: &WardenError) -> FailureKind {
        if matches!(error, WardenError::SessionExpired(_)) {
            return FailureKind::SessionExpired;
        }

        if let Some(code) = error.fault_code() {
            if code.to_lowercase().contains("session") {
                return FailureKind::SessionExpired;
            }
        }

        let text = error.failure_text().to_lowercase();
        if !text.is_empty()
            && SESSION_EXPIRED_MARKERS
                .iter()
                .any(|marker| text.contains(marker))
        {
            return FailureKind::SessionExpired;
        }

        FailureKind::Operational
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
