//! Error hierarchy for the Warden orchestrator.
//!
//! One domain error type, [`WardenError`], covers every failure class the
//! session and workflow layers deal with:
//!
//! - `SessionExpired`: the shared token went stale mid-call
//! - `Operation`: a remote call signalled rejection (non-positive/non-zero
//!   result), annotated with the remote's own last-error text when available
//! - `SyncDegraded`: partial synchronization returned a failure code
//! - `SyncFatal`: full synchronization failed — never silently absorbed
//! - `NotFound`: a required person/credential lookup came up empty
//! - `Validation`: malformed input rejected before any remote call
//! - `Remote`: raw transport/fault failure from the client layer
//!
//! Session-expiry *detection* does not live here — see [`crate::classify`].

use thiserror::Error;

/// Result type alias used across all Warden crates.
pub type Result<T> = std::result::Result<T, WardenError>;

/// Top-level error type for the Warden orchestrator.
#[derive(Debug, Error)]
pub enum WardenError {
    /// The shared session token expired or was invalidated remotely.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// A remote operation signalled rejection.
    #[error("{operation} failed: {message}")]
    Operation {
        /// The attempted operation, e.g. `"insert person"`.
        operation: String,
        /// Failure detail, preferring the remote's last-error text.
        message: String,
    },

    /// Partial synchronization returned a non-zero code that was not
    /// (or could not be) recovered by escalation.
    #[error("partial synchronization returned code {code}")]
    SyncDegraded {
        /// The remote partial-sync result code.
        code: i32,
    },

    /// Full synchronization failed. Always fatal.
    #[error("full synchronization failed with result {result}")]
    SyncFatal {
        /// The non-positive remote full-sync result.
        result: i64,
    },

    /// A lookup that the workflow requires found nothing.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind, e.g. `"person"`.
        entity: String,
        /// The lookup key that matched nothing.
        key: String,
    },

    /// Input rejected before any remote call was made.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A remote call failed at the transport or fault level.
    #[error("remote call failed: {message}")]
    Remote {
        /// Transport or fault description.
        message: String,
        /// Remote fault code, if the failure carried one.
        fault_code: Option<String>,
    },
}

impl WardenError {
    /// A remote operation rejection.
    #[must_use]
    pub fn operation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// A required lookup that found nothing.
    #[must_use]
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// A transport-level failure without a fault code.
    #[must_use]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            fault_code: None,
        }
    }

    /// A remote fault with a code.
    #[must_use]
    pub fn remote_fault(message: impl Into<String>, fault_code: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            fault_code: Some(fault_code.into()),
        }
    }

    /// The textual content used for heuristic failure classification.
    #[must_use]
    pub fn failure_text(&self) -> &str {
        match self {
            Self::SessionExpired(message) | Self::Validation(message) => message,
            Self::Operation { message, .. } | Self::Remote { message, .. } => message,
            Self::SyncDegraded { .. } | Self::SyncFatal { .. } | Self::NotFound { .. } => "",
        }
    }

    /// The remote fault code, if any.
    #[must_use]
    pub fn fault_code(&self) -> Option<&str> {
        match self {
            Self::Remote { fault_code, .. } => fault_code.as_deref(),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_display_includes_both_parts() {
        let err = WardenError::operation("insert person", "duplicate external ref");
        assert_eq!(err.to_string(), "insert person failed: duplicate external ref");
    }

    #[test]
    fn not_found_display() {
        let err = WardenError::not_found("person", "EMP-42");
        assert_eq!(err.to_string(), "person not found: EMP-42");
    }

    #[test]
    fn remote_fault_carries_code() {
        let err = WardenError::remote_fault("fault from server", "a:SessionFault");
        assert_eq!(err.fault_code(), Some("a:SessionFault"));
        assert_eq!(err.failure_text(), "fault from server");
    }

    #[test]
    fn remote_without_code() {
        let err = WardenError::remote("connection refused");
        assert_eq!(err.fault_code(), None);
    }

    #[test]
    fn failure_text_for_structured_variants_is_empty() {
        assert_eq!(WardenError::SyncDegraded { code: 255 }.failure_text(), "");
        assert_eq!(WardenError::SyncFatal { result: -1 }.failure_text(), "");
        assert_eq!(WardenError::not_found("person", "x").failure_text(), "");
    }

    #[test]
    fn is_std_error() {
        let err = WardenError::Validation("empty card value".into());
        let _: &dyn std::error::Error = &err;
    }
}
