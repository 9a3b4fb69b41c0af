//! Domain types mirrored from the remote access-control system.
//!
//! Every remote entity has a distinct integer id type implemented as a
//! newtype wrapper around `i64`. This prevents accidentally passing a
//! person id where a credential id is expected — an easy mistake when every
//! remote call traffics in bare integers.
//!
//! The [`SessionToken`] is the one piece of state this layer owns: an opaque
//! identifier returned by the remote connect call and replaced atomically on
//! reconnect. Its `Debug` impl is redacted so tokens never leak into logs.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw remote id.
            #[must_use]
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Return the raw remote id.
            #[must_use]
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

remote_id! {
    /// Remote primary key of a person.
    PersonId
}

remote_id! {
    /// Remote primary key of a credential.
    CredentialId
}

remote_id! {
    /// Remote primary key of an authentication factor.
    FactorId
}

remote_id! {
    /// Remote primary key of a factor type (e.g. a card format).
    FactorTypeId
}

remote_id! {
    /// Remote primary key of an access group.
    GroupId
}

// ─────────────────────────────────────────────────────────────────────────────
// SessionToken
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque session token issued by the remote connect call.
///
/// Exactly one lives in the process at a time, owned by the session
/// controller. Callers receive clones and must never cache them across
/// workflow invocations.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Return the raw token value for embedding in a remote call.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    // Redacted: tokens must not end up in logs or error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────────────────────────

/// A person as stored in the remote directory.
///
/// Keyed by [`Person::external_ref`] (the business-system identifier, e.g.
/// an ERP id) for all lookups this layer performs; the remote does not
/// enforce uniqueness of that key, so lookups assume at most one match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Remote primary key.
    pub id: PersonId,
    /// Business-system identifier (not the remote primary key).
    pub external_ref: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Access group, if any.
    pub group_id: Option<GroupId>,
}

/// Fields for inserting a new person.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    /// Business-system identifier.
    pub external_ref: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Access group, if any.
    pub group_id: Option<GroupId>,
}

/// A named container of authentication factors, assignable to one person.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Remote primary key.
    pub id: CredentialId,
    /// Human-readable name, unique (case-insensitively) in its scope.
    pub name: String,
}

/// A single authentication factor (e.g. an access card) bound to a credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Factor {
    /// Remote primary key.
    pub id: FactorId,
    /// Owning credential.
    pub credential_id: CredentialId,
    /// Factor type (card format).
    pub factor_type_id: FactorTypeId,
    /// Normalized numeric value (digits only, no leading zeros).
    pub value: String,
}

/// Fields for inserting a new factor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFactor {
    /// Owning credential.
    pub credential_id: CredentialId,
    /// Factor type (card format).
    pub factor_type_id: FactorTypeId,
    /// Normalized numeric value.
    pub value: String,
}

/// A factor type the remote system supports (e.g. a card bit format).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorType {
    /// Remote primary key.
    pub id: FactorTypeId,
    /// Display name.
    pub name: String,
}

/// An access group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Remote primary key.
    pub id: GroupId,
    /// Display name.
    pub name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_ids_are_distinct_types() {
        let person = PersonId::new(7);
        let credential = CredentialId::new(7);
        assert_eq!(person.get(), credential.get());
        // The two ids do not compare — distinct types by construction.
    }

    #[test]
    fn remote_id_display_and_conversions() {
        let id = CredentialId::from(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn remote_id_serde_transparent() {
        let id = PersonId::new(9);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "9");
        let back: PersonId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn session_token_debug_is_redacted() {
        let token = SessionToken::new("very-secret");
        let debug = format!("{token:?}");
        assert!(!debug.contains("very-secret"));
        assert_eq!(token.as_str(), "very-secret");
    }

    #[test]
    fn person_serde_camel_case() {
        let person = Person {
            id: PersonId::new(1),
            external_ref: "EMP-100".into(),
            first_name: "Jan".into(),
            last_name: "Kowalski".into(),
            group_id: Some(GroupId::new(3)),
        };
        let json = serde_json::to_value(&person).unwrap();
        assert!(json.get("externalRef").is_some());
        assert!(json.get("firstName").is_some());
        assert!(json.get("groupId").is_some());
    }

    #[test]
    fn factor_serde_roundtrip() {
        let factor = Factor {
            id: FactorId::new(5),
            credential_id: CredentialId::new(2),
            factor_type_id: FactorTypeId::new(1),
            value: "1234".into(),
        };
        let json = serde_json::to_string(&factor).unwrap();
        let back: Factor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, factor);
    }
}
