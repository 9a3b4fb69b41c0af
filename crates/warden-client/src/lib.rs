//! # warden-client
//!
//! The remote access-control system surface, grouped by concern:
//!
//! - [`SessionApi`]: connect / disconnect / probe
//! - [`DirectoryApi`]: persons, credentials, factors, groups
//! - [`SyncApi`]: partial and full configuration synchronization
//! - [`ClientAccessors`]: factory producing short-lived call handles bound
//!   to one of the endpoints
//!
//! The orchestration core depends on these traits only; tests substitute
//! in-memory fakes and production wires up [`HttpClientAccessors`].

#![deny(unsafe_code)]

pub mod accessors;
pub mod http;

pub use accessors::{ClientAccessors, DirectoryApi, SessionApi, SyncApi};
pub use http::{HttpClientAccessors, HttpClientConfig};
