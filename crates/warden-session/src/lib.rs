//! # warden-session
//!
//! Lifecycle of the single shared session token.
//!
//! The remote access-control system offers no durable session recovery:
//! callers must hold a token, detect when it silently expires, reconnect,
//! and re-issue the failed step. This crate concentrates all of that in two
//! places:
//!
//! - [`SessionController`]: owns the one token process-wide — guarded lazy
//!   connect, forced refresh, background keep-alive with reconnect-on-failure
//! - [`SessionRetryRunner`]: wraps each workflow in a "use current session,
//!   recover once from expiry" envelope
//!
//! Workflow code never inspects tokens or classifies failures itself.

#![deny(unsafe_code)]

pub mod controller;
pub mod retry;

pub use controller::{ServiceAccount, SessionController};
pub use retry::SessionRetryRunner;
