//! # warden-settings
//!
//! Layered configuration for the Warden orchestrator:
//!
//! 1. Compiled [`WardenSettings::default()`]
//! 2. Optional `~/.warden/settings.json`, deep-merged over defaults
//! 3. Environment variable overrides (highest priority), strictly parsed
//!
//! Values with operational bounds (the keep-alive interval in particular)
//! are clamped on access, never trusted from the file.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::{ProvisioningSettings, RemoteSettings, SessionSettings, WardenSettings};
