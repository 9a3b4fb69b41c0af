//! Settings type definitions with serde defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounds for the keep-alive interval in minutes.
pub const KEEP_ALIVE_MIN_MINUTES: u64 = 1;
/// Upper bound for the keep-alive interval in minutes.
pub const KEEP_ALIVE_MAX_MINUTES: u64 = 30;

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardenSettings {
    /// Remote system connection settings.
    #[serde(default)]
    pub remote: RemoteSettings,
    /// Session lifecycle settings.
    #[serde(default)]
    pub session: SessionSettings,
    /// Provisioning workflow settings.
    #[serde(default)]
    pub provisioning: ProvisioningSettings,
}

/// Remote system connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSettings {
    /// Base URL of the remote access-control system.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for each remote call in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Service account login.
    #[serde(default = "default_login")]
    pub login: String,
    /// Service account password.
    #[serde(default)]
    pub password: String,
    /// Whether the deployment supports the bulk all-factors call.
    #[serde(default = "default_true")]
    pub bulk_factors: bool,
}

/// Session lifecycle settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    /// Keep-alive probe interval in minutes. Clamped to 1–30 on access.
    #[serde(default = "default_keep_alive_minutes")]
    pub keep_alive_minutes: u64,
}

/// Provisioning workflow settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningSettings {
    /// Preferred factor type name, matched case-insensitively.
    #[serde(default = "default_preferred_factor_type")]
    pub preferred_factor_type: String,
    /// Factor type id used when no type matches the preferred name.
    #[serde(default = "default_fallback_factor_type_id")]
    pub fallback_factor_type_id: i64,
}

fn default_base_url() -> String {
    "http://localhost:8892".to_owned()
}
fn default_call_timeout_ms() -> u64 {
    30_000
}
fn default_login() -> String {
    "admin".to_owned()
}
fn default_true() -> bool {
    true
}
fn default_keep_alive_minutes() -> u64 {
    5
}
fn default_preferred_factor_type() -> String {
    "Card number (DEC)".to_owned()
}
fn default_fallback_factor_type_id() -> i64 {
    1
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            call_timeout_ms: default_call_timeout_ms(),
            login: default_login(),
            password: String::new(),
            bulk_factors: true,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            keep_alive_minutes: default_keep_alive_minutes(),
        }
    }
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            preferred_factor_type: default_preferred_factor_type(),
            fallback_factor_type_id: default_fallback_factor_type_id(),
        }
    }
}

impl RemoteSettings {
    /// Per-call timeout as a [`Duration`].
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl SessionSettings {
    /// Keep-alive interval, clamped to the 1–30 minute operational range.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        let minutes = self
            .keep_alive_minutes
            .clamp(KEEP_ALIVE_MIN_MINUTES, KEEP_ALIVE_MAX_MINUTES);
        Duration::from_secs(minutes * 60)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
