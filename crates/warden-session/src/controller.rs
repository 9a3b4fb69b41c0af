//! The session controller: one valid token, shared by all callers.
//!
//! State machine: `Disconnected → Connecting → Active`, driven by the
//! background lifecycle task and by callers detecting expiry. All token
//! writes happen under one connect lock held only for the duration of a
//! connect/disconnect/reconnect call — never across a business workflow.
//! Concurrent callers arriving while a connect is in flight wait for it
//! instead of issuing a duplicate connect.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use warden_client::ClientAccessors;
use warden_core::backoff;
use warden_core::{Result, SessionToken};

/// Service-account credentials used for every connect.
#[derive(Clone)]
pub struct ServiceAccount {
    /// Login of the service account.
    pub login: String,
    /// Password of the service account.
    pub password: String,
}

impl std::fmt::Debug for ServiceAccount {
    // Redacted: credentials must not end up in logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("login", &self.login)
            .field("password", &"..")
            .finish()
    }
}

/// Owns the single live session token for the remote system.
///
/// Exactly one instance exists per process. Callers obtain tokens through
/// [`get_token`](Self::get_token) and force recovery through
/// [`refresh_token`](Self::refresh_token); raw access is never exposed.
pub struct SessionController {
    accessors: Arc<dyn ClientAccessors>,
    account: ServiceAccount,
    token: RwLock<Option<SessionToken>>,
    // Serializes connect/disconnect/reconnect. Never held across a workflow.
    connect_lock: Mutex<()>,
}

impl SessionController {
    /// Create a controller. The token starts absent; the first caller (or
    /// the lifecycle task) establishes it.
    #[must_use]
    pub fn new(accessors: Arc<dyn ClientAccessors>, account: ServiceAccount) -> Arc<Self> {
        Arc::new(Self {
            accessors,
            account,
            token: RwLock::new(None),
            connect_lock: Mutex::new(()),
        })
    }

    /// Current token if active, otherwise a guarded connect.
    ///
    /// Never yields an absent token: on return the caller holds a token the
    /// remote issued, though it may still expire at any moment afterwards.
    pub async fn get_token(&self) -> Result<SessionToken> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.guarded_connect().await
    }

    /// Force disconnect-then-reconnect regardless of current state.
    ///
    /// Used when a caller has independently detected the token is stale.
    /// Serialized with all other connect activity by the connect lock.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<SessionToken> {
        let _guard = self.connect_lock.lock().await;
        let session = self.accessors.session();

        if let Some(stale) = self.token.write().await.take() {
            if let Err(error) = session.disconnect(&stale).await {
                warn!(%error, "disconnect of stale token failed");
            }
        }

        let token = session
            .connect(&self.account.login, &self.account.password)
            .await?;
        *self.token.write().await = Some(token.clone());
        info!("session reconnected");
        Ok(token)
    }

    /// Best-effort disconnect of the active token. Never fails: disconnect
    /// errors are logged and swallowed so they cannot block shutdown.
    pub async fn shutdown(&self) {
        let _guard = self.connect_lock.lock().await;
        if let Some(token) = self.token.write().await.take() {
            if let Err(error) = self.accessors.session().disconnect(&token).await {
                warn!(%error, "disconnect failed during shutdown");
            } else {
                debug!("session disconnected");
            }
        }
    }

    async fn guarded_connect(&self) -> Result<SessionToken> {
        let _guard = self.connect_lock.lock().await;

        // A connect may have completed while we waited for the lock.
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }

        let token = self
            .accessors
            .session()
            .connect(&self.account.login, &self.account.password)
            .await?;
        *self.token.write().await = Some(token.clone());
        info!("session established");
        Ok(token)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Background lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Spawn the background lifecycle task.
    ///
    /// Runs for the process lifetime: connects initially (exponential
    /// backoff with jitter until connected or cancelled), then probes the
    /// session every `keep_alive` and reconnects on any probe failure.
    /// Cancellation stops the loop and performs a best-effort disconnect.
    pub fn spawn_lifecycle(
        self: &Arc<Self>,
        keep_alive: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move { controller.run_lifecycle(keep_alive, cancel).await })
    }

    async fn run_lifecycle(&self, keep_alive: Duration, cancel: CancellationToken) {
        // Initial connect: retry with backoff until connected or cancelled.
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return;
            }
            match self.get_token().await {
                Ok(_) => break,
                Err(error) => {
                    let delay = backoff::connect_delay(attempt, rand::random::<f64>());
                    warn!(%error, attempt, delay_ms = delay.as_millis() as u64, "initial connect failed");
                    attempt = attempt.saturating_add(1);
                    tokio::select! {
                        () = cancel.cancelled() => return,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
        debug!("entering keep-alive loop");

        // Steady state: probe on the keep-alive interval; any failure means
        // reconnect, never loop termination.
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(keep_alive) => {}
            }
            if let Err(error) = self.keep_alive_probe().await {
                warn!(%error, "keep-alive could not restore the session");
            }
        }

        self.shutdown().await;
    }

    /// One keep-alive round: probe the session, reconnect if it looks dead.
    async fn keep_alive_probe(&self) -> Result<()> {
        let token = self.get_token().await?;
        match self.accessors.session().probe(&token).await {
            Ok(Some(operator)) if !operator.is_empty() => {
                debug!(%operator, "session alive");
                Ok(())
            }
            Ok(_) => {
                warn!("probe returned no operator identity; reconnecting");
                self.refresh_token().await.map(|_| ())
            }
            Err(error) => {
                warn!(%error, "probe failed; reconnecting");
                self.refresh_token().await.map(|_| ())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
