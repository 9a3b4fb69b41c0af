//! The retry-once-on-expiry envelope around workflows.
//!
//! Every workflow runs inside [`SessionRetryRunner::run_with_retry`]: obtain
//! the current token, run the action, and if the failure classifies as an
//! expired session, refresh the token and run the action exactly once more.
//! Operational failures propagate unmodified, and a second expiry after a
//! fresh connect does too — one recovery attempt per workflow, no loops.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use warden_core::classify::{FailureClassifier, FailureKind, TextHeuristicClassifier};
use warden_core::{Result, SessionToken};

use crate::controller::SessionController;

/// Wraps workflow actions in the "recover once from session expiry" policy.
///
/// Holds the shared [`SessionController`] and a [`FailureClassifier`]; the
/// classifier decides which failures a reconnect can fix.
pub struct SessionRetryRunner {
    controller: Arc<SessionController>,
    classifier: Arc<dyn FailureClassifier>,
}

impl SessionRetryRunner {
    /// Create a runner with the default textual classifier.
    #[must_use]
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self::with_classifier(controller, Arc::new(TextHeuristicClassifier))
    }

    /// Create a runner with a custom classifier.
    #[must_use]
    pub fn with_classifier(
        controller: Arc<SessionController>,
        classifier: Arc<dyn FailureClassifier>,
    ) -> Self {
        Self {
            controller,
            classifier,
        }
    }

    /// The shared session controller this runner recovers through.
    #[must_use]
    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// Run `action` with the current session token, recovering once from
    /// session expiry.
    ///
    /// `action` must be safe to invoke a second time: workflows are written
    /// so that each remote step either completed or left nothing behind
    /// before the failure surfaced.
    pub async fn run_with_retry<T, F, Fut>(&self, operation: &str, action: F) -> Result<T>
    where
        F: Fn(SessionToken) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let token = self.controller.get_token().await?;
        match action(token).await {
            Ok(value) => Ok(value),
            Err(error) => match self.classifier.classify(&error) {
                FailureKind::Operational => Err(error),
                FailureKind::SessionExpired => {
                    warn!(operation, %error, "session expired mid-operation; reconnecting");
                    let fresh = self.controller.refresh_token().await?;
                    debug!(operation, "re-running after reconnect");
                    action(fresh).await
                }
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use warden_client::{ClientAccessors, DirectoryApi, SessionApi, SyncApi};
    use warden_core::{Result, SessionToken, WardenError};

    use super::*;
    use crate::controller::ServiceAccount;

    struct FakeSession {
        connects: AtomicUsize,
    }

    #[async_trait]
    impl SessionApi for FakeSession {
        async fn connect(&self, _login: &str, _password: &str) -> Result<SessionToken> {
            let n = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(SessionToken::new(format!("token-{n}")))
        }

        async fn disconnect(&self, _token: &SessionToken) -> Result<()> {
            Ok(())
        }

        async fn probe(&self, _token: &SessionToken) -> Result<Option<String>> {
            Ok(Some("svc".to_owned()))
        }
    }

    struct FakeAccessors {
        session: Arc<FakeSession>,
    }

    impl FakeAccessors {
        fn new() -> Self {
            Self {
                session: Arc::new(FakeSession {
                    connects: AtomicUsize::new(0),
                }),
            }
        }
    }

    impl ClientAccessors for FakeAccessors {
        fn session(&self) -> Arc<dyn SessionApi> {
            self.session.clone()
        }

        fn directory(&self) -> Arc<dyn DirectoryApi> {
            unreachable!("retry tests never touch the directory")
        }

        fn sync(&self) -> Arc<dyn SyncApi> {
            unreachable!("retry tests never touch sync")
        }
    }

    fn runner() -> (SessionRetryRunner, Arc<FakeSession>) {
        let accessors = Arc::new(FakeAccessors::new());
        let session = accessors.session.clone();
        let controller = SessionController::new(
            accessors,
            ServiceAccount {
                login: "svc".to_owned(),
                password: "secret".to_owned(),
            },
        );
        (SessionRetryRunner::new(controller), session)
    }

    fn expired() -> WardenError {
        WardenError::remote("The session has expired. Please log in again.")
    }

    #[tokio::test]
    async fn success_needs_one_attempt() {
        let (runner, session) = runner();
        let attempts = AtomicUsize::new(0);

        let result = runner
            .run_with_retry("probe", |_token| async {
                let _ = attempts.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(session.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expiry_reconnects_and_reruns_once() {
        let (runner, session) = runner();
        let attempts = AtomicUsize::new(0);

        let result = runner
            .run_with_retry("insert person", |token| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(expired())
                    } else {
                        Ok(token.as_str().to_owned())
                    }
                }
            })
            .await
            .unwrap();

        // The rerun saw the token from the second connect.
        assert_eq!(result, "token-2");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(session.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_expiry_is_final() {
        let (runner, session) = runner();
        let attempts = AtomicUsize::new(0);

        let result: Result<()> = runner
            .run_with_retry("insert person", |_token| {
                let _ = attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(expired()) }
            })
            .await;

        assert_matches!(result, Err(WardenError::Remote { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(session.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn operational_failure_is_not_retried() {
        let (runner, session) = runner();
        let attempts = AtomicUsize::new(0);

        let result: Result<()> = runner
            .run_with_retry("delete person", |_token| {
                let _ = attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(WardenError::operation("delete person", "result -1")) }
            })
            .await;

        assert_matches!(result, Err(WardenError::Operation { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(session.connects.load(Ordering::SeqCst), 1);
    }
}
