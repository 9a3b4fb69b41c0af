//! HTTP implementation of the remote capability traits.
//!
//! Calls are JSON envelopes posted to per-concern endpoints under a
//! configured base URL:
//!
//! ```text
//! POST {base}/session     {"method": "connect", "token": null, "params": {...}}
//! POST {base}/directory   {"method": "insertPerson", "token": "...", "params": {...}}
//! POST {base}/sync        {"method": "synchronizeCredentials", ...}
//! ```
//!
//! Responses carry either `{"result": ...}` or `{"fault": {"code",
//! "message"}}`. Faults and transport failures map to
//! [`WardenError::Remote`]; remote *result codes* (rejection ids, sync
//! codes) pass through untouched for the workflow layer to interpret.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use warden_core::{
    Credential, CredentialId, Factor, FactorId, FactorType, Group, NewFactor, NewPerson, Person,
    PersonId, Result, SessionToken, WardenError,
};

use crate::accessors::{ClientAccessors, DirectoryApi, SessionApi, SyncApi};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for [`HttpClientAccessors`].
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    /// Base URL of the remote system, without a trailing slash.
    pub base_url: String,
    /// Timeout applied to every remote call.
    pub call_timeout: Duration,
    /// Whether the deployment supports the bulk all-factors call.
    pub bulk_factors: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8892".to_owned(),
            call_timeout: Duration::from_secs(30),
            bulk_factors: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire envelope
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Fault {
    code: Option<String>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<Value>,
    fault: Option<Fault>,
}

/// One remote endpoint (session, directory, or sync) sharing a pooled client.
#[derive(Clone)]
struct Endpoint {
    client: reqwest::Client,
    url: String,
}

impl Endpoint {
    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        token: Option<&SessionToken>,
        params: Value,
    ) -> Result<R> {
        let body = json!({
            "method": method,
            "token": token.map(SessionToken::as_str),
            "params": params,
        });

        debug!(method, url = %self.url, "remote call");
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WardenError::remote(format!("{method}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WardenError::remote(format!(
                "{method}: HTTP {status}: {text}"
            )));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| WardenError::remote(format!("{method}: invalid response: {e}")))?;

        if let Some(fault) = envelope.fault {
            return Err(match fault.code {
                Some(code) => WardenError::remote_fault(fault.message, code),
                None => WardenError::remote(fault.message),
            });
        }

        let value = envelope.result.unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| WardenError::remote(format!("{method}: unexpected result shape: {e}")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Accessors
// ─────────────────────────────────────────────────────────────────────────────

/// Production [`ClientAccessors`] over HTTP.
pub struct HttpClientAccessors {
    session: Arc<HttpSessionApi>,
    directory: Arc<HttpDirectoryApi>,
    sync: Arc<HttpSyncApi>,
}

impl HttpClientAccessors {
    /// Build the accessors from configuration.
    ///
    /// The bulk-factors capability is fixed here, at construction — the
    /// directory handle never probes for it per call.
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.call_timeout)
            .build()
            .map_err(|e| WardenError::remote(format!("building HTTP client: {e}")))?;

        let endpoint = |path: &str| Endpoint {
            client: client.clone(),
            url: format!("{}/{path}", config.base_url.trim_end_matches('/')),
        };

        Ok(Self {
            session: Arc::new(HttpSessionApi {
                endpoint: endpoint("session"),
            }),
            directory: Arc::new(HttpDirectoryApi {
                endpoint: endpoint("directory"),
                bulk_factors: config.bulk_factors,
            }),
            sync: Arc::new(HttpSyncApi {
                endpoint: endpoint("sync"),
            }),
        })
    }
}

impl ClientAccessors for HttpClientAccessors {
    fn session(&self) -> Arc<dyn SessionApi> {
        self.session.clone()
    }

    fn directory(&self) -> Arc<dyn DirectoryApi> {
        self.directory.clone()
    }

    fn sync(&self) -> Arc<dyn SyncApi> {
        self.sync.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session endpoint
// ─────────────────────────────────────────────────────────────────────────────

struct HttpSessionApi {
    endpoint: Endpoint,
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn connect(&self, login: &str, password: &str) -> Result<SessionToken> {
        let token: String = self
            .endpoint
            .call("connect", None, json!({"login": login, "password": password}))
            .await?;
        Ok(SessionToken::new(token))
    }

    async fn disconnect(&self, token: &SessionToken) -> Result<()> {
        let _: Value = self
            .endpoint
            .call("disconnect", Some(token), json!({}))
            .await?;
        Ok(())
    }

    async fn probe(&self, token: &SessionToken) -> Result<Option<String>> {
        self.endpoint.call("getOperator", Some(token), json!({})).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory endpoint
// ─────────────────────────────────────────────────────────────────────────────

struct HttpDirectoryApi {
    endpoint: Endpoint,
    bulk_factors: bool,
}

#[async_trait]
impl DirectoryApi for HttpDirectoryApi {
    async fn insert_person(&self, token: &SessionToken, person: &NewPerson) -> Result<i64> {
        let params = serde_json::to_value(person)
            .map_err(|e| WardenError::remote(format!("insertPerson: encoding params: {e}")))?;
        self.endpoint.call("insertPerson", Some(token), params).await
    }

    async fn person_by_id(&self, token: &SessionToken, id: PersonId) -> Result<Option<Person>> {
        self.endpoint
            .call("getPerson", Some(token), json!({"id": id}))
            .await
    }

    async fn person_by_external_ref(
        &self,
        token: &SessionToken,
        external_ref: &str,
    ) -> Result<Option<Person>> {
        self.endpoint
            .call(
                "getPersonByExternalRef",
                Some(token),
                json!({"externalRef": external_ref}),
            )
            .await
    }

    async fn all_persons(&self, token: &SessionToken) -> Result<Vec<Person>> {
        self.endpoint.call("getAllPersons", Some(token), json!({})).await
    }

    async fn update_person(&self, token: &SessionToken, person: &Person) -> Result<i64> {
        let params = serde_json::to_value(person)
            .map_err(|e| WardenError::remote(format!("updatePerson: encoding params: {e}")))?;
        self.endpoint.call("updatePerson", Some(token), params).await
    }

    async fn delete_person(
        &self,
        token: &SessionToken,
        id: PersonId,
        unlink_related: bool,
    ) -> Result<i64> {
        self.endpoint
            .call(
                "deletePerson",
                Some(token),
                json!({"id": id, "unlinkRelated": unlink_related}),
            )
            .await
    }

    async fn person_credentials(
        &self,
        token: &SessionToken,
        id: PersonId,
    ) -> Result<Vec<Credential>> {
        self.endpoint
            .call("getPersonCredentials", Some(token), json!({"personId": id}))
            .await
    }

    async fn all_credentials(&self, token: &SessionToken) -> Result<Vec<Credential>> {
        self.endpoint
            .call("getAllCredentials", Some(token), json!({}))
            .await
    }

    async fn insert_credential(&self, token: &SessionToken, name: &str) -> Result<i64> {
        self.endpoint
            .call("insertCredential", Some(token), json!({"name": name}))
            .await
    }

    async fn delete_credential(
        &self,
        token: &SessionToken,
        id: CredentialId,
        unlink_related: bool,
    ) -> Result<i64> {
        self.endpoint
            .call(
                "deleteCredential",
                Some(token),
                json!({"id": id, "unlinkRelated": unlink_related}),
            )
            .await
    }

    async fn assign_credential(
        &self,
        token: &SessionToken,
        credential: CredentialId,
        person: PersonId,
    ) -> Result<i64> {
        self.endpoint
            .call(
                "assignCredential",
                Some(token),
                json!({"credentialId": credential, "personId": person}),
            )
            .await
    }

    async fn unassign_credential(
        &self,
        token: &SessionToken,
        credential: CredentialId,
        person: PersonId,
    ) -> Result<i64> {
        self.endpoint
            .call(
                "unassignCredential",
                Some(token),
                json!({"credentialId": credential, "personId": person}),
            )
            .await
    }

    async fn factor_types(&self, token: &SessionToken) -> Result<Vec<FactorType>> {
        self.endpoint
            .call("getFactorTypes", Some(token), json!({}))
            .await
    }

    async fn insert_factor(&self, token: &SessionToken, factor: &NewFactor) -> Result<i64> {
        let params = serde_json::to_value(factor)
            .map_err(|e| WardenError::remote(format!("insertFactor: encoding params: {e}")))?;
        self.endpoint.call("insertFactor", Some(token), params).await
    }

    async fn remove_factor(&self, token: &SessionToken, id: FactorId) -> Result<i64> {
        self.endpoint
            .call("removeFactor", Some(token), json!({"id": id}))
            .await
    }

    async fn factors_by_credential(
        &self,
        token: &SessionToken,
        id: CredentialId,
    ) -> Result<Vec<Factor>> {
        self.endpoint
            .call(
                "getFactorsByCredential",
                Some(token),
                json!({"credentialId": id}),
            )
            .await
    }

    async fn all_factors(&self, token: &SessionToken) -> Result<Option<Vec<Factor>>> {
        if !self.bulk_factors {
            return Ok(None);
        }
        let factors: Vec<Factor> = self
            .endpoint
            .call("getAllFactors", Some(token), json!({}))
            .await?;
        Ok(Some(factors))
    }

    async fn unassigned_credentials(&self, token: &SessionToken) -> Result<Vec<Credential>> {
        self.endpoint
            .call("getUnassignedCredentials", Some(token), json!({}))
            .await
    }

    async fn all_groups(&self, token: &SessionToken) -> Result<Vec<Group>> {
        self.endpoint.call("getAllGroups", Some(token), json!({})).await
    }

    async fn last_error(&self, token: &SessionToken) -> Result<Option<String>> {
        self.endpoint.call("getLastError", Some(token), json!({})).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sync endpoint
// ─────────────────────────────────────────────────────────────────────────────

struct HttpSyncApi {
    endpoint: Endpoint,
}

#[async_trait]
impl SyncApi for HttpSyncApi {
    async fn synchronize_credentials(
        &self,
        token: &SessionToken,
        ids: &[CredentialId],
    ) -> Result<i32> {
        self.endpoint
            .call(
                "synchronizeCredentials",
                Some(token),
                json!({"credentialIds": ids}),
            )
            .await
    }

    async fn synchronize_full(&self, token: &SessionToken) -> Result<i64> {
        self.endpoint
            .call("synchronizeFull", Some(token), json!({}))
            .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
