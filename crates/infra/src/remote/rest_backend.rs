//! REST adapter for [`RemoteBackend`]
//!
//! | operation     | request                                   |
//! |---------------|-------------------------------------------|
//! | `add`         | `POST {base}/{collection}/{id}[?scope=]`  |
//! | `update`      | `PUT {base}/{collection}/{id}[?scope=]`   |
//! | `delete`      | `DELETE {base}/{collection}/{id}[?scope=]`|
//! | `save_backup` | `POST {base}/backups`                     |
//!
//! Requests carry the identity's access token as a bearer token and the
//! user id in `X-User-Id`. Non-2xx responses become [`RemoteError::Http`];
//! a JSON error body's `code` is folded into the message so it takes part
//! in failure classification.

use std::time::Duration;

use async_trait::async_trait;
use carelog_core::sync::{RemoteBackend, RemoteError, RemoteResult};
use carelog_domain::{CareLogError, EntityRef, Identity, RemoteConfig, Result, Snapshot};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Connection settings for [`RestBackend`]
#[derive(Debug, Clone)]
pub struct RestBackendConfig {
    /// Base URL without a trailing slash
    pub base_url: String,
    pub timeout: Duration,
}

impl From<&RemoteConfig> for RestBackendConfig {
    fn from(config: &RemoteConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// Remote backend reached over HTTP
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl RestBackend {
    /// Build the adapter and its HTTP client.
    ///
    /// # Errors
    /// Returns `CareLogError::Config` when the client cannot be built.
    pub fn new(config: RestBackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CareLogError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    fn entity_url(&self, target: &EntityRef) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            target.kind.collection(),
            urlencoding::encode(&target.entity_id)
        )
    }

    fn request(&self, method: Method, url: &str, identity: &Identity) -> RequestBuilder {
        let mut request = self.client.request(method, url).header("X-User-Id", &identity.user_id);
        if let Some(token) = &identity.access_token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn entity_request(&self, method: Method, identity: &Identity, target: &EntityRef) -> RequestBuilder {
        let request = self.request(method, &self.entity_url(target), identity);
        match &target.scope_id {
            Some(scope) => request.query(&[("scope", scope)]),
            None => request,
        }
    }

    async fn send(request: RequestBuilder) -> RemoteResult<()> {
        let response = request.send().await.map_err(map_transport_error)?;
        check_status(response).await
    }
}

#[async_trait]
impl RemoteBackend for RestBackend {
    #[instrument(skip(self, identity, payload), fields(target = %target))]
    async fn add(&self, identity: &Identity, target: &EntityRef, payload: &Value) -> RemoteResult<()> {
        debug!("POST entity");
        Self::send(self.entity_request(Method::POST, identity, target).json(payload)).await
    }

    #[instrument(skip(self, identity, payload), fields(target = %target))]
    async fn update(
        &self,
        identity: &Identity,
        target: &EntityRef,
        payload: &Value,
    ) -> RemoteResult<()> {
        debug!("PUT entity");
        Self::send(self.entity_request(Method::PUT, identity, target).json(payload)).await
    }

    #[instrument(skip(self, identity), fields(target = %target))]
    async fn delete(&self, identity: &Identity, target: &EntityRef) -> RemoteResult<()> {
        debug!("DELETE entity");
        Self::send(self.entity_request(Method::DELETE, identity, target)).await
    }

    #[instrument(skip_all, fields(snapshot_id = %snapshot.id))]
    async fn save_backup(&self, identity: &Identity, snapshot: &Snapshot) -> RemoteResult<()> {
        let url = format!("{}/backups", self.base_url);
        Self::send(self.request(Method::POST, &url, identity).json(snapshot)).await
    }
}

fn map_transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout(err.to_string())
    } else if err.is_connect() || err.is_request() {
        RemoteError::Network(err.to_string())
    } else {
        RemoteError::Other(err.to_string())
    }
}

async fn check_status(response: Response) -> RemoteResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { code: Some(code), message }) => {
            format!("{code}: {}", message.unwrap_or_default())
        }
        Ok(ErrorBody { code: None, message: Some(message) }) => message,
        _ if body.is_empty() => status.canonical_reason().unwrap_or("request failed").to_string(),
        _ => body,
    };

    warn!(status = status.as_u16(), error = %message, "remote request rejected");
    Err(RemoteError::http(status.as_u16(), message))
}
