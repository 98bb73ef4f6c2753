//! ARM Client
//!
//! Main client for Resource Manager calls, combining the HTTP transport with
//! the polling and pagination settings from [`Config`].

use super::http::{ArmHttpClient, Request, Response, Transport};
use crate::config::Config;
use crate::error::{PaginationError, PollError, TransportError};
use crate::pagination::{self, ListOptions, Page};
use crate::pollers::{self, Poller};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Query parameter every Resource Manager call carries
const API_VERSION_PARAM: &str = "api-version";

/// Main Resource Manager client
#[derive(Clone)]
pub struct ArmClient {
    transport: Arc<dyn Transport>,
    pub config: Config,
}

impl ArmClient {
    /// Create a client that authenticates with an already-acquired token
    pub fn new(config: Config, token: &str) -> Result<Self, TransportError> {
        let http = ArmHttpClient::new(&config.http)?.with_bearer_token(token);
        Ok(Self::with_transport(Arc::new(http), config))
    }

    /// Create a client over any transport
    pub fn with_transport(transport: Arc<dyn Transport>, config: Config) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Absolute URL for a resource id or path under the configured endpoint.
    /// Absolute URLs are kept as they are.
    pub fn resource_url(&self, id: &str, api_version: &str) -> Result<String, TransportError> {
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: id.to_string(),
            reason,
        };

        let endpoint =
            url::Url::parse(&self.config.http.endpoint).map_err(|e| invalid(e.to_string()))?;
        let mut url = endpoint.join(id).map_err(|e| invalid(e.to_string()))?;

        let has_version = url.query_pairs().any(|(k, _)| k == API_VERSION_PARAM);
        if !has_version {
            url.query_pairs_mut()
                .append_pair(API_VERSION_PARAM, api_version);
        }

        Ok(url.into())
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Read a resource
    pub async fn get(&self, id: &str, api_version: &str) -> Result<Response, TransportError> {
        let url = self.resource_url(id, api_version)?;
        self.transport.send(Request::get(&url)).await
    }

    /// Start a possibly long-running operation against a resource
    pub async fn begin(
        &self,
        method: Method,
        id: &str,
        api_version: &str,
        body: Option<Value>,
    ) -> Result<Poller, PollError> {
        let url = self.resource_url(id, api_version)?;
        let mut request = Request::new(method, &url);
        request.body = body;

        pollers::submit(self.transport(), request, self.config.poller.clone()).await
    }

    /// Create or update a resource
    pub async fn begin_put(
        &self,
        id: &str,
        api_version: &str,
        body: Value,
    ) -> Result<Poller, PollError> {
        self.begin(Method::PUT, id, api_version, Some(body)).await
    }

    /// Delete a resource
    pub async fn begin_delete(&self, id: &str, api_version: &str) -> Result<Poller, PollError> {
        self.begin(Method::DELETE, id, api_version, None).await
    }

    /// First page of a list endpoint
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<Page<T>, PaginationError> {
        let url = self.resource_url(path, api_version)?;
        let options = ListOptions::from(&self.config.pagination);
        pagination::list(self.transport(), &url, options).await
    }
}
