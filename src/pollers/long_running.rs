//! Built-in polling strategies
//!
//! Resource Manager signals an asynchronous operation in one of three ways:
//!
//! - an `Azure-AsyncOperation` header pointing at a status resource whose
//!   body carries `status` and, on failure, `error`;
//! - a `Location` header on a 201/202 that keeps answering 202 until done;
//! - a resource body whose `properties.provisioningState` is not terminal.
//!
//! [`submit`] sends the initiating request and picks the matching strategy.

use super::{PollResult, PollerType, PollingStatus, Poller};
use crate::arm::http::{Request, Response, Transport};
use crate::config::PollerConfig;
use crate::error::{PollError, TransportError};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
const LOCATION_HEADER: &str = "location";

/// Issue the initiating call and return a poller for the operation.
/// Operations that complete synchronously yield an already-terminal poller.
pub async fn submit(
    transport: Arc<dyn Transport>,
    request: Request,
    config: PollerConfig,
) -> Result<Poller, PollError> {
    let method = request.method.clone();
    let url = request.url.clone();
    let response = transport.send(request).await?;

    if !response.is_success() {
        return Err(unexpected(response));
    }

    let suggested = response.retry_after();

    if let Some(status_url) = response.header(ASYNC_OPERATION_HEADER) {
        let status_url = resolve(&url, status_url)?;
        let final_url = match response.header(LOCATION_HEADER) {
            Some(location) => Some(resolve(&url, location)?),
            None if method == Method::PUT || method == Method::PATCH => Some(url.clone()),
            None => None,
        };
        tracing::debug!("{} {} is asynchronous, polling {}", method, url, status_url);

        let poller_type = AsyncOperationPoller::new(transport, &status_url, final_url);
        return Ok(Poller::new(poller_type, config).with_initial_interval(suggested));
    }

    if matches!(response.status, 201 | 202) {
        if let Some(location) = response.header(LOCATION_HEADER) {
            let location = resolve(&url, location)?;
            tracing::debug!("{} {} accepted, polling {}", method, url, location);

            let poller_type = LocationPoller::new(transport, &location);
            return Ok(Poller::new(poller_type, config).with_initial_interval(suggested));
        }
    }

    if method == Method::PUT || method == Method::PATCH {
        let state = provisioning_state(response.body.as_ref());
        if state.is_some_and(|s| !s.is_terminal()) {
            tracing::debug!("{} {} is provisioning, polling the resource", method, url);

            let poller_type = ProvisioningStatePoller::new(transport, &url);
            return Ok(Poller::new(poller_type, config).with_initial_interval(suggested));
        }
    }

    Ok(Poller::completed(response.body, config))
}

/// Polls an `Azure-AsyncOperation` status resource
pub struct AsyncOperationPoller {
    transport: Arc<dyn Transport>,
    status_url: String,
    /// Resource read once the operation succeeds
    final_url: Option<String>,
}

impl AsyncOperationPoller {
    pub fn new(transport: Arc<dyn Transport>, status_url: &str, final_url: Option<String>) -> Self {
        Self {
            transport,
            status_url: status_url.to_string(),
            final_url,
        }
    }
}

#[async_trait]
impl PollerType for AsyncOperationPoller {
    async fn poll(&mut self) -> Result<PollResult, PollError> {
        let response = self.transport.send(Request::get(&self.status_url)).await?;
        if !response.is_success() {
            return Err(unexpected(response));
        }

        // the provider may move the status resource between checks
        if let Some(next) = response.header(ASYNC_OPERATION_HEADER) {
            self.status_url = resolve(&self.status_url, next)?;
        }

        let Some(status) = response
            .body
            .as_ref()
            .and_then(|b| b.get("status"))
            .and_then(Value::as_str)
            .map(PollingStatus::from_provider)
        else {
            return Err(unexpected(response));
        };

        if status != PollingStatus::Succeeded {
            return Ok(PollResult::from_response(status, &response));
        }

        match &self.final_url {
            Some(final_url) => {
                let resource = self.transport.send(Request::get(final_url)).await?;
                if !resource.is_success() {
                    return Err(unexpected(resource));
                }
                Ok(PollResult::new(PollingStatus::Succeeded).with_body(resource.body))
            }
            None => Ok(PollResult::from_response(status, &response)),
        }
    }
}

/// Polls a `Location` URL that answers 202 while the operation runs.
/// Any other non-2xx answer is the provider reporting a failed operation,
/// except throttling and unexplained server errors, which are retried.
pub struct LocationPoller {
    transport: Arc<dyn Transport>,
    url: String,
}

impl LocationPoller {
    pub fn new(transport: Arc<dyn Transport>, url: &str) -> Self {
        Self {
            transport,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl PollerType for LocationPoller {
    async fn poll(&mut self) -> Result<PollResult, PollError> {
        let response = self.transport.send(Request::get(&self.url)).await?;

        match response.status {
            202 => {
                if let Some(next) = response.header(LOCATION_HEADER) {
                    self.url = resolve(&self.url, next)?;
                }
                Ok(PollResult::from_response(PollingStatus::InProgress, &response))
            }
            200 | 201 | 204 => Ok(PollResult::from_response(
                PollingStatus::Succeeded,
                &response,
            )),
            _ if response.is_transient_failure() => Err(unexpected(response)),
            _ => Ok(PollResult::from_response(PollingStatus::Failed, &response)),
        }
    }
}

/// Re-reads a resource until its `provisioningState` is terminal
pub struct ProvisioningStatePoller {
    transport: Arc<dyn Transport>,
    resource_url: String,
}

impl ProvisioningStatePoller {
    pub fn new(transport: Arc<dyn Transport>, resource_url: &str) -> Self {
        Self {
            transport,
            resource_url: resource_url.to_string(),
        }
    }
}

#[async_trait]
impl PollerType for ProvisioningStatePoller {
    async fn poll(&mut self) -> Result<PollResult, PollError> {
        let response = self.transport.send(Request::get(&self.resource_url)).await?;
        if !response.is_success() {
            return Err(unexpected(response));
        }

        // resources without a provisioning state are done once readable
        let status = provisioning_state(response.body.as_ref()).unwrap_or(PollingStatus::Succeeded);
        Ok(PollResult::from_response(status, &response))
    }
}

/// `properties.provisioningState` of a resource body
fn provisioning_state(body: Option<&Value>) -> Option<PollingStatus> {
    body?
        .get("properties")?
        .get("provisioningState")?
        .as_str()
        .map(PollingStatus::from_provider)
}

/// Resolve a possibly relative status URL against the request URL
fn resolve(base: &str, target: &str) -> Result<String, PollError> {
    let invalid = |reason: String| {
        PollError::Transport(TransportError::InvalidUrl {
            url: target.to_string(),
            reason,
        })
    };

    let base = url::Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    base.join(target)
        .map(String::from)
        .map_err(|e| invalid(e.to_string()))
}

fn unexpected(response: Response) -> PollError {
    PollError::UnexpectedResponse {
        url: response.url,
        status: response.status,
        body: response.body,
    }
}
