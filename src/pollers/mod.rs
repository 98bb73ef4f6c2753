//! Long-running operation polling
//!
//! A mutating Resource Manager call may return before the work is done,
//! handing back a status endpoint instead. [`submit`] issues the initiating
//! call and picks a strategy from the response; [`Poller::poll_until_done`]
//! drives it to a terminal state.
//!
//! # Module Structure
//!
//! - [`poller`] - The polling loop, interval clamping and transient retries
//! - [`long_running`] - Built-in strategies (async-operation header,
//!   location header, provisioning state) and [`submit`]
//!
//! Custom strategies implement [`PollerType`], for example an API that has
//! no status endpoint and is finished once the resource returns 404.

pub mod long_running;
pub mod poller;

pub use long_running::{
    submit, AsyncOperationPoller, LocationPoller, ProvisioningStatePoller,
};
pub use poller::Poller;

use crate::arm::http::Response;
use crate::error::PollError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// State of an operation as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollingStatus {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl PollingStatus {
    /// Map a provider status string. Anything that is not a recognised
    /// terminal value (`Accepted`, `Running`, `Updating`...) is in progress.
    pub fn from_provider(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::InProgress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for PollingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single status check
#[derive(Debug, Clone)]
pub struct PollResult {
    pub status: PollingStatus,
    /// Server-suggested delay before the next check
    pub poll_interval: Option<Duration>,
    /// Final resource on success, provider error body on failure
    pub body: Option<Value>,
}

impl PollResult {
    pub fn new(status: PollingStatus) -> Self {
        Self {
            status,
            poll_interval: None,
            body: None,
        }
    }

    /// Result carrying the body and `Retry-After` of a response
    pub fn from_response(status: PollingStatus, response: &Response) -> Self {
        Self {
            status,
            poll_interval: response.retry_after(),
            body: response.body.clone(),
        }
    }

    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }
}

/// One polling strategy. Each call performs exactly one status check and
/// may replace the strategy's own status descriptor.
#[async_trait]
pub trait PollerType: Send + Sync {
    async fn poll(&mut self) -> Result<PollResult, PollError>;
}
