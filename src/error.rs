//! Error types for armcore
//!
//! Every failure surfaced by the framework is one of these structured types.
//! Nothing in the library logs or swallows an error: each variant carries
//! enough context (segment position, offending literal, HTTP status, provider
//! body) for the caller to build a precise diagnostic.

use crate::arm::http::is_transient_response;
use crate::pollers::PollingStatus;
use std::time::Duration;
use thiserror::Error;

/// Result type using the umbrella [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Umbrella error for callers that drive several subsystems
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

// =============================================================================
// Resource identifiers
// =============================================================================

/// Failure to parse a literal resource identifier against a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("parsing resource id: input was empty")]
    EmptyInput,

    #[error("parsing {input:?}: expected segment {position} to be {expected:?} but got {actual:?}")]
    SegmentMismatch {
        input: String,
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("parsing {input:?}: segment {position} ({name:?}) was empty")]
    EmptySegment {
        input: String,
        position: usize,
        name: String,
    },

    #[error("parsing {input:?}: value {actual:?} for segment {position} ({name:?}) is not one of {allowed:?}")]
    InvalidConstant {
        input: String,
        position: usize,
        name: String,
        allowed: Vec<String>,
        actual: String,
    },

    #[error("parsing {input:?}: segment {position} ({name:?}) should be an absolute URI but got {actual:?}")]
    InvalidBaseUri {
        input: String,
        position: usize,
        name: String,
        actual: String,
    },

    #[error("parsing {input:?}: a resource id must start with '/'")]
    NotRooted { input: String },

    #[error("parsing {input:?}: too few segments, expected {expected} but got {actual}")]
    TooFewSegments {
        input: String,
        expected: usize,
        actual: usize,
    },

    #[error("parsing {input:?}: too many segments, expected {expected} but got {actual}")]
    TooManySegments {
        input: String,
        expected: usize,
        actual: usize,
    },

    #[error("the parsed {id_type} is missing the field {name:?}")]
    MissingField { id_type: String, name: String },

    #[error("no resource id type named {0:?} is registered")]
    UnknownIdType(String),
}

/// Invalid identifier template definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {id_type} declares the field {name:?} more than once")]
    DuplicateField { id_type: String, name: String },

    #[error("template {0} has no segments")]
    NoSegments(String),

    #[error("template {id_type}: constant segment {name:?} declares no allowed values")]
    EmptyConstant { id_type: String, name: String },

    #[error("an id type named {0:?} is already registered")]
    AlreadyRegistered(String),

    #[error("invalid template definition: {0}")]
    Definition(String),
}

// =============================================================================
// Transport
// =============================================================================

/// A request never produced an HTTP response
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid request url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("connection to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    Client(String),
}

// =============================================================================
// Long-running operations
// =============================================================================

/// Provider-reported terminal failure of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationFailure {
    /// `Failed` or `Canceled`
    pub status: PollingStatus,
    pub code: Option<String>,
    pub message: Option<String>,
    /// Raw provider body, preserved verbatim
    pub body: Option<serde_json::Value>,
}

impl OperationFailure {
    /// Extract the provider error from a status or resource body. Async
    /// operation bodies carry `error` at the top level, resources nest it
    /// under `properties`.
    pub fn from_body(status: PollingStatus, body: Option<serde_json::Value>) -> Self {
        let error = body.as_ref().and_then(|b| {
            b.get("error")
                .or_else(|| b.get("properties").and_then(|p| p.get("error")))
        });
        let field = |name: &str| {
            error
                .and_then(|e| e.get(name))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        let code = field("code");
        let message = field("message");

        Self {
            status,
            code,
            message,
            body,
        }
    }
}

impl std::fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation {}", self.status)?;
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, ": {}: {}", code, message),
            (Some(code), None) => write!(f, ": {}", code),
            (None, Some(message)) => write!(f, ": {}", message),
            (None, None) => Ok(()),
        }
    }
}

/// Failure while submitting or polling a long-running operation
#[derive(Error, Debug)]
pub enum PollError {
    #[error("{0}")]
    OperationFailed(OperationFailure),

    #[error("polling transport failure after {attempts} attempts: {last}")]
    TransportFailure { attempts: u32, last: String },

    #[error("unexpected status {status} from {url}")]
    UnexpectedResponse {
        url: String,
        status: u16,
        body: Option<serde_json::Value>,
    },

    #[error("polling was cancelled")]
    Cancelled,

    #[error("polling did not complete within {0:?}")]
    DeadlineExceeded(Duration),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl PollError {
    /// True for caller-side cancellation or deadline, as opposed to a
    /// provider-reported `Canceled` state
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded(_))
    }

    /// Failures a status check may recover from by retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(TransportError::InvalidUrl { .. } | TransportError::Client(_)) => false,
            Self::Transport(_) => true,
            Self::UnexpectedResponse { status, body, .. } => {
                is_transient_response(*status, body.as_ref())
            }
            _ => false,
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Failure while fetching or decoding a page
#[derive(Error, Debug)]
pub enum PaginationError {
    #[error("fetching page {url} failed with status {status}")]
    Status {
        url: String,
        status: u16,
        body: Option<serde_json::Value>,
    },

    #[error("decoding page {url}: {reason}")]
    Decode {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("there are no more pages to load")]
    NoMorePages,

    #[error("listing was cancelled")]
    Cancelled,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl PaginationError {
    /// HTTP status of the failing page, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }
}
