//! HTTP utilities for Resource Manager REST calls
//!
//! [`Transport`] is the seam the poller and pager depend on. The reqwest
//! backed [`ArmHttpClient`] is the production implementation; tests inject
//! scripted transports instead.

use crate::config::HttpConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header carrying a per-request correlation id
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// An outgoing request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            body: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A received response; non-2xx statuses are responses, not errors
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub url: String,
    pub status: u16,
    /// Header names are stored lowercased
    pub headers: HashMap<String, String>,
    /// Decoded JSON body; non-JSON text is kept as a string value
    pub body: Option<Value>,
}

impl Response {
    pub fn new(url: &str, status: u16) -> Self {
        Self {
            url: url.to_string(),
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Case-insensitive header lookup, ignoring empty values
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Failures worth retrying when polling
    pub fn is_transient_failure(&self) -> bool {
        is_transient_response(self.status, self.body.as_ref())
    }

    /// Server-suggested delay from `Retry-After`, either delta-seconds or an
    /// HTTP date
    pub fn retry_after(&self) -> Option<Duration> {
        let value = self.header("retry-after")?.trim();
        if let Ok(seconds) = value.parse::<u64>() {
            return Some(Duration::from_secs(seconds));
        }
        let at = chrono::DateTime::parse_from_rfc2822(value).ok()?;
        let delta = at.with_timezone(&chrono::Utc) - chrono::Utc::now();
        Some(delta.to_std().unwrap_or(Duration::ZERO))
    }
}

fn has_error_object(body: Option<&Value>) -> bool {
    body.and_then(|b| b.get("error")).is_some_and(Value::is_object)
}

/// Throttling and timeouts are always retried. A server error is retried
/// unless the provider explained it with an `error` object.
pub(crate) fn is_transient_response(status: u16, body: Option<&Value>) -> bool {
    match status {
        408 | 429 => true,
        s if s >= 500 => !has_error_object(body),
        _ => false,
    }
}

/// Injected HTTP collaborator. Implementations must be safe to share
/// between concurrent callers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// HTTP client wrapper for Resource Manager calls
#[derive(Clone)]
pub struct ArmHttpClient {
    client: Client,
    token: Option<String>,
}

impl ArmHttpClient {
    /// Create a new HTTP client
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            token: None,
        })
    }

    /// Attach an already-acquired bearer token to every request
    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<Response, TransportError> {
        self.send(Request::get(url)).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put(&self, url: &str, body: Value) -> Result<Response, TransportError> {
        self.send(Request::new(Method::PUT, url).with_body(body)).await
    }
}

#[async_trait]
impl Transport for ArmHttpClient {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("{} {} ({})", request.method, request.url, request_id);

        let url = reqwest::Url::parse(&request.url).map_err(|e| TransportError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(CLIENT_REQUEST_ID_HEADER, request_id.as_str());

        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| map_reqwest_error(&request.url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(&request.url, e))?;

        tracing::debug!(
            "{} {} -> {} {}",
            request.method,
            request.url,
            status,
            sanitize_for_log(&text)
        );

        let body = if text.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        };

        Ok(Response {
            url: request.url,
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = Response::new("https://example.com", 202)
            .with_header("Azure-AsyncOperation", "https://example.com/op")
            .with_header("Location", " ");

        assert_eq!(
            response.header("azure-asyncoperation"),
            Some("https://example.com/op")
        );
        assert_eq!(response.header("location"), None);
    }

    #[test]
    fn test_retry_after_seconds() {
        let response = Response::new("u", 202).with_header("Retry-After", "15");
        assert_eq!(response.retry_after(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_retry_after_http_date_in_past() {
        let response =
            Response::new("u", 202).with_header("Retry-After", "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(response.retry_after(), Some(Duration::ZERO));
    }

    #[test]
    fn test_retry_after_garbage() {
        let response = Response::new("u", 202).with_header("Retry-After", "soon");
        assert_eq!(response.retry_after(), None);
    }

    #[test]
    fn test_transient_statuses() {
        assert!(Response::new("u", 429).is_transient_failure());
        assert!(Response::new("u", 503).is_transient_failure());
        assert!(Response::new("u", 408).is_transient_failure());
        assert!(!Response::new("u", 404).is_transient_failure());
        assert!(!Response::new("u", 409).is_transient_failure());
    }

    #[test]
    fn test_server_error_with_provider_error_is_not_transient() {
        let explained = Response::new("u", 500)
            .with_body(serde_json::json!({"error": {"code": "InternalError", "message": "boom"}}));
        assert!(!explained.is_transient_failure());

        let text = Response::new("u", 502).with_body(Value::String("Bad Gateway".to_string()));
        assert!(text.is_transient_failure());
    }

    #[test]
    fn test_sanitize_for_log_truncates() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(200)));
        assert!(sanitized.contains("500 bytes total"));
    }
}
