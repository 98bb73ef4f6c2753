//! Paginated list results
//!
//! Resource Manager list endpoints answer with one page of items plus an
//! opaque continuation link:
//!
//! ```json
//! {"value": [{"name": "w1"}, {"name": "w2"}], "nextLink": "https://..."}
//! ```
//!
//! [`list`] fetches the first page. A [`Page`] can fetch its successor with
//! [`Page::load_more`], drain everything with [`Page::complete`] or be turned
//! into an item stream with [`Page::into_stream`].
//!
//! # Example
//!
//! ```no_run
//! use armcore::arm::http::{ArmHttpClient, Transport};
//! use armcore::config::HttpConfig;
//! use armcore::pagination::{list, ListOptions};
//! use serde_json::Value;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport: Arc<dyn Transport> = Arc::new(ArmHttpClient::new(&HttpConfig::default())?);
//! let first = list::<Value>(transport, "https://management.azure.com/subscriptions?api-version=2022-12-01", ListOptions::default()).await?;
//! let all = first.complete(&CancellationToken::new(), |_| true).await?;
//! # Ok(())
//! # }
//! ```

mod page;

pub use page::Page;

use crate::arm::http::Transport;
use crate::config::PaginationConfig;
use crate::error::PaginationError;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Wire field names of a list response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub items_field: String,
    pub next_link_field: String,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::from(&PaginationConfig::default())
    }
}

impl From<&PaginationConfig> for ListOptions {
    fn from(config: &PaginationConfig) -> Self {
        Self {
            items_field: config.items_field.clone(),
            next_link_field: config.next_link_field.clone(),
        }
    }
}

/// Fetch the first page of a list endpoint
pub async fn list<T: DeserializeOwned>(
    transport: Arc<dyn Transport>,
    url: &str,
    options: ListOptions,
) -> Result<Page<T>, PaginationError> {
    Page::fetch(transport, url, Arc::new(options), &CancellationToken::new()).await
}
