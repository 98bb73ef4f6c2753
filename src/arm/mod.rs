//! Resource Manager API interaction module
//!
//! # Module Structure
//!
//! - [`client`] - Main client that starts operations and lists resources
//! - [`http`] - Request/response types, the [`http::Transport`] seam and the
//!   reqwest implementation
//!
//! # Example
//!
//! ```no_run
//! use armcore::arm::client::ArmClient;
//! use armcore::config::Config;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ArmClient::new(Config::load(), "<token>")?;
//! let mut poller = client
//!     .begin_delete("/subscriptions/abc/resourceGroups/rg1", "2022-09-01")
//!     .await?;
//! poller.poll_until_done(&CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod http;
