//! armcore - client-side access framework for Azure Resource Manager
//!
//! # Module Structure
//!
//! - [`resourceids`] - Typed resource identifier templates, parsing and formatting
//! - [`pollers`] - Long-running operation polling
//! - [`pagination`] - Paginated list results
//! - [`arm`] - HTTP transport and the Resource Manager client
//! - [`config`] - Persistent configuration
//! - [`error`] - Error types

pub mod arm;
pub mod config;
pub mod error;
pub mod pagination;
pub mod pollers;
pub mod resourceids;

pub use error::{Error, Result};
