//! Structured resource identifiers
//!
//! Resource ids are hierarchical paths such as
//! `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}`.
//! This module models them as typed segment templates that can parse,
//! validate and re-serialize literal ids.
//!
//! # Module Structure
//!
//! - [`segment`] - Typed path elements
//! - [`template`] - Ordered segment definitions per id type
//! - [`parser`] - Case-sensitive and case-insensitive parsing
//! - [`formatter`] - Canonical string rendering
//! - [`registry`] - Lookup of templates by type name
//! - [`common`] - Concrete id types shared across resources
//!
//! # Example
//!
//! ```
//! use armcore::resourceids::{ResourceId, WidgetId};
//!
//! let id = WidgetId::parse_insensitively(
//!     "/subscriptions/abc/resourcegroups/rg1/providers/Microsoft.Example/widgets/w1",
//! )
//! .unwrap();
//! assert_eq!(
//!     id.id(),
//!     "/subscriptions/abc/resourceGroups/rg1/providers/Microsoft.Example/widgets/w1"
//! );
//! ```

pub mod common;
pub mod formatter;
mod id;
pub mod parser;
pub mod registry;
pub mod segment;
pub mod template;

pub use common::*;
pub use formatter::format_id;
pub use id::ResourceId;
pub use parser::ParseResult;
pub use registry::IdRegistry;
pub use segment::Segment;
pub use template::IdTemplate;
