//! Concrete resource id contract
//!
//! A concrete id is an immutable value object hydrated from a
//! [`ParseResult`]. It keeps no reference to the template that produced it;
//! the template is rebuilt from [`ResourceId::segments`] when needed.

use super::formatter::format_id;
use super::parser::ParseResult;
use super::segment::Segment;
use super::template::IdTemplate;
use crate::error::ParseError;

/// Typed resource id backed by a segment template
pub trait ResourceId: Sized {
    /// Name of the id type, e.g. `Widget`
    const ID_TYPE: &'static str;

    /// Segment definition in path order
    fn segments() -> Vec<Segment>;

    /// Copy parsed values into the concrete type
    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError>;

    /// Value of a non-literal field
    fn field(&self, name: &str) -> Option<&str>;

    fn template() -> IdTemplate {
        IdTemplate::from_static(Self::ID_TYPE, Self::segments())
    }

    /// Case-sensitive parse, used for user-supplied ids
    fn parse(input: &str) -> Result<Self, ParseError> {
        Self::from_parse_result(&Self::template().parse(input, false)?)
    }

    /// Case-insensitive parse, used for ids echoed back by the API
    fn parse_insensitively(input: &str) -> Result<Self, ParseError> {
        Self::from_parse_result(&Self::template().parse(input, true)?)
    }

    /// Canonical literal form
    fn id(&self) -> String {
        format_id(&Self::segments(), |name| self.field(name))
    }

    /// Human-readable form, one labelled field per line
    fn describe(&self) -> String {
        let components: Vec<String> = Self::segments()
            .iter()
            .filter_map(|segment| {
                let label = segment.display_label()?;
                let value = segment.field_name().and_then(|name| self.field(name))?;
                Some(format!("{}: {:?}", label, value))
            })
            .collect();

        format!("{} ({})", Self::ID_TYPE, components.join("\n"))
    }
}
