//! Identifier formatting
//!
//! The inverse of parsing. Formatting is plain interpolation in template
//! order and performs no validation: a missing value renders as an empty
//! element, so a zero-value id yields a syntactically valid but empty path.

use super::segment::Segment;
use super::template::IdTemplate;
use std::collections::BTreeMap;

/// Render segments into a path, asking `value_for` for each segment's text
pub(crate) fn render<F>(segments: &[Segment], value_for: F) -> String
where
    F: Fn(&Segment) -> Option<String>,
{
    let mut out = String::new();

    for (position, segment) in segments.iter().enumerate() {
        let value = value_for(segment).unwrap_or_default();
        match segment {
            Segment::BaseUri { .. } if position == 0 => {
                out.push_str(value.trim_end_matches('/'));
            }
            Segment::Scope { .. } | Segment::BaseUri { .. } => {
                out.push('/');
                out.push_str(value.trim_matches('/'));
            }
            _ => {
                out.push('/');
                out.push_str(&value);
            }
        }
    }

    out
}

/// Format an id from its segments and a field lookup
pub fn format_id<'a, F>(segments: &[Segment], lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    render(segments, |segment| match segment.literal() {
        Some(literal) => Some(literal.to_string()),
        None => segment
            .field_name()
            .and_then(&lookup)
            .map(|v| v.to_string()),
    })
}

impl IdTemplate {
    /// Format the canonical literal for the given field values
    pub fn format(&self, values: &BTreeMap<String, String>) -> String {
        format_id(self.segments(), |name| values.get(name).map(String::as_str))
    }
}
