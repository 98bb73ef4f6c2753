//! Identifier templates
//!
//! An [`IdTemplate`] is the ordered segment definition for one id type. It is
//! validated once at construction and never mutated afterwards.

use super::segment::Segment;
use crate::error::TemplateError;
use serde::Deserialize;
use std::collections::HashSet;

/// Ordered segment definition for one resource id type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "TemplateDef")]
pub struct IdTemplate {
    id_type: String,
    segments: Vec<Segment>,
}

/// Raw JSON shape of a template definition
#[derive(Debug, Deserialize)]
struct TemplateDef {
    id_type: String,
    segments: Vec<Segment>,
}

impl TryFrom<TemplateDef> for IdTemplate {
    type Error = TemplateError;

    fn try_from(def: TemplateDef) -> Result<Self, Self::Error> {
        IdTemplate::new(&def.id_type, def.segments)
    }
}

impl IdTemplate {
    /// Build a template, checking that field names are unique
    pub fn new(id_type: &str, segments: Vec<Segment>) -> Result<Self, TemplateError> {
        if segments.is_empty() {
            return Err(TemplateError::NoSegments(id_type.to_string()));
        }

        let mut seen = HashSet::new();
        for segment in &segments {
            if let Segment::Constant { name, allowed, .. } = segment {
                if allowed.is_empty() {
                    return Err(TemplateError::EmptyConstant {
                        id_type: id_type.to_string(),
                        name: name.clone(),
                    });
                }
            }
            if let Some(name) = segment.field_name() {
                if !seen.insert(name) {
                    return Err(TemplateError::DuplicateField {
                        id_type: id_type.to_string(),
                        name: name.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            id_type: id_type.to_string(),
            segments,
        })
    }

    /// Template for a built-in id type whose segments are declared in code.
    /// Built-in definitions are covered by tests instead of runtime checks.
    pub(crate) fn from_static(id_type: &str, segments: Vec<Segment>) -> Self {
        Self {
            id_type: id_type.to_string(),
            segments,
        }
    }

    /// Name of the id type this template hydrates, e.g. `Widget`
    pub fn id_type(&self) -> &str {
        &self.id_type
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Field names of the non-literal segments, in template order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::field_name)
    }

    /// Format string with placeholders, e.g.
    /// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}`
    pub fn pattern(&self) -> String {
        super::formatter::render(&self.segments, |segment| Some(segment.placeholder()))
    }

    /// Documentation value built from every segment's example
    pub fn example_value(&self) -> String {
        super::formatter::render(&self.segments, |segment| Some(segment.example_value()))
    }

    /// Human-readable description of the expected format
    pub fn description(&self) -> String {
        format!(
            "The {} ID should be in the format {} - for example {}",
            self.id_type,
            self.pattern(),
            self.example_value()
        )
    }
}
