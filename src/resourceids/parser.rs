//! Identifier parsing
//!
//! Parses a literal path against an [`IdTemplate`]. Literal segments are
//! protocol vocabulary: they match exactly in sensitive mode and case-folded
//! in insensitive mode (server responses are not consistent about casing).
//! Everything else is caller data and is stored verbatim, apart from
//! constants which are normalized to their declared casing.

use super::segment::Segment;
use super::template::IdTemplate;
use crate::error::ParseError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Field values extracted from one literal id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub id_type: String,
    pub raw_input: String,
    pub parsed: BTreeMap<String, String>,
}

impl ParseResult {
    /// Value for a field, failing if the template never produced it
    pub fn get(&self, name: &str) -> Result<&str, ParseError> {
        self.parsed
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ParseError::MissingField {
                id_type: self.id_type.clone(),
                name: name.to_string(),
            })
    }
}

/// Matching state for one parse call
struct Matcher<'a> {
    input: &'a str,
    segments: &'a [Segment],
    elements: Vec<&'a str>,
    insensitive: bool,
    /// Whether a leading `/` was stripped before splitting
    rooted: bool,
}

impl IdTemplate {
    /// Parse `input` into field values
    pub fn parse(&self, input: &str, insensitive: bool) -> Result<ParseResult, ParseError> {
        if input.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let starts_with_base_uri = matches!(self.segments().first(), Some(Segment::BaseUri { .. }));
        let (body, rooted) = match input.strip_prefix('/') {
            Some(rest) if !starts_with_base_uri => (rest, true),
            _ => (input, false),
        };
        // ids echoed back by the API are sometimes unrooted, user input may not be
        if !rooted && !starts_with_base_uri && !insensitive {
            return Err(ParseError::NotRooted {
                input: input.to_string(),
            });
        }

        let matcher = Matcher {
            input,
            segments: self.segments(),
            elements: body.split('/').collect(),
            insensitive,
            rooted,
        };

        let mut parsed = BTreeMap::new();
        matcher.match_from(0, 0, &mut parsed)?;

        Ok(ParseResult {
            id_type: self.id_type().to_string(),
            raw_input: input.to_string(),
            parsed,
        })
    }

    /// Case-sensitive validation of user input, reported as a list of errors
    pub fn validate(&self, input: &str) -> Vec<ParseError> {
        match self.parse(input, false) {
            Ok(_) => Vec::new(),
            Err(err) => vec![err],
        }
    }
}

impl<'a> Matcher<'a> {
    fn match_from(
        &self,
        segment_idx: usize,
        element_idx: usize,
        parsed: &mut BTreeMap<String, String>,
    ) -> Result<(), ParseError> {
        let Some(segment) = self.segments.get(segment_idx) else {
            if element_idx == self.elements.len() {
                return Ok(());
            }
            return Err(ParseError::TooManySegments {
                input: self.input.to_string(),
                expected: self.segments.len(),
                actual: self.elements.len(),
            });
        };

        if segment.is_variable_length() {
            return self.match_variable(segment, segment_idx, element_idx, parsed);
        }

        let Some(element) = self.elements.get(element_idx) else {
            return Err(self.too_few());
        };

        match segment {
            Segment::Static { literal } | Segment::ResourceProvider { literal, .. } => {
                let matches = if self.insensitive {
                    literal.eq_ignore_ascii_case(element)
                } else {
                    literal == element
                };
                if !matches {
                    return Err(ParseError::SegmentMismatch {
                        input: self.input.to_string(),
                        position: segment_idx,
                        expected: literal.clone(),
                        actual: element.to_string(),
                    });
                }
            }
            Segment::Constant { name, allowed, .. } => {
                self.require_non_empty(name, segment_idx, element)?;
                let canonical = allowed.iter().find(|v| v.eq_ignore_ascii_case(element));
                let value = match canonical {
                    Some(value) => value.clone(),
                    // unknown values pass through so newer server values still parse
                    None if self.insensitive => element.to_string(),
                    None => {
                        return Err(ParseError::InvalidConstant {
                            input: self.input.to_string(),
                            position: segment_idx,
                            name: name.clone(),
                            allowed: allowed.clone(),
                            actual: element.to_string(),
                        })
                    }
                };
                parsed.insert(name.clone(), value);
            }
            Segment::SubscriptionId { name, .. }
            | Segment::ResourceGroup { name, .. }
            | Segment::UserSpecified { name, .. } => {
                self.require_non_empty(name, segment_idx, element)?;
                parsed.insert(name.clone(), element.to_string());
            }
            Segment::Scope { .. } | Segment::BaseUri { .. } => unreachable!("handled above"),
        }

        self.match_from(segment_idx + 1, element_idx + 1, parsed)
    }

    /// Scope and base-uri segments take a run of elements. Every later
    /// segment needs at least one element, so the longest run is tried first
    /// and shortened until the remainder matches.
    fn match_variable(
        &self,
        segment: &Segment,
        segment_idx: usize,
        element_idx: usize,
        parsed: &mut BTreeMap<String, String>,
    ) -> Result<(), ParseError> {
        let name = segment.field_name().unwrap_or_default();
        let remaining_segments = self.segments.len() - segment_idx - 1;
        let remaining_elements = self.elements.len().saturating_sub(element_idx);

        if remaining_elements < remaining_segments + 1 {
            return Err(self.too_few());
        }

        let longest = remaining_elements - remaining_segments;
        let shortest = if remaining_segments == 0 { longest } else { 1 };
        let mut first_error = None;

        for len in (shortest..=longest).rev() {
            let run = &self.elements[element_idx..element_idx + len];
            // a scope must not contain `//`; a base uri may, after its scheme,
            // but must not end in `/`
            let has_empty = match segment {
                Segment::Scope { .. } => run.iter().any(|e| e.is_empty()),
                _ => run.last().is_some_and(|e| e.is_empty()),
            };
            if has_empty {
                first_error.get_or_insert(ParseError::EmptySegment {
                    input: self.input.to_string(),
                    position: segment_idx,
                    name: name.to_string(),
                });
                continue;
            }

            let value = match segment {
                Segment::BaseUri { .. } if element_idx == 0 && !self.rooted => run.join("/"),
                _ => format!("/{}", run.join("/")),
            };

            if matches!(segment, Segment::BaseUri { .. }) && url::Url::parse(&value).is_err() {
                first_error.get_or_insert(ParseError::InvalidBaseUri {
                    input: self.input.to_string(),
                    position: segment_idx,
                    name: name.to_string(),
                    actual: value,
                });
                continue;
            }

            let mut attempt = parsed.clone();
            attempt.insert(name.to_string(), value);
            match self.match_from(segment_idx + 1, element_idx + len, &mut attempt) {
                Ok(()) => {
                    *parsed = attempt;
                    return Ok(());
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        Err(first_error.unwrap_or_else(|| self.too_few()))
    }

    fn require_non_empty(&self, name: &str, position: usize, element: &str) -> Result<(), ParseError> {
        if element.is_empty() {
            return Err(ParseError::EmptySegment {
                input: self.input.to_string(),
                position,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn too_few(&self) -> ParseError {
        ParseError::TooFewSegments {
            input: self.input.to_string(),
            expected: self.segments.len(),
            actual: self.elements.len(),
        }
    }
}
