//! Segment model
//!
//! One typed element of a resource id path. Segments are declared in code for
//! the built-in id types and in JSON for registry definitions.

use serde::Deserialize;

/// Example subscription id used in documentation values
pub const EXAMPLE_SUBSCRIPTION_ID: &str = "12345678-1234-9876-4563-123456789012";

/// Example resource group name used in documentation values
pub const EXAMPLE_RESOURCE_GROUP: &str = "example-resource-group";

/// Example scope used in documentation values
pub const EXAMPLE_SCOPE: &str =
    "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/some-resource-group";

/// A single typed path element
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Fixed protocol text, e.g. `resourceGroups`
    Static { literal: String },
    /// Resource provider namespace, e.g. `Microsoft.Compute`
    ResourceProvider {
        literal: String,
        #[serde(default)]
        display: Option<String>,
    },
    SubscriptionId {
        name: String,
        #[serde(default)]
        example: Option<String>,
    },
    ResourceGroup {
        name: String,
        #[serde(default)]
        example: Option<String>,
    },
    /// A user-supplied resource name
    UserSpecified {
        name: String,
        #[serde(default)]
        example: Option<String>,
    },
    /// One of a fixed set of values, stored in its declared casing
    Constant {
        name: String,
        allowed: Vec<String>,
        #[serde(default)]
        example: Option<String>,
    },
    /// A nested resource id of arbitrary length
    Scope {
        name: String,
        #[serde(default)]
        example: Option<String>,
    },
    /// Data-plane endpoint prefix, e.g. `https://account.blob.core.windows.net`
    BaseUri {
        name: String,
        #[serde(default)]
        example: Option<String>,
    },
}

impl Segment {
    pub fn static_segment(literal: &str) -> Self {
        Self::Static {
            literal: literal.to_string(),
        }
    }

    pub fn resource_provider(literal: &str) -> Self {
        Self::ResourceProvider {
            literal: literal.to_string(),
            display: None,
        }
    }

    pub fn subscription_id(name: &str) -> Self {
        Self::SubscriptionId {
            name: name.to_string(),
            example: None,
        }
    }

    pub fn resource_group(name: &str) -> Self {
        Self::ResourceGroup {
            name: name.to_string(),
            example: None,
        }
    }

    pub fn user_specified(name: &str) -> Self {
        Self::UserSpecified {
            name: name.to_string(),
            example: None,
        }
    }

    pub fn constant(name: &str, allowed: &[&str]) -> Self {
        Self::Constant {
            name: name.to_string(),
            allowed: allowed.iter().map(|v| v.to_string()).collect(),
            example: None,
        }
    }

    pub fn scope(name: &str) -> Self {
        Self::Scope {
            name: name.to_string(),
            example: None,
        }
    }

    pub fn base_uri(name: &str) -> Self {
        Self::BaseUri {
            name: name.to_string(),
            example: None,
        }
    }

    /// Field name used as the parse-result key (`None` for literal segments)
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Static { .. } | Self::ResourceProvider { .. } => None,
            Self::SubscriptionId { name, .. }
            | Self::ResourceGroup { name, .. }
            | Self::UserSpecified { name, .. }
            | Self::Constant { name, .. }
            | Self::Scope { name, .. }
            | Self::BaseUri { name, .. } => Some(name),
        }
    }

    /// Expected text for literal segments
    pub fn literal(&self) -> Option<&str> {
        match self {
            Self::Static { literal } | Self::ResourceProvider { literal, .. } => Some(literal),
            _ => None,
        }
    }

    /// True for segments that may consume more than one path element
    pub fn is_variable_length(&self) -> bool {
        matches!(self, Self::Scope { .. } | Self::BaseUri { .. })
    }

    /// Value used when rendering documentation examples
    pub fn example_value(&self) -> String {
        match self {
            Self::Static { literal } | Self::ResourceProvider { literal, .. } => literal.clone(),
            Self::SubscriptionId { example, .. } => example
                .clone()
                .unwrap_or_else(|| EXAMPLE_SUBSCRIPTION_ID.to_string()),
            Self::ResourceGroup { example, .. } => example
                .clone()
                .unwrap_or_else(|| EXAMPLE_RESOURCE_GROUP.to_string()),
            Self::UserSpecified { name, example } => example
                .clone()
                .unwrap_or_else(|| format!("{}Value", name.trim_end_matches("Name"))),
            Self::Constant {
                allowed, example, ..
            } => example
                .clone()
                .or_else(|| allowed.first().cloned())
                .unwrap_or_default(),
            Self::Scope { example, .. } => {
                example.clone().unwrap_or_else(|| EXAMPLE_SCOPE.to_string())
            }
            Self::BaseUri { example, .. } => example
                .clone()
                .unwrap_or_else(|| "https://endpoint.example.com".to_string()),
        }
    }

    /// Placeholder shown in format descriptions, e.g. `{resourceGroupName}`
    pub fn placeholder(&self) -> String {
        match self {
            Self::Static { literal } => literal.clone(),
            Self::ResourceProvider { literal, display } => {
                display.clone().unwrap_or_else(|| literal.clone())
            }
            Self::Constant { name, allowed, .. } => {
                format!("{{{}: {}}}", name, allowed.join("|"))
            }
            other => format!("{{{}}}", other.field_name().unwrap_or_default()),
        }
    }

    /// Label used in the human-readable form of a concrete id,
    /// e.g. `resourceGroupName` -> `Resource Group Name`
    pub fn display_label(&self) -> Option<String> {
        match self {
            Self::SubscriptionId { .. } => Some("Subscription".to_string()),
            _ => self.field_name().map(title_case),
        }
    }
}

/// Split a camelCase field name into title-cased words
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_segments_have_no_field_name() {
        assert_eq!(Segment::static_segment("subscriptions").field_name(), None);
        assert_eq!(Segment::resource_provider("Microsoft.Example").field_name(), None);
        assert_eq!(
            Segment::user_specified("widgetName").field_name(),
            Some("widgetName")
        );
    }

    #[test]
    fn test_example_values() {
        assert_eq!(
            Segment::subscription_id("subscriptionId").example_value(),
            EXAMPLE_SUBSCRIPTION_ID
        );
        assert_eq!(
            Segment::user_specified("widgetName").example_value(),
            "widgetValue"
        );
        assert_eq!(
            Segment::constant("tier", &["Basic", "Premium"]).example_value(),
            "Basic"
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("resourceGroupName"), "Resource Group Name");
        assert_eq!(title_case("widgetName"), "Widget Name");
        assert_eq!(title_case("scope"), "Scope");
    }

    #[test]
    fn test_deserialize_from_json() {
        let segment: Segment = serde_json::from_str(
            r#"{"kind": "constant", "name": "tier", "allowed": ["Basic", "Premium"]}"#,
        )
        .unwrap();
        assert_eq!(segment, Segment::constant("tier", &["Basic", "Premium"]));
    }
}
