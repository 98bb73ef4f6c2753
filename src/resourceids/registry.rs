//! Identifier registry
//!
//! Lookup of id templates by type name, so generic tooling can validate or
//! recase any id without knowing its concrete type. The registry is an
//! ordinary value: build it once at startup and pass it by reference.
//! Built-in definitions are embedded JSON files compiled into the binary.

use super::parser::ParseResult;
use super::template::IdTemplate;
use crate::error::{ParseError, TemplateError};
use serde::Deserialize;
use std::collections::HashMap;

/// Embedded template definition files
const DEFINITION_FILES: &[&str] = &[
    include_str!("definitions/common.json"),
    include_str!("definitions/example.json"),
];

/// Root structure of definitions/*.json
#[derive(Debug, Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    templates: Vec<IdTemplate>,
}

/// Id templates keyed by type name, kept in registration order
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    templates: Vec<IdTemplate>,
    index: HashMap<String, usize>,
}

impl IdRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry loaded with the embedded definitions
    pub fn builtin() -> Result<Self, TemplateError> {
        let mut registry = Self::new();
        for content in DEFINITION_FILES {
            registry.load_json(content)?;
        }
        Ok(registry)
    }

    /// Register every template in a definitions document
    pub fn load_json(&mut self, content: &str) -> Result<(), TemplateError> {
        let file: DefinitionFile = serde_json::from_str(content)
            .map_err(|e| TemplateError::Definition(e.to_string()))?;
        for template in file.templates {
            self.register(template)?;
        }
        Ok(())
    }

    pub fn register(&mut self, template: IdTemplate) -> Result<(), TemplateError> {
        if self.index.contains_key(template.id_type()) {
            return Err(TemplateError::AlreadyRegistered(
                template.id_type().to_string(),
            ));
        }
        self.index
            .insert(template.id_type().to_string(), self.templates.len());
        self.templates.push(template);
        Ok(())
    }

    pub fn get(&self, id_type: &str) -> Option<&IdTemplate> {
        self.index.get(id_type).map(|&i| &self.templates[i])
    }

    /// Registered type names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.templates.iter().map(IdTemplate::id_type).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IdTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Parse `input` as the named id type
    pub fn parse(
        &self,
        id_type: &str,
        input: &str,
        insensitive: bool,
    ) -> Result<ParseResult, ParseError> {
        self.template(id_type)?.parse(input, insensitive)
    }

    /// Validate `input` as the named id type
    pub fn validate(&self, id_type: &str, input: &str) -> Vec<ParseError> {
        match self.template(id_type) {
            Ok(template) => template.validate(input),
            Err(err) => vec![err],
        }
    }

    /// First registered template that accepts `input` case-insensitively
    pub fn identify(&self, input: &str) -> Option<(&IdTemplate, ParseResult)> {
        self.templates
            .iter()
            .find_map(|t| t.parse(input, true).ok().map(|result| (t, result)))
    }

    /// Rewrite the literal segments of `input` in their canonical casing.
    /// Input no registered template recognizes is returned unchanged.
    pub fn recase(&self, input: &str) -> String {
        match self.identify(input) {
            Some((template, result)) => template.format(&result.parsed),
            None => input.to_string(),
        }
    }

    /// Recase `input` as the named id type
    pub fn recase_as(&self, id_type: &str, input: &str) -> Result<String, ParseError> {
        let template = self.template(id_type)?;
        let result = template.parse(input, true)?;
        Ok(template.format(&result.parsed))
    }

    fn template(&self, id_type: &str) -> Result<&IdTemplate, ParseError> {
        self.get(id_type)
            .ok_or_else(|| ParseError::UnknownIdType(id_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resourceids::common::{
        RecordTypeId, ResourceGroupId, ScopedRoleAssignmentId, SubnetId, SubscriptionId,
        UserAssignedIdentityId, VirtualNetworkId, WidgetId,
    };
    use crate::resourceids::ResourceId;

    #[test]
    fn test_builtin_registry_loads() {
        let registry = IdRegistry::builtin().unwrap();
        assert!(!registry.is_empty());
        assert!(registry.names().contains(&"Widget"));
        assert!(registry.get("Storage Container").is_some());
    }

    #[test]
    fn test_definitions_match_code_templates() {
        let registry = IdRegistry::builtin().unwrap();
        for template in [
            SubscriptionId::template(),
            ResourceGroupId::template(),
            UserAssignedIdentityId::template(),
            VirtualNetworkId::template(),
            SubnetId::template(),
            RecordTypeId::template(),
            ScopedRoleAssignmentId::template(),
            WidgetId::template(),
        ] {
            let registered = registry
                .get(template.id_type())
                .unwrap_or_else(|| panic!("{} missing", template.id_type()));
            assert_eq!(registered.segments(), template.segments());
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = IdRegistry::new();
        registry.register(WidgetId::template()).unwrap();
        assert_eq!(
            registry.register(WidgetId::template()),
            Err(TemplateError::AlreadyRegistered("Widget".to_string()))
        );
    }

    #[test]
    fn test_registries_are_isolated() {
        let mut first = IdRegistry::new();
        first.register(WidgetId::template()).unwrap();
        let second = IdRegistry::new();
        assert!(first.get("Widget").is_some());
        assert!(second.get("Widget").is_none());
    }

    #[test]
    fn test_recase() {
        let registry = IdRegistry::builtin().unwrap();
        assert_eq!(
            registry.recase("/SUBSCRIPTIONS/abc/resourcegroups/RG1/PROVIDERS/microsoft.example/Widgets/w1"),
            "/subscriptions/abc/resourceGroups/RG1/providers/Microsoft.Example/widgets/w1"
        );
        assert_eq!(registry.recase("/not/an/id"), "/not/an/id");
    }

    #[test]
    fn test_recase_as_and_unknown_type() {
        let registry = IdRegistry::builtin().unwrap();
        assert_eq!(
            registry.recase_as("Resource Group", "/subscriptions/abc/RESOURCEGROUPS/rg").unwrap(),
            "/subscriptions/abc/resourceGroups/rg"
        );
        assert_eq!(
            registry.parse("Gadget", "/x", false),
            Err(ParseError::UnknownIdType("Gadget".to_string()))
        );
        assert_eq!(registry.validate("Gadget", "/x").len(), 1);
    }
}
