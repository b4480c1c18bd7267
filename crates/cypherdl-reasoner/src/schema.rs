//! Names of the graph schema primitives.
//!
//! Defaults follow the neosemantics import conventions. A mapping is built
//! once and then only read; the catalog and the compiler copy what they need
//! out of it at construction time.

use cypherdl_model::vocab;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RESOURCE_LABEL: &str = "Resource";
pub const DEFAULT_CLASS_LABEL: &str = "Class";
pub const DEFAULT_OBJECT_PROPERTY_LABEL: &str = "Relationship";
pub const DEFAULT_DATA_PROPERTY_LABEL: &str = "Property";
pub const DEFAULT_SUBCLASS_OF_REL: &str = "SCO";
pub const DEFAULT_SUBPROPERTY_OF_REL: &str = "SPO";
pub const DEFAULT_DOMAIN_REL: &str = "DOMAIN";
pub const DEFAULT_RANGE_REL: &str = "RANGE";
pub const DEFAULT_IDENTITY_KEY: &str = "uri";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaMapping {
    resource_label: String,
    class_label: String,
    object_property_label: String,
    data_property_label: String,
    subclass_of_rel: String,
    subproperty_of_rel: String,
    domain_rel: String,
    range_rel: String,
    /// Node attribute holding the resource URI.
    identity_key: String,
    /// Node attribute holding `rdfs:label` values. Not a data property.
    label_key: String,
}

impl Default for SchemaMapping {
    fn default() -> Self {
        Self {
            resource_label: DEFAULT_RESOURCE_LABEL.to_string(),
            class_label: DEFAULT_CLASS_LABEL.to_string(),
            object_property_label: DEFAULT_OBJECT_PROPERTY_LABEL.to_string(),
            data_property_label: DEFAULT_DATA_PROPERTY_LABEL.to_string(),
            subclass_of_rel: DEFAULT_SUBCLASS_OF_REL.to_string(),
            subproperty_of_rel: DEFAULT_SUBPROPERTY_OF_REL.to_string(),
            domain_rel: DEFAULT_DOMAIN_REL.to_string(),
            range_rel: DEFAULT_RANGE_REL.to_string(),
            identity_key: DEFAULT_IDENTITY_KEY.to_string(),
            label_key: vocab::RDFS_LABEL.to_string(),
        }
    }
}

impl SchemaMapping {
    pub fn builder() -> SchemaMappingBuilder {
        SchemaMappingBuilder::default()
    }

    pub fn resource_label(&self) -> &str {
        &self.resource_label
    }

    pub fn class_label(&self) -> &str {
        &self.class_label
    }

    pub fn object_property_label(&self) -> &str {
        &self.object_property_label
    }

    pub fn data_property_label(&self) -> &str {
        &self.data_property_label
    }

    pub fn subclass_of_rel(&self) -> &str {
        &self.subclass_of_rel
    }

    pub fn subproperty_of_rel(&self) -> &str {
        &self.subproperty_of_rel
    }

    pub fn domain_rel(&self) -> &str {
        &self.domain_rel
    }

    pub fn range_rel(&self) -> &str {
        &self.range_rel
    }

    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    pub fn label_key(&self) -> &str {
        &self.label_key
    }

    /// Attribute keys that live on resource nodes but are not data properties.
    pub fn is_reserved_key(&self, key: &str) -> bool {
        key == self.identity_key || key == self.label_key
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaMappingBuilder {
    mapping: SchemaMapping,
}

impl SchemaMappingBuilder {
    pub fn resource_label(mut self, label: impl Into<String>) -> Self {
        self.mapping.resource_label = label.into();
        self
    }

    pub fn class_label(mut self, label: impl Into<String>) -> Self {
        self.mapping.class_label = label.into();
        self
    }

    pub fn object_property_label(mut self, label: impl Into<String>) -> Self {
        self.mapping.object_property_label = label.into();
        self
    }

    pub fn data_property_label(mut self, label: impl Into<String>) -> Self {
        self.mapping.data_property_label = label.into();
        self
    }

    pub fn subclass_of_rel(mut self, rel: impl Into<String>) -> Self {
        self.mapping.subclass_of_rel = rel.into();
        self
    }

    pub fn subproperty_of_rel(mut self, rel: impl Into<String>) -> Self {
        self.mapping.subproperty_of_rel = rel.into();
        self
    }

    pub fn domain_rel(mut self, rel: impl Into<String>) -> Self {
        self.mapping.domain_rel = rel.into();
        self
    }

    pub fn range_rel(mut self, rel: impl Into<String>) -> Self {
        self.mapping.range_rel = rel.into();
        self
    }

    pub fn identity_key(mut self, key: impl Into<String>) -> Self {
        self.mapping.identity_key = key.into();
        self
    }

    pub fn label_key(mut self, key: impl Into<String>) -> Self {
        self.mapping.label_key = key.into();
        self
    }

    pub fn build(self) -> SchemaMapping {
        self.mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let m = SchemaMapping::default();
        assert_eq!(m.resource_label(), "Resource");
        assert_eq!(m.object_property_label(), "Relationship");
        assert_eq!(m.data_property_label(), "Property");
        assert_eq!(m.subclass_of_rel(), "SCO");
        assert_eq!(m.identity_key(), "uri");
        assert_eq!(m, SchemaMapping::builder().build());
    }

    #[test]
    fn test_builder_overrides_single_field() {
        let m = SchemaMapping::builder().class_label("OwlClass").range_rel("HAS_RANGE").build();
        assert_eq!(m.class_label(), "OwlClass");
        assert_eq!(m.range_rel(), "HAS_RANGE");
        assert_eq!(m.domain_rel(), DEFAULT_DOMAIN_REL);
    }

    #[test]
    fn test_reserved_keys() {
        let m = SchemaMapping::default();
        assert!(m.is_reserved_key("uri"));
        assert!(m.is_reserved_key(vocab::RDFS_LABEL));
        assert!(!m.is_reserved_key("http://ex.org/age"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let m: SchemaMapping = serde_json::from_str(r#"{ "class_label": "Concept" }"#).unwrap();
        assert_eq!(m.class_label(), "Concept");
        assert_eq!(m.resource_label(), DEFAULT_RESOURCE_LABEL);
    }
}
