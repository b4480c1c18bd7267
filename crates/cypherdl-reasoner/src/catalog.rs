//! Fixed query templates for schema-level (non-compiled) queries.
//!
//! Templates contain two kinds of placeholder:
//!
//! - `%NAME%` schema tokens, substituted once when the catalog is built from
//!   a [`SchemaMapping`];
//! - `$name` parameters, bound per call by the driver.
//!
//! `%KEY%` is the one token left after materialization: the two "members"
//! queries splice a relationship type or attribute key there per call,
//! because Cypher cannot take those as parameters.
//!
//! Schema queries return a scalar `uri` column. Instance queries return node
//! objects so attributes can be read off them afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use cypherdl_model::vocab;

use crate::cypher;
use crate::error::{ReasonerError, Result};
use crate::schema::SchemaMapping;

/// Column holding a scalar URI in schema query results.
pub const URI_COLUMN: &str = "uri";
/// Column holding an individual's node in instance query results.
pub const INDIVIDUAL_COLUMN: &str = "individual";
pub const PROPERTY_COLUMN: &str = "property";
pub const TARGET_COLUMN: &str = "target";
pub const VALUE_COLUMN: &str = "value";

const KEY_TOKEN: &str = "KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryId {
    Classes,
    ObjectProperties,
    DataProperties,
    BooleanDataProperties,
    StringDataProperties,
    IntDataProperties,
    DoubleDataProperties,
    SubClasses,
    RootClasses,
    SuperClasses,
    IsSubClassOf,
    SubObjectProperties,
    SuperObjectProperties,
    SubDataProperties,
    SuperDataProperties,
    ObjectPropertyDomain,
    DataPropertyDomain,
    ObjectPropertyRange,
    DataPropertyRange,
    AllIndividuals,
    IndividualEdges,
    IndividualNode,
    ObjectPropertyMembers,
    DataPropertyMembers,
}

impl QueryId {
    pub const ALL: [QueryId; 24] = [
        QueryId::Classes,
        QueryId::ObjectProperties,
        QueryId::DataProperties,
        QueryId::BooleanDataProperties,
        QueryId::StringDataProperties,
        QueryId::IntDataProperties,
        QueryId::DoubleDataProperties,
        QueryId::SubClasses,
        QueryId::RootClasses,
        QueryId::SuperClasses,
        QueryId::IsSubClassOf,
        QueryId::SubObjectProperties,
        QueryId::SuperObjectProperties,
        QueryId::SubDataProperties,
        QueryId::SuperDataProperties,
        QueryId::ObjectPropertyDomain,
        QueryId::DataPropertyDomain,
        QueryId::ObjectPropertyRange,
        QueryId::DataPropertyRange,
        QueryId::AllIndividuals,
        QueryId::IndividualEdges,
        QueryId::IndividualNode,
        QueryId::ObjectPropertyMembers,
        QueryId::DataPropertyMembers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QueryId::Classes => "classes",
            QueryId::ObjectProperties => "object_properties",
            QueryId::DataProperties => "data_properties",
            QueryId::BooleanDataProperties => "boolean_data_properties",
            QueryId::StringDataProperties => "string_data_properties",
            QueryId::IntDataProperties => "int_data_properties",
            QueryId::DoubleDataProperties => "double_data_properties",
            QueryId::SubClasses => "sub_classes",
            QueryId::RootClasses => "root_classes",
            QueryId::SuperClasses => "super_classes",
            QueryId::IsSubClassOf => "is_sub_class_of",
            QueryId::SubObjectProperties => "sub_object_properties",
            QueryId::SuperObjectProperties => "super_object_properties",
            QueryId::SubDataProperties => "sub_data_properties",
            QueryId::SuperDataProperties => "super_data_properties",
            QueryId::ObjectPropertyDomain => "object_property_domain",
            QueryId::DataPropertyDomain => "data_property_domain",
            QueryId::ObjectPropertyRange => "object_property_range",
            QueryId::DataPropertyRange => "data_property_range",
            QueryId::AllIndividuals => "all_individuals",
            QueryId::IndividualEdges => "individual_edges",
            QueryId::IndividualNode => "individual_node",
            QueryId::ObjectPropertyMembers => "object_property_members",
            QueryId::DataPropertyMembers => "data_property_members",
        }
    }

    /// Raw template with schema tokens still in place.
    pub fn template(self) -> &'static str {
        match self {
            QueryId::Classes => "MATCH (cls:%CLASS%) RETURN cls.%URI% AS uri",
            QueryId::ObjectProperties => "MATCH (p:%OBJECT_PROPERTY%) RETURN p.%URI% AS uri",
            QueryId::DataProperties => "MATCH (p:%DATA_PROPERTY%) RETURN p.%URI% AS uri",
            QueryId::BooleanDataProperties => {
                "MATCH (p:%DATA_PROPERTY%)-[:%RANGE%]->(ran:%RESOURCE%)\n\
                 WHERE ran.%URI% IN [%XSD_BOOLEAN%]\n\
                 RETURN p.%URI% AS uri"
            }
            QueryId::StringDataProperties => {
                "MATCH (p:%DATA_PROPERTY%)-[:%RANGE%]->(ran:%RESOURCE%)\n\
                 WHERE ran.%URI% IN [%XSD_STRING%]\n\
                 RETURN p.%URI% AS uri"
            }
            QueryId::IntDataProperties => {
                "MATCH (p:%DATA_PROPERTY%)-[:%RANGE%]->(ran:%RESOURCE%)\n\
                 WHERE ran.%URI% IN [%XSD_INT%, %XSD_INTEGER%]\n\
                 RETURN p.%URI% AS uri"
            }
            QueryId::DoubleDataProperties => {
                "MATCH (p:%DATA_PROPERTY%)-[:%RANGE%]->(ran:%RESOURCE%)\n\
                 WHERE ran.%URI% IN [%XSD_DOUBLE%, %XSD_FLOAT%]\n\
                 RETURN p.%URI% AS uri"
            }
            QueryId::SubClasses => {
                "MATCH (sub:%CLASS%)-[:%SCO%]->(sup {%URI%: $uri}) RETURN sub.%URI% AS uri"
            }
            // Depending on how the ontology was loaded, top-level classes may or
            // may not have an explicit edge to owl:Thing.
            QueryId::RootClasses => {
                "MATCH (sub:%CLASS%)-[:%SCO%]->(sup {%URI%: $uri})\n\
                 RETURN sub.%URI% AS uri\n\
                 UNION\n\
                 MATCH (sub:%CLASS%)\n\
                 WHERE NOT (sub)-[:%SCO%]->()\n\
                 RETURN sub.%URI% AS uri"
            }
            QueryId::SuperClasses => {
                "MATCH (sub:%CLASS% {%URI%: $uri})-[:%SCO%]->(sup:%CLASS%) RETURN sup.%URI% AS uri"
            }
            QueryId::IsSubClassOf => {
                "MATCH (sub:%CLASS% {%URI%: $sub_uri})-[:%SCO%]->(sup:%CLASS% {%URI%: $sup_uri})\n\
                 RETURN sub.%URI% AS uri LIMIT 1"
            }
            QueryId::SubObjectProperties => {
                "MATCH (sub:%OBJECT_PROPERTY%)-[:%SPO%]->(sup:%OBJECT_PROPERTY% {%URI%: $uri})\n\
                 RETURN sub.%URI% AS uri"
            }
            QueryId::SuperObjectProperties => {
                "MATCH (sub:%OBJECT_PROPERTY% {%URI%: $uri})-[:%SPO%]->(sup:%OBJECT_PROPERTY%)\n\
                 RETURN sup.%URI% AS uri"
            }
            QueryId::SubDataProperties => {
                "MATCH (sub:%DATA_PROPERTY%)-[:%SPO%]->(sup:%DATA_PROPERTY% {%URI%: $uri})\n\
                 RETURN sub.%URI% AS uri"
            }
            QueryId::SuperDataProperties => {
                "MATCH (sub:%DATA_PROPERTY% {%URI%: $uri})-[:%SPO%]->(sup:%DATA_PROPERTY%)\n\
                 RETURN sup.%URI% AS uri"
            }
            QueryId::ObjectPropertyDomain => {
                "MATCH (p:%OBJECT_PROPERTY% {%URI%: $uri})-[:%DOMAIN%]->(dom:%CLASS%)\n\
                 RETURN dom.%URI% AS uri"
            }
            QueryId::DataPropertyDomain => {
                "MATCH (p:%DATA_PROPERTY% {%URI%: $uri})-[:%DOMAIN%]->(dom:%CLASS%)\n\
                 RETURN dom.%URI% AS uri"
            }
            QueryId::ObjectPropertyRange => {
                "MATCH (p:%OBJECT_PROPERTY% {%URI%: $uri})-[:%RANGE%]->(ran:%CLASS%)\n\
                 RETURN ran.%URI% AS uri"
            }
            QueryId::DataPropertyRange => {
                "MATCH (p:%DATA_PROPERTY% {%URI%: $uri})-[:%RANGE%]->(ran:%RESOURCE%)\n\
                 RETURN ran.%URI% AS uri"
            }
            QueryId::AllIndividuals => {
                "MATCH (ind:%RESOURCE%)\n\
                 WHERE NOT ind:%CLASS% AND NOT ind:%OBJECT_PROPERTY% AND NOT ind:%DATA_PROPERTY%\n\
                 RETURN ind AS individual"
            }
            QueryId::IndividualEdges => {
                "MATCH (s:%RESOURCE% {%URI%: $uri})-[r]->(o:%RESOURCE%)\n\
                 RETURN type(r) AS property, o AS target"
            }
            QueryId::IndividualNode => {
                "MATCH (ind:%RESOURCE% {%URI%: $uri}) RETURN ind AS individual"
            }
            QueryId::ObjectPropertyMembers => {
                "MATCH (ind:%RESOURCE%)-[:%KEY%]->(o:%RESOURCE%)\n\
                 RETURN ind AS individual, o AS target"
            }
            QueryId::DataPropertyMembers => {
                "MATCH (ind:%RESOURCE%)\n\
                 WHERE ind.%KEY% IS NOT NULL\n\
                 RETURN ind AS individual, ind.%KEY% AS value"
            }
        }
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown query id {0:?}")]
pub struct UnknownQueryId(String);

impl FromStr for QueryId {
    type Err = UnknownQueryId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| UnknownQueryId(s.to_string()))
    }
}

/// Declared-range filters for data property enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatatypeFilter {
    Boolean,
    String,
    /// `xsd:int` or `xsd:integer`.
    Int,
    /// `xsd:double` or `xsd:float`.
    Double,
}

impl DatatypeFilter {
    pub fn query_id(self) -> QueryId {
        match self {
            DatatypeFilter::Boolean => QueryId::BooleanDataProperties,
            DatatypeFilter::String => QueryId::StringDataProperties,
            DatatypeFilter::Int => QueryId::IntDataProperties,
            DatatypeFilter::Double => QueryId::DoubleDataProperties,
        }
    }
}

/// Replace every `%NAME%` token found in `values` in a single left-to-right
/// pass. Substituted text is never rescanned; unknown tokens are copied as-is.
fn substitute(template: &str, values: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) if values.contains_key(&after[..end]) => {
                out.push_str(&values[&after[..end]]);
                rest = &after[end + 1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn schema_tokens(mapping: &SchemaMapping) -> HashMap<&'static str, String> {
    let mut tokens = HashMap::new();
    tokens.insert("RESOURCE", cypher::schema_name(mapping.resource_label()));
    tokens.insert("CLASS", cypher::schema_name(mapping.class_label()));
    tokens.insert(
        "OBJECT_PROPERTY",
        cypher::schema_name(mapping.object_property_label()),
    );
    tokens.insert(
        "DATA_PROPERTY",
        cypher::schema_name(mapping.data_property_label()),
    );
    tokens.insert("SCO", cypher::schema_name(mapping.subclass_of_rel()));
    tokens.insert("SPO", cypher::schema_name(mapping.subproperty_of_rel()));
    tokens.insert("DOMAIN", cypher::schema_name(mapping.domain_rel()));
    tokens.insert("RANGE", cypher::schema_name(mapping.range_rel()));
    tokens.insert("URI", cypher::schema_name(mapping.identity_key()));
    tokens.insert("XSD_BOOLEAN", cypher::string_literal(vocab::XSD_BOOLEAN));
    tokens.insert("XSD_STRING", cypher::string_literal(vocab::XSD_STRING));
    tokens.insert("XSD_INT", cypher::string_literal(vocab::XSD_INT));
    tokens.insert("XSD_INTEGER", cypher::string_literal(vocab::XSD_INTEGER));
    tokens.insert("XSD_DOUBLE", cypher::string_literal(vocab::XSD_DOUBLE));
    tokens.insert("XSD_FLOAT", cypher::string_literal(vocab::XSD_FLOAT));
    tokens
}

/// Materialized templates for one schema mapping. Immutable once built.
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    queries: BTreeMap<QueryId, String>,
}

impl QueryCatalog {
    /// Materialize every template against `mapping`.
    pub fn new(mapping: &SchemaMapping) -> Self {
        Self::from_templates(mapping, QueryId::ALL.map(|id| (id, id.template())))
    }

    /// Materialize a custom template set. Ids missing from `templates` are
    /// reported as configuration errors when requested.
    pub fn from_templates<'t, I>(mapping: &SchemaMapping, templates: I) -> Self
    where
        I: IntoIterator<Item = (QueryId, &'t str)>,
    {
        let tokens = schema_tokens(mapping);
        let queries = templates
            .into_iter()
            .map(|(id, template)| (id, substitute(template, &tokens)))
            .collect();
        Self { queries }
    }

    pub fn get(&self, id: QueryId) -> Result<&str> {
        self.queries
            .get(&id)
            .map(String::as_str)
            .ok_or(ReasonerError::Configuration(id))
    }

    /// The template for `id` with `%KEY%` replaced by `uri`, quoted as a
    /// relationship type or attribute key.
    pub fn keyed(&self, id: QueryId, uri: &str) -> Result<String> {
        let text = self.get(id)?;
        let mut values = HashMap::new();
        values.insert(KEY_TOKEN, cypher::uri_name(uri)?);
        Ok(substitute(text, &values))
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueryId, &str)> {
        self.queries.iter().map(|(id, q)| (*id, q.as_str()))
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::new(&SchemaMapping::default())
    }
}
