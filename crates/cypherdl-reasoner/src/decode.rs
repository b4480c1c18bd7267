//! Raw store values → entities and literals.
//!
//! Schema queries hand back URIs as plain strings; instance queries hand back
//! whole nodes. [`Decoder::uri`] accepts either, reading the identity key off
//! a node. Literal decoding is lenient: values of kinds the object model has
//! no literal for are logged and skipped.

use std::collections::BTreeSet;

use cypherdl_model::{Entity, EntityKind, Literal, NamedEntity};

use crate::error::{ReasonerError, Result};
use crate::schema::SchemaMapping;
use crate::store::{Row, Value};

/// Fetch a column, failing if the row does not carry it.
pub fn column<'r>(row: &'r Row, name: &str) -> Result<&'r Value> {
    row.get(name).ok_or_else(|| ReasonerError::UnexpectedValue {
        column: name.to_string(),
        expected: "a value".to_string(),
        actual: "missing column".to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct Decoder {
    identity_key: String,
}

impl Decoder {
    pub fn new(schema: &SchemaMapping) -> Self {
        Self {
            identity_key: schema.identity_key().to_string(),
        }
    }

    /// The URI carried by `value`: the string itself, or the identity key of
    /// a node.
    pub fn uri<'v>(&self, value: &'v Value, column: &str) -> Result<&'v str> {
        match value {
            Value::String(uri) => Ok(uri),
            Value::Node(node) => node
                .property(&self.identity_key)
                .and_then(Value::as_str)
                .ok_or_else(|| ReasonerError::UnexpectedValue {
                    column: column.to_string(),
                    expected: format!("node with a string `{}` key", self.identity_key),
                    actual: "node without one".to_string(),
                }),
            other => Err(ReasonerError::UnexpectedValue {
                column: column.to_string(),
                expected: "URI string or node".to_string(),
                actual: other.kind_name().to_string(),
            }),
        }
    }

    /// Decode `value` as an entity of the requested kind.
    pub fn decode(&self, value: &Value, kind: EntityKind, column: &str) -> Result<Entity> {
        self.uri(value, column).map(|uri| Entity::new(kind, uri))
    }

    /// Typed variant of [`Decoder::decode`] reading straight from a row.
    pub fn entity<E: NamedEntity>(&self, row: &Row, name: &str) -> Result<E> {
        let value = column(row, name)?;
        self.uri(value, name).map(|uri| E::from_uri(uri.to_string()))
    }

    /// Decode every row's `name` column into a sorted set.
    pub fn entities<E: NamedEntity>(&self, rows: &[Row], name: &str) -> Result<BTreeSet<E>> {
        rows.iter().map(|row| self.entity(row, name)).collect()
    }
}

/// A list becomes the set of its element literals; a scalar becomes a
/// one-element set.
pub fn literals(value: &Value) -> BTreeSet<Literal> {
    match value {
        Value::List(items) => items.iter().filter_map(literal).collect(),
        scalar => literal(scalar).into_iter().collect(),
    }
}

fn literal(value: &Value) -> Option<Literal> {
    match value {
        Value::Integer(v) => Some(Literal::Integer(*v)),
        Value::Float(v) => Some(Literal::Float(*v)),
        Value::String(v) => Some(Literal::String(v.clone())),
        Value::Boolean(v) => Some(Literal::Boolean(*v)),
        other => {
            tracing::warn!(kind = other.kind_name(), "dropping value with no literal form");
            None
        }
    }
}
