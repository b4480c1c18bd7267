//! Pattern IR produced by the expression compiler.
//!
//! A [`PatternQuery`] is what a class expression lowers to before any Cypher
//! text exists: an optional inference preamble binding variables through the
//! subsumption-closure procedure, a list of graph pattern parts, attribute
//! conditions, and the variable to return. Rendering is a straight walk over
//! those lists, so two equal IR values always render to the same text.

use serde::{Deserialize, Serialize};

use cypherdl_model::Literal;

use crate::cypher;
use crate::error::Result;
use crate::schema::SchemaMapping;

// ============================================================================
// IR
// ============================================================================

/// Binds a variable before the main pattern (inference mode only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreambleStep {
    /// `variable` ranges over the members of `class` and all its subclasses.
    Subsumption { class: String, variable: String },
    /// `variable` ranges over the common members of every class. Each class
    /// is collected into its own temporary set first.
    SubsumptionIntersection {
        classes: Vec<SubsumptionSet>,
        variable: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsumptionSet {
    pub class: String,
    pub set_variable: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternPart {
    /// `(variable:L1:L2)`; labels are class URIs.
    Node {
        variable: String,
        labels: Vec<String>,
    },
    /// `(from)-[:relation]->(to)`
    Edge {
        from: String,
        relation: String,
        to: String,
    },
    /// `(from)-[:relation]->(to {uri: 'individual'})`
    ValueEdge {
        from: String,
        relation: String,
        to: String,
        individual: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    HasAttribute {
        variable: String,
        key: String,
    },
    AttributeEquals {
        variable: String,
        key: String,
        value: Literal,
    },
    /// Emitted for a nested `owl:Nothing`; the query can never match.
    Unsatisfiable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationStats {
    pub variables_allocated: usize,
    pub scopes_opened: usize,
    pub scopes_closed: usize,
    pub max_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternQuery {
    pub preamble: Vec<PreambleStep>,
    pub parts: Vec<PatternPart>,
    pub conditions: Vec<Condition>,
    pub target: String,
    /// Every node variable introduced, in allocation order.
    pub variables: Vec<String>,
    pub stats: CompilationStats,
}

impl PatternQuery {
    /// Render the query as Cypher text.
    ///
    /// `inference_procedure` is only consulted when the preamble is non-empty.
    pub fn render(&self, schema: &SchemaMapping, inference_procedure: &str) -> Result<String> {
        let mut lines = Vec::new();

        for step in &self.preamble {
            render_preamble_step(step, schema, inference_procedure, &mut lines);
        }

        // One clause per part: Cypher never reuses a relationship within a
        // single MATCH, which would make `∃P.A ⊓ ∃P.B` miss a shared edge.
        for part in &self.parts {
            lines.push(format!("MATCH {}", render_part(part, schema)?));
        }

        if !self.conditions.is_empty() {
            let conditions = self
                .conditions
                .iter()
                .map(render_condition)
                .collect::<Result<Vec<_>>>()?;
            lines.push(format!("WHERE {}", conditions.join(" AND ")));
        }

        lines.push(format!("RETURN DISTINCT {}", self.target));
        Ok(lines.join("\n"))
    }

    /// Variables bound by the preamble.
    pub fn preamble_variables(&self) -> impl Iterator<Item = &str> {
        self.preamble.iter().map(|step| match step {
            PreambleStep::Subsumption { variable, .. }
            | PreambleStep::SubsumptionIntersection { variable, .. } => variable.as_str(),
        })
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn procedure_call(
    procedure: &str,
    class: &str,
    schema: &SchemaMapping,
    yield_clause: &str,
) -> String {
    format!(
        "CALL {procedure}({}, {{catLabel: {}, subCatRel: {}, catNameProp: {}}}) {yield_clause}",
        cypher::string_literal(class),
        cypher::string_literal(schema.class_label()),
        cypher::string_literal(schema.subclass_of_rel()),
        cypher::string_literal(schema.identity_key()),
    )
}

fn render_preamble_step(
    step: &PreambleStep,
    schema: &SchemaMapping,
    procedure: &str,
    lines: &mut Vec<String>,
) {
    match step {
        PreambleStep::Subsumption { class, variable } => {
            let yield_clause = format!("YIELD node AS {variable}");
            lines.push(procedure_call(procedure, class, schema, &yield_clause));
        }
        PreambleStep::SubsumptionIntersection { classes, variable } => {
            for set in classes {
                let inner = procedure_call(procedure, &set.class, schema, "YIELD node");
                lines.push(format!(
                    "CALL {{ {inner} RETURN collect(node) AS {} }}",
                    set.set_variable
                ));
            }
            let mut sets = classes.iter().map(|s| s.set_variable.clone());
            let first = sets.next().unwrap_or_else(|| "[]".to_string());
            let folded = sets.fold(first, |acc, next| {
                format!("apoc.coll.intersection({acc}, {next})")
            });
            lines.push(format!("UNWIND {folded} AS {variable}"));
        }
    }
}

fn render_part(part: &PatternPart, schema: &SchemaMapping) -> Result<String> {
    Ok(match part {
        PatternPart::Node { variable, labels } => {
            let mut out = format!("({variable}");
            for label in labels {
                out.push(':');
                out.push_str(&cypher::uri_name(label)?);
            }
            out.push(')');
            out
        }
        PatternPart::Edge { from, relation, to } => {
            format!("({from})-[:{}]->({to})", cypher::uri_name(relation)?)
        }
        PatternPart::ValueEdge {
            from,
            relation,
            to,
            individual,
        } => format!(
            "({from})-[:{}]->({to} {{{}: {}}})",
            cypher::uri_name(relation)?,
            cypher::schema_name(schema.identity_key()),
            cypher::string_literal(individual),
        ),
    })
}

fn render_condition(condition: &Condition) -> Result<String> {
    Ok(match condition {
        Condition::HasAttribute { variable, key } => {
            format!("{variable}.{} IS NOT NULL", cypher::uri_name(key)?)
        }
        Condition::AttributeEquals {
            variable,
            key,
            value,
        } => format!(
            "{variable}.{} = {}",
            cypher::uri_name(key)?,
            cypher::literal(value)?
        ),
        Condition::Unsatisfiable => "false".to_string(),
    })
}
