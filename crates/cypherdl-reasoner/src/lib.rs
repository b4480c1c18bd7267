//! Structural DL reasoning over a Cypher property graph.
//!
//! The ontology is expected in the neosemantics layout: every resource is a
//! node labelled `Resource`, classes / object properties / data properties
//! carry their own labels, the schema is wired with `SCO`, `SPO`, `DOMAIN`
//! and `RANGE` relationships, and individuals carry their class URIs as
//! labels and their data property values as node attributes.
//!
//! ```text
//!   caller ──► CypherReasoner ──► QueryCatalog (schema queries)
//!                    │       └──► ExpressionCompiler (instance retrieval)
//!                    ▼
//!               GraphStore ──► rows ──► decode ──► typed entities
//! ```
//!
//! ## Module Organization
//!
//! - `schema`: names of the graph schema primitives
//! - `catalog`: fixed query templates, materialized once per schema
//! - `compiler` / `pattern`: class expression → pattern IR → Cypher text
//! - `store`: the read-only store seam (sessions, statements, rows)
//! - `decode`: raw values → entities and literals
//! - `reasoner`: the `Reasoner` contract and its Cypher-backed facade

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod cypher;
pub mod decode;
pub mod error;
pub mod pattern;
pub mod reasoner;
pub mod schema;
pub mod store;

pub use catalog::{DatatypeFilter, QueryCatalog, QueryId};
pub use compiler::{CompilationMode, ExpressionCompiler, DEFAULT_INFERENCE_PROCEDURE};
pub use config::ReasonerConfig;
pub use error::{ReasonerError, Result};
pub use pattern::{
    CompilationStats, Condition, PatternPart, PatternQuery, PreambleStep, SubsumptionSet,
};
pub use reasoner::{
    CypherReasoner, DataMembers, DataRelationships, ObjectMembers, ObjectRelationships, Reasoner,
};
pub use schema::{SchemaMapping, SchemaMappingBuilder};
pub use store::{GraphStore, Node, ReadSession, Row, Statement, StoreError, Value};
