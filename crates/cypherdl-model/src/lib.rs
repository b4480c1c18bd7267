//! Ontology object model for cypherdl.
//!
//! Plain data only: identifiers for named entities, typed literals and the
//! class-expression tree handed to the reasoner. Nothing in this crate talks
//! to a graph store or knows about Cypher.
//!
//! Class expressions are a closed enum. Constructs the reasoner cannot answer
//! structurally (negation, disjunction, cardinality, universal restrictions)
//! are still representable so that callers can build them and the compiler
//! can reject them explicitly.

pub mod entity;
pub mod expression;
pub mod literal;
pub mod vocab;

pub use entity::{
    local_name, DataProperty, Datatype, Entity, EntityKind, NamedEntity, NamedIndividual,
    ObjectProperty, OwlClass,
};
pub use expression::{Cardinality, ClassExpression, DataRange};
pub use literal::{Literal, LiteralKind};
