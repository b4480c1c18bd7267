//! Class expressions and data ranges.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::entity::{local_name, DataProperty, Datatype, NamedIndividual, ObjectProperty, OwlClass};
use crate::literal::Literal;
use crate::vocab;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Min,
    Max,
    Exact,
}

/// A description-logic class expression.
///
/// Operand sets are ordered, so two intersections built from the same
/// operands in a different order are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassExpression {
    Thing,
    Nothing,
    Class(OwlClass),
    Intersection(BTreeSet<ClassExpression>),
    Union(BTreeSet<ClassExpression>),
    Complement(Box<ClassExpression>),
    ObjectSomeValuesFrom {
        property: ObjectProperty,
        filler: Box<ClassExpression>,
    },
    ObjectAllValuesFrom {
        property: ObjectProperty,
        filler: Box<ClassExpression>,
    },
    ObjectHasValue {
        property: ObjectProperty,
        individual: NamedIndividual,
    },
    ObjectCardinality {
        restriction: Cardinality,
        cardinality: u32,
        property: ObjectProperty,
        filler: Box<ClassExpression>,
    },
    DataSomeValuesFrom {
        property: DataProperty,
    },
    DataHasValue {
        property: DataProperty,
        value: Literal,
    },
    DataAllValuesFrom {
        property: DataProperty,
        range: Datatype,
    },
}

impl ClassExpression {
    /// A named class. `owl:Thing` and `owl:Nothing` map to their dedicated
    /// variants.
    pub fn class(uri: impl Into<String>) -> Self {
        let cls = OwlClass::new(uri);
        if cls.is_thing() {
            ClassExpression::Thing
        } else if cls.is_nothing() {
            ClassExpression::Nothing
        } else {
            ClassExpression::Class(cls)
        }
    }

    /// Conjunction of `operands`: `Thing` when empty, the operand itself when
    /// there is only one.
    pub fn intersection_of<I>(operands: I) -> Self
    where
        I: IntoIterator<Item = ClassExpression>,
    {
        let mut set: BTreeSet<ClassExpression> = operands.into_iter().collect();
        match set.len() {
            0 => ClassExpression::Thing,
            1 => set.pop_first().unwrap_or(ClassExpression::Thing),
            _ => ClassExpression::Intersection(set),
        }
    }

    pub fn union_of<I>(operands: I) -> Self
    where
        I: IntoIterator<Item = ClassExpression>,
    {
        let mut set: BTreeSet<ClassExpression> = operands.into_iter().collect();
        match set.len() {
            0 => ClassExpression::Nothing,
            1 => set.pop_first().unwrap_or(ClassExpression::Nothing),
            _ => ClassExpression::Union(set),
        }
    }

    pub fn complement(operand: ClassExpression) -> Self {
        ClassExpression::Complement(Box::new(operand))
    }

    pub fn some(property: impl Into<ObjectProperty>, filler: ClassExpression) -> Self {
        ClassExpression::ObjectSomeValuesFrom {
            property: property.into(),
            filler: Box::new(filler),
        }
    }

    pub fn only(property: impl Into<ObjectProperty>, filler: ClassExpression) -> Self {
        ClassExpression::ObjectAllValuesFrom {
            property: property.into(),
            filler: Box::new(filler),
        }
    }

    pub fn has_value(
        property: impl Into<ObjectProperty>,
        individual: impl Into<NamedIndividual>,
    ) -> Self {
        ClassExpression::ObjectHasValue {
            property: property.into(),
            individual: individual.into(),
        }
    }

    pub fn cardinality(
        restriction: Cardinality,
        cardinality: u32,
        property: impl Into<ObjectProperty>,
        filler: ClassExpression,
    ) -> Self {
        ClassExpression::ObjectCardinality {
            restriction,
            cardinality,
            property: property.into(),
            filler: Box::new(filler),
        }
    }

    pub fn data_some(property: impl Into<DataProperty>) -> Self {
        ClassExpression::DataSomeValuesFrom {
            property: property.into(),
        }
    }

    pub fn data_has_value(property: impl Into<DataProperty>, value: impl Into<Literal>) -> Self {
        ClassExpression::DataHasValue {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn data_only(property: impl Into<DataProperty>, range: impl Into<Datatype>) -> Self {
        ClassExpression::DataAllValuesFrom {
            property: property.into(),
            range: range.into(),
        }
    }

    /// Named expressions are `Thing`, `Nothing` and plain classes.
    pub fn is_anonymous(&self) -> bool {
        !matches!(
            self,
            ClassExpression::Thing | ClassExpression::Nothing | ClassExpression::Class(_)
        )
    }

    pub fn is_thing(&self) -> bool {
        matches!(self, ClassExpression::Thing)
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, ClassExpression::Nothing)
    }

    /// The class behind a named expression, with `Thing`/`Nothing` mapped to
    /// their OWL IRIs. `None` for anonymous expressions.
    pub fn as_named_class(&self) -> Option<OwlClass> {
        match self {
            ClassExpression::Thing => Some(OwlClass::thing()),
            ClassExpression::Nothing => Some(OwlClass::nothing()),
            ClassExpression::Class(cls) => Some(cls.clone()),
            _ => None,
        }
    }

    /// Nesting depth; a named class has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            ClassExpression::Thing
            | ClassExpression::Nothing
            | ClassExpression::Class(_)
            | ClassExpression::ObjectHasValue { .. }
            | ClassExpression::DataSomeValuesFrom { .. }
            | ClassExpression::DataHasValue { .. }
            | ClassExpression::DataAllValuesFrom { .. } => 1,
            ClassExpression::Intersection(ops) | ClassExpression::Union(ops) => {
                1 + ops.iter().map(ClassExpression::depth).max().unwrap_or(0)
            }
            ClassExpression::Complement(op) => 1 + op.depth(),
            ClassExpression::ObjectSomeValuesFrom { filler, .. }
            | ClassExpression::ObjectAllValuesFrom { filler, .. }
            | ClassExpression::ObjectCardinality { filler, .. } => 1 + filler.depth(),
        }
    }

    /// Rebuild the tree through the smart constructors.
    ///
    /// Deserialized or hand-assembled trees may carry `Class(owl:Thing)`,
    /// `Class(owl:Nothing)` or zero- and one-operand sets; those become the
    /// dedicated variants and plain operands.
    pub fn normalized(&self) -> ClassExpression {
        match self {
            ClassExpression::Class(cls) => ClassExpression::class(cls.uri()),
            ClassExpression::Intersection(ops) => {
                ClassExpression::intersection_of(ops.iter().map(ClassExpression::normalized))
            }
            ClassExpression::Union(ops) => {
                ClassExpression::union_of(ops.iter().map(ClassExpression::normalized))
            }
            ClassExpression::Complement(op) => ClassExpression::complement(op.normalized()),
            ClassExpression::ObjectSomeValuesFrom { property, filler } => {
                ClassExpression::some(property.clone(), filler.normalized())
            }
            ClassExpression::ObjectAllValuesFrom { property, filler } => {
                ClassExpression::only(property.clone(), filler.normalized())
            }
            ClassExpression::ObjectCardinality {
                restriction,
                cardinality,
                property,
                filler,
            } => ClassExpression::cardinality(
                *restriction,
                *cardinality,
                property.clone(),
                filler.normalized(),
            ),
            other => other.clone(),
        }
    }
}

impl From<OwlClass> for ClassExpression {
    fn from(cls: OwlClass) -> Self {
        ClassExpression::class(cls.into_uri())
    }
}

fn render_operands(
    f: &mut fmt::Formatter<'_>,
    ops: &BTreeSet<ClassExpression>,
    sep: &str,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, op) in ops.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{op}")?;
    }
    f.write_str(")")
}

/// DL syntax with local names, e.g. `(A ⊓ ∃p.C)`.
impl fmt::Display for ClassExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassExpression::Thing => f.write_str("⊤"),
            ClassExpression::Nothing => f.write_str("⊥"),
            ClassExpression::Class(cls) => f.write_str(local_name(cls.uri())),
            ClassExpression::Intersection(ops) => render_operands(f, ops, " ⊓ "),
            ClassExpression::Union(ops) => render_operands(f, ops, " ⊔ "),
            ClassExpression::Complement(op) => write!(f, "¬{op}"),
            ClassExpression::ObjectSomeValuesFrom { property, filler } => {
                write!(f, "∃{}.{filler}", local_name(property.uri()))
            }
            ClassExpression::ObjectAllValuesFrom { property, filler } => {
                write!(f, "∀{}.{filler}", local_name(property.uri()))
            }
            ClassExpression::ObjectHasValue {
                property,
                individual,
            } => write!(
                f,
                "∃{}.{{{}}}",
                local_name(property.uri()),
                local_name(individual.uri())
            ),
            ClassExpression::ObjectCardinality {
                restriction,
                cardinality,
                property,
                filler,
            } => {
                let op = match restriction {
                    Cardinality::Min => "≥",
                    Cardinality::Max => "≤",
                    Cardinality::Exact => "=",
                };
                write!(
                    f,
                    "{op} {cardinality} {}.{filler}",
                    local_name(property.uri())
                )
            }
            ClassExpression::DataSomeValuesFrom { property } => {
                write!(f, "∃{}.⊤ᴰ", local_name(property.uri()))
            }
            ClassExpression::DataHasValue { property, value } => {
                write!(f, "∃{}.{{{value}}}", local_name(property.uri()))
            }
            ClassExpression::DataAllValuesFrom { property, range } => write!(
                f,
                "∀{}.{}",
                local_name(property.uri()),
                local_name(range.uri())
            ),
        }
    }
}

/// The range of a data property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataRange {
    Datatype(Datatype),
    Intersection(BTreeSet<Datatype>),
}

impl DataRange {
    /// `rdfs:Literal` when empty, the datatype itself when there is only one.
    pub fn intersection_of<I>(datatypes: I) -> Self
    where
        I: IntoIterator<Item = Datatype>,
    {
        let mut set: BTreeSet<Datatype> = datatypes.into_iter().collect();
        match set.len() {
            0 => DataRange::Datatype(Datatype::top()),
            1 => DataRange::Datatype(set.pop_first().unwrap_or_else(Datatype::top)),
            _ => DataRange::Intersection(set),
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(self, DataRange::Datatype(dt) if dt.uri() == vocab::RDFS_LITERAL)
    }
}
