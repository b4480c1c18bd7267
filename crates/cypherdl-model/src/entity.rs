//! Named entities: thin, ordered wrappers around URI strings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vocab;

/// The kinds of named entity the reasoner can hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Class,
    ObjectProperty,
    DataProperty,
    NamedIndividual,
    Datatype,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Class => "class",
            EntityKind::ObjectProperty => "object property",
            EntityKind::DataProperty => "data property",
            EntityKind::NamedIndividual => "named individual",
            EntityKind::Datatype => "datatype",
        };
        f.write_str(s)
    }
}

/// Common surface of every URI-identified entity type.
pub trait NamedEntity: Clone + Ord + fmt::Debug {
    const KIND: EntityKind;

    fn from_uri(uri: String) -> Self;

    fn uri(&self) -> &str;
}

macro_rules! named_entity {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(uri: impl Into<String>) -> Self {
                Self(uri.into())
            }

            pub fn uri(&self) -> &str {
                &self.0
            }

            pub fn into_uri(self) -> String {
                self.0
            }
        }

        impl NamedEntity for $name {
            const KIND: EntityKind = EntityKind::$kind;

            fn from_uri(uri: String) -> Self {
                Self(uri)
            }

            fn uri(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(uri: &str) -> Self {
                Self::new(uri)
            }
        }

        impl From<String> for $name {
            fn from(uri: String) -> Self {
                Self(uri)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "<{}>", self.0)
            }
        }
    };
}

named_entity!(
    /// A named OWL class.
    OwlClass => Class
);
named_entity!(ObjectProperty => ObjectProperty);
named_entity!(DataProperty => DataProperty);
named_entity!(NamedIndividual => NamedIndividual);
named_entity!(
    /// A datatype IRI such as `xsd:string`.
    Datatype => Datatype
);

impl OwlClass {
    pub fn thing() -> Self {
        Self::new(vocab::OWL_THING)
    }

    pub fn nothing() -> Self {
        Self::new(vocab::OWL_NOTHING)
    }

    pub fn is_thing(&self) -> bool {
        self.0 == vocab::OWL_THING
    }

    pub fn is_nothing(&self) -> bool {
        self.0 == vocab::OWL_NOTHING
    }
}

impl Datatype {
    /// `rdfs:Literal`, the top of the datatype lattice.
    pub fn top() -> Self {
        Self::new(vocab::RDFS_LITERAL)
    }
}

/// Any named entity, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Class(OwlClass),
    ObjectProperty(ObjectProperty),
    DataProperty(DataProperty),
    NamedIndividual(NamedIndividual),
    Datatype(Datatype),
}

impl Entity {
    pub fn new(kind: EntityKind, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        match kind {
            EntityKind::Class => Entity::Class(OwlClass(uri)),
            EntityKind::ObjectProperty => Entity::ObjectProperty(ObjectProperty(uri)),
            EntityKind::DataProperty => Entity::DataProperty(DataProperty(uri)),
            EntityKind::NamedIndividual => Entity::NamedIndividual(NamedIndividual(uri)),
            EntityKind::Datatype => Entity::Datatype(Datatype(uri)),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Class(_) => EntityKind::Class,
            Entity::ObjectProperty(_) => EntityKind::ObjectProperty,
            Entity::DataProperty(_) => EntityKind::DataProperty,
            Entity::NamedIndividual(_) => EntityKind::NamedIndividual,
            Entity::Datatype(_) => EntityKind::Datatype,
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            Entity::Class(e) => e.uri(),
            Entity::ObjectProperty(e) => e.uri(),
            Entity::DataProperty(e) => e.uri(),
            Entity::NamedIndividual(e) => e.uri(),
            Entity::Datatype(e) => e.uri(),
        }
    }
}

/// Fragment or last path segment of an IRI, used for compact rendering.
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}
