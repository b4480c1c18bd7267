//! The `Reasoner` contract and its Cypher-backed implementation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cypherdl_model::{
    ClassExpression, DataProperty, DataRange, Datatype, Literal, NamedIndividual, ObjectProperty,
    OwlClass,
};

use crate::catalog::{
    DatatypeFilter, QueryCatalog, QueryId, INDIVIDUAL_COLUMN, PROPERTY_COLUMN, TARGET_COLUMN,
    URI_COLUMN, VALUE_COLUMN,
};
use crate::compiler::ExpressionCompiler;
use crate::config::ReasonerConfig;
use crate::decode::{self, Decoder};
use crate::error::{ReasonerError, Result};
use crate::schema::SchemaMapping;
use crate::store::{GraphStore, ReadSession, Row, Statement, Value};

pub type ObjectRelationships = BTreeMap<ObjectProperty, BTreeSet<NamedIndividual>>;
pub type DataRelationships = BTreeMap<DataProperty, BTreeSet<Literal>>;
pub type ObjectMembers = BTreeMap<NamedIndividual, BTreeSet<NamedIndividual>>;
pub type DataMembers = BTreeMap<NamedIndividual, BTreeSet<Literal>>;

/// Structural queries over an ontology.
///
/// Class arguments of the hierarchy queries must be named (`Thing`,
/// `Nothing` or a class); anonymous expressions fail with
/// [`ReasonerError::UnsupportedConstruct`]. Domain and range queries never
/// fail for a missing axiom: no axiom means `owl:Thing` (or `rdfs:Literal`
/// for data ranges).
pub trait Reasoner {
    fn classes(&self) -> Result<BTreeSet<OwlClass>>;
    fn object_properties(&self) -> Result<BTreeSet<ObjectProperty>>;
    fn data_properties(&self) -> Result<BTreeSet<DataProperty>>;
    /// Data properties whose declared range matches `filter`.
    fn data_properties_with_range(
        &self,
        filter: DatatypeFilter,
    ) -> Result<BTreeSet<DataProperty>>;

    fn sub_classes(&self, ce: &ClassExpression) -> Result<BTreeSet<OwlClass>>;
    fn super_classes(&self, ce: &ClassExpression) -> Result<BTreeSet<OwlClass>>;
    fn is_super_class_of(&self, sup: &ClassExpression, sub: &ClassExpression) -> Result<bool>;

    fn sub_object_properties(&self, p: &ObjectProperty) -> Result<BTreeSet<ObjectProperty>>;
    fn super_object_properties(&self, p: &ObjectProperty) -> Result<BTreeSet<ObjectProperty>>;
    fn sub_data_properties(&self, p: &DataProperty) -> Result<BTreeSet<DataProperty>>;
    fn super_data_properties(&self, p: &DataProperty) -> Result<BTreeSet<DataProperty>>;

    fn object_property_domain(&self, p: &ObjectProperty) -> Result<ClassExpression>;
    fn object_property_range(&self, p: &ObjectProperty) -> Result<ClassExpression>;
    fn data_property_domain(&self, p: &DataProperty) -> Result<ClassExpression>;
    fn data_property_range(&self, p: &DataProperty) -> Result<DataRange>;

    /// Instances of `ce`.
    fn individuals(&self, ce: &ClassExpression) -> Result<BTreeSet<NamedIndividual>>;

    fn has_type(&self, ce: &ClassExpression, individual: &NamedIndividual) -> Result<bool> {
        Ok(self.individuals(ce)?.contains(individual))
    }

    /// Outgoing edges of `individual`, grouped by edge type.
    fn object_property_relationships(
        &self,
        individual: &NamedIndividual,
    ) -> Result<ObjectRelationships>;

    /// Attribute values of `individual`. Fails with
    /// [`ReasonerError::NotFound`] if the individual has no node.
    fn data_property_relationships(
        &self,
        individual: &NamedIndividual,
    ) -> Result<DataRelationships>;

    /// Every `(subject, object)` pair connected by `p`, grouped by subject.
    fn object_property_members(&self, p: &ObjectProperty) -> Result<ObjectMembers>;

    /// Every individual carrying attribute `p`, with its values.
    fn data_property_members(&self, p: &DataProperty) -> Result<DataMembers>;
}

// ============================================================================
// Cypher-backed facade
// ============================================================================

/// Routes each query either to a catalog template or to the expression
/// compiler, runs it in its own read session and decodes the rows.
#[derive(Debug)]
pub struct CypherReasoner<S> {
    store: S,
    catalog: Arc<QueryCatalog>,
    compiler: ExpressionCompiler,
    decoder: Decoder,
    schema: SchemaMapping,
}

impl<S: Clone> Clone for CypherReasoner<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            catalog: Arc::clone(&self.catalog),
            compiler: self.compiler.clone(),
            decoder: self.decoder.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl<S: GraphStore> CypherReasoner<S> {
    pub fn new(store: S, config: &ReasonerConfig) -> Self {
        Self {
            store,
            catalog: Arc::new(QueryCatalog::new(&config.schema)),
            compiler: config.compiler(),
            decoder: Decoder::new(&config.schema),
            schema: config.schema.clone(),
        }
    }

    pub fn with_defaults(store: S) -> Self {
        Self::new(store, &ReasonerConfig::default())
    }

    /// Replace the template catalog.
    pub fn with_catalog(mut self, catalog: impl Into<Arc<QueryCatalog>>) -> Self {
        self.catalog = catalog.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    pub fn compiler(&self) -> &ExpressionCompiler {
        &self.compiler
    }

    pub fn schema(&self) -> &SchemaMapping {
        &self.schema
    }

    /// Issue one statement in a fresh session. The session is dropped on
    /// every path out of this function.
    fn run(&self, query: &str, statement: &Statement) -> Result<Vec<Row>> {
        tracing::debug!(
            query,
            params = ?statement.parameter_names(),
            "issuing read statement"
        );
        let mut session = self.store.open_read_session()?;
        let rows = session.run_read(statement)?;
        Ok(rows)
    }

    fn run_template(&self, id: QueryId, params: &[(&str, &str)]) -> Result<Vec<Row>> {
        let mut statement = Statement::new(self.catalog.get(id)?);
        for (name, value) in params {
            statement = statement.param(*name, *value);
        }
        self.run(id.name(), &statement)
    }

    fn uris<E: cypherdl_model::NamedEntity>(
        &self,
        id: QueryId,
        uri: Option<&str>,
    ) -> Result<BTreeSet<E>> {
        let rows = match uri {
            Some(uri) => self.run_template(id, &[("uri", uri)])?,
            None => self.run_template(id, &[])?,
        };
        self.decoder.entities(&rows, URI_COLUMN)
    }

    fn class_expression_of(&self, id: QueryId, uri: &str) -> Result<ClassExpression> {
        let classes: BTreeSet<OwlClass> = self.uris(id, Some(uri))?;
        Ok(ClassExpression::intersection_of(
            classes.into_iter().map(ClassExpression::from),
        ))
    }

    fn individuals_in(&self, rows: &[Row]) -> Result<BTreeSet<NamedIndividual>> {
        self.decoder.entities(rows, INDIVIDUAL_COLUMN)
    }
}

fn named(ce: &ClassExpression, operation: &str) -> Result<OwlClass> {
    ce.normalized().as_named_class().ok_or_else(|| {
        ReasonerError::unsupported(format!("{operation} needs a named class, got {ce}"))
    })
}

impl<S: GraphStore> Reasoner for CypherReasoner<S> {
    fn classes(&self) -> Result<BTreeSet<OwlClass>> {
        self.uris(QueryId::Classes, None)
    }

    fn object_properties(&self) -> Result<BTreeSet<ObjectProperty>> {
        self.uris(QueryId::ObjectProperties, None)
    }

    fn data_properties(&self) -> Result<BTreeSet<DataProperty>> {
        self.uris(QueryId::DataProperties, None)
    }

    fn data_properties_with_range(
        &self,
        filter: DatatypeFilter,
    ) -> Result<BTreeSet<DataProperty>> {
        self.uris(filter.query_id(), None)
    }

    fn sub_classes(&self, ce: &ClassExpression) -> Result<BTreeSet<OwlClass>> {
        let cls = named(ce, "sub_classes")?;
        if cls.is_nothing() {
            return Ok(BTreeSet::new());
        }
        let id = if cls.is_thing() {
            QueryId::RootClasses
        } else {
            QueryId::SubClasses
        };
        self.uris(id, Some(cls.uri()))
    }

    fn super_classes(&self, ce: &ClassExpression) -> Result<BTreeSet<OwlClass>> {
        let cls = named(ce, "super_classes")?;
        if cls.is_thing() {
            return Ok(BTreeSet::new());
        }
        self.uris(QueryId::SuperClasses, Some(cls.uri()))
    }

    fn is_super_class_of(&self, sup: &ClassExpression, sub: &ClassExpression) -> Result<bool> {
        let sup = named(sup, "is_super_class_of")?;
        let sub = named(sub, "is_super_class_of")?;
        if sup.is_thing() || sub.is_nothing() || sup == sub {
            return Ok(true);
        }
        let rows = self.run_template(
            QueryId::IsSubClassOf,
            &[("sub_uri", sub.uri()), ("sup_uri", sup.uri())],
        )?;
        Ok(!rows.is_empty())
    }

    fn sub_object_properties(&self, p: &ObjectProperty) -> Result<BTreeSet<ObjectProperty>> {
        self.uris(QueryId::SubObjectProperties, Some(p.uri()))
    }

    fn super_object_properties(&self, p: &ObjectProperty) -> Result<BTreeSet<ObjectProperty>> {
        self.uris(QueryId::SuperObjectProperties, Some(p.uri()))
    }

    fn sub_data_properties(&self, p: &DataProperty) -> Result<BTreeSet<DataProperty>> {
        self.uris(QueryId::SubDataProperties, Some(p.uri()))
    }

    fn super_data_properties(&self, p: &DataProperty) -> Result<BTreeSet<DataProperty>> {
        self.uris(QueryId::SuperDataProperties, Some(p.uri()))
    }

    fn object_property_domain(&self, p: &ObjectProperty) -> Result<ClassExpression> {
        self.class_expression_of(QueryId::ObjectPropertyDomain, p.uri())
    }

    fn object_property_range(&self, p: &ObjectProperty) -> Result<ClassExpression> {
        self.class_expression_of(QueryId::ObjectPropertyRange, p.uri())
    }

    fn data_property_domain(&self, p: &DataProperty) -> Result<ClassExpression> {
        self.class_expression_of(QueryId::DataPropertyDomain, p.uri())
    }

    fn data_property_range(&self, p: &DataProperty) -> Result<DataRange> {
        let datatypes: BTreeSet<Datatype> = self.uris(QueryId::DataPropertyRange, Some(p.uri()))?;
        Ok(DataRange::intersection_of(datatypes))
    }

    fn individuals(&self, ce: &ClassExpression) -> Result<BTreeSet<NamedIndividual>> {
        let ce = ce.normalized();
        match &ce {
            ClassExpression::Nothing => Ok(BTreeSet::new()),
            ClassExpression::Thing => {
                let rows = self.run_template(QueryId::AllIndividuals, &[])?;
                self.individuals_in(&rows)
            }
            _ => {
                // Compile before touching the store: a rejected expression
                // must not open a session.
                let text = self.compiler.compile(&ce, Some(INDIVIDUAL_COLUMN))?;
                let rows = self.run("compiled", &Statement::new(text))?;
                self.individuals_in(&rows)
            }
        }
    }

    fn object_property_relationships(
        &self,
        individual: &NamedIndividual,
    ) -> Result<ObjectRelationships> {
        let rows = self.run_template(QueryId::IndividualEdges, &[("uri", individual.uri())])?;
        let mut grouped = ObjectRelationships::new();
        for row in &rows {
            let property: ObjectProperty = self.decoder.entity(row, PROPERTY_COLUMN)?;
            let target: NamedIndividual = self.decoder.entity(row, TARGET_COLUMN)?;
            grouped.entry(property).or_default().insert(target);
        }
        Ok(grouped)
    }

    fn data_property_relationships(
        &self,
        individual: &NamedIndividual,
    ) -> Result<DataRelationships> {
        let rows = self.run_template(QueryId::IndividualNode, &[("uri", individual.uri())])?;
        let Some(row) = rows.first() else {
            return Err(ReasonerError::NotFound(individual.uri().to_string()));
        };
        let node = match decode::column(row, INDIVIDUAL_COLUMN)? {
            Value::Node(node) => node,
            other => {
                return Err(ReasonerError::UnexpectedValue {
                    column: INDIVIDUAL_COLUMN.to_string(),
                    expected: "node".to_string(),
                    actual: other.kind_name().to_string(),
                })
            }
        };

        let mut values = DataRelationships::new();
        for (key, value) in &node.properties {
            if self.schema.is_reserved_key(key) {
                continue;
            }
            let literals = decode::literals(value);
            if !literals.is_empty() {
                values.insert(DataProperty::new(key.as_str()), literals);
            }
        }
        Ok(values)
    }

    fn object_property_members(&self, p: &ObjectProperty) -> Result<ObjectMembers> {
        let text = self.catalog.keyed(QueryId::ObjectPropertyMembers, p.uri())?;
        let rows = self.run(QueryId::ObjectPropertyMembers.name(), &Statement::new(text))?;
        let mut members = ObjectMembers::new();
        for row in &rows {
            let subject: NamedIndividual = self.decoder.entity(row, INDIVIDUAL_COLUMN)?;
            let target: NamedIndividual = self.decoder.entity(row, TARGET_COLUMN)?;
            members.entry(subject).or_default().insert(target);
        }
        Ok(members)
    }

    fn data_property_members(&self, p: &DataProperty) -> Result<DataMembers> {
        let text = self.catalog.keyed(QueryId::DataPropertyMembers, p.uri())?;
        let rows = self.run(QueryId::DataPropertyMembers.name(), &Statement::new(text))?;
        let mut members = DataMembers::new();
        for row in &rows {
            let subject: NamedIndividual = self.decoder.entity(row, INDIVIDUAL_COLUMN)?;
            let literals = decode::literals(decode::column(row, VALUE_COLUMN)?);
            if !literals.is_empty() {
                members.entry(subject).or_default().extend(literals);
            }
        }
        Ok(members)
    }
}
