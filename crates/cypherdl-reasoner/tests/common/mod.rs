//! Shared fixtures: a scripted store that records what it was asked, and an
//! in-memory graph that evaluates the compiler's pattern IR and the
//! catalog's schema templates directly.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use cypherdl_model::{ClassExpression, Literal};
use cypherdl_reasoner::{
    Condition, ExpressionCompiler, GraphStore, Node, PatternPart, PatternQuery, ReadSession, Row,
    Statement, StoreError, Value,
};

pub const EX: &str = "http://ex.org/";

pub fn ex(local: &str) -> String {
    format!("{EX}{local}")
}

pub fn uri_rows<S: AsRef<str>>(uris: &[S]) -> Vec<Row> {
    uris.iter()
        .map(|uri| Row::new().with("uri", uri.as_ref()))
        .collect()
}

pub fn individual_node(uri: &str) -> Node {
    Node::new()
        .with_label("Resource")
        .with_property("uri", uri)
}

// ============================================================================
// Scripted store
// ============================================================================

type Responder = Box<dyn Fn(&Statement) -> Option<Result<Vec<Row>, StoreError>>>;

/// Answers statements from a script; anything unscripted gets zero rows.
#[derive(Default)]
pub struct ScriptedStore {
    responders: Vec<Responder>,
    unavailable: bool,
    statements: RefCell<Vec<Statement>>,
    opened: Cell<usize>,
    closed: Cell<usize>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements with exactly this text.
    pub fn on(mut self, text: impl Into<String>, rows: Vec<Row>) -> Self {
        let text = text.into();
        self.responders.push(Box::new(move |stmt: &Statement| {
            (stmt.text == text).then(|| Ok(rows.clone()))
        }));
        self
    }

    /// Answer statements with this text whose `param` is bound to `value`.
    pub fn on_param(
        mut self,
        text: impl Into<String>,
        param: &str,
        value: &str,
        rows: Vec<Row>,
    ) -> Self {
        let text = text.into();
        let param = param.to_string();
        let value = Value::from(value);
        self.responders.push(Box::new(move |stmt: &Statement| {
            (stmt.text == text && stmt.parameters.get(&param) == Some(&value))
                .then(|| Ok(rows.clone()))
        }));
        self
    }

    /// Fail statements with this text.
    pub fn failing_on(mut self, text: impl Into<String>, message: &str) -> Self {
        let text = text.into();
        let message = message.to_string();
        self.responders.push(Box::new(move |stmt: &Statement| {
            (stmt.text == text).then(|| Err(StoreError::new(message.clone())))
        }));
        self
    }

    /// Refuse to open sessions at all.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.borrow().clone()
    }

    pub fn opened(&self) -> usize {
        self.opened.get()
    }

    pub fn closed(&self) -> usize {
        self.closed.get()
    }
}

pub struct ScriptedSession<'a> {
    store: &'a ScriptedStore,
}

impl ReadSession for ScriptedSession<'_> {
    fn run_read(&mut self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        self.store.statements.borrow_mut().push(statement.clone());
        self.store
            .responders
            .iter()
            .find_map(|respond| respond(statement))
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

impl Drop for ScriptedSession<'_> {
    fn drop(&mut self) {
        self.store.closed.set(self.store.closed.get() + 1);
    }
}

impl GraphStore for ScriptedStore {
    type Session<'a> = ScriptedSession<'a>;

    fn open_read_session(&self) -> Result<Self::Session<'_>, StoreError> {
        if self.unavailable {
            return Err(StoreError::new("connection refused"));
        }
        self.opened.set(self.opened.get() + 1);
        Ok(ScriptedSession { store: self })
    }
}

// ============================================================================
// In-memory graph
// ============================================================================

/// A tiny labelled property graph. Nodes are identified by their `uri`
/// attribute; class membership is a label per class URI.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: BTreeSet<(usize, String, usize)>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or extend) the individual `uri` with class labels.
    pub fn individual(&mut self, uri: &str, classes: &[&str]) -> &mut Self {
        let id = self.node_id(uri);
        for class in classes {
            self.nodes[id].labels.insert(class.to_string());
        }
        self
    }

    pub fn attribute(&mut self, uri: &str, key: &str, value: impl Into<Value>) -> &mut Self {
        let id = self.node_id(uri);
        self.nodes[id].properties.insert(key.to_string(), value.into());
        self
    }

    pub fn edge(&mut self, from: &str, relation: &str, to: &str) -> &mut Self {
        let from = self.node_id(from);
        let to = self.node_id(to);
        self.edges.insert((from, relation.to_string(), to));
        self
    }

    /// A class node (default `Class` label) with subclass-of edges to
    /// `supers`. Superclasses that are never declared stay plain resources.
    pub fn class(&mut self, uri: &str, supers: &[&str]) -> &mut Self {
        let id = self.node_id(uri);
        self.nodes[id].labels.insert("Class".to_string());
        for sup in supers {
            self.edge(uri, "SCO", sup);
        }
        self
    }

    /// An object property node with domain and range edges.
    pub fn object_property(&mut self, uri: &str, domains: &[&str], ranges: &[&str]) -> &mut Self {
        let id = self.node_id(uri);
        self.nodes[id].labels.insert("Relationship".to_string());
        for domain in domains {
            self.edge(uri, "DOMAIN", domain);
        }
        for range in ranges {
            self.edge(uri, "RANGE", range);
        }
        self
    }

    pub fn node(&self, uri: &str) -> Option<&Node> {
        self.index.get(uri).map(|&id| &self.nodes[id])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn uris(&self) -> BTreeSet<String> {
        (0..self.nodes.len()).map(|id| self.uri_of(id)).collect()
    }

    /// Targets of `relation` edges leaving `uri`.
    pub fn successors(&self, uri: &str, relation: &str) -> BTreeSet<String> {
        let Some(&from) = self.index.get(uri) else {
            return BTreeSet::new();
        };
        self.edges
            .iter()
            .filter(|(f, r, _)| *f == from && r == relation)
            .map(|(_, _, to)| self.uri_of(*to))
            .collect()
    }

    fn node_id(&mut self, uri: &str) -> usize {
        if let Some(&id) = self.index.get(uri) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(individual_node(uri));
        self.index.insert(uri.to_string(), id);
        id
    }

    fn uri_of(&self, id: usize) -> String {
        self.nodes[id]
            .property("uri")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// URIs bound to the target variable by some assignment satisfying every
    /// part and condition. Direct-mode queries only.
    pub fn evaluate(&self, query: &PatternQuery) -> BTreeSet<String> {
        assert!(query.preamble.is_empty(), "inference preambles are not evaluated");
        if query.conditions.contains(&Condition::Unsatisfiable) {
            return BTreeSet::new();
        }

        let slots: HashMap<&str, usize> = query
            .variables
            .iter()
            .enumerate()
            .map(|(i, v)| (v.as_str(), i))
            .collect();
        let constraints: Vec<Constraint<'_>> = query
            .parts
            .iter()
            .map(Constraint::Part)
            .chain(query.conditions.iter().map(Constraint::Condition))
            .collect();

        let mut assignment = vec![None; query.variables.len()];
        let mut found = BTreeSet::new();
        let target = slots.get(query.target.as_str()).copied();
        let mut emit = |assignment: &[Option<usize>]| {
            if let Some(id) = target.and_then(|s| assignment[s]) {
                found.insert(self.uri_of(id));
            }
        };
        self.search(0, &mut assignment, &slots, &constraints, &mut emit);
        found
    }

    fn search(
        &self,
        slot: usize,
        assignment: &mut Vec<Option<usize>>,
        slots: &HashMap<&str, usize>,
        constraints: &[Constraint<'_>],
        emit: &mut dyn FnMut(&[Option<usize>]),
    ) {
        if slot == assignment.len() {
            emit(assignment);
            return;
        }
        for id in 0..self.nodes.len() {
            assignment[slot] = Some(id);
            let consistent = constraints
                .iter()
                .all(|c| c.check(self, assignment, slots).unwrap_or(true));
            if consistent {
                self.search(slot + 1, assignment, slots, constraints, emit);
            }
        }
        assignment[slot] = None;
    }

    /// The nodes behind `uris` as `individual` rows.
    fn rows_for(&self, uris: &BTreeSet<String>) -> Vec<Row> {
        uris.iter()
            .filter_map(|uri| self.node(uri))
            .map(|node| Row::new().with("individual", node.clone()))
            .collect()
    }
}

// ============================================================================
// Schema templates
// ============================================================================

/// `(variable:Label {key: $param})` as written in catalog templates.
#[derive(Debug)]
struct NodePattern {
    variable: String,
    labels: Vec<String>,
    key: Option<(String, String)>,
}

/// One `MATCH ... [WHERE NOT (v)-[:R]->()] RETURN v.key AS column` branch.
#[derive(Debug)]
struct TemplateBranch {
    from: NodePattern,
    edge: Option<(String, NodePattern)>,
    without_edge: Option<(String, String)>,
    returned: (String, String),
    column: String,
}

fn parse_node(text: &str) -> NodePattern {
    let (head, props) = match text.split_once(" {") {
        Some((head, props)) => (head, Some(props.trim_end_matches('}'))),
        None => (text, None),
    };
    let mut names = head.split(':');
    let variable = names.next().unwrap_or_default().to_string();
    let labels = names.map(str::to_string).collect();
    let key = props
        .and_then(|p| p.split_once(": $"))
        .map(|(key, param)| (key.to_string(), param.to_string()));
    NodePattern {
        variable,
        labels,
        key,
    }
}

/// `None` for shapes the fixture does not understand.
fn parse_branch(text: &str) -> Option<TemplateBranch> {
    let rest = text.trim().strip_prefix("MATCH ")?;
    let (head, returned) = rest.split_once(" RETURN ")?;
    let (pattern, filter) = match head.split_once(" WHERE ") {
        Some((pattern, filter)) => (pattern, Some(filter)),
        None => (head, None),
    };

    let pattern = pattern.strip_prefix('(')?.strip_suffix(')')?;
    let (from, edge) = match pattern.split_once(")-[:") {
        Some((from, rest)) => {
            let (relation, to) = rest.split_once("]->(")?;
            (from, Some((relation.to_string(), parse_node(to))))
        }
        None => (pattern, None),
    };

    let without_edge = match filter {
        Some(filter) => {
            let inner = filter.strip_prefix("NOT (")?.strip_suffix("]->()")?;
            let (variable, relation) = inner.split_once(")-[:")?;
            Some((variable.to_string(), relation.to_string()))
        }
        None => None,
    };

    let returned = returned.split(" LIMIT ").next()?;
    let (expr, column) = returned.split_once(" AS ")?;
    let (variable, key) = expr.split_once('.')?;

    Some(TemplateBranch {
        from: parse_node(from),
        edge,
        without_edge,
        returned: (variable.to_string(), key.to_string()),
        column: column.to_string(),
    })
}

impl MemoryGraph {
    fn node_matches(
        &self,
        id: usize,
        pattern: &NodePattern,
        params: &BTreeMap<String, Value>,
    ) -> bool {
        let node = &self.nodes[id];
        pattern.labels.iter().all(|label| node.has_label(label))
            && pattern.key.as_ref().map_or(true, |(key, param)| {
                node.property(key).is_some() && node.property(key) == params.get(param)
            })
    }

    /// Answer a schema template (scalar-returning, optionally a `UNION`).
    /// `None` if the text is not in the supported shape.
    pub fn run_template(&self, statement: &Statement) -> Option<Vec<Row>> {
        let text = statement.text.replace('\n', " ");
        let mut column = String::new();
        let mut values = BTreeSet::new();

        for branch in text.split(" UNION ") {
            let branch = parse_branch(branch)?;
            let mut bindings: Vec<HashMap<&str, usize>> = Vec::new();
            match &branch.edge {
                Some((relation, to)) => {
                    for (f, r, t) in &self.edges {
                        if r == relation
                            && self.node_matches(*f, &branch.from, &statement.parameters)
                            && self.node_matches(*t, to, &statement.parameters)
                        {
                            bindings.push(HashMap::from([
                                (branch.from.variable.as_str(), *f),
                                (to.variable.as_str(), *t),
                            ]));
                        }
                    }
                }
                None => {
                    for id in 0..self.nodes.len() {
                        if self.node_matches(id, &branch.from, &statement.parameters) {
                            bindings.push(HashMap::from([(branch.from.variable.as_str(), id)]));
                        }
                    }
                }
            }
            if let Some((variable, relation)) = &branch.without_edge {
                bindings.retain(|b| {
                    !self
                        .edges
                        .iter()
                        .any(|(f, r, _)| Some(f) == b.get(variable.as_str()) && r == relation)
                });
            }

            let (variable, key) = &branch.returned;
            for binding in &bindings {
                let id = *binding.get(variable.as_str())?;
                if let Some(Value::String(value)) = self.nodes[id].property(key) {
                    values.insert(value.clone());
                }
            }
            column = branch.column;
        }

        Some(
            values
                .into_iter()
                .map(|value| Row::new().with(column.as_str(), value))
                .collect(),
        )
    }
}

enum Constraint<'q> {
    Part(&'q PatternPart),
    Condition(&'q Condition),
}

impl Constraint<'_> {
    /// `None` while one of the constraint's variables is still unbound.
    fn check(
        &self,
        graph: &MemoryGraph,
        assignment: &[Option<usize>],
        slots: &HashMap<&str, usize>,
    ) -> Option<bool> {
        let bound = |var: &str| slots.get(var).and_then(|&s| assignment[s]);
        match self {
            Constraint::Part(PatternPart::Node { variable, labels }) => {
                let node = &graph.nodes[bound(variable.as_str())?];
                Some(labels.iter().all(|l| node.has_label(l)))
            }
            Constraint::Part(PatternPart::Edge { from, relation, to }) => {
                let key = (bound(from.as_str())?, relation.clone(), bound(to.as_str())?);
                Some(graph.edges.contains(&key))
            }
            Constraint::Part(PatternPart::ValueEdge {
                from,
                relation,
                to,
                individual,
            }) => {
                let to = bound(to.as_str())?;
                let key = (bound(from.as_str())?, relation.clone(), to);
                Some(graph.edges.contains(&key) && graph.uri_of(to) == *individual)
            }
            Constraint::Condition(Condition::HasAttribute { variable, key }) => {
                let node = &graph.nodes[bound(variable.as_str())?];
                Some(matches!(node.property(key), Some(v) if *v != Value::Null))
            }
            Constraint::Condition(Condition::AttributeEquals {
                variable,
                key,
                value,
            }) => {
                let node = &graph.nodes[bound(variable.as_str())?];
                Some(node.property(key).is_some_and(|v| value_equals(v, value)))
            }
            Constraint::Condition(Condition::Unsatisfiable) => Some(false),
        }
    }
}

pub fn value_equals(value: &Value, literal: &Literal) -> bool {
    match (value, literal) {
        (Value::Integer(a), Literal::Integer(b)) => a == b,
        (Value::Float(a), Literal::Float(b)) => a == b,
        (Value::Integer(a), Literal::Float(b)) => (*a as f64) == *b,
        (Value::Float(a), Literal::Integer(b)) => *a == (*b as f64),
        (Value::String(a), Literal::String(b)) => a == b,
        (Value::Boolean(a), Literal::Boolean(b)) => a == b,
        _ => false,
    }
}

/// Serves compiled instance queries out of a [`MemoryGraph`].
///
/// The store only sees Cypher text, so expressions are registered up front:
/// the rendered text is the lookup key and the IR is what gets evaluated.
pub struct MemoryStore {
    graph: MemoryGraph,
    prepared: BTreeMap<String, PatternQuery>,
    opened: Cell<usize>,
}

impl MemoryStore {
    pub fn new(graph: MemoryGraph) -> Self {
        Self {
            graph,
            prepared: BTreeMap::new(),
            opened: Cell::new(0),
        }
    }

    pub fn prepare(
        &mut self,
        compiler: &ExpressionCompiler,
        expression: &ClassExpression,
        target: &str,
    ) {
        let query = compiler
            .lower(expression, Some(target))
            .expect("expression should lower");
        let text = compiler
            .compile(expression, Some(target))
            .expect("expression should compile");
        self.prepared.insert(text, query);
    }

    pub fn opened(&self) -> usize {
        self.opened.get()
    }
}

pub struct MemorySession<'a> {
    store: &'a MemoryStore,
}

impl ReadSession for MemorySession<'_> {
    fn run_read(&mut self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        let graph = &self.store.graph;
        if let Some(query) = self.store.prepared.get(&statement.text) {
            return Ok(graph.rows_for(&graph.evaluate(query)));
        }
        graph
            .run_template(statement)
            .ok_or_else(|| StoreError::new(format!("unprepared statement: {}", statement.text)))
    }
}

impl GraphStore for MemoryStore {
    type Session<'a> = MemorySession<'a>;

    fn open_read_session(&self) -> Result<Self::Session<'_>, StoreError> {
        self.opened.set(self.opened.get() + 1);
        Ok(MemorySession { store: self })
    }
}
