//! Class expression → Cypher compiler.
//!
//! Compilation runs in two stages: [`ExpressionCompiler::lower`] walks the
//! expression tree and produces a [`PatternQuery`], and
//! [`PatternQuery::render`] turns that into text. All mutable state lives in
//! a context created per call, so one compiler can be shared across threads
//! and every call starts numbering variables from `n0` again.
//!
//! ## Emission rules
//!
//! - a named class becomes a label on the current node (direct mode) or a
//!   subsumption-procedure call binding the current node (inference mode);
//! - an intersection puts all its named operands on one shared node and
//!   visits its anonymous operands from that same node;
//! - `∃P.C` adds an edge to a fresh node and compiles `C` against it;
//! - `∃P.{a}` adds an edge to a node matched by identity;
//! - data restrictions become attribute conditions on the current node.
//!
//! Negation, disjunction, cardinality and universal restrictions are
//! rejected with [`ReasonerError::UnsupportedConstruct`] and produce no
//! partial query.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use cypherdl_model::{ClassExpression, Literal};

use crate::cypher;
use crate::error::{ReasonerError, Result};
use crate::pattern::{
    CompilationStats, Condition, PatternPart, PatternQuery, PreambleStep, SubsumptionSet,
};
use crate::schema::SchemaMapping;

pub const DEFAULT_INFERENCE_PROCEDURE: &str = "semantics.inference.nodesLabelled";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilationMode {
    /// Match class membership through node labels only.
    #[default]
    Direct,
    /// Match class membership through the subsumption-closure procedure.
    Inference,
}

#[derive(Debug, Clone)]
pub struct ExpressionCompiler {
    schema: SchemaMapping,
    mode: CompilationMode,
    inference_procedure: String,
}

impl ExpressionCompiler {
    pub fn new(schema: &SchemaMapping, mode: CompilationMode) -> Self {
        Self {
            schema: schema.clone(),
            mode,
            inference_procedure: DEFAULT_INFERENCE_PROCEDURE.to_string(),
        }
    }

    pub fn with_inference_procedure(mut self, procedure: impl Into<String>) -> Self {
        self.inference_procedure = procedure.into();
        self
    }

    pub fn mode(&self) -> CompilationMode {
        self.mode
    }

    pub fn schema(&self) -> &SchemaMapping {
        &self.schema
    }

    /// Compile `expression` to Cypher text returning `target` (or a fresh
    /// `n0` when `None`).
    pub fn compile(&self, expression: &ClassExpression, target: Option<&str>) -> Result<String> {
        let query = self.lower(expression, target)?;
        let text = query.render(&self.schema, &self.inference_procedure)?;
        tracing::trace!(mode = ?self.mode, cypher = %text, "compiled class expression");
        Ok(text)
    }

    /// Lower `expression` to the pattern IR without rendering it.
    pub fn lower(
        &self,
        expression: &ClassExpression,
        target: Option<&str>,
    ) -> Result<PatternQuery> {
        let expression = &expression.normalized();
        match expression {
            ClassExpression::Thing | ClassExpression::Nothing => {
                return Err(ReasonerError::unsupported(format!(
                    "bare {expression} has no pattern; resolve it before compiling"
                )));
            }
            _ => {}
        }
        if let Some(name) = target {
            if !cypher::is_variable_name(name) {
                return Err(ReasonerError::InvalidIdentifier(name.to_string()));
            }
        }

        let mut ctx = CompilationContext::new(self.mode, target);
        let root = ctx.target.clone();
        ctx.enter(root);
        ctx.visit(expression)?;
        ctx.leave();
        Ok(ctx.finish())
    }
}

// ============================================================================
// Per-call state
// ============================================================================

struct CompilationContext {
    mode: CompilationMode,
    target: String,
    counter: usize,
    used: HashSet<String>,
    scopes: Vec<String>,
    preamble: Vec<PreambleStep>,
    parts: Vec<PatternPart>,
    conditions: Vec<Condition>,
    variables: Vec<String>,
    stats: CompilationStats,
}

impl CompilationContext {
    fn new(mode: CompilationMode, target: Option<&str>) -> Self {
        let mut ctx = Self {
            mode,
            target: String::new(),
            counter: 0,
            used: HashSet::new(),
            scopes: Vec::new(),
            preamble: Vec::new(),
            parts: Vec::new(),
            conditions: Vec::new(),
            variables: Vec::new(),
            stats: CompilationStats::default(),
        };
        ctx.target = match target {
            Some(name) => {
                ctx.claim(name.to_string());
                name.to_string()
            }
            None => ctx.fresh(),
        };
        ctx
    }

    fn claim(&mut self, name: String) {
        self.used.insert(name.clone());
        self.variables.push(name);
        self.stats.variables_allocated += 1;
    }

    /// Next `n{i}` not already taken (the caller's target may be one).
    fn fresh(&mut self) -> String {
        loop {
            let name = format!("n{}", self.counter);
            self.counter += 1;
            if !self.used.contains(&name) {
                self.claim(name.clone());
                return name;
            }
        }
    }

    fn fresh_set(&mut self, node: &str, index: usize) -> String {
        let mut name = format!("{node}_set{index}");
        while self.used.contains(&name) {
            name.push('_');
        }
        self.used.insert(name.clone());
        name
    }

    fn enter(&mut self, variable: String) {
        self.scopes.push(variable);
        self.stats.scopes_opened += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.scopes.len());
    }

    fn leave(&mut self) {
        if self.scopes.pop().is_some() {
            self.stats.scopes_closed += 1;
        }
    }

    fn current(&self) -> String {
        self.scopes
            .last()
            .cloned()
            .unwrap_or_else(|| self.target.clone())
    }

    fn finish(mut self) -> PatternQuery {
        if self.parts.is_empty() {
            self.parts.push(PatternPart::Node {
                variable: self.target.clone(),
                labels: Vec::new(),
            });
        }
        PatternQuery {
            preamble: self.preamble,
            parts: self.parts,
            conditions: self.conditions,
            target: self.target,
            variables: self.variables,
            stats: self.stats,
        }
    }

    fn visit(&mut self, expression: &ClassExpression) -> Result<()> {
        match expression {
            ClassExpression::Thing => Ok(()),
            ClassExpression::Nothing => {
                self.conditions.push(Condition::Unsatisfiable);
                Ok(())
            }
            ClassExpression::Class(cls) => self.named_classes(vec![cls.uri().to_string()]),
            ClassExpression::Intersection(operands) => {
                let mut classes = Vec::new();
                let mut anonymous = Vec::new();
                flatten(operands, &mut classes, &mut anonymous, &mut self.conditions);
                self.named_classes(classes)?;
                for operand in anonymous {
                    self.visit(operand)?;
                }
                Ok(())
            }
            ClassExpression::ObjectSomeValuesFrom { property, filler } => {
                cypher::uri_name(property.uri())?;
                let from = self.current();
                let to = self.fresh();
                self.parts.push(PatternPart::Edge {
                    from,
                    relation: property.uri().to_string(),
                    to: to.clone(),
                });
                self.enter(to);
                let result = self.visit(filler);
                self.leave();
                result
            }
            ClassExpression::ObjectHasValue {
                property,
                individual,
            } => {
                cypher::uri_name(property.uri())?;
                let from = self.current();
                let to = self.fresh();
                self.parts.push(PatternPart::ValueEdge {
                    from,
                    relation: property.uri().to_string(),
                    to,
                    individual: individual.uri().to_string(),
                });
                Ok(())
            }
            ClassExpression::DataSomeValuesFrom { property } => {
                cypher::uri_name(property.uri())?;
                let variable = self.current();
                self.conditions.push(Condition::HasAttribute {
                    variable,
                    key: property.uri().to_string(),
                });
                Ok(())
            }
            ClassExpression::DataHasValue { property, value } => {
                cypher::uri_name(property.uri())?;
                check_literal(value)?;
                let variable = self.current();
                self.conditions.push(Condition::AttributeEquals {
                    variable,
                    key: property.uri().to_string(),
                    value: value.clone(),
                });
                Ok(())
            }
            ClassExpression::Union(_) => Err(rejected("disjunction", expression)),
            ClassExpression::Complement(_) => Err(rejected("negation", expression)),
            ClassExpression::ObjectAllValuesFrom { .. }
            | ClassExpression::DataAllValuesFrom { .. } => {
                Err(rejected("universal restriction", expression))
            }
            ClassExpression::ObjectCardinality { .. } => {
                Err(rejected("cardinality restriction", expression))
            }
        }
    }

    fn named_classes(&mut self, classes: Vec<String>) -> Result<()> {
        for class in &classes {
            cypher::uri_name(class)?;
        }
        let node = self.current();
        match (self.mode, classes.len()) {
            (_, 0) => {}
            (CompilationMode::Direct, _) => self.parts.push(PatternPart::Node {
                variable: node,
                labels: classes,
            }),
            (CompilationMode::Inference, 1) => {
                let class = classes.into_iter().next().unwrap_or_default();
                self.preamble.push(PreambleStep::Subsumption {
                    class,
                    variable: node,
                });
            }
            (CompilationMode::Inference, _) => {
                let sets = classes
                    .into_iter()
                    .enumerate()
                    .map(|(i, class)| SubsumptionSet {
                        set_variable: self.fresh_set(&node, i),
                        class,
                    })
                    .collect();
                self.preamble.push(PreambleStep::SubsumptionIntersection {
                    classes: sets,
                    variable: node,
                });
            }
        }
        Ok(())
    }
}

/// Split intersection operands into named classes and anonymous operands,
/// descending into nested intersections. `Thing` contributes nothing;
/// `Nothing` makes the whole pattern unsatisfiable.
fn flatten<'e>(
    operands: &'e BTreeSet<ClassExpression>,
    classes: &mut Vec<String>,
    anonymous: &mut Vec<&'e ClassExpression>,
    conditions: &mut Vec<Condition>,
) {
    for operand in operands {
        match operand {
            ClassExpression::Thing => {}
            ClassExpression::Nothing => {
                if !conditions.contains(&Condition::Unsatisfiable) {
                    conditions.push(Condition::Unsatisfiable);
                }
            }
            ClassExpression::Class(cls) => classes.push(cls.uri().to_string()),
            ClassExpression::Intersection(nested) => {
                flatten(nested, classes, anonymous, conditions)
            }
            other => anonymous.push(other),
        }
    }
}

fn check_literal(value: &Literal) -> Result<()> {
    cypher::literal(value).map(|_| ())
}

fn rejected(what: &str, expression: &ClassExpression) -> ReasonerError {
    ReasonerError::unsupported(format!("{what} is not supported: {expression}"))
}
