use serde::{Deserialize, Serialize};

use crate::compiler::{CompilationMode, ExpressionCompiler, DEFAULT_INFERENCE_PROCEDURE};
use crate::schema::SchemaMapping;

/// Everything a [`crate::CypherReasoner`] needs besides the store.
///
/// All fields are defaulted, so a partial JSON document (or `{}`) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    pub schema: SchemaMapping,
    /// Use the subsumption-closure procedure instead of direct labels.
    pub inference: bool,
    pub inference_procedure: String,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            schema: SchemaMapping::default(),
            inference: false,
            inference_procedure: DEFAULT_INFERENCE_PROCEDURE.to_string(),
        }
    }
}

impl ReasonerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_schema(mut self, schema: SchemaMapping) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_inference(mut self, inference: bool) -> Self {
        self.inference = inference;
        self
    }

    pub fn mode(&self) -> CompilationMode {
        if self.inference {
            CompilationMode::Inference
        } else {
            CompilationMode::Direct
        }
    }

    pub fn compiler(&self) -> ExpressionCompiler {
        ExpressionCompiler::new(&self.schema, self.mode())
            .with_inference_procedure(self.inference_procedure.clone())
    }
}
