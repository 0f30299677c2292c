use core::fmt;

use crate::engine::RawResult;

/// Runtime shape of an evaluation outcome.
#[derive(Debug)]
pub enum EvaluationResult<I> {
    Text(String),
    Boolean(bool),
    Number(f64),
    /// Nodes in the order the engine produced them; consumed once by the renderer.
    NodeSet(I),
    /// A value none of the probes recognised, in its default textual form.
    Unrecognized(String),
}

impl<I> EvaluationResult<I> {
    pub fn runtime_type(&self) -> RuntimeType {
        match self {
            EvaluationResult::Text(_) => RuntimeType::String,
            EvaluationResult::Boolean(_) => RuntimeType::Boolean,
            EvaluationResult::Number(_) => RuntimeType::Number,
            EvaluationResult::NodeSet(_) => RuntimeType::NodeSet,
            EvaluationResult::Unrecognized(_) => RuntimeType::Unknown,
        }
    }
}

/// Type name shown on the right-hand side of a result header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeType {
    String,
    Boolean,
    Number,
    NodeSet,
    Unknown,
}

impl RuntimeType {
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeType::String => "String",
            RuntimeType::Boolean => "Boolean",
            RuntimeType::Number => "Number",
            RuntimeType::NodeSet => "NodeSet",
            RuntimeType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `raw` by probing text, boolean, number and node-set in that
/// order; the first probe that answers wins.
pub fn classify<R: RawResult>(raw: R) -> EvaluationResult<R::Nodes> {
    if let Some(text) = raw.text() {
        return EvaluationResult::Text(text.to_owned());
    }
    if let Some(value) = raw.boolean() {
        return EvaluationResult::Boolean(value);
    }
    if let Some(value) = raw.number() {
        return EvaluationResult::Number(value);
    }
    match raw.into_nodes() {
        Ok(nodes) => EvaluationResult::NodeSet(nodes),
        Err(raw) => EvaluationResult::Unrecognized(raw.to_string()),
    }
}
