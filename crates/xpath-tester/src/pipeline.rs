//! Parse, compile, evaluate: one run from input text to a rendered outcome.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, debug_span, warn};

use crate::classify::classify;
use crate::diagnostic::{Diagnostic, Phase};
use crate::engine::{CompiledQuery, EngineFailure, QueryEngine, ResultType};
use crate::node::IndentUnit;
use crate::render::{ResultValue, render_success};
use crate::timer::{PhaseTimer, PhaseTimings};

/// Kind reported for a panic caught at the pipeline boundary.
pub const PANIC_KIND: &str = "panic";
/// Kind reported when a node could not be serialized.
pub const MARKUP_KIND: &str = "MarkupError";

/// Success record of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub declared: ResultType,
    pub value: ResultValue,
    pub timings: PhaseTimings,
}

impl Evaluation {
    pub fn render(&self) -> String {
        render_success(self.declared, &self.value, &self.timings)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Success(Evaluation),
    Failure(Diagnostic),
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success(_))
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        match self {
            PipelineOutcome::Success(evaluation) => Some(evaluation),
            PipelineOutcome::Failure(_) => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            PipelineOutcome::Success(_) => None,
            PipelineOutcome::Failure(diagnostic) => Some(diagnostic),
        }
    }

    /// The complete text block for this outcome, always ending in the sentinel line.
    pub fn render(&self) -> String {
        match self {
            PipelineOutcome::Success(evaluation) => evaluation.render(),
            PipelineOutcome::Failure(diagnostic) => diagnostic.to_string(),
        }
    }
}

/// Runs queries against documents with a fixed engine configuration.
///
/// Nothing is cached between runs: every call parses, compiles and evaluates
/// from scratch and drops all intermediate state before returning.
#[derive(Debug, Clone)]
pub struct Pipeline<E> {
    engine: E,
    indent: IndentUnit,
}

impl<E: QueryEngine> Pipeline<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, indent: IndentUnit::SINGLE_SPACE }
    }

    #[must_use]
    pub fn with_indent(mut self, indent: IndentUnit) -> Self {
        self.indent = indent;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn run(&self, document_text: &str, query_text: &str) -> PipelineOutcome {
        let _span = debug_span!("run", query = query_text).entered();
        match panic::catch_unwind(AssertUnwindSafe(|| self.run_phases(document_text, query_text))) {
            Ok(Ok(evaluation)) => {
                debug!(declared = %evaluation.declared, runtime = %evaluation.value.runtime_type(), "run succeeded");
                PipelineOutcome::Success(evaluation)
            }
            Ok(Err(diagnostic)) => {
                debug!(phase = %diagnostic.phase, kind = %diagnostic.kind, "run failed");
                PipelineOutcome::Failure(diagnostic)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(%message, "evaluation panicked");
                PipelineOutcome::Failure(Diagnostic::new(Phase::Unexpected, PANIC_KIND, message))
            }
        }
    }

    fn run_phases(&self, document_text: &str, query_text: &str) -> Result<Evaluation, Diagnostic> {
        let timer = PhaseTimer::start(Phase::Parsing);
        let document = self
            .engine
            .parse_document(document_text)
            .map_err(|failure| failed(Phase::Parsing, &failure, Some(document_text)))?;
        let parse = timer.stop();

        let timer = PhaseTimer::start(Phase::Compiling);
        let query = self
            .engine
            .compile_query(query_text)
            .map_err(|failure| failed(Phase::Compiling, &failure, Some(query_text)))?;
        let compile = timer.stop();
        let declared = query.declared_type();

        let tree = self.engine.open(&document);
        let timer = PhaseTimer::start(Phase::Evaluating);
        let raw = self
            .engine
            .evaluate(&query, &tree)
            .map_err(|failure| failed(Phase::Evaluating, &failure, Some(document_text)))?;
        let evaluate = timer.stop();

        let value = ResultValue::from_classified(classify(raw), self.indent)
            .map_err(|err| Diagnostic::new(Phase::Unexpected, MARKUP_KIND, err.to_string()))?;
        Ok(Evaluation { declared, value, timings: PhaseTimings { parse, compile, evaluate } })
    }
}

fn failed(phase: Phase, failure: &EngineFailure, source: Option<&str>) -> Diagnostic {
    debug!(%phase, kind = %failure.kind, position = ?failure.position, "phase failed");
    Diagnostic::from_failure(phase, failure, source)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
