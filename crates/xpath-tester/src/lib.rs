//! Evaluation and diagnostics harness for XPath queries against XML documents.
//!
//! A [`Pipeline`] parses a document, compiles a query, evaluates it and turns
//! the outcome into one deterministic text block: a typed result with phase
//! timings, or a [`Diagnostic`] that points at the offending source line.

pub mod classify;
pub mod diagnostic;
pub mod engine;
pub mod escape;
pub mod node;
pub mod pipeline;
pub mod render;
pub mod timer;

pub use classify::{EvaluationResult, RuntimeType, classify};
pub use diagnostic::{Diagnostic, Phase};
pub use engine::sxd::SxdEngine;
pub use engine::{CompiledQuery, EngineFailure, QueryEngine, RawResult, ResultType, SourcePosition};
pub use escape::{escape_string, unescape};
pub use node::{DocumentNode, IndentUnit, MarkupError, NodeKind};
pub use pipeline::{Evaluation, Pipeline, PipelineOutcome};
pub use render::{NodeBlock, ResultValue, SENTINEL};
pub use timer::PhaseTimings;
