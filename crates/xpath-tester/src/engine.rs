//! Interface between the harness and the document/query engine.
//!
//! The harness never parses markup or query text itself. Everything it knows
//! about documents, compiled queries and raw results comes through the traits
//! in this module; [`sxd::SxdEngine`] is the implementation backed by
//! `sxd-document` and `sxd-xpath`.

use core::fmt;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::node::DocumentNode;

pub mod markup;
pub mod return_type;
pub mod sxd;

/// 1-based line/column of a failure inside the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Converts a byte offset into `text` to a line/column pair.
    ///
    /// CRLF, CR and LF all end a line; columns count characters. Offsets past the
    /// end of the text (or inside a multi-byte character) are clamped.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;
        let mut chars = text.char_indices().peekable();
        while let Some((index, ch)) = chars.next() {
            if index >= offset {
                break;
            }
            match ch {
                '\r' => {
                    if let Some(&(next_index, '\n')) = chars.peek()
                        && next_index < offset
                    {
                        chars.next();
                    }
                    line += 1;
                    column = 1;
                }
                '\n' => {
                    line += 1;
                    column = 1;
                }
                _ => column += 1,
            }
        }
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, position {}", self.line, self.column)
    }
}

/// A failure raised by the engine in any phase.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct EngineFailure {
    pub kind: String,
    pub message: String,
    pub position: Option<SourcePosition>,
    #[source]
    pub source: Option<Arc<dyn StdError + Send + Sync>>,
    stack: Option<Arc<Backtrace>>,
}

impl EngineFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let backtrace = Backtrace::capture();
        let stack = (backtrace.status() == BacktraceStatus::Captured).then(|| Arc::new(backtrace));
        Self { kind: kind.into(), message: message.into(), position: None, source: None, stack }
    }

    pub fn at(mut self, position: SourcePosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Cause chain below the direct source plus the captured backtrace, if any.
    pub fn trace(&self) -> Option<String> {
        let mut out = String::new();
        let mut cause = self.source.as_deref().and_then(|err| err.source());
        while let Some(err) = cause {
            let _ = writeln!(out, "caused by: {err}");
            cause = err.source();
        }
        if let Some(backtrace) = &self.stack {
            let _ = write!(out, "{backtrace}");
        }
        let trimmed = out.trim_end();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
}

/// Result type a compiled query announces before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    String,
    Boolean,
    Number,
    NodeSet,
    /// The engine cannot tell statically (variables, unknown functions).
    Any,
}

impl ResultType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultType::String => "String",
            ResultType::Boolean => "Boolean",
            ResultType::Number => "Number",
            ResultType::NodeSet => "NodeSet",
            ResultType::Any => "Any",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait CompiledQuery {
    fn declared_type(&self) -> ResultType;
}

/// The engine-native outcome of an evaluation, probed shape by shape.
///
/// Each probe answers only for its own shape; the classifier decides the order
/// in which they are asked. `Display` is the fallback conversion for values no
/// probe recognises.
pub trait RawResult: fmt::Display + Sized {
    type Node: DocumentNode;
    type Nodes: Iterator<Item = Self::Node>;

    fn text(&self) -> Option<&str>;
    fn boolean(&self) -> Option<bool>;
    fn number(&self) -> Option<f64>;

    /// Turns a node-set into its node sequence, or hands the value back untouched.
    fn into_nodes(self) -> Result<Self::Nodes, Self>;
}

/// The document/query capability the pipeline is written against.
///
/// Parsing yields an owned document; [`QueryEngine::open`] gives the borrowed
/// tree that evaluation results (and their nodes) point into.
pub trait QueryEngine {
    type Document;
    type Tree<'p>;
    type Query: CompiledQuery;
    type Raw<'t>: RawResult
    where
        Self: 't;

    fn parse_document(&self, text: &str) -> Result<Self::Document, EngineFailure>;

    fn open<'p>(&self, document: &'p Self::Document) -> Self::Tree<'p>;

    fn compile_query(&self, text: &str) -> Result<Self::Query, EngineFailure>;

    fn evaluate<'t, 'p: 't>(
        &'t self,
        query: &Self::Query,
        tree: &'t Self::Tree<'p>,
    ) -> Result<Self::Raw<'t>, EngineFailure>;
}
