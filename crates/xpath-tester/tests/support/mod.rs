#![allow(dead_code)]

use std::cell::RefCell;
use std::fmt;
use std::io;

use xpath_tester::{
    CompiledQuery, DocumentNode, EngineFailure, IndentUnit, MarkupError, NodeKind, QueryEngine, RawResult,
    ResultType,
};

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub kind: NodeKind,
    pub markup: String,
    pub broken: bool,
}

impl FakeNode {
    pub fn new(kind: NodeKind, markup: &str) -> Self {
        Self { kind, markup: markup.to_owned(), broken: false }
    }

    pub fn broken(kind: NodeKind) -> Self {
        Self { kind, markup: String::new(), broken: true }
    }
}

impl DocumentNode for FakeNode {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn serialize_subtree(&self, indent: IndentUnit) -> Result<String, MarkupError> {
        if self.broken {
            return Err(io::Error::other("serializer exploded").into());
        }
        Ok(format!("{}{}", char::from(indent.fill).to_string().repeat(indent.size), self.markup))
    }

    fn raw_outer_markup(&self) -> Result<String, MarkupError> {
        if self.broken {
            return Err(io::Error::other("serializer exploded").into());
        }
        Ok(self.markup.clone())
    }
}

#[derive(Debug, Clone)]
pub enum FakeValue {
    Text(String),
    Boolean(bool),
    Number(f64),
    NodeList(Vec<FakeNode>),
    /// A value none of the probes recognise.
    Opaque(String),
}

impl fmt::Display for FakeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FakeValue::Opaque(text) => f.write_str(text),
            other => write!(f, "{other:?}"),
        }
    }
}

impl RawResult for FakeValue {
    type Node = FakeNode;
    type Nodes = std::vec::IntoIter<FakeNode>;

    fn text(&self) -> Option<&str> {
        match self {
            FakeValue::Text(text) => Some(text),
            _ => None,
        }
    }

    fn boolean(&self) -> Option<bool> {
        match self {
            FakeValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            FakeValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    fn into_nodes(self) -> Result<std::vec::IntoIter<FakeNode>, Self> {
        match self {
            FakeValue::NodeList(nodes) => Ok(nodes.into_iter()),
            other => Err(other),
        }
    }
}

#[derive(Debug)]
pub struct FakeQuery(ResultType);

impl CompiledQuery for FakeQuery {
    fn declared_type(&self) -> ResultType {
        self.0
    }
}

/// What the scripted engine does in its evaluation phase.
#[derive(Debug, Clone)]
pub enum Evaluate {
    Return(FakeValue),
    Fail(EngineFailure),
    Panic(&'static str),
}

/// Engine whose every phase outcome is fixed up front; records which phases ran.
#[derive(Debug)]
pub struct ScriptedEngine {
    pub parse: Result<(), EngineFailure>,
    pub compile: Result<ResultType, EngineFailure>,
    pub evaluate: Evaluate,
    calls: RefCell<Vec<&'static str>>,
}

impl ScriptedEngine {
    pub fn returning(declared: ResultType, value: FakeValue) -> Self {
        Self { parse: Ok(()), compile: Ok(declared), evaluate: Evaluate::Return(value), calls: RefCell::default() }
    }

    pub fn failing_parse(failure: EngineFailure) -> Self {
        Self { parse: Err(failure), ..Self::returning(ResultType::Any, FakeValue::Boolean(true)) }
    }

    pub fn failing_compile(failure: EngineFailure) -> Self {
        Self { compile: Err(failure), ..Self::returning(ResultType::Any, FakeValue::Boolean(true)) }
    }

    pub fn with_evaluate(evaluate: Evaluate) -> Self {
        Self { evaluate, ..Self::returning(ResultType::Any, FakeValue::Boolean(true)) }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl QueryEngine for ScriptedEngine {
    type Document = String;
    type Tree<'p> = &'p str;
    type Query = FakeQuery;
    type Raw<'t> = FakeValue;

    fn parse_document(&self, text: &str) -> Result<String, EngineFailure> {
        self.calls.borrow_mut().push("parse");
        self.parse.clone().map(|()| text.to_owned())
    }

    fn open<'p>(&self, document: &'p String) -> &'p str {
        document
    }

    fn compile_query(&self, _text: &str) -> Result<FakeQuery, EngineFailure> {
        self.calls.borrow_mut().push("compile");
        self.compile.clone().map(FakeQuery)
    }

    fn evaluate<'t, 'p: 't>(&'t self, _query: &FakeQuery, _tree: &'t &'p str) -> Result<FakeValue, EngineFailure> {
        self.calls.borrow_mut().push("evaluate");
        match &self.evaluate {
            Evaluate::Return(value) => Ok(value.clone()),
            Evaluate::Fail(failure) => Err(failure.clone()),
            Evaluate::Panic(message) => panic!("{message}"),
        }
    }
}
