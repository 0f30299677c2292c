//! [`QueryEngine`] backed by `sxd-document` and `sxd-xpath`.

use core::fmt;

use sxd_document::{Package, dom, parser};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value, XPath};
use tracing::debug;

use super::{CompiledQuery, EngineFailure, QueryEngine, RawResult, ResultType, SourcePosition, markup, return_type};
use crate::node::{DocumentNode, IndentUnit, MarkupError, NodeKind};
use crate::render::format_number;

pub const XML_SYNTAX_ERROR: &str = "XmlSyntaxError";
pub const XPATH_SYNTAX_ERROR: &str = "XPathSyntaxError";
pub const EMPTY_EXPRESSION: &str = "EmptyExpression";
pub const XPATH_EVALUATION_ERROR: &str = "XPathEvaluationError";

/// XPath 1.0 over XML documents.
///
/// Namespace prefixes and string variables are bound on every evaluation
/// context; the document root is always the context node.
#[derive(Debug, Clone, Default)]
pub struct SxdEngine {
    namespaces: Vec<(String, String)>,
    variables: Vec<(String, String)>,
}

impl SxdEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), uri.into()));
        self
    }

    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Re-serializes a whole parsed document with the given indentation.
    pub fn format_document(&self, document: &Package, indent: IndentUnit) -> Result<String, MarkupError> {
        let tree = document.as_document();
        markup::subtree(Node::Root(tree.root()), indent)
    }
}

/// The parser splits character data at entity and character references;
/// one text node per run of character data is what XPath selects.
fn merge_adjacent_text(element: dom::Element<'_>) {
    let mut previous: Option<dom::Text<'_>> = None;
    for child in element.children() {
        match child {
            dom::ChildOfElement::Text(text) => match previous {
                Some(first) => {
                    let merged = format!("{}{}", first.text(), text.text());
                    first.set_text(&merged);
                    element.remove_child(text);
                }
                None => previous = Some(text),
            },
            dom::ChildOfElement::Element(inner) => {
                previous = None;
                merge_adjacent_text(inner);
            }
            _ => previous = None,
        }
    }
}

pub struct SxdQuery {
    xpath: XPath,
    declared: ResultType,
}

impl fmt::Debug for SxdQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SxdQuery").field("declared", &self.declared).finish_non_exhaustive()
    }
}

impl CompiledQuery for SxdQuery {
    fn declared_type(&self) -> ResultType {
        self.declared
    }
}

impl QueryEngine for SxdEngine {
    type Document = Package;
    type Tree<'p> = dom::Document<'p>;
    type Query = SxdQuery;
    type Raw<'t> = SxdValue<'t>;

    fn parse_document(&self, text: &str) -> Result<Package, EngineFailure> {
        let package = parser::parse(text).map_err(|err| {
            let position = SourcePosition::from_offset(text, err.location());
            debug!(offset = err.location(), %position, "XML parse failed");
            EngineFailure::new(XML_SYNTAX_ERROR, err.to_string()).at(position)
        })?;
        {
            let document = package.as_document();
            for child in document.root().children() {
                if let dom::ChildOfRoot::Element(element) = child {
                    merge_adjacent_text(element);
                }
            }
        }
        Ok(package)
    }

    fn open<'p>(&self, document: &'p Package) -> dom::Document<'p> {
        document.as_document()
    }

    fn compile_query(&self, text: &str) -> Result<SxdQuery, EngineFailure> {
        let empty = || EngineFailure::new(EMPTY_EXPRESSION, "the XPath expression is empty");
        if text.trim().is_empty() {
            return Err(empty());
        }
        match Factory::new().build(text) {
            Ok(Some(xpath)) => {
                let declared = return_type::infer(text);
                debug!(%declared, "XPath compiled");
                Ok(SxdQuery { xpath, declared })
            }
            Ok(None) => Err(empty()),
            Err(err) => Err(EngineFailure::new(XPATH_SYNTAX_ERROR, err.to_string())),
        }
    }

    fn evaluate<'t, 'p: 't>(
        &'t self,
        query: &SxdQuery,
        tree: &'t dom::Document<'p>,
    ) -> Result<SxdValue<'t>, EngineFailure> {
        let tree: &'t dom::Document<'t> = tree;
        let mut context = Context::new();
        for (prefix, uri) in &self.namespaces {
            context.set_namespace(prefix, uri);
        }
        for (name, value) in &self.variables {
            context.set_variable(name.as_str(), Value::String(value.clone()));
        }
        query
            .xpath
            .evaluate(&context, tree.root())
            .map(SxdValue)
            .map_err(|err| EngineFailure::new(XPATH_EVALUATION_ERROR, err.to_string()))
    }
}

/// An `sxd-xpath` value borrowed from the evaluated document.
#[derive(Debug)]
pub struct SxdValue<'d>(pub Value<'d>);

impl fmt::Display for SxdValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Number(value) => f.write_str(&format_number(*value)),
            Value::String(value) => f.write_str(value),
            Value::Nodeset(nodes) => write!(f, "node-set of {} nodes", nodes.size()),
        }
    }
}

impl<'d> RawResult for SxdValue<'d> {
    type Node = SxdNode<'d>;
    type Nodes = std::vec::IntoIter<SxdNode<'d>>;

    fn text(&self) -> Option<&str> {
        match &self.0 {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    fn boolean(&self) -> Option<bool> {
        match self.0 {
            Value::Boolean(value) => Some(value),
            _ => None,
        }
    }

    fn number(&self) -> Option<f64> {
        match self.0 {
            Value::Number(value) => Some(value),
            _ => None,
        }
    }

    fn into_nodes(self) -> Result<Self::Nodes, Self> {
        match self.0 {
            Value::Nodeset(nodes) => Ok(nodes.document_order().into_iter().map(SxdNode).collect::<Vec<_>>().into_iter()),
            other => Err(SxdValue(other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SxdNode<'d>(pub Node<'d>);

impl DocumentNode for SxdNode<'_> {
    fn kind(&self) -> NodeKind {
        match self.0 {
            Node::Root(_) => NodeKind::Root,
            Node::Element(_) => NodeKind::Element,
            Node::Attribute(_) => NodeKind::Attribute,
            Node::Text(_) => NodeKind::Text,
            Node::Comment(_) => NodeKind::Comment,
            Node::Namespace(_) => NodeKind::Namespace,
            Node::ProcessingInstruction(_) => NodeKind::ProcessingInstruction,
        }
    }

    fn serialize_subtree(&self, indent: IndentUnit) -> Result<String, MarkupError> {
        markup::subtree(self.0, indent)
    }

    fn raw_outer_markup(&self) -> Result<String, MarkupError> {
        markup::outer_markup(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn engine() -> SxdEngine {
        SxdEngine::new()
    }

    #[rstest]
    fn parse_failure_reports_line_and_column(engine: SxdEngine) {
        let err = engine.parse_document("<a>\n<b></a>").unwrap_err();
        assert_eq!(err.kind, XML_SYNTAX_ERROR);
        let position = err.position.unwrap();
        assert_eq!(position.line, 2);
        assert!(position.column >= 1);
    }

    #[rstest]
    #[case("")]
    #[case("  \t")]
    fn blank_query_is_empty_expression(engine: SxdEngine, #[case] query: &str) {
        let err = engine.compile_query(query).unwrap_err();
        assert_eq!(err.kind, EMPTY_EXPRESSION);
        assert!(err.position.is_none());
    }

    #[rstest]
    fn syntax_error_has_no_position(engine: SxdEngine) {
        let err = engine.compile_query("//[").unwrap_err();
        assert_eq!(err.kind, XPATH_SYNTAX_ERROR);
        assert!(err.position.is_none());
    }

    #[rstest]
    fn declared_type_comes_from_expression(engine: SxdEngine) {
        let query = engine.compile_query("count(//b)").unwrap();
        assert_eq!(query.declared_type(), ResultType::Number);
    }

    #[rstest]
    fn node_sets_come_back_in_document_order(engine: SxdEngine) {
        let package = engine.parse_document("<a><b>1</b><c/><b>2</b></a>").unwrap();
        let tree = engine.open(&package);
        let query = engine.compile_query("//c | //b").unwrap();
        let value = engine.evaluate(&query, &tree).unwrap();
        let nodes: Vec<String> = value.into_nodes().unwrap().map(|node| node.raw_outer_markup().unwrap()).collect();
        assert_eq!(nodes, vec!["<b>1</b>", "<c/>", "<b>2</b>"]);
    }

    #[rstest]
    fn entity_references_do_not_split_text(engine: SxdEngine) {
        let package = engine.parse_document("<a>x &amp; y<b>1&#50;</b>z</a>").unwrap();
        let tree = engine.open(&package);
        let query = engine.compile_query("//text()").unwrap();
        let value = engine.evaluate(&query, &tree).unwrap();
        let texts: Vec<String> = value.into_nodes().unwrap().map(|node| node.raw_outer_markup().unwrap()).collect();
        assert_eq!(texts, vec!["x &amp; y", "12", "z"]);
    }

    #[rstest]
    fn bindings_are_visible_to_queries() {
        let engine = SxdEngine::new().with_namespace("p", "urn:p").with_variable("want", "2");
        let package = engine.parse_document(r#"<r xmlns:q="urn:p"><q:i>1</q:i><q:i>2</q:i></r>"#).unwrap();
        let tree = engine.open(&package);
        let query = engine.compile_query("count(//p:i[. = $want])").unwrap();
        let value = engine.evaluate(&query, &tree).unwrap();
        assert_eq!(value.number(), Some(1.0));
    }

    #[rstest]
    fn unknown_variable_fails_at_evaluation(engine: SxdEngine) {
        let package = engine.parse_document("<a/>").unwrap();
        let tree = engine.open(&package);
        let query = engine.compile_query("$missing").unwrap();
        assert_eq!(query.declared_type(), ResultType::Any);
        let err = engine.evaluate(&query, &tree).unwrap_err();
        assert_eq!(err.kind, XPATH_EVALUATION_ERROR);
    }

    #[rstest]
    fn format_document_reindents(engine: SxdEngine) {
        let package = engine.parse_document("<a>\n      <b>x</b>\n</a>").unwrap();
        let formatted = engine.format_document(&package, IndentUnit::SINGLE_SPACE).unwrap();
        assert_eq!(formatted, "<a>\n <b>x</b>\n</a>");
    }
}
