//! Text rendering of successful evaluations.
//!
//! Every block is assembled as a list of lines and joined once at the end.

use std::time::Duration;

use crate::classify::{EvaluationResult, RuntimeType};
use crate::engine::ResultType;
use crate::escape::escape_string;
use crate::node::{DocumentNode, IndentUnit, MarkupError, NodeKind};
use crate::timer::PhaseTimings;

/// Closing line of every rendered block.
pub const SENTINEL: &str = "End of line.";

/// One rendered member of a node-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBlock {
    pub kind: NodeKind,
    pub markup: String,
}

impl NodeBlock {
    /// Root and element nodes are serialized as an indented subtree, all other
    /// kinds as their raw markup.
    pub fn from_node<N: DocumentNode>(node: &N, indent: IndentUnit) -> Result<Self, MarkupError> {
        let kind = node.kind();
        let markup = if kind.has_subtree() { node.serialize_subtree(indent)? } else { node.raw_outer_markup()? };
        Ok(Self { kind, markup })
    }

    pub fn tag(&self) -> String {
        format!("[NodeType.{}]", self.kind)
    }
}

/// Consumes `nodes` once, keeping engine order and duplicates.
pub fn render_node_set<I>(nodes: I, indent: IndentUnit) -> Result<Vec<NodeBlock>, MarkupError>
where
    I: IntoIterator,
    I::Item: DocumentNode,
{
    nodes.into_iter().map(|node| NodeBlock::from_node(&node, indent)).collect()
}

/// Owned, fully rendered form of a classified result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Text(String),
    Boolean(bool),
    Number(f64),
    NodeSet(Vec<NodeBlock>),
    Unrecognized(String),
}

impl ResultValue {
    pub fn from_classified<I>(result: EvaluationResult<I>, indent: IndentUnit) -> Result<Self, MarkupError>
    where
        I: Iterator,
        I::Item: DocumentNode,
    {
        Ok(match result {
            EvaluationResult::Text(text) => ResultValue::Text(text),
            EvaluationResult::Boolean(value) => ResultValue::Boolean(value),
            EvaluationResult::Number(value) => ResultValue::Number(value),
            EvaluationResult::NodeSet(nodes) => ResultValue::NodeSet(render_node_set(nodes, indent)?),
            EvaluationResult::Unrecognized(text) => ResultValue::Unrecognized(text),
        })
    }

    pub fn runtime_type(&self) -> RuntimeType {
        match self {
            ResultValue::Text(_) => RuntimeType::String,
            ResultValue::Boolean(_) => RuntimeType::Boolean,
            ResultValue::Number(_) => RuntimeType::Number,
            ResultValue::NodeSet(_) => RuntimeType::NodeSet,
            ResultValue::Unrecognized(_) => RuntimeType::Unknown,
        }
    }

    /// The primary result as output lines; the first one goes on the header line.
    pub fn lines(&self) -> Vec<String> {
        match self {
            ResultValue::Text(text) => {
                vec![format!("{{Length={}}}", text.chars().count()), String::new(), escape_string(text)]
            }
            ResultValue::Boolean(value) => vec![value.to_string()],
            ResultValue::Number(value) => vec![format_number(*value)],
            ResultValue::NodeSet(blocks) => {
                let mut lines = Vec::with_capacity(1 + blocks.len() * 3);
                lines.push(format!("{{Count={}}}", blocks.len()));
                for block in blocks {
                    lines.push(String::new());
                    lines.push(block.tag());
                    lines.push(block.markup.clone());
                }
                lines
            }
            ResultValue::Unrecognized(text) => vec![format!("{{unknown type}} {text}")],
        }
    }
}

/// Renders the success block: type header, primary result, timings, sentinel.
pub fn render_success(declared: ResultType, value: &ResultValue, timings: &PhaseTimings) -> String {
    let mut lines = value.lines().into_iter();
    let first = lines.next().unwrap_or_default();
    let mut segments = vec![format!("[ResultType.{declared} -> {}]: {first}", value.runtime_type())];
    segments.extend(lines);
    segments.push(String::new());
    segments.push(format!("XML parse time     {}", format_duration(timings.parse)));
    segments.push(format!("XPath compile time {}", format_duration(timings.compile)));
    segments.push(format!("Evaluation time    {}", format_duration(timings.evaluate)));
    segments.push(SENTINEL.to_owned());
    segments.join("\n")
}

/// Shortest round-trip decimal, independent of locale.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value.is_sign_positive() { "Infinity".to_owned() } else { "-Infinity".to_owned() }
    } else if value == 0.0 {
        "0".to_owned()
    } else {
        value.to_string()
    }
}

/// `hh:mm:ss.fffffff`, in 100 ns ticks.
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let ticks = duration.subsec_nanos() / 100;
    format!("{:02}:{:02}:{:02}.{ticks:07}", seconds / 3600, (seconds / 60) % 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Fixed(NodeKind, &'static str);

    impl DocumentNode for Fixed {
        fn kind(&self) -> NodeKind {
            self.0
        }

        fn serialize_subtree(&self, indent: IndentUnit) -> Result<String, MarkupError> {
            Ok(format!("subtree[{}]:{}", indent.size, self.1))
        }

        fn raw_outer_markup(&self) -> Result<String, MarkupError> {
            Ok(format!("raw:{}", self.1))
        }
    }

    #[rstest]
    #[case(2.0, "2")]
    #[case(0.5, "0.5")]
    #[case(-0.0, "0")]
    #[case(-3.25, "-3.25")]
    #[case(f64::NAN, "NaN")]
    #[case(f64::INFINITY, "Infinity")]
    #[case(f64::NEG_INFINITY, "-Infinity")]
    fn numbers_render_invariantly(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(value), expected);
    }

    #[rstest]
    #[case(Duration::ZERO, "00:00:00.0000000")]
    #[case(Duration::from_micros(1_234), "00:00:00.0012340")]
    #[case(Duration::from_secs(3_723), "01:02:03.0000000")]
    fn durations_render_as_ticks(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(duration), expected);
    }

    #[rstest]
    fn node_set_keeps_order_and_picks_markup_per_kind() {
        let nodes = vec![
            Fixed(NodeKind::Attribute, "a"),
            Fixed(NodeKind::Element, "e"),
            Fixed(NodeKind::Attribute, "a"),
            Fixed(NodeKind::Root, "r"),
        ];
        let blocks = render_node_set(nodes, IndentUnit::SINGLE_SPACE).unwrap();
        let markup: Vec<&str> = blocks.iter().map(|block| block.markup.as_str()).collect();
        assert_eq!(markup, ["raw:a", "subtree[1]:e", "raw:a", "subtree[1]:r"]);
    }

    #[rstest]
    fn text_block_shows_length_then_literal() {
        let value = ResultValue::Text("a\"b".to_owned());
        let block = render_success(ResultType::String, &value, &PhaseTimings::default());
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], "[ResultType.String -> String]: {Length=3}");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], r#""a\"b""#);
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "XML parse time     00:00:00.0000000");
        assert_eq!(lines.last(), Some(&SENTINEL));
    }

    #[rstest]
    fn node_set_block_lists_tags_after_blank_lines() {
        let value = ResultValue::NodeSet(vec![NodeBlock { kind: NodeKind::Comment, markup: "<!--c-->".to_owned() }]);
        let block = render_success(ResultType::NodeSet, &value, &PhaseTimings::default());
        assert!(block.starts_with("[ResultType.NodeSet -> NodeSet]: {Count=1}\n\n[NodeType.Comment]\n<!--c-->\n\nXML parse time"));
    }

    #[rstest]
    fn unrecognized_is_prefixed() {
        let value = ResultValue::Unrecognized("42 things".to_owned());
        let block = render_success(ResultType::Any, &value, &PhaseTimings::default());
        assert!(block.starts_with("[ResultType.Any -> Unknown]: {unknown type} 42 things\n"));
    }

    #[rstest]
    fn length_counts_characters() {
        assert_eq!(ResultValue::Text("grüße".to_owned()).lines()[0], "{Length=5}");
    }
}
