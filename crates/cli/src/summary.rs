//! Machine-readable form of a pipeline outcome.

use serde::Serialize;
use xpath_tester::render::format_number;
use xpath_tester::{Diagnostic, Evaluation, PipelineOutcome, ResultValue};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeSummary {
    Success { declared: String, runtime: String, value: ValueSummary, timings_us: TimingsSummary },
    Failure { diagnostic: DiagnosticSummary },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ValueSummary {
    String { length: usize, value: String },
    Boolean { value: bool },
    /// `value` is `null` for NaN and the infinities; `text` always carries the rendered form.
    Number { value: f64, text: String },
    NodeSet { count: usize, nodes: Vec<NodeSummary> },
    Unknown { text: String },
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    kind: String,
    markup: String,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingsSummary {
    parse: u64,
    compile: u64,
    evaluate: u64,
    total: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticSummary {
    phase: String,
    kind: String,
    message: String,
    line: Option<usize>,
    column: Option<usize>,
    source_line: Option<String>,
    trace: Option<String>,
}

impl From<&PipelineOutcome> for OutcomeSummary {
    fn from(outcome: &PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::Success(evaluation) => Self::from_evaluation(evaluation),
            PipelineOutcome::Failure(diagnostic) => {
                OutcomeSummary::Failure { diagnostic: DiagnosticSummary::from(diagnostic) }
            }
        }
    }
}

impl OutcomeSummary {
    fn from_evaluation(evaluation: &Evaluation) -> Self {
        let micros = |duration: std::time::Duration| u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        OutcomeSummary::Success {
            declared: evaluation.declared.to_string(),
            runtime: evaluation.value.runtime_type().to_string(),
            value: ValueSummary::from(&evaluation.value),
            timings_us: TimingsSummary {
                parse: micros(evaluation.timings.parse),
                compile: micros(evaluation.timings.compile),
                evaluate: micros(evaluation.timings.evaluate),
                total: micros(evaluation.timings.total()),
            },
        }
    }
}

impl From<&ResultValue> for ValueSummary {
    fn from(value: &ResultValue) -> Self {
        match value {
            ResultValue::Text(text) => ValueSummary::String { length: text.chars().count(), value: text.clone() },
            ResultValue::Boolean(value) => ValueSummary::Boolean { value: *value },
            ResultValue::Number(value) => ValueSummary::Number { value: *value, text: format_number(*value) },
            ResultValue::NodeSet(blocks) => ValueSummary::NodeSet {
                count: blocks.len(),
                nodes: blocks
                    .iter()
                    .map(|block| NodeSummary { kind: block.kind.to_string(), markup: block.markup.clone() })
                    .collect(),
            },
            ResultValue::Unrecognized(text) => ValueSummary::Unknown { text: text.clone() },
        }
    }
}

impl From<&Diagnostic> for DiagnosticSummary {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            phase: diagnostic.phase.to_string(),
            kind: diagnostic.kind.clone(),
            message: diagnostic.message.clone(),
            line: diagnostic.position.map(|position| position.line),
            column: diagnostic.position.map(|position| position.column),
            source_line: diagnostic.source_line.clone(),
            trace: diagnostic.trace.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use xpath_tester::{NodeBlock, NodeKind, Phase, PhaseTimings, ResultType, SourcePosition};

    fn success(value: ResultValue) -> PipelineOutcome {
        PipelineOutcome::Success(Evaluation { declared: ResultType::Any, value, timings: PhaseTimings::default() })
    }

    #[rstest]
    fn node_set_summary_lists_every_block() {
        let outcome = success(ResultValue::NodeSet(vec![
            NodeBlock { kind: NodeKind::Attribute, markup: "x=\"1\"".into() },
            NodeBlock { kind: NodeKind::Text, markup: "t".into() },
        ]));
        let json = serde_json::to_value(OutcomeSummary::from(&outcome)).expect("json");
        assert_eq!(json["status"], "success");
        assert_eq!(json["declared"], "Any");
        assert_eq!(json["runtime"], "NodeSet");
        assert_eq!(json["value"]["type"], "NodeSet");
        assert_eq!(json["value"]["count"], 2);
        assert_eq!(json["value"]["nodes"][0]["kind"], "Attribute");
        assert_eq!(json["timings_us"]["parse"], 0);
    }

    #[rstest]
    fn timings_include_the_total() {
        let timings = PhaseTimings {
            parse: std::time::Duration::from_micros(10),
            compile: std::time::Duration::from_micros(20),
            evaluate: std::time::Duration::from_micros(30),
        };
        let outcome = PipelineOutcome::Success(Evaluation { declared: ResultType::Boolean, value: ResultValue::Boolean(true), timings });
        let json = serde_json::to_value(OutcomeSummary::from(&outcome)).expect("json");
        assert_eq!(json["timings_us"]["evaluate"], 30);
        assert_eq!(json["timings_us"]["total"], 60);
    }

    #[rstest]
    fn non_finite_numbers_serialize_as_null_with_text() {
        let json = serde_json::to_value(OutcomeSummary::from(&success(ResultValue::Number(f64::NAN)))).expect("json");
        assert!(json["value"]["value"].is_null());
        assert_eq!(json["value"]["text"], "NaN");
    }

    #[rstest]
    fn failure_summary_flattens_the_position() {
        let diagnostic = Diagnostic {
            position: Some(SourcePosition::new(3, 7)),
            ..Diagnostic::new(Phase::Parsing, "XmlSyntaxError", "bad")
        };
        let json = serde_json::to_value(OutcomeSummary::from(&PipelineOutcome::Failure(diagnostic))).expect("json");
        assert_eq!(json["status"], "failure");
        assert_eq!(json["diagnostic"]["phase"], "Parsing");
        assert_eq!(json["diagnostic"]["line"], 3);
        assert_eq!(json["diagnostic"]["column"], 7);
        assert!(json["diagnostic"]["trace"].is_null());
    }
}
