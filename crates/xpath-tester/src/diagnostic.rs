use core::fmt;

use crate::engine::{EngineFailure, SourcePosition};
use crate::render::SENTINEL;

/// Pipeline phase a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Parsing,
    Compiling,
    Evaluating,
    /// Anything escaping the three phases, such as a panic or a rendering failure.
    Unexpected,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Parsing => "Parsing",
            Phase::Compiling => "Compiling",
            Phase::Evaluating => "Evaluating",
            Phase::Unexpected => "Unexpected",
        }
    }

    /// Wording used in the diagnostic header.
    pub fn description(self) -> &'static str {
        match self {
            Phase::Parsing => "parsing XML",
            Phase::Compiling => "parsing XPath",
            Phase::Evaluating => "evaluating XPath on XML",
            Phase::Unexpected => "running the evaluation",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured record of a failed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub kind: String,
    pub message: String,
    pub position: Option<SourcePosition>,
    /// The source line `position` points into, captured when the diagnostic was built.
    pub source_line: Option<String>,
    pub trace: Option<String>,
}

impl Diagnostic {
    pub fn new(phase: Phase, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { phase, kind: kind.into(), message: message.into(), position: None, source_line: None, trace: None }
    }

    /// Builds a diagnostic from an engine failure, capturing the offending line
    /// of `source` when the failure carries an in-range position.
    pub fn from_failure(phase: Phase, failure: &EngineFailure, source: Option<&str>) -> Self {
        let source_line = match (failure.position, source) {
            (Some(position), Some(text)) => line_at(&source_lines(text), position.line).map(str::to_owned),
            _ => None,
        };
        Self {
            phase,
            kind: failure.kind.clone(),
            message: failure.message.clone(),
            position: failure.position,
            source_line,
            trace: failure.trace(),
        }
    }

    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn header(&self) -> String {
        format!("Error {}: $exception [{}]: {}", self.phase.description(), self.kind, self.message)
    }

    /// Renders the diagnostic against `source_lines`.
    ///
    /// The line/caret pair is only emitted when the position's line lies in
    /// `1..=source_lines.len()`; a column of 0 is treated as 1.
    pub fn format(&self, source_lines: &[&str]) -> String {
        let line = self.position.and_then(|position| line_at(source_lines, position.line));
        self.render_with(line)
    }

    fn render_with(&self, line: Option<&str>) -> String {
        let mut segments = vec![self.header()];
        if let (Some(position), Some(line)) = (self.position, line) {
            segments.push(line.to_owned());
            segments.push(format!("{}^", " ".repeat(position.column.max(1) - 1)));
        }
        if let Some(trace) = &self.trace {
            segments.push(trace.clone());
        }
        segments.push(String::new());
        segments.push(SENTINEL.to_owned());
        segments.join("\n")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_with(self.source_line.as_deref()))
    }
}

/// Splits `text` into lines on CRLF, CR or LF.
pub fn source_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\r' => {
                lines.push(&text[start..index]);
                if bytes.get(index + 1) == Some(&b'\n') {
                    index += 1;
                }
                start = index + 1;
            }
            b'\n' => {
                lines.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
        index += 1;
    }
    lines.push(&text[start..]);
    lines
}

fn line_at<'a>(lines: &[&'a str], line: usize) -> Option<&'a str> {
    line.checked_sub(1).and_then(|index| lines.get(index)).copied()
}
