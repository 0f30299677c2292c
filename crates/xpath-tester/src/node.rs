use core::fmt;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Kind of a position inside a parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
    Other,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Element => "Element",
            NodeKind::Attribute => "Attribute",
            NodeKind::Text => "Text",
            NodeKind::Comment => "Comment",
            NodeKind::ProcessingInstruction => "ProcessingInstruction",
            NodeKind::Namespace => "Namespace",
            NodeKind::Other => "Other",
        }
    }

    /// Root and element nodes are shown as an indented subtree, everything else as raw markup.
    pub fn has_subtree(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Element)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indentation used when serializing a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentUnit {
    pub fill: u8,
    pub size: usize,
}

impl IndentUnit {
    pub const SINGLE_SPACE: IndentUnit = IndentUnit { fill: b' ', size: 1 };
}

impl Default for IndentUnit {
    fn default() -> Self {
        Self::SINGLE_SPACE
    }
}

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("failed to write markup: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialized markup is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Read-only view of a node borrowed from its document.
///
/// Implementations are only valid while the owning document is alive; the
/// harness never keeps them past a single render call.
pub trait DocumentNode {
    fn kind(&self) -> NodeKind;

    /// Pretty-printed serialization of the node and its descendants.
    fn serialize_subtree(&self, indent: IndentUnit) -> Result<String, MarkupError>;

    /// The node's own markup, without reformatting.
    fn raw_outer_markup(&self) -> Result<String, MarkupError>;
}

impl<N: DocumentNode + ?Sized> DocumentNode for &N {
    fn kind(&self) -> NodeKind {
        (**self).kind()
    }

    fn serialize_subtree(&self, indent: IndentUnit) -> Result<String, MarkupError> {
        (**self).serialize_subtree(indent)
    }

    fn raw_outer_markup(&self) -> Result<String, MarkupError> {
        (**self).raw_outer_markup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NodeKind::Root, true)]
    #[case(NodeKind::Element, true)]
    #[case(NodeKind::Attribute, false)]
    #[case(NodeKind::Text, false)]
    #[case(NodeKind::Comment, false)]
    #[case(NodeKind::ProcessingInstruction, false)]
    #[case(NodeKind::Namespace, false)]
    #[case(NodeKind::Other, false)]
    fn only_containers_render_as_subtree(#[case] kind: NodeKind, #[case] expected: bool) {
        assert_eq!(kind.has_subtree(), expected);
    }

    #[rstest]
    fn kind_display_matches_tag_name() {
        assert_eq!(NodeKind::ProcessingInstruction.to_string(), "ProcessingInstruction");
        assert_eq!(format!("[NodeType.{}]", NodeKind::Attribute), "[NodeType.Attribute]");
    }
}
