//! Markup serialization of `sxd-document` nodes through `quick-xml`.
//!
//! Names keep the prefix the parser saw. Namespace declarations are written on
//! the first serialized element that needs them, so every fragment stands on
//! its own even when it was cut out of a larger document.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesEnd, BytesPI, BytesStart, BytesText, Event};
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_xpath::nodeset::Node;

use crate::node::{IndentUnit, MarkupError};

/// Pretty-printed serialization of `node`.
///
/// Whitespace-only text inside elements is dropped so that the writer's own
/// indentation is the only layout in the output.
pub fn subtree(node: Node<'_>, indent: IndentUnit) -> Result<String, MarkupError> {
    let mut writer = Writer::new_with_indent(Vec::new(), indent.fill, indent.size);
    write_node(&mut writer, node, true)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Markup of `node` exactly as stored, with no layout added or removed.
pub fn outer_markup(node: Node<'_>) -> Result<String, MarkupError> {
    match node {
        Node::Root(_) | Node::Element(_) => {
            let mut writer = Writer::new(Vec::new());
            write_node(&mut writer, node, false)?;
            Ok(String::from_utf8(writer.into_inner())?)
        }
        Node::Attribute(attribute) => {
            let name = attribute.name();
            let qualified = match (name.namespace_uri(), attribute.preferred_prefix()) {
                (Some(_), Some(prefix)) => format!("{prefix}:{}", name.local_part()),
                _ => name.local_part().to_owned(),
            };
            Ok(format!("{qualified}=\"{}\"", escape(attribute.value())))
        }
        Node::Text(text) => Ok(partial_escape(text.text()).into_owned()),
        Node::Comment(comment) => Ok(format!("<!--{}-->", comment.text())),
        Node::ProcessingInstruction(pi) => Ok(match pi.value() {
            Some(value) => format!("<?{} {value}?>", pi.target()),
            None => format!("<?{}?>", pi.target()),
        }),
        Node::Namespace(namespace) => Ok(match namespace.prefix() {
            "" => format!("xmlns=\"{}\"", escape(namespace.uri())),
            prefix => format!("xmlns:{prefix}=\"{}\"", escape(namespace.uri())),
        }),
    }
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: Node<'_>, pretty: bool) -> Result<(), MarkupError> {
    let mut scope = Scope::default();
    match node {
        Node::Root(root) => {
            for child in root.children() {
                match child {
                    ChildOfRoot::Element(element) => write_element(writer, element, pretty, &mut scope)?,
                    ChildOfRoot::Comment(comment) => write_comment(writer, comment.text())?,
                    ChildOfRoot::ProcessingInstruction(pi) => write_pi(writer, pi.target(), pi.value())?,
                }
            }
            Ok(())
        }
        Node::Element(element) => write_element(writer, element, pretty, &mut scope),
        other => {
            let markup = outer_markup(other)?;
            writer.write_event(Event::Text(BytesText::from_escaped(markup)))?;
            Ok(())
        }
    }
}

/// Namespace declarations already written by enclosing elements.
#[derive(Default)]
struct Scope<'d> {
    declared: Vec<(Option<&'d str>, &'d str)>,
}

impl<'d> Scope<'d> {
    fn lookup(&self, prefix: Option<&str>) -> Option<&'d str> {
        self.declared.iter().rev().find(|(p, _)| *p == prefix).map(|(_, uri)| *uri).filter(|uri| !uri.is_empty())
    }

    /// Records `prefix -> uri` and returns the attribute that declares it, if it is new.
    fn require(&mut self, prefix: Option<&'d str>, uri: &'d str) -> Option<(String, &'d str)> {
        if self.lookup(prefix) == Some(uri) || (uri.is_empty() && self.lookup(prefix).is_none()) {
            return None;
        }
        self.declared.push((prefix, uri));
        Some((prefix.map_or_else(|| "xmlns".to_owned(), |p| format!("xmlns:{p}")), uri))
    }
}

fn write_element<'d, W: Write>(
    writer: &mut Writer<W>,
    element: Element<'d>,
    pretty: bool,
    scope: &mut Scope<'d>,
) -> Result<(), MarkupError> {
    let depth = scope.declared.len();
    let name = element.name();
    let mut declarations = Vec::new();

    let tag = match name.namespace_uri() {
        Some(uri) => match element.preferred_prefix() {
            Some(prefix) => {
                declarations.extend(scope.require(Some(prefix), uri));
                format!("{prefix}:{}", name.local_part())
            }
            None => {
                declarations.extend(scope.require(None, uri));
                name.local_part().to_owned()
            }
        },
        None => {
            declarations.extend(scope.require(None, ""));
            name.local_part().to_owned()
        }
    };

    let mut attributes = Vec::new();
    for attribute in element.attributes() {
        let attr_name = attribute.name();
        let qualified = match (attr_name.namespace_uri(), attribute.preferred_prefix()) {
            (Some(uri), Some(prefix)) => {
                declarations.extend(scope.require(Some(prefix), uri));
                format!("{prefix}:{}", attr_name.local_part())
            }
            _ => attr_name.local_part().to_owned(),
        };
        attributes.push((qualified, attribute.value()));
    }

    let mut start = BytesStart::new(tag.as_str());
    for (declaration, uri) in &declarations {
        start.push_attribute((declaration.as_str(), *uri));
    }
    for (qualified, value) in &attributes {
        start.push_attribute((qualified.as_str(), *value));
    }

    let children: Vec<ChildOfElement<'d>> = element
        .children()
        .into_iter()
        .filter(|child| !(pretty && matches!(child, ChildOfElement::Text(text) if text.text().trim().is_empty())))
        .collect();

    if children.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        for child in children {
            match child {
                ChildOfElement::Element(inner) => write_element(writer, inner, pretty, scope)?,
                ChildOfElement::Text(text) => {
                    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text.text()))))?;
                }
                ChildOfElement::Comment(comment) => write_comment(writer, comment.text())?,
                ChildOfElement::ProcessingInstruction(pi) => write_pi(writer, pi.target(), pi.value())?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
    }
    scope.declared.truncate(depth);
    Ok(())
}

fn write_comment<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<(), MarkupError> {
    writer.write_event(Event::Comment(BytesText::from_escaped(text)))?;
    Ok(())
}

fn write_pi<W: Write>(writer: &mut Writer<W>, target: &str, value: Option<&str>) -> Result<(), MarkupError> {
    let content = match value {
        Some(value) => format!("{target} {value}"),
        None => target.to_owned(),
    };
    writer.write_event(Event::PI(BytesPI::new(content)))?;
    Ok(())
}
