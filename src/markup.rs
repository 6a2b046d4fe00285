//! Bounded pre-order walk over XML documents
//!
//! The document is pulled from the memory stream through `quick-xml`'s
//! event reader. Each start tag, empty tag, text run, CDATA section, comment,
//! processing instruction, declaration and doctype becomes one [`Node`] in
//! document order; end tags only close the current element.
//!
//! A node's [`NodeKind`] decides which accessors the driver invokes:
//! elements get their name parts and attributes (capped at
//! `max_attributes`), text gets its content and whitespace flag, numeric text
//! gets a typed value, and CDATA is handed over as opaque bytes.
//!
//! The reader reports `&name;` and `&#NN;` inside character data as separate
//! reference events, so a text run is split around them. Each reference is
//! its own node: character references are resolved through
//! `BytesRef::resolve_char_ref`, named ones against the predefined XML
//! entities, and anything else keeps only its raw name.

use crate::error::{Error, Result};
use crate::session::{ResourceLedger, Session};
use crate::stream::MemoryStream;
use crate::traversal::{Cap, Exit, TraversalState, Visitor};
use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, BytesStart, Event};
use std::borrow::Cow;

/// Type tag of a markup node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Start or empty tag
    Element,
    /// Non-numeric character data
    Text,
    /// Character data holding an integer
    Integer,
    /// Character data holding a real number
    Real,
    /// CDATA section
    Opaque,
    /// Entity or character reference in character data
    Reference,
    /// Comment, processing instruction, declaration or doctype
    Other,
}

/// One attribute of an element
#[derive(Debug, Clone)]
pub struct Attribute<'n> {
    /// Qualified attribute name
    pub name: Cow<'n, str>,
    /// Attribute value with entities resolved where possible
    pub value: Cow<'n, str>,
}

/// Tag-specific accessor results
#[derive(Debug, Clone)]
pub enum NodeData<'n> {
    /// Element name parts and (capped) attributes
    Element {
        /// Qualified name
        name: Cow<'n, str>,
        /// Name without namespace prefix
        local_name: Cow<'n, str>,
        /// Namespace prefix, if any
        prefix: Option<Cow<'n, str>>,
        /// Attributes, at most `max_attributes`
        attributes: Vec<Attribute<'n>>,
        /// Whether the element was written as `<a/>`
        empty: bool,
    },
    /// Text content
    Text {
        /// Content with entities resolved where possible
        content: Cow<'n, str>,
        /// True when the content is entirely whitespace
        whitespace: bool,
    },
    /// Integer-valued text
    Integer(i64),
    /// Real-valued text
    Real(f64),
    /// Raw CDATA content
    Opaque(&'n [u8]),
    /// Entity or character reference
    Reference {
        /// Reference name between `&` and `;`, e.g. `amp` or `#65`
        name: Cow<'n, str>,
        /// Replacement text, when the reference could be resolved
        resolved: Option<Cow<'n, str>>,
    },
    /// XML declaration pseudo-attributes
    Declaration {
        /// `version`, if it could be read
        version: Option<Cow<'n, str>>,
        /// `encoding`, if present
        encoding: Option<Cow<'n, str>>,
        /// `standalone`, if present
        standalone: Option<Cow<'n, str>>,
    },
    /// Raw content of a comment, processing instruction, declaration or doctype
    Other(&'n [u8]),
}

/// A node visited during the walk
#[derive(Debug, Clone)]
pub struct Node<'n> {
    /// Position in document order
    pub index: usize,
    /// Nesting depth (0 for top-level nodes)
    pub depth: usize,
    /// Accessor results for this node's kind
    pub data: NodeData<'n>,
}

impl Node<'_> {
    /// Type tag of this node
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text { .. } => NodeKind::Text,
            NodeData::Integer(_) => NodeKind::Integer,
            NodeData::Real(_) => NodeKind::Real,
            NodeData::Opaque(_) => NodeKind::Opaque,
            NodeData::Reference { .. } => NodeKind::Reference,
            NodeData::Declaration { .. } | NodeData::Other(_) => NodeKind::Other,
        }
    }

    /// Element name, for element nodes
    pub fn element_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Text content, for text nodes
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Replacement text, for resolved reference nodes
    pub fn resolved(&self) -> Option<&str> {
        match &self.data {
            NodeData::Reference {
                resolved: Some(resolved),
                ..
            } => Some(resolved),
            _ => None,
        }
    }
}

/// Walk the document in `stream` and return why the walk stopped
///
/// `Err` is reserved for setup failures; malformed markup is reported as
/// [`Exit::ParseError`].
pub(crate) fn traverse<V: Visitor>(
    stream: &mut MemoryStream<'_>,
    state: &mut TraversalState,
    ledger: Option<&ResourceLedger>,
    visitor: &mut V,
) -> Result<Exit> {
    let mut reader = Reader::from_reader(stream);
    reader.config_mut().check_comments = true;
    let mut session = Session::open(reader, ledger)?;

    let limits = state.limits();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut index = 0usize;

    let exit = loop {
        buf.clear();
        let event = match session.handle_mut().read_event_into(&mut buf) {
            Ok(Event::Eof) => break Exit::EndOfInput,
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            Ok(event) if is_node(&event) => event,
            Ok(_) => continue,
            Err(e) => break Exit::ParseError(Error::Xml(e)),
        };

        if state.enter_unit(limits.max_nodes()).is_break() {
            break Exit::CapReached(Cap::Nodes);
        }
        let data = match node_data(&event, limits.max_attributes(), state) {
            Ok(data) => data,
            Err(e) => break Exit::ParseError(e),
        };

        let node = Node { index, depth, data };
        if visitor.node(&node).is_break() {
            break Exit::Cancelled;
        }
        if matches!(event, Event::Start(_)) {
            depth += 1;
        }
        index += 1;
    };

    session.close();
    Ok(exit)
}

fn is_node(event: &Event<'_>) -> bool {
    matches!(
        event,
        Event::Start(_)
            | Event::Empty(_)
            | Event::Text(_)
            | Event::GeneralRef(_)
            | Event::CData(_)
            | Event::Comment(_)
            | Event::PI(_)
            | Event::Decl(_)
            | Event::DocType(_)
    )
}

/// Invoke the accessors valid for the event's node kind
fn node_data<'n>(
    event: &'n Event<'_>,
    max_attributes: usize,
    state: &mut TraversalState,
) -> Result<NodeData<'n>> {
    Ok(match event {
        Event::Start(e) => element(e, false, max_attributes, state)?,
        Event::Empty(e) => element(e, true, max_attributes, state)?,
        Event::Text(t) => text(t),
        Event::GeneralRef(r) => reference(r),
        Event::CData(c) => NodeData::Opaque(c),
        Event::Comment(t) | Event::DocType(t) => NodeData::Other(t),
        Event::PI(pi) => NodeData::Other(pi),
        Event::Decl(decl) => NodeData::Declaration {
            version: decl.version().ok().map(lossy),
            encoding: decl.encoding().and_then(|e| e.ok()).map(lossy),
            standalone: decl.standalone().and_then(|s| s.ok()).map(lossy),
        },
        _ => NodeData::Other(&[]),
    })
}

fn element<'n>(
    e: &'n BytesStart<'_>,
    empty: bool,
    max_attributes: usize,
    state: &mut TraversalState,
) -> Result<NodeData<'n>> {
    let mut attributes = Vec::new();
    for attr in e.attributes().take(max_attributes) {
        let attr = attr?;
        state.record_sublist_item();
        let value = resolve(lossy(attr.value));
        attributes.push(Attribute {
            name: String::from_utf8_lossy(attr.key.into_inner()),
            value,
        });
    }

    let name = e.name();
    let prefix = name
        .prefix()
        .map(|prefix| String::from_utf8_lossy(prefix.into_inner()));
    Ok(NodeData::Element {
        name: String::from_utf8_lossy(name.into_inner()),
        local_name: String::from_utf8_lossy(e.local_name().into_inner()),
        prefix,
        attributes,
        empty,
    })
}

fn text<'n>(raw: &'n [u8]) -> NodeData<'n> {
    let content = String::from_utf8_lossy(raw);

    let trimmed = content.trim();
    let numeric = trimmed
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
    if numeric {
        if let Ok(value) = trimmed.parse::<i64>() {
            return NodeData::Integer(value);
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            return NodeData::Real(value);
        }
    }

    let whitespace = content.chars().all(char::is_whitespace);
    NodeData::Text {
        content,
        whitespace,
    }
}

fn reference<'n>(r: &'n BytesRef<'_>) -> NodeData<'n> {
    let name = String::from_utf8_lossy(r);
    let resolved = if r.is_char_ref() {
        match r.resolve_char_ref() {
            Ok(Some(c)) => Some(Cow::Owned(c.to_string())),
            _ => None,
        }
    } else {
        resolve_predefined_entity(&name).map(Cow::Borrowed)
    };
    NodeData::Reference { name, resolved }
}

/// Resolve entity references, keeping the raw text when resolution fails
fn resolve(raw: Cow<'_, str>) -> Cow<'_, str> {
    let resolved = match unescape(&raw) {
        Ok(Cow::Owned(resolved)) => Some(resolved),
        _ => None,
    };
    resolved.map_or(raw, Cow::Owned)
}

fn lossy(bytes: Cow<'_, [u8]>) -> Cow<'_, str> {
    match bytes {
        Cow::Borrowed(b) => String::from_utf8_lossy(b),
        Cow::Owned(v) => Cow::Owned(String::from_utf8_lossy(&v).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_classification() {
        assert!(matches!(text(b"42"), NodeData::Integer(42)));
        assert!(matches!(text(b" -7 "), NodeData::Integer(-7)));
        assert!(matches!(text(b"2.5"), NodeData::Real(v) if v == 2.5));
        assert!(matches!(text(b"inf"), NodeData::Text { whitespace: false, .. }));
        assert!(matches!(text(b"hi"), NodeData::Text { whitespace: false, .. }));
        assert!(matches!(text(b"\n  \t"), NodeData::Text { whitespace: true, .. }));
    }

    #[test]
    fn test_resolve_attribute_entities() {
        assert_eq!(resolve(Cow::Borrowed("a &amp; b")), "a & b");
        assert_eq!(resolve(Cow::Borrowed("&#x41;&#66;")), "AB");
    }

    #[test]
    fn test_resolve_keeps_unknown_entity() {
        assert_eq!(resolve(Cow::Borrowed("&bogus;")), "&bogus;");
        assert!(matches!(resolve(Cow::Borrowed("plain")), Cow::Borrowed(_)));
    }

    #[test]
    fn test_node_kind_accessors() {
        let node = Node {
            index: 0,
            depth: 1,
            data: NodeData::Text {
                content: Cow::Borrowed("x"),
                whitespace: false,
            },
        };
        assert_eq!(node.kind(), NodeKind::Text);
        assert_eq!(node.text(), Some("x"));
        assert_eq!(node.element_name(), None);
    }
}
