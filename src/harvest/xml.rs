//! Minimal owned XML tree.
//!
//! Manifests are consumed by element name, never schema-validated, so a small
//! owned tree built from `quick-xml` events is all the resource layer needs:
//! name lookups, attribute reads, text extraction, and rendering back to XML
//! for diagnostics.

use std::fmt;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::traits::HarvestError;

// ============================================================================
// Tree Types
// ============================================================================

/// A parsed XML document with exactly one root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

/// A node inside an element's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its (qualified) name, attributes in document order and
/// child nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

// ============================================================================
// Document
// ============================================================================

impl XmlDocument {
    /// Parses `source` into a document.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::MalformedXml`] if the input has no root
    /// element, more than one root, unbalanced tags, or fails to tokenize.
    pub fn parse(source: &str) -> Result<Self, HarvestError> {
        let mut reader = Reader::from_str(source);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(malformed)?;
            match event {
                Event::Start(start) => stack.push(XmlElement::from_start(&start)?),
                Event::Empty(start) => {
                    let element = XmlElement::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        HarvestError::MalformedXml("unexpected closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    // Text outside the root element (prolog whitespace) is dropped.
                    if let Some(parent) = stack.last_mut() {
                        let text = text.unescape().map_err(malformed)?;
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(HarvestError::MalformedXml(format!(
                "unclosed element <{}>",
                open.name
            )));
        }

        root.map(|root| Self { root })
            .ok_or_else(|| HarvestError::MalformedXml("document has no root element".to_string()))
    }

    /// Wraps an element as the root of a new document.
    pub fn from_element(root: XmlElement) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn into_root(self) -> XmlElement {
        self.root
    }
}

impl fmt::Display for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

fn malformed(err: impl fmt::Display) -> HarvestError {
    HarvestError::MalformedXml(err.to_string())
}

/// Closes `element` into its parent, or makes it the root when the stack is
/// empty.
fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), HarvestError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(HarvestError::MalformedXml(format!(
            "second root element <{}>",
            element.name
        ))),
    }
}

// ============================================================================
// Element
// ============================================================================

impl XmlElement {
    /// Creates an empty element named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, HarvestError> {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr.map_err(malformed)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(malformed)?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    /// Local name, with any namespace prefix stripped (`rdf:RDF` → `RDF`).
    pub fn name(&self) -> &str {
        local_part(&self.name)
    }

    /// Name exactly as written in the source, prefix included.
    pub fn qualified_name(&self) -> &str {
        &self.name
    }

    /// Looks up an attribute by qualified name, falling back to the first
    /// attribute whose local name matches the local part of `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let local = local_part(name);
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| self.attributes.iter().find(|(key, _)| local_part(key) == local))
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Element children, skipping text nodes.
    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First element child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children().find(|child| child.name() == name)
    }

    /// All descendants (excluding `self`) with the given local name, in
    /// document order.
    pub fn descendants(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'e>(&'e self, name: &str, found: &mut Vec<&'e XmlElement>) {
        for child in self.children() {
            if child.name() == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Whether any descendant text node holds non-whitespace content.
    pub fn has_text(&self) -> bool {
        self.children.iter().any(|node| match node {
            XmlNode::Text(text) => !text.trim().is_empty(),
            XmlNode::Element(element) => element.has_text(),
        })
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, value) in &self.attributes {
            write!(f, " {}=\"{}\"", key, escape(value.as_str()))?;
        }
        if self.children.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        for node in &self.children {
            match node {
                XmlNode::Text(text) => f.write_str(&escape(text.as_str()))?,
                XmlNode::Element(element) => fmt::Display::fmt(element, f)?,
            }
        }
        write!(f, "</{}>", self.name)
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_attributes_and_text() {
        let doc = XmlDocument::parse(
            r#"<?xml version="1.0"?>
            <publicObject id="druid:oo000oo0000"><contentMetadata type="image">foo</contentMetadata></publicObject>"#,
        )
        .unwrap();

        assert_eq!(doc.root().name(), "publicObject");
        assert_eq!(doc.root().attribute("id"), Some("druid:oo000oo0000"));
        let cm = doc.root().child("contentMetadata").unwrap();
        assert_eq!(cm.attribute("type"), Some("image"));
        assert_eq!(cm.text(), "foo");
    }

    #[test]
    fn test_prefixed_names_match_by_local_part() {
        let doc = XmlDocument::parse(
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="x"/></rdf:RDF>"#,
        )
        .unwrap();

        assert_eq!(doc.root().name(), "RDF");
        assert_eq!(doc.root().qualified_name(), "rdf:RDF");
        let description = doc.root().child("Description").unwrap();
        assert_eq!(description.attribute("rdf:about"), Some("x"));
        assert_eq!(description.attribute("about"), Some("x"));
    }

    #[test]
    fn test_attribute_lookup_tolerates_other_prefixes() {
        let doc = XmlDocument::parse(
            r#"<r:Description xmlns:r="http://www.w3.org/1999/02/22-rdf-syntax-ns#" r:resource="some:druid"/>"#,
        )
        .unwrap();

        assert_eq!(doc.root().attribute("rdf:resource"), Some("some:druid"));
        assert_eq!(doc.root().attribute("r:resource"), Some("some:druid"));
        assert_eq!(doc.root().attribute("rdf:about"), None);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = XmlDocument::parse("<a><b>1</b><c><b>2</b></c><b>3</b></a>").unwrap();
        let texts: Vec<String> = doc.root().descendants("b").iter().map(|b| b.text()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_has_text_ignores_whitespace() {
        let blank = XmlDocument::parse("<mods>\n  <note>  </note>\n</mods>").unwrap();
        assert!(!blank.root().has_text());

        let filled = XmlDocument::parse("<mods><note>hi</note></mods>").unwrap();
        assert!(filled.root().has_text());
    }

    #[test]
    fn test_rejects_documents_without_single_root() {
        assert!(matches!(
            XmlDocument::parse(""),
            Err(HarvestError::MalformedXml(_))
        ));
        assert!(matches!(
            XmlDocument::parse("<a/><b/>"),
            Err(HarvestError::MalformedXml(_))
        ));
        assert!(XmlDocument::parse("<a><b></a>").is_err());
    }

    #[test]
    fn test_display_escapes_and_renders_empty_elements() {
        let doc = XmlDocument::parse(r#"<mods xmlns="urn:x"><note a="1 &amp; 2">x &lt; y</note><empty/></mods>"#)
            .unwrap();
        assert_eq!(
            doc.to_string(),
            r#"<mods xmlns="urn:x"><note a="1 &amp; 2">x &lt; y</note><empty/></mods>"#
        );
    }
}
