use std::fs;
use std::path::Path;

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName, ResolveResult};
use quick_xml::NsReader;
use thiserror::Error;

use crate::tree::XmlNode;

/// Errors that can occur while parsing XML into an [`XmlNode`] tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input XML could not be decoded or tokenized.
    #[error("failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Input bytes were not valid UTF-8 for tag/attribute/text extraction.
    #[error("invalid UTF-8 while parsing XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// Failed to decode text entity or bytes.
    #[error("failed to decode XML text: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    /// Failed to read input file.
    #[error("failed to read XML file: {0}")]
    Io(#[from] std::io::Error),
    /// Structural issue in XML document.
    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// Parse XML bytes into an [`XmlNode`] tree, resolving namespaces.
pub fn parse(xml: &[u8]) -> Result<XmlNode, ParseError> {
    let mut reader = NsReader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event_into(&mut buf)?;
        let namespace = namespace_of(resolved)?;
        match event {
            Event::Start(e) => {
                let node = build_node_start(&e, namespace, reader.decoder())?;
                stack.push(node);
            }
            Event::Empty(e) => {
                let node = build_node_start(&e, namespace, reader.decoder())?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    let text = e.unescape()?.into_owned();
                    if !text.trim().is_empty() {
                        match &mut current.text {
                            Some(existing) => existing.push_str(&text),
                            None => current.text = Some(text),
                        }
                    }
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    let text = std::str::from_utf8(e.as_ref())?.to_string();
                    if !text.trim().is_empty() {
                        match &mut current.text {
                            Some(existing) => existing.push_str(&text),
                            None => current.text = Some(text),
                        }
                    }
                }
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| {
                    ParseError::Malformed("encountered closing tag without open tag".to_string())
                })?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ParseError::Malformed(
            "unclosed element(s) at end of document".to_string(),
        ));
    }

    root.ok_or_else(|| ParseError::Malformed("no root element found".to_string()))
}

/// Parse an XML string into an [`XmlNode`] tree.
pub fn parse_str(xml: &str) -> Result<XmlNode, ParseError> {
    parse(xml.as_bytes())
}

/// Parse an XML file into an [`XmlNode`] tree.
pub fn parse_file(path: &Path) -> Result<XmlNode, ParseError> {
    let bytes = fs::read(path)?;
    parse(&bytes)
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        *root = Some(node);
    } else {
        return Err(ParseError::Malformed(
            "multiple top-level elements found".to_string(),
        ));
    }
    Ok(())
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<Option<String>, ParseError> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(std::str::from_utf8(ns.as_ref())?.to_string())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ParseError::Malformed(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn build_node_start(
    e: &BytesStart<'_>,
    namespace: Option<String>,
    decoder: Decoder,
) -> Result<XmlNode, ParseError> {
    let tag = std::str::from_utf8(e.local_name().as_ref())?.to_string();
    let mut node = XmlNode::new(tag);
    node.namespace = namespace;

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = qname_to_string(attr.key)?;
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr.decode_and_unescape_value(decoder)?.into_owned();
        node.attributes.insert(key, value);
    }

    Ok(node)
}

fn qname_to_string(name: QName<'_>) -> Result<String, ParseError> {
    Ok(std::str::from_utf8(name.as_ref())?.to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse_str, ParseError};

    #[test]
    fn default_namespace_is_inherited_by_children() {
        let root = parse_str(r#"<a xmlns="urn:one"><b>text</b></a>"#).expect("parse");

        assert_eq!(root.namespace.as_deref(), Some("urn:one"));
        let child = root.get_child("b").expect("child");
        assert_eq!(child.namespace.as_deref(), Some("urn:one"));
        assert!(root.attributes.is_empty());
    }

    #[test]
    fn prefixed_elements_resolve_to_their_uri() {
        let root = parse_str(r#"<a xmlns:x="urn:x"><x:b/><c/></a>"#).expect("parse");

        assert!(root.children[0].is("b", Some("urn:x")));
        assert!(root.children[1].is("c", None));
    }

    #[test]
    fn undeclared_prefix_is_rejected() {
        let err = parse_str("<a><y:b/></a>").expect_err("prefix is not bound");
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn empty_document_has_no_root() {
        let err = parse_str("<?xml version=\"1.0\"?>").expect_err("no root");
        assert!(matches!(err, ParseError::Malformed(_)));
    }
}
