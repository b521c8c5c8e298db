use std::collections::BTreeMap;

use serde::Serialize;

/// A namespaced XML element.
///
/// `tag` is the local name. `namespace` holds the resolved namespace URI, so
/// two elements written with different prefixes but bound to the same URI
/// compare equal. Namespace declarations are not kept in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlNode {
    /// Local element name.
    pub tag: String,
    /// Resolved namespace URI, if the element is bound to one.
    pub namespace: Option<String>,
    /// XML attributes keyed by qualified name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
    /// Optional text content.
    pub text: Option<String>,
}

impl XmlNode {
    /// Create a new node without a namespace.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            namespace: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Create a new node bound to `namespace`.
    pub fn with_namespace(tag: impl Into<String>, namespace: Option<&str>) -> Self {
        let mut node = Self::new(tag);
        node.namespace = namespace.map(str::to_string);
        node
    }

    /// Whether the node has the given local name and namespace.
    pub fn is(&self, tag: &str, namespace: Option<&str>) -> bool {
        self.tag == tag && self.namespace.as_deref() == namespace
    }

    /// Return the first child with the provided local name, in any namespace.
    pub fn get_child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Return all children with the provided local name, in any namespace.
    pub fn get_children(&self, tag: &str) -> Vec<&XmlNode> {
        self.children
            .iter()
            .filter(|child| child.tag == tag)
            .collect()
    }

    /// Walk a nested child path and return terminal node text if found.
    pub fn get_text<'a>(&'a self, path: &[&str]) -> Option<&'a str> {
        if path.is_empty() {
            return self.text.as_deref();
        }

        let mut current = self;
        for segment in path {
            current = current.get_child(segment)?;
        }
        current.text.as_deref()
    }

    /// Remove every child (recursively) with the given local name.
    ///
    /// Returns the number of removed elements.
    pub fn remove_descendants(&mut self, tag: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|child| child.tag != tag);
        let mut removed = before - self.children.len();
        for child in &mut self.children {
            removed += child.remove_descendants(tag);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::XmlNode;

    #[test]
    fn get_text_walks_nested_path() {
        let mut root = XmlNode::new("root");
        let mut parent = XmlNode::new("parent");
        let mut child = XmlNode::new("child");
        child.text = Some("value".to_string());
        parent.children.push(child);
        root.children.push(parent);

        assert_eq!(root.get_text(&["parent", "child"]), Some("value"));
    }

    #[test]
    fn is_compares_local_name_and_namespace() {
        let node = XmlNode::with_namespace("OneX", Some("urn:onex"));

        assert!(node.is("OneX", Some("urn:onex")));
        assert!(!node.is("OneX", None));
        assert!(!node.is("onex", Some("urn:onex")));
    }

    #[test]
    fn remove_descendants_drops_nested_matches() {
        let mut root = XmlNode::new("root");
        let mut inner = XmlNode::new("inner");
        inner.children.push(XmlNode::new("junk"));
        root.children.push(inner);
        root.children.push(XmlNode::new("junk"));

        assert_eq!(root.remove_descendants("junk"), 2);
        assert!(root.get_child("junk").is_none());
        assert!(root.get_child("inner").unwrap().children.is_empty());
    }
}
