//! Canonical attributed tree built from parsed XML
//!
//! The parser folds every element into one of three shapes: a plain scalar,
//! an object carrying text, attributes and children, or an array of repeated
//! siblings. Attributes and text live in their own fields so they can never
//! collide with a child element of the same name.

pub mod parser;

use serde_json::{Map, Value};

use crate::types::TreeConvention;

pub use parser::{is_well_formed, parse_document};

/// One node of the canonical tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Text-only element, or a bare value inside an array
    Scalar(String),
    /// Element with attributes and/or child elements
    Object(Element),
    /// Repeated sibling elements sharing one tag, in document order
    Array(Vec<Node>),
}

impl Node {
    pub fn scalar(value: impl Into<String>) -> Self {
        Node::Scalar(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Object(element) => Some(element),
            _ => None,
        }
    }

    /// Scalars that are empty after trimming carry no value.
    pub fn is_empty_scalar(&self) -> bool {
        matches!(self, Node::Scalar(s) if s.is_empty())
    }

    /// Render in the conventional JSON shape (attributes grouped under the
    /// attribute prefix key, text under the text key).
    pub fn to_json(&self, convention: &TreeConvention) -> Value {
        match self {
            Node::Scalar(s) => Value::String(s.clone()),
            Node::Array(items) => {
                Value::Array(items.iter().map(|n| n.to_json(convention)).collect())
            }
            Node::Object(element) => {
                let mut obj = Map::new();
                if !element.attributes.is_empty() {
                    let attrs: Map<String, Value> = element
                        .attributes
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect();
                    obj.insert(convention.attribute_prefix.clone(), Value::Object(attrs));
                }
                if let Some(text) = &element.text {
                    obj.insert(convention.text_key.clone(), Value::String(text.clone()));
                }
                for (tag, child) in &element.children {
                    obj.insert(tag.clone(), child.to_json(convention));
                }
                Value::Object(obj)
            }
        }
    }
}

/// An element with attributes or children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    text: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<(String, Node)>,
}

impl Element {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_attribute(name, value);
        self
    }

    pub fn with_child(mut self, tag: impl Into<String>, node: Node) -> Self {
        self.push_child(tag, node);
        self
    }

    /// Text content; whitespace-only text is treated as absent.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|(k, _)| k == tag).map(|(_, v)| v)
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        let trimmed = text.trim();
        self.text = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn push_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Add a child element. A second child with the same tag turns the
    /// entry into an array, keeping the position of the first occurrence.
    pub fn push_child(&mut self, tag: impl Into<String>, node: Node) {
        let tag = tag.into();
        match self.children.iter_mut().find(|(k, _)| *k == tag) {
            Some((_, Node::Array(items))) => items.push(node),
            Some((_, existing)) => {
                let first = std::mem::replace(existing, Node::Array(Vec::new()));
                *existing = Node::Array(vec![first, node]);
            }
            None => self.children.push((tag, node)),
        }
    }
}

// Subtrees are dropped from a heap worklist; drop depth stays constant.
impl Drop for Element {
    fn drop(&mut self) {
        let mut pending: Vec<Node> = self.children.drain(..).map(|(_, node)| node).collect();
        while let Some(node) = pending.pop() {
            match node {
                Node::Object(mut element) => {
                    pending.extend(element.children.drain(..).map(|(_, node)| node));
                }
                Node::Array(items) => pending.extend(items),
                Node::Scalar(_) => {}
            }
        }
    }
}

/// A parsed XML document: its root tag and root node
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root_name: String,
    root: Node,
}

impl Document {
    pub fn new(root_name: impl Into<String>, root: Node) -> Self {
        Document {
            root_name: root_name.into(),
            root,
        }
    }

    /// Parse XML text, rejecting nesting deeper than `max_depth`.
    pub fn parse(xml: &str, max_depth: usize) -> crate::Result<Self> {
        parse_document(xml, max_depth)
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The whole document as `{rootTag: ...}` in the conventional JSON shape
    pub fn to_json(&self, convention: &TreeConvention) -> Value {
        let mut obj = Map::new();
        obj.insert(self.root_name.clone(), self.root.to_json(convention));
        Value::Object(obj)
    }
}
