//! Path normalization: split one item into scalar paths and array groups
//!
//! Text lands on the current prefix, attributes on `prefix_@name`, scalar
//! children on `prefix_tag`. Singleton children recurse with an extended
//! prefix; repeated children are registered as array groups for the
//! cartesian expander instead of being walked here.

use crate::error::{ConvertError, Result};
use crate::tree::{Element, Node};
use crate::types::{ArrayGroups, ConversionOptions, PathMap};

/// Scalar paths and deferred array groups of one node
#[derive(Debug, Default, PartialEq)]
pub struct Normalized<'a> {
    pub paths: PathMap,
    pub groups: ArrayGroups<'a>,
}

impl Normalized<'_> {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.groups.is_empty()
    }
}

pub struct PathNormalizer<'o> {
    options: &'o ConversionOptions,
}

impl<'o> PathNormalizer<'o> {
    pub fn new(options: &'o ConversionOptions) -> Self {
        PathNormalizer { options }
    }

    pub fn options(&self) -> &'o ConversionOptions {
        self.options
    }

    /// Normalize `node` with every emitted key anchored at `prefix`.
    pub fn normalize<'a>(&self, node: &'a Node, prefix: &str, depth: usize) -> Result<Normalized<'a>> {
        let mut out = Normalized::default();
        match node {
            Node::Scalar(value) => {
                if !value.is_empty() {
                    out.paths.insert(self.text_path(prefix), value.clone());
                }
            }
            Node::Array(elements) => {
                self.register_array(elements, self.text_path(prefix), depth, &mut out)?;
            }
            Node::Object(element) => {
                self.walk(element, prefix, depth, &mut out)?;
            }
        }
        Ok(out)
    }

    fn walk<'a>(
        &self,
        element: &'a Element,
        prefix: &str,
        depth: usize,
        out: &mut Normalized<'a>,
    ) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(ConvertError::DepthLimitExceeded {
                limit: self.options.max_depth,
            });
        }

        let convention = &self.options.convention;

        if let Some(text) = element.text() {
            out.paths.insert(self.text_path(prefix), text.to_string());
        }

        for (name, value) in element.attributes() {
            if value.is_empty() {
                continue;
            }
            let key = convention.join_path(prefix, &convention.attribute_key(name));
            out.paths.insert(key, value.to_string());
        }

        for (tag, child) in element.children() {
            let key = convention.join_path(prefix, tag);
            match child {
                Node::Scalar(value) => {
                    if !value.is_empty() {
                        out.paths.insert(key, value.clone());
                    }
                }
                Node::Array(elements) => {
                    self.register_array(elements, key, depth, out)?;
                }
                Node::Object(nested) => {
                    self.walk(nested, &key, depth + 1, out)?;
                }
            }
        }

        Ok(())
    }

    fn register_array<'a>(
        &self,
        elements: &'a [Node],
        key: String,
        depth: usize,
        out: &mut Normalized<'a>,
    ) -> Result<()> {
        if self.options.concatenates() {
            if let Some(joined) = self.concatenate(elements, depth + 1)? {
                out.paths.insert(key, joined);
            }
        } else {
            out.groups.insert(key, elements);
        }
        Ok(())
    }

    /// Render an array as one `[a;b]` string. Object elements become the
    /// compact JSON of their own path map. `None` when nothing is left after
    /// dropping empty elements.
    fn concatenate(&self, elements: &[Node], depth: usize) -> Result<Option<String>> {
        let mut parts = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Node::Scalar(value) if value.is_empty() => {}
                Node::Scalar(value) => parts.push(value.clone()),
                Node::Array(inner) => {
                    if let Some(joined) = self.concatenate(inner, depth + 1)? {
                        parts.push(joined);
                    }
                }
                Node::Object(_) => {
                    let nested = self.normalize(element, "", depth)?;
                    if !nested.paths.is_empty() {
                        parts.push(serde_json::to_string(&nested.paths)?);
                    }
                }
            }
        }

        if parts.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!(
            "[{}]",
            parts.join(&self.options.array_separator)
        )))
    }

    /// Text has no suffix of its own; at an empty prefix it takes the text key.
    fn text_path(&self, prefix: &str) -> String {
        if prefix.is_empty() {
            self.options.convention.text_key.clone()
        } else {
            prefix.to_string()
        }
    }
}
