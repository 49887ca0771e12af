use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::tree::Node;

/// Scalar values of one item keyed by their synthetic path
pub type PathMap = BTreeMap<String, String>;

/// One flat output row. Fields missing here are filled by the encoder.
pub type CsvRow = BTreeMap<String, String>;

/// A normalized record, nested or flattened depending on options
pub type Record = Map<String, Value>;

/// Repeated child collections of one item, in discovery order, not yet expanded.
/// Elements are borrowed from the parsed tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayGroups<'a> {
    groups: Vec<(String, &'a [Node])>,
}

impl<'a> ArrayGroups<'a> {
    pub fn new() -> Self {
        ArrayGroups { groups: Vec::new() }
    }

    /// Register a group. A colliding path replaces the earlier group in place.
    pub fn insert(&mut self, path: String, elements: &'a [Node]) {
        if let Some(slot) = self.groups.iter_mut().find(|(p, _)| *p == path) {
            slot.1 = elements;
        } else {
            self.groups.push((path, elements));
        }
    }

    pub fn get(&self, path: &str) -> Option<&'a [Node]> {
        self.groups
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, elements)| *elements)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &'a [Node])> + '_ {
        self.groups.iter().map(|(p, e)| (p.as_str(), *e))
    }
}

/// Rows ready for tabular encoding, with the sorted union of their fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    pub fields: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl RowSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How repeated sibling elements are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayHandling {
    /// Keep arrays; rows are expanded into every combination
    #[default]
    Preserve,
    /// Join array elements into one `[a;b]` string
    Concatenate,
}

/// Naming convention used to fold attributes and text into ordinary keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeConvention {
    /// Prefix marking attribute names, e.g. `@id`
    pub attribute_prefix: String,

    /// Key for element text when it sits next to attributes or children
    pub text_key: String,

    /// Joins path segments in tabular output, e.g. `order_products_product`
    pub path_separator: String,

    /// Joins keys when flattening records, e.g. `details.address.city`
    pub flatten_separator: String,
}

impl Default for TreeConvention {
    fn default() -> Self {
        TreeConvention {
            attribute_prefix: String::from("@"),
            text_key: String::from("_"),
            path_separator: String::from("_"),
            flatten_separator: String::from("."),
        }
    }
}

impl TreeConvention {
    pub fn attribute_key(&self, name: &str) -> String {
        format!("{}{}", self.attribute_prefix, name)
    }

    /// Join a path prefix with a segment; an empty prefix yields the segment.
    pub fn join_path(&self, prefix: &str, segment: &str) -> String {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{}{}{}", prefix, self.path_separator, segment)
        }
    }
}

/// Quoting policy handed to the CSV encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuoteStyle {
    #[default]
    Necessary,
    Always,
    Never,
    NonNumeric,
}

/// Options passed through unchanged to the CSV encoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CsvOptions {
    pub delimiter: u8,
    pub quote: u8,
    /// Escape byte for quotes; `None` doubles them instead
    pub escape: Option<u8>,
    pub header: bool,
    pub quote_style: QuoteStyle,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            quote: b'"',
            escape: None,
            header: true,
            quote_style: QuoteStyle::Necessary,
        }
    }
}

/// Default nesting limit for parsing and every recursive pass
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Configuration for one conversion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversionOptions {
    /// Dotted path to the subtree holding the items, starting with the
    /// document's root tag. `None` selects the document root.
    pub root_element: Option<String>,

    pub array_handling: ArrayHandling,

    /// Separator used only with `ArrayHandling::Concatenate`
    pub array_separator: String,

    /// Flatten nested record objects into dotted keys
    pub flatten_nested_objects: bool,

    /// Maximum element nesting accepted by the parser and every recursive pass
    pub max_depth: usize,

    /// Upper bound on rows produced by cartesian expansion
    pub max_rows: Option<usize>,

    pub convention: TreeConvention,

    pub csv: CsvOptions,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            root_element: None,
            array_handling: ArrayHandling::Preserve,
            array_separator: String::from(";"),
            flatten_nested_objects: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_rows: None,
            convention: TreeConvention::default(),
            csv: CsvOptions::default(),
        }
    }
}

impl ConversionOptions {
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root_element = Some(root.into());
        self
    }

    pub fn with_array_handling(mut self, handling: ArrayHandling) -> Self {
        self.array_handling = handling;
        self
    }

    pub fn with_array_separator(mut self, separator: impl Into<String>) -> Self {
        self.array_separator = separator.into();
        self
    }

    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten_nested_objects = flatten;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn with_convention(mut self, convention: TreeConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    pub(crate) fn concatenates(&self) -> bool {
        self.array_handling == ArrayHandling::Concatenate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        let convention = TreeConvention::default();
        assert_eq!(convention.join_path("", "name"), "name");
        assert_eq!(convention.join_path("order", "id"), "order_id");
        assert_eq!(convention.attribute_key("code"), "@code");
    }

    #[test]
    fn test_array_groups_keep_discovery_order() {
        let first = vec![Node::scalar("1")];
        let second = vec![Node::scalar("2")];
        let third = vec![Node::scalar("3")];

        let mut groups = ArrayGroups::new();
        groups.insert("b".to_string(), &first);
        groups.insert("a".to_string(), &second);
        groups.insert("b".to_string(), &third);

        let paths: Vec<&str> = groups.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["b", "a"]);
        assert_eq!(groups.get("b"), Some(&third[..]));
    }

    #[test]
    fn test_options_from_partial_json() {
        let options: ConversionOptions = serde_json::from_str(
            r#"{"rootElement": "feed.entries", "arrayHandling": "concatenate", "csv": {"delimiter": 59}}"#,
        )
        .unwrap();

        assert_eq!(options.root_element.as_deref(), Some("feed.entries"));
        assert_eq!(options.array_handling, ArrayHandling::Concatenate);
        assert_eq!(options.array_separator, ";");
        assert_eq!(options.csv.delimiter, b';');
        assert!(options.csv.header);
        assert_eq!(options.convention, TreeConvention::default());
    }
}
