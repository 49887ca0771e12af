//! Root navigation and item extraction
//!
//! A root path that does not exist is a soft miss: the caller gets no items,
//! not an error.

use tracing::debug;

use crate::tree::{Document, Node};

/// Tag whose repetition marks the item sequence in feed-style documents
pub const ITEM_TAG: &str = "item";

/// Walk a dotted path (starting with the root tag) to the subtree of interest.
///
/// `None` selects the document root. Returns `None` when any component is
/// missing or the walk runs into an array or scalar.
pub fn locate<'a>(doc: &'a Document, root_path: Option<&str>) -> Option<&'a Node> {
    let Some(path) = root_path else {
        return Some(doc.root());
    };

    let mut components = path.split('.');
    if components.next() != Some(doc.root_name()) {
        debug!(path, root = doc.root_name(), "root path does not start at the document root");
        return None;
    }

    let mut node = doc.root();
    for component in components {
        let next = match node {
            Node::Object(element) if !component.is_empty() => element.child(component),
            _ => None,
        };
        match next {
            Some(child) => node = child,
            None => {
                debug!(path, missing = component, "root path not found in document");
                return None;
            }
        }
    }
    Some(node)
}

/// Split a located subtree into the items to convert.
///
/// An array yields its elements; an object with an `item` child yields that
/// child (repeated or single); anything else is a single item.
pub fn extract_items(node: &Node) -> Vec<&Node> {
    match node {
        Node::Array(elements) => elements.iter().collect(),
        Node::Object(element) => match element.child(ITEM_TAG) {
            Some(Node::Array(elements)) => elements.iter().collect(),
            Some(item) => vec![item],
            None => vec![node],
        },
        Node::Scalar(_) => vec![node],
    }
}

/// Locate the configured root and extract its items in one step.
pub fn items<'a>(doc: &'a Document, root_path: Option<&str>) -> Vec<&'a Node> {
    let items = locate(doc, root_path).map(extract_items).unwrap_or_default();
    debug!(count = items.len(), "extracted items");
    items
}
