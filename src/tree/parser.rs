//! quick-xml adapter: turns raw markup into a canonical [`Document`]
//!
//! The tree is built with an explicit element stack, so document depth never
//! turns into call-stack depth here.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::{Document, Element, Node};
use crate::error::{ConvertError, Result};
use crate::types::DEFAULT_MAX_DEPTH;

/// An element that has been opened but not yet closed
struct OpenElement {
    name: String,
    element: Element,
    text: String,
}

impl OpenElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = Element::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?;
            element.push_attribute(key, value.into_owned());
        }
        Ok(OpenElement {
            name,
            element,
            text: String::new(),
        })
    }

    /// Close the element. Text-only elements collapse to a scalar.
    fn finish(self) -> (String, Node) {
        let OpenElement {
            name,
            mut element,
            text,
        } = self;

        if !element.has_attributes() && !element.has_children() {
            return (name, Node::Scalar(text.trim().to_string()));
        }

        element.set_text(text);
        (name, Node::Object(element))
    }
}

/// Parse XML text into a [`Document`].
///
/// Fails on mismatched or unclosed tags, content outside the single root
/// element, and nesting deeper than `max_depth`.
pub fn parse_document(xml: &str, max_depth: usize) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, Node)> = None;

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_event()? {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(ConvertError::malformed(position, "multiple root elements"));
                }
                if stack.len() >= max_depth {
                    return Err(ConvertError::DepthLimitExceeded { limit: max_depth });
                }
                stack.push(OpenElement::from_start(&start)?);
            }
            Event::Empty(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(ConvertError::malformed(position, "multiple root elements"));
                }
                if stack.len() >= max_depth {
                    return Err(ConvertError::DepthLimitExceeded { limit: max_depth });
                }
                let closed = OpenElement::from_start(&start)?.finish();
                attach(&mut stack, &mut root, closed);
            }
            Event::End(end) => {
                let Some(open) = stack.pop() else {
                    return Err(ConvertError::malformed(position, "unexpected closing tag"));
                };
                if end.name().as_ref() != open.name.as_bytes() {
                    return Err(ConvertError::malformed(
                        position,
                        format!(
                            "expected </{}>, found </{}>",
                            open.name,
                            String::from_utf8_lossy(end.name().as_ref())
                        ),
                    ));
                }
                let closed = open.finish();
                attach(&mut stack, &mut root, closed);
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                match stack.last_mut() {
                    Some(open) => open.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(ConvertError::malformed(
                            position,
                            "text content outside the root element",
                        ));
                    }
                }
            }
            Event::CData(cdata) => {
                let Some(open) = stack.last_mut() else {
                    return Err(ConvertError::malformed(
                        position,
                        "CDATA outside the root element",
                    ));
                };
                open.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    let position = reader.buffer_position() as u64;
    if let Some(open) = stack.last() {
        return Err(ConvertError::malformed(
            position,
            format!("unclosed element <{}>", open.name),
        ));
    }

    let (root_name, root) =
        root.ok_or_else(|| ConvertError::malformed(position, "document has no root element"))?;

    debug!(root = %root_name, "parsed XML document");
    Ok(Document::new(root_name, root))
}

fn attach(stack: &mut [OpenElement], root: &mut Option<(String, Node)>, closed: (String, Node)) {
    match stack.last_mut() {
        Some(parent) => parent.element.push_child(closed.0, closed.1),
        None => *root = Some(closed),
    }
}

/// True when `xml` parses into a document with a single root element,
/// nested no deeper than [`DEFAULT_MAX_DEPTH`].
pub fn is_well_formed(xml: &str) -> bool {
    parse_document(xml, DEFAULT_MAX_DEPTH).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TreeConvention;
    use serde_json::json;

    fn parse(xml: &str) -> Document {
        parse_document(xml, 64).unwrap()
    }

    #[test]
    fn test_text_only_elements_are_scalars() {
        let doc = parse("<root><item><name>Alice</name><age> 30 </age></item></root>");

        assert_eq!(doc.root_name(), "root");
        let item = doc.root().as_element().unwrap().child("item").unwrap();
        let item = item.as_element().unwrap();
        assert_eq!(item.child("name"), Some(&Node::scalar("Alice")));
        assert_eq!(item.child("age"), Some(&Node::scalar("30")));
    }

    #[test]
    fn test_empty_elements_are_empty_scalars() {
        let doc = parse("<root><item><value></value><empty/></item></root>");
        let item = doc.root().as_element().unwrap().child("item").unwrap();
        let item = item.as_element().unwrap();

        assert!(item.child("value").unwrap().is_empty_scalar());
        assert!(item.child("empty").unwrap().is_empty_scalar());
    }

    #[test]
    fn test_attributes_text_and_entities() {
        let doc = parse(r#"<root><item id="1" note="a &amp; b">&lt;Yamada&gt; &amp; Taro</item></root>"#);

        assert_eq!(
            doc.to_json(&TreeConvention::default()),
            json!({"root": {"item": {"@": {"id": "1", "note": "a & b"}, "_": "<Yamada> & Taro"}}})
        );
    }

    #[test]
    fn test_cdata_is_text() {
        let doc = parse("<root><code><![CDATA[a < b]]></code></root>");
        let code = doc.root().as_element().unwrap().child("code").unwrap();
        assert_eq!(code, &Node::scalar("a < b"));
    }

    #[test]
    fn test_declaration_and_comments_ignored() {
        let doc = parse("<?xml version=\"1.0\"?>\n<!-- feed --><root><a>1</a><!-- x --></root>\n");
        assert_eq!(
            doc.to_json(&TreeConvention::default()),
            json!({"root": {"a": "1"}})
        );
    }

    #[test]
    fn test_mismatched_tag_fails() {
        let err = parse_document("<root><invalid></root>", 64).unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_unclosed_element_fails() {
        let err = parse_document("<root><item>test", 64).unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_not_xml_fails() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("not xml"));
        assert!(!is_well_formed("<root><item>test</root>"));
        assert!(!is_well_formed("<a/><b/>"));
        assert!(is_well_formed("<root><item>test</item></root>"));
    }

    #[test]
    fn test_depth_limit() {
        let xml = "<a><b><c><d>deep</d></c></b></a>";
        assert!(parse_document(xml, 4).is_ok());

        let err = parse_document(xml, 3).unwrap_err();
        assert!(matches!(err, ConvertError::DepthLimitExceeded { limit: 3 }));
    }

    #[test]
    fn test_deep_input_is_not_well_formed() {
        let depth = 200_000;
        let xml = "<a>".repeat(depth) + &"</a>".repeat(depth);
        assert!(!is_well_formed(&xml));

        let shallow = "<a>".repeat(DEFAULT_MAX_DEPTH) + &"</a>".repeat(DEFAULT_MAX_DEPTH);
        assert!(is_well_formed(&shallow));
    }

    #[test]
    fn test_deep_tree_drops_without_recursion() {
        let depth = 200_000;
        let xml = "<a>".repeat(depth) + "<b>leaf</b><b>x</b>" + &"</a>".repeat(depth);
        let doc = parse_document(&xml, depth + 1).unwrap();
        assert_eq!(doc.root_name(), "a");
        drop(doc);
    }
}
