//! Record normalization for the JSON output path
//!
//! Keeps the nesting of the source tree. Attributes become prefixed keys,
//! mixed text goes under the text key, empty values and empty objects
//! disappear. Arrays are kept (`preserve`) or joined into one string
//! (`concatenate`); no row expansion happens here.

use serde_json::{Map, Value};

use crate::error::{ConvertError, Result};
use crate::tree::{Element, Node};
use crate::types::{ConversionOptions, Record};

pub struct RecordNormalizer<'o> {
    options: &'o ConversionOptions,
}

impl<'o> RecordNormalizer<'o> {
    pub fn new(options: &'o ConversionOptions) -> Self {
        RecordNormalizer { options }
    }

    /// Normalize one item. Scalar items and items with nothing left after
    /// dropping empty values yield `None`.
    pub fn normalize(&self, item: &Node) -> Result<Option<Record>> {
        match item {
            Node::Object(element) => self.object(element, 0),
            _ => Ok(None),
        }
    }

    fn object(&self, element: &Element, depth: usize) -> Result<Option<Record>> {
        if depth > self.options.max_depth {
            return Err(ConvertError::DepthLimitExceeded {
                limit: self.options.max_depth,
            });
        }

        let convention = &self.options.convention;
        let mut record = Map::new();

        for (name, value) in element.attributes() {
            if !value.is_empty() {
                record.insert(convention.attribute_key(name), Value::String(value.to_string()));
            }
        }

        if let Some(text) = element.text() {
            record.insert(convention.text_key.clone(), Value::String(text.to_string()));
        }

        for (tag, child) in element.children() {
            if let Some(value) = self.value(child, depth + 1)? {
                record.insert(tag.to_string(), value);
            }
        }

        Ok(if record.is_empty() { None } else { Some(record) })
    }

    fn value(&self, node: &Node, depth: usize) -> Result<Option<Value>> {
        match node {
            Node::Scalar(s) if s.is_empty() => Ok(None),
            Node::Scalar(s) => Ok(Some(Value::String(s.clone()))),
            Node::Object(element) => Ok(self.object(element, depth)?.map(Value::Object)),
            Node::Array(elements) => self.array(elements, depth),
        }
    }

    fn array(&self, elements: &[Node], depth: usize) -> Result<Option<Value>> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(value) = self.value(element, depth)? {
                values.push(value);
            }
        }

        if values.is_empty() {
            return Ok(None);
        }

        if !self.options.concatenates() {
            return Ok(Some(Value::Array(values)));
        }

        let parts: Vec<String> = values
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        Ok(Some(Value::String(format!(
            "[{}]",
            parts.join(&self.options.array_separator)
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_document;
    use crate::types::ArrayHandling;
    use serde_json::json;

    fn normalize(xml: &str, options: &ConversionOptions) -> Option<Value> {
        let doc = parse_document(xml, 64).unwrap();
        let item = doc.root().as_element().unwrap().child("item").unwrap();
        RecordNormalizer::new(options)
            .normalize(item)
            .unwrap()
            .map(Value::Object)
    }

    #[test]
    fn test_nested_objects_kept() {
        let record = normalize(
            "<root><item><user><name>Taro</name><details><age>30</age></details></user></item></root>",
            &ConversionOptions::default(),
        );
        assert_eq!(
            record,
            Some(json!({"user": {"name": "Taro", "details": {"age": "30"}}}))
        );
    }

    #[test]
    fn test_attributes_on_item_and_nested() {
        let record = normalize(
            r#"<root><item id="1" type="user"><data type="personal" visibility="private"><name>Taro</name></data></item></root>"#,
            &ConversionOptions::default(),
        );
        assert_eq!(
            record,
            Some(json!({
                "@id": "1",
                "@type": "user",
                "data": {"@type": "personal", "@visibility": "private", "name": "Taro"}
            }))
        );
    }

    #[test]
    fn test_empty_children_dropped() {
        let record = normalize(
            "<root><item><name>test</name><empty></empty><another/><hollow><inner/></hollow></item></root>",
            &ConversionOptions::default(),
        );
        assert_eq!(record, Some(json!({"name": "test"})));

        let record = normalize(
            "<root><item><empty/></item></root>",
            &ConversionOptions::default(),
        );
        assert_eq!(record, None);
    }

    #[test]
    fn test_arrays_preserved() {
        let record = normalize(
            "<root><item><tag>a</tag><tag></tag><tag>b</tag><part><n>1</n></part><part><n>2</n></part></item></root>",
            &ConversionOptions::default(),
        );
        assert_eq!(
            record,
            Some(json!({"tag": ["a", "b"], "part": [{"n": "1"}, {"n": "2"}]}))
        );
    }

    #[test]
    fn test_arrays_concatenated() {
        let options = ConversionOptions::default().with_array_handling(ArrayHandling::Concatenate);
        let record = normalize(
            "<root><item><tag>a</tag><tag>b</tag><part><n>1</n></part><part><n>2</n></part></item></root>",
            &options,
        );
        assert_eq!(
            record,
            Some(json!({"tag": "[a;b]", "part": r#"[{"n":"1"};{"n":"2"}]"#}))
        );
    }
}
