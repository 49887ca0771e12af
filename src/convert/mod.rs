//! Tree normalization and row expansion
//!
//! Root navigation picks the items, then either the record normalizer
//! (JSON output) or the path normalizer, cartesian expander and row
//! assembler (tabular output) take over.

pub mod expand;
pub mod flatten;
pub mod navigate;
pub mod paths;
pub mod records;
pub mod rows;

pub use expand::CartesianExpander;
pub use flatten::flatten_record;
pub use navigate::{extract_items, locate};
pub use paths::{Normalized, PathNormalizer};
pub use records::RecordNormalizer;
pub use rows::{resolve_fields, RowAssembler};

use crate::error::Result;
use crate::tree::Document;
use crate::types::{ConversionOptions, Record, RowSet};

/// Normalized records of every item under the configured root.
pub fn to_records(doc: &Document, options: &ConversionOptions) -> Result<Vec<Record>> {
    let items = navigate::items(doc, options.root_element.as_deref());
    let normalizer = RecordNormalizer::new(options);

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Some(record) = normalizer.normalize(item)? else {
            continue;
        };
        if options.flatten_nested_objects {
            records.push(flatten_record(&record, &options.convention.flatten_separator));
        } else {
            records.push(record);
        }
    }
    Ok(records)
}

/// Flat rows of every item under the configured root, with sorted fields.
pub fn to_rows(doc: &Document, options: &ConversionOptions) -> Result<RowSet> {
    let items = navigate::items(doc, options.root_element.as_deref());
    RowAssembler::new(options).assemble(&items)
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    // -- Strategy helpers --

    fn arb_tag() -> impl Strategy<Value = String> {
        "[a-f]{1,3}".prop_map(|s| format!("t{}", s))
    }

    fn arb_text() -> impl Strategy<Value = String> {
        "[a-z0-9]{1,6}"
    }

    /// An item as a flat list of child elements; repeated tags become groups.
    fn arb_item() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec((arb_tag(), arb_text()), 0..6)
    }

    fn render(items: &[Vec<(String, String)>]) -> String {
        let mut xml = String::from("<root>");
        for item in items {
            xml.push_str("<item>");
            for (tag, text) in item {
                xml.push_str(&format!("<{tag}>{text}</{tag}>"));
            }
            xml.push_str("</item>");
        }
        xml.push_str("</root>");
        xml
    }

    fn parse(xml: &str) -> Document {
        Document::parse(xml, 64).unwrap()
    }

    proptest! {
        #[test]
        fn fields_are_sorted(items in prop::collection::vec(arb_item(), 0..4)) {
            let doc = parse(&render(&items));
            let set = to_rows(&doc, &ConversionOptions::default()).unwrap();

            let mut sorted = set.fields.clone();
            sorted.sort();
            prop_assert_eq!(&set.fields, &sorted);
        }

        #[test]
        fn rows_multiply_across_groups(sizes in prop::collection::vec(1usize..4, 1..4)) {
            let item: Vec<(String, String)> = sizes
                .iter()
                .enumerate()
                .flat_map(|(g, &n)| (0..n).map(move |i| (format!("g{g}"), format!("v{i}"))))
                .collect();
            let doc = parse(&render(&[item]));
            let set = to_rows(&doc, &ConversionOptions::default()).unwrap();

            let expected: usize = sizes.iter().product();
            prop_assert_eq!(set.rows.len(), expected);
        }

        #[test]
        fn missing_root_is_empty(items in prop::collection::vec(arb_item(), 0..4)) {
            let doc = parse(&render(&items));
            let options = ConversionOptions::default().with_root("root.missing.path");

            prop_assert!(to_rows(&doc, &options).unwrap().is_empty());
            prop_assert!(to_records(&doc, &options).unwrap().is_empty());
        }
    }
}
