//! # xmelt - XML Feed Melting Toolkit
//!
//! Converts attribute-bearing XML documents into normalized JSON records or
//! flat CSV rows, for feed and catalog style XML headed for spreadsheets and
//! analytics tooling.
//!
//! ## Modules
//!
//! - **tree**: quick-xml adapter producing a canonical attributed tree
//! - **convert**: root navigation, path normalization, cartesian row
//!   expansion, field resolution and record flattening
//! - **writer**: CSV and JSON output
//!
//! ## Quick Start
//!
//! ```rust
//! use xmelt::{xml_to_csv, xml_to_json, ConversionOptions};
//!
//! # fn main() -> xmelt::Result<()> {
//! let xml = r#"
//!     <root>
//!       <item>
//!         <order id="1">
//!           <products>
//!             <product>A</product>
//!             <product>B</product>
//!           </products>
//!         </order>
//!       </item>
//!     </root>
//! "#;
//!
//! let csv = xml_to_csv(xml, &ConversionOptions::default())?;
//! assert_eq!(csv, "order_@id,order_products_product\n1,A\n1,B");
//!
//! let records = xml_to_json(xml, &ConversionOptions::default())?;
//! assert_eq!(records.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! A root path that does not exist in the document yields an empty result;
//! only malformed XML and exceeded resource limits are errors.

use serde_json::Value;

pub mod convert;
pub mod error;
pub mod tree;
pub mod types;
pub mod writer;

pub use convert::{flatten_record, to_records, to_rows};
pub use error::{ConvertError, Result};
pub use tree::{is_well_formed, Document, Element, Node};
pub use types::{
    ArrayGroups, ArrayHandling, ConversionOptions, CsvOptions, CsvRow, PathMap, QuoteStyle, Record,
    RowSet, TreeConvention, DEFAULT_MAX_DEPTH,
};
pub use writer::{CsvEncoder, RecordFormat, RecordWriter};

/// Parse XML and return the normalized records of every item.
pub fn xml_to_json(xml: &str, options: &ConversionOptions) -> Result<Vec<Record>> {
    let doc = Document::parse(xml, options.max_depth)?;
    to_records(&doc, options)
}

/// Parse XML and return flat rows plus their sorted field list.
pub fn xml_to_rows(xml: &str, options: &ConversionOptions) -> Result<RowSet> {
    let doc = Document::parse(xml, options.max_depth)?;
    to_rows(&doc, options)
}

/// Parse XML and encode its rows as delimited text (empty string when there
/// are no rows).
pub fn xml_to_csv(xml: &str, options: &ConversionOptions) -> Result<String> {
    let rows = xml_to_rows(xml, options)?;
    CsvEncoder::new(options.csv.clone()).encode(&rows)
}

/// Parse XML into the conventional JSON shape without any normalization.
pub fn parse_xml_to_json(xml: &str, options: &ConversionOptions) -> Result<Value> {
    let doc = Document::parse(xml, options.max_depth)?;
    Ok(doc.to_json(&options.convention))
}
