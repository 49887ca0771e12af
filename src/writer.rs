use crate::error::{ConvertError, Result};
use crate::types::{CsvOptions, QuoteStyle, Record, RowSet};
use std::io::Write;

/// Encodes a [`RowSet`] as delimited text using the `csv` crate
pub struct CsvEncoder {
    options: CsvOptions,
}

impl CsvEncoder {
    pub fn new(options: CsvOptions) -> Self {
        CsvEncoder { options }
    }

    fn builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .quote_style(match self.options.quote_style {
                QuoteStyle::Necessary => csv::QuoteStyle::Necessary,
                QuoteStyle::Always => csv::QuoteStyle::Always,
                QuoteStyle::Never => csv::QuoteStyle::Never,
                QuoteStyle::NonNumeric => csv::QuoteStyle::NonNumeric,
            })
            .terminator(csv::Terminator::Any(b'\n'));
        if let Some(escape) = self.options.escape {
            builder.double_quote(false).escape(escape);
        }
        builder
    }

    /// Write the header (if enabled) and every row; missing fields become
    /// empty cells. Writes nothing at all when there are no rows.
    pub fn write<W: Write>(&self, rows: &RowSet, writer: W) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut wtr = self.builder().from_writer(writer);
        if self.options.header {
            wtr.write_record(&rows.fields)?;
        }
        for row in &rows.rows {
            wtr.write_record(
                rows.fields
                    .iter()
                    .map(|field| row.get(field).map(String::as_str).unwrap_or("")),
            )?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Encode to a string without the trailing line terminator.
    pub fn encode(&self, rows: &RowSet) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(rows, &mut buffer)?;

        let mut text = String::from_utf8(buffer)
            .map_err(|e| ConvertError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }
}

/// Output layout for records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// One pretty-printed JSON array
    Json,
    /// One compact JSON object per line
    Ndjson,
}

/// Writes normalized records as JSON or newline-delimited JSON
pub struct RecordWriter<W: Write> {
    writer: W,
    format: RecordFormat,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, format: RecordFormat) -> Self {
        RecordWriter { writer, format }
    }

    pub fn write_records(&mut self, records: &[Record]) -> Result<()> {
        match self.format {
            RecordFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, records)?;
                writeln!(self.writer)?;
            }
            RecordFormat::Ndjson => {
                for record in records {
                    serde_json::to_writer(&mut self.writer, record)?;
                    writeln!(self.writer)?;
                }
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CsvRow;
    use serde_json::json;

    fn row(pairs: &[(&str, &str)]) -> CsvRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn rowset(rows: Vec<CsvRow>) -> RowSet {
        RowSet {
            fields: crate::convert::resolve_fields(&rows),
            rows,
        }
    }

    #[test]
    fn test_encode_fills_missing_fields() {
        let rows = rowset(vec![row(&[("a", "1")]), row(&[("b", "2")])]);
        let csv = CsvEncoder::new(CsvOptions::default()).encode(&rows).unwrap();
        assert_eq!(csv, "a,b\n1,\n,2");
    }

    #[test]
    fn test_encode_empty_is_empty_string() {
        let csv = CsvEncoder::new(CsvOptions::default())
            .encode(&RowSet::default())
            .unwrap();
        assert_eq!(csv, "");
    }

    #[test]
    fn test_encode_options_pass_through() {
        let rows = rowset(vec![row(&[("name", "a;b"), ("note", "say \"hi\"")])]);

        let options = CsvOptions {
            delimiter: b';',
            header: false,
            ..CsvOptions::default()
        };
        let csv = CsvEncoder::new(options).encode(&rows).unwrap();
        assert_eq!(csv, "\"a;b\";\"say \"\"hi\"\"\"");

        let options = CsvOptions {
            quote: b'\'',
            escape: Some(b'\\'),
            quote_style: QuoteStyle::Always,
            ..CsvOptions::default()
        };
        let csv = CsvEncoder::new(options).encode(&rows).unwrap();
        assert_eq!(csv, "'name','note'\n'a;b','say \"hi\"'");
    }

    #[test]
    fn test_ndjson_records() {
        let records: Vec<Record> = vec![
            serde_json::from_value(json!({"a": "1"})).unwrap(),
            serde_json::from_value(json!({"b": {"c": "2"}})).unwrap(),
        ];
        let mut buffer = Vec::new();
        let mut writer = RecordWriter::new(&mut buffer, RecordFormat::Ndjson);
        writer.write_records(&records).unwrap();
        writer.flush().unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "{\"a\":\"1\"}\n{\"b\":{\"c\":\"2\"}}\n");
    }
}
