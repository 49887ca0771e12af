//! Error types for XML conversion.
//!
//! Only two things can go wrong for a caller: the document is broken, or a
//! resource limit was hit. A configured root that does not exist is not an
//! error and never shows up here.

use thiserror::Error;

/// Errors produced while parsing or converting a document
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConvertError {
    /// The XML reader rejected the input.
    #[error("XML parse error: {0}")]
    Parse(#[from] quick_xml::Error),

    /// An attribute could not be read.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Structurally invalid document detected while building the tree.
    #[error("Malformed XML at byte {position}: {message}")]
    Malformed {
        /// Byte offset where the problem was noticed.
        position: u64,
        /// Description of the problem.
        message: String,
    },

    /// Document nesting exceeded the configured maximum depth.
    #[error("Maximum nesting depth of {limit} exceeded")]
    DepthLimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// Row expansion would produce more rows than allowed.
    #[error("Row expansion exceeds the limit of {limit} rows")]
    RowLimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// CSV encoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub(crate) fn malformed(position: u64, message: impl Into<String>) -> Self {
        ConvertError::Malformed {
            position,
            message: message.into(),
        }
    }

    /// True when the input document itself is broken.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            ConvertError::Parse(_) | ConvertError::Attribute(_) | ConvertError::Malformed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
