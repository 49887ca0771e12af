//! Row assembly and field resolution
//!
//! Each item's scalar paths are merged into every one of its combinations.
//! Rows keep item order, then combination order within an item. The field
//! list is the lexicographically sorted union of all row keys, so output
//! columns do not depend on which item happened to come first.

use std::collections::BTreeSet;

use tracing::debug;

use super::expand::CartesianExpander;
use super::paths::PathNormalizer;
use crate::error::{ConvertError, Result};
use crate::tree::Node;
use crate::types::{ConversionOptions, CsvRow, RowSet};

pub struct RowAssembler<'o> {
    normalizer: PathNormalizer<'o>,
}

impl<'o> RowAssembler<'o> {
    pub fn new(options: &'o ConversionOptions) -> Self {
        RowAssembler {
            normalizer: PathNormalizer::new(options),
        }
    }

    /// Rows of a single item, in combination order.
    ///
    /// `budget` is the number of rows still allowed under `max_rows`.
    pub fn item_rows(&self, item: &Node, budget: Option<usize>) -> Result<Vec<CsvRow>> {
        if !matches!(item, Node::Object(_)) {
            return Ok(Vec::new());
        }

        let normalized = self.normalizer.normalize(item, "", 0)?;
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        let expander = CartesianExpander::new(&self.normalizer);
        if let Some(budget) = budget {
            let expected = expander.count(&normalized.groups, 0)?;
            if expected > budget {
                let limit = self.normalizer.options().max_rows.unwrap_or(budget);
                return Err(ConvertError::RowLimitExceeded { limit });
            }
        }

        let rows = expander
            .expand(&normalized.groups, 0)?
            .into_iter()
            .map(|combination| {
                let mut row = normalized.paths.clone();
                row.extend(combination);
                row
            })
            .filter(|row| !row.is_empty())
            .collect();
        Ok(rows)
    }

    /// Rows of every item plus the sorted union of their fields.
    pub fn assemble(&self, items: &[&Node]) -> Result<RowSet> {
        let max_rows = self.normalizer.options().max_rows;
        let mut rows: Vec<CsvRow> = Vec::new();

        for item in items {
            let budget = max_rows.map(|limit| limit.saturating_sub(rows.len()));
            rows.extend(self.item_rows(item, budget)?);
        }

        let fields = resolve_fields(&rows);
        debug!(rows = rows.len(), fields = fields.len(), "assembled rows");
        Ok(RowSet { fields, rows })
    }
}

/// Sorted union of every row's keys
pub fn resolve_fields(rows: &[CsvRow]) -> Vec<String> {
    let fields: BTreeSet<&String> = rows.iter().flat_map(|row| row.keys()).collect();
    fields.into_iter().cloned().collect()
}
