//! Cartesian row expansion over array groups
//!
//! Every combination picks exactly one element from each group. Object
//! elements are normalized at the group's own path and may contribute
//! further nested groups, which are expanded in turn. The number of
//! combinations is the product of the group sizes, so callers should check
//! [`CartesianExpander::count`] against their row budget before calling
//! [`CartesianExpander::expand`].

use tracing::trace;

use super::paths::{Normalized, PathNormalizer};
use crate::error::{ConvertError, Result};
use crate::tree::Node;
use crate::types::{ArrayGroups, PathMap};

pub struct CartesianExpander<'n, 'o> {
    normalizer: &'n PathNormalizer<'o>,
}

impl<'n, 'o> CartesianExpander<'n, 'o> {
    pub fn new(normalizer: &'n PathNormalizer<'o>) -> Self {
        CartesianExpander { normalizer }
    }

    /// All combinations of one element from each group, first group varying
    /// slowest. No groups yields a single empty combination.
    pub fn expand(&self, groups: &ArrayGroups<'_>, depth: usize) -> Result<Vec<PathMap>> {
        self.check_depth(depth)?;

        let mut combinations = vec![PathMap::new()];
        for (path, elements) in groups.iter() {
            let contributions = self.contributions(path, elements, depth)?;
            trace!(
                path,
                elements = elements.len(),
                contributions = contributions.len(),
                "expanding array group"
            );

            let mut next = Vec::with_capacity(combinations.len() * contributions.len());
            for combination in &combinations {
                for contribution in &contributions {
                    let mut merged = combination.clone();
                    merged.extend(contribution.iter().map(|(k, v)| (k.clone(), v.clone())));
                    next.push(merged);
                }
            }
            combinations = next;
        }

        Ok(combinations)
    }

    /// Number of combinations [`expand`](Self::expand) would produce,
    /// saturating at `usize::MAX`.
    pub fn count(&self, groups: &ArrayGroups<'_>, depth: usize) -> Result<usize> {
        self.check_depth(depth)?;

        let mut total: usize = 1;
        for (path, elements) in groups.iter() {
            let mut group_total: usize = 0;
            for element in elements {
                group_total = group_total.saturating_add(self.element_count(path, element, depth)?);
            }
            total = total.saturating_mul(group_total.max(1));
        }
        Ok(total)
    }

    /// Partial rows contributed by each element of one group. Empty scalars
    /// contribute nothing; a group with nothing left contributes the empty
    /// combination so the rest of the row survives.
    fn contributions(&self, path: &str, elements: &[Node], depth: usize) -> Result<Vec<PathMap>> {
        let mut contributions = Vec::new();
        for element in elements {
            match element {
                Node::Scalar(value) if value.is_empty() => {}
                Node::Scalar(value) => {
                    contributions.push(PathMap::from([(path.to_string(), value.clone())]));
                }
                Node::Object(_) | Node::Array(_) => {
                    let normalized = self.normalizer.normalize(element, path, depth + 1)?;
                    if !self.has_values(&normalized, depth + 1)? {
                        continue;
                    }
                    for nested in self.expand(&normalized.groups, depth + 1)? {
                        let mut merged = normalized.paths.clone();
                        merged.extend(nested);
                        contributions.push(merged);
                    }
                }
            }
        }

        if contributions.is_empty() {
            contributions.push(PathMap::new());
        }
        Ok(contributions)
    }

    fn element_count(&self, path: &str, element: &Node, depth: usize) -> Result<usize> {
        match element {
            Node::Scalar(value) if value.is_empty() => Ok(0),
            Node::Scalar(_) => Ok(1),
            Node::Object(_) | Node::Array(_) => {
                let normalized = self.normalizer.normalize(element, path, depth + 1)?;
                if !self.has_values(&normalized, depth + 1)? {
                    return Ok(0);
                }
                self.count(&normalized.groups, depth + 1)
            }
        }
    }

    /// Whether a normalized element yields any value at all, directly or
    /// through a nested group. Elements without values are skipped like
    /// empty scalars, so they never multiply rows.
    fn has_values(&self, normalized: &Normalized<'_>, depth: usize) -> Result<bool> {
        self.check_depth(depth)?;
        if !normalized.paths.is_empty() {
            return Ok(true);
        }
        for (path, elements) in normalized.groups.iter() {
            for element in elements {
                let found = match element {
                    Node::Scalar(value) => !value.is_empty(),
                    Node::Object(_) | Node::Array(_) => {
                        let nested = self.normalizer.normalize(element, path, depth + 1)?;
                        self.has_values(&nested, depth + 1)?
                    }
                };
                if found {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        let limit = self.normalizer.options().max_depth;
        if depth > limit {
            return Err(ConvertError::DepthLimitExceeded { limit });
        }
        Ok(())
    }
}
