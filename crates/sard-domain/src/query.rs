//! Query parameter translation.
//!
//! Converts request query parameters into a storage-agnostic
//! filter/sort/pagination spec and produces the pagination counters
//! for response metadata. Search stays tolerant: unrecognized filter
//! keys are ignored, never rejected.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::policy::ResourceDescriptor;

/// Deployment-configured pagination policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PageBounds {
    fn default() -> Self {
        Self {
            default_limit: 25,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Storage-agnostic search specification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    /// Attribute equality filters.
    pub filters: Vec<(String, Value)>,
    pub sort: Option<(String, SortDirection)>,
    pub limit: usize,
    pub offset: usize,
}

/// Pagination counters carried in document meta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// Rows in this page.
    pub count: usize,
    pub limit: usize,
    pub offset: usize,
    /// Total matches before pagination.
    pub total: usize,
}

impl PageMeta {
    pub fn to_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("count".to_string(), self.count.into());
        map.insert("limit".to_string(), self.limit.into());
        map.insert("offset".to_string(), self.offset.into());
        map.insert("total".to_string(), self.total.into());
        map
    }
}

/// Translates raw query parameters for one resource kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryTranslator {
    bounds: PageBounds,
}

impl QueryTranslator {
    pub fn new(bounds: PageBounds) -> Self {
        Self { bounds }
    }

    /// Build a [`QuerySpec`] from query parameters. `limit` is
    /// clamped to the configured maximum; filter keys that are not
    /// declared fields of the kind are dropped.
    pub fn translate(
        &self,
        descriptor: &ResourceDescriptor,
        params: &HashMap<String, String>,
    ) -> QuerySpec {
        let mut spec = QuerySpec {
            limit: self.bounds.default_limit,
            ..QuerySpec::default()
        };

        for (key, raw) in params {
            match key.as_str() {
                "limit" => {
                    if let Ok(limit) = raw.parse::<usize>() {
                        spec.limit = limit.min(self.bounds.max_limit);
                    }
                }
                "offset" => {
                    if let Ok(offset) = raw.parse::<usize>() {
                        spec.offset = offset;
                    }
                }
                "sort" => {
                    spec.sort = Some(match raw.strip_prefix('-') {
                        Some(field) => (field.to_string(), SortDirection::Descending),
                        None => (raw.clone(), SortDirection::Ascending),
                    });
                }
                field if descriptor.fields.contains_key(field) => {
                    // Filter values arrive as strings; recover JSON
                    // scalars (bools, numbers) where they parse.
                    let value = serde_json::from_str(raw)
                        .unwrap_or_else(|_| Value::String(raw.clone()));
                    spec.filters.push((field.to_string(), value));
                }
                other => {
                    debug!(parameter = other, "ignoring unrecognized filter key");
                }
            }
        }

        spec
    }

    /// Pagination counters for a completed search.
    pub fn page_meta(returned: usize, total: usize, spec: &QuerySpec) -> PageMeta {
        PageMeta {
            count: returned,
            limit: spec.limit,
            offset: spec.offset,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::AccessTier;
    use crate::policy::ResourceDescriptor;
    use serde_json::json;

    fn descriptor() -> ResourceDescriptor {
        ResourceDescriptor::new("rescues")
            .field("status", AccessTier::All, AccessTier::Group)
            .field("code_red", AccessTier::All, AccessTier::Group)
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_without_parameters() {
        let spec = QueryTranslator::default().translate(&descriptor(), &HashMap::new());
        assert_eq!(spec.limit, 25);
        assert_eq!(spec.offset, 0);
        assert!(spec.filters.is_empty());
        assert!(spec.sort.is_none());
    }

    #[test]
    fn limit_is_clamped_to_maximum() {
        let spec = QueryTranslator::default().translate(&descriptor(), &params(&[("limit", "5000")]));
        assert_eq!(spec.limit, 100);
    }

    #[test]
    fn unknown_filter_keys_are_ignored() {
        let spec = QueryTranslator::default()
            .translate(&descriptor(), &params(&[("warp_factor", "9"), ("status", "open")]));
        assert_eq!(spec.filters, vec![("status".to_string(), json!("open"))]);
    }

    #[test]
    fn scalar_filter_values_are_recovered() {
        let spec =
            QueryTranslator::default().translate(&descriptor(), &params(&[("code_red", "true")]));
        assert_eq!(spec.filters, vec![("code_red".to_string(), json!(true))]);
    }

    #[test]
    fn sort_direction_prefix() {
        let spec = QueryTranslator::default().translate(&descriptor(), &params(&[("sort", "-status")]));
        assert_eq!(
            spec.sort,
            Some(("status".to_string(), SortDirection::Descending))
        );
    }

    #[test]
    fn page_meta_counts() {
        let spec = QuerySpec {
            limit: 10,
            offset: 20,
            ..QuerySpec::default()
        };
        let meta = QueryTranslator::page_meta(7, 120, &spec);
        assert_eq!(meta.count, 7);
        assert_eq!(meta.total, 120);
        assert_eq!(meta.offset, 20);
    }
}
