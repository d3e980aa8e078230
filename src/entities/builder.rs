//! Per-instance descriptor construction
//!
//! Resolves how many instances of a hardware category exist (from a list in a
//! live response or from a probed count) and expands the category's templates
//! once per instance with the naming convention applied.

use super::template::{self, TemplateError, TemplateParams};
use super::{MetricDescriptor, MetricTemplate};
use crate::extract::extract;
use crate::ugreen::client::DeviceApi;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Where the instance count of a category comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceSource<'a> {
    /// Length of the array at `list_path` in the `endpoint` response
    List {
        endpoint: &'a str,
        list_path: &'a str,
    },
    /// Precomputed count
    Count(usize),
}

/// Naming convention for the instances of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Naming {
    pub prefix_key_base: &'static str,
    pub prefix_name_base: &'static str,
    pub category: &'static str,
    /// Number given to the first instance; also the first `series_index`
    pub index_start: usize,
    /// A lone instance keeps the bare base names
    pub single_compact: bool,
}

impl Naming {
    pub const fn new(
        prefix_key_base: &'static str,
        prefix_name_base: &'static str,
        category: &'static str,
    ) -> Self {
        Self {
            prefix_key_base,
            prefix_name_base,
            category,
            index_start: 1,
            single_compact: true,
        }
    }

    pub const fn index_start(mut self, index_start: usize) -> Self {
        self.index_start = index_start;
        self
    }

    pub const fn single_compact(mut self, single_compact: bool) -> Self {
        self.single_compact = single_compact;
        self
    }
}

/// Responses fetched while building, so categories sharing an endpoint cost one request
#[derive(Debug, Default)]
pub struct ResponseCache {
    responses: HashMap<String, Value>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with a response that was already fetched
    pub fn insert(&mut self, endpoint: &str, response: Value) {
        self.responses.insert(endpoint.to_string(), response);
    }

    pub async fn get(&mut self, api: &dyn DeviceApi, endpoint: &str) -> Option<&Value> {
        if !self.responses.contains_key(endpoint) {
            match api.fetch_json(endpoint).await {
                Ok(response) => {
                    self.responses.insert(endpoint.to_string(), response);
                }
                Err(e) => {
                    warn!("Failed to fetch {} while building descriptors: {}", endpoint, e);
                    return None;
                }
            }
        }
        self.responses.get(endpoint)
    }
}

/// Number of items in the array at `list_path`; anything else counts as zero
pub fn list_len(response: &Value, list_path: &str) -> usize {
    extract(response, list_path)
        .as_array()
        .map(Vec::len)
        .unwrap_or_default()
}

/// Resolve the instance count of a source
pub async fn resolve_count(
    source: InstanceSource<'_>,
    api: &dyn DeviceApi,
    cache: &mut ResponseCache,
) -> usize {
    match source {
        InstanceSource::Count(count) => count,
        InstanceSource::List {
            endpoint,
            list_path,
        } => cache
            .get(api, endpoint)
            .await
            .map(|response| list_len(response, list_path))
            .unwrap_or_default(),
    }
}

/// Expand `templates` once per instance.
///
/// With `count == 1` and `single_compact`, the instance uses the bare base names.
/// Otherwise instance `i` is suffixed with `index_start + i`. A count of zero
/// yields no descriptors.
pub fn expand_instances(
    count: usize,
    templates: &[MetricTemplate],
    naming: &Naming,
    endpoint: &str,
) -> Result<Vec<MetricDescriptor>, TemplateError> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let single = count == 1 && naming.single_compact;
    let mut out = Vec::with_capacity(count * templates.len());

    for i in 0..count {
        let series_index = naming.index_start + i;
        let (prefix_key, prefix_name) = if single {
            (
                naming.prefix_key_base.to_string(),
                naming.prefix_name_base.to_string(),
            )
        } else {
            (
                format!("{}{}", naming.prefix_key_base, series_index),
                format!("{} {}", naming.prefix_name_base, series_index),
            )
        };

        let params = TemplateParams {
            prefix_key: Some(prefix_key),
            prefix_name: Some(prefix_name),
            i: Some(i),
            series_index: Some(series_index),
            endpoint: Some(endpoint.to_string()),
            pool_index: None,
            category: Some(naming.category.to_string()),
        };
        out.extend(template::expand(templates, &params)?);
    }

    Ok(out)
}

/// Resolve the count of `source` and expand the templates for every instance
pub async fn build(
    api: &dyn DeviceApi,
    cache: &mut ResponseCache,
    source: InstanceSource<'_>,
    templates: &[MetricTemplate],
    naming: &Naming,
    endpoint: &str,
) -> Result<Vec<MetricDescriptor>, TemplateError> {
    let count = resolve_count(source, api, cache).await;
    debug!(
        "{} instance(s) of '{}' found",
        count, naming.prefix_key_base
    );
    expand_instances(count, templates, naming, endpoint)
}
