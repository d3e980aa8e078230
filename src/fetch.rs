//! Data Fetch Engine
//!
//! One refresh pass over a descriptor set:
//!
//! 1. group descriptors by endpoint, so each endpoint is requested once
//! 2. request all endpoints concurrently
//! 3. extract every direct and rate-scaled value from its endpoint response
//! 4. resolve aggregates such as the RAM total from the values of step 3
//!
//! A failed endpoint yields `null` for each of its descriptors and nothing else.

use crate::entities::MetricDescriptor;
use crate::extract::{extract, ram_total_size, Extraction};
use crate::format::scale_bytes_per_second;
use crate::ugreen::client::DeviceApi;
use futures_util::future::join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Readable descriptors grouped by endpoint; action descriptors are left out
pub fn group_by_endpoint(
    descriptors: &[MetricDescriptor],
) -> BTreeMap<&str, Vec<&MetricDescriptor>> {
    let mut groups: BTreeMap<&str, Vec<&MetricDescriptor>> = BTreeMap::new();
    for descriptor in descriptors.iter().filter(|d| !d.is_action()) {
        groups
            .entry(descriptor.endpoint.as_str())
            .or_default()
            .push(descriptor);
    }
    groups
}

/// Fetch and extract the raw value of every descriptor
pub async fn fetch_all(
    api: &dyn DeviceApi,
    descriptors: &[MetricDescriptor],
) -> BTreeMap<String, Value> {
    let groups = group_by_endpoint(descriptors);
    let responses = join_all(groups.keys().map(|endpoint| async move {
        match api.fetch_json(endpoint).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("Failed to fetch '{}': {}", endpoint, e);
                None
            }
        }
    }))
    .await;

    let mut values = BTreeMap::new();
    let mut aggregates = Vec::new();

    for ((endpoint, group), response) in groups.iter().zip(responses) {
        let Some(response) = response else {
            for descriptor in group {
                values.insert(descriptor.key.clone(), Value::Null);
            }
            continue;
        };

        for descriptor in group {
            let extraction = Extraction::parse(&descriptor.extraction_path);
            let value = match extraction {
                Extraction::Direct(path) => extract(&response, path),
                Extraction::ScaleBytesPerSecond(path) => {
                    scale_bytes_per_second(&extract(&response, path))
                        .map(Value::String)
                        .unwrap_or(Value::Null)
                }
                Extraction::RamTotalSize => {
                    aggregates.push(*descriptor);
                    continue;
                }
                Extraction::Unknown(marker) => {
                    debug!(
                        "Unknown calculated marker '{}' on {} ({})",
                        marker, descriptor.key, endpoint
                    );
                    Value::Null
                }
            };
            values.insert(descriptor.key.clone(), value);
        }
    }

    // Aggregates only see the directly extracted values of this pass
    let resolved: Vec<(String, Value)> = aggregates
        .into_iter()
        .map(|descriptor| match Extraction::parse(&descriptor.extraction_path) {
            Extraction::RamTotalSize => (descriptor.key.clone(), ram_total_size(&values)),
            _ => (descriptor.key.clone(), Value::Null),
        })
        .collect();
    values.extend(resolved);

    values
}
