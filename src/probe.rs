//! Capability Probing
//!
//! Counts the optional hardware of an appliance once and caches the result for
//! the lifetime of the connection. Concurrent callers wait for and share the
//! first probe.
//!
//! | Endpoint | Counts |
//! |---|---|
//! | `/ugreen/v1/sysinfo/machine/common` | RAM modules, USB devices, UPS |
//! | `/ugreen/v2/storage/disk/list` | disks |
//! | `/ugreen/v1/storage/pool/list` | pools, volumes |
//! | `/ugreen/v1/taskmgr/stat/get_all` | NICs, fans, GPU |
//!
//! A sub-probe whose request fails leaves its fields unset; the remaining
//! sub-probes still run.

use crate::extract::extract;
use crate::ugreen::client::DeviceApi;
use crate::ugreen::endpoints::{DISK_LIST, POOL_LIST, SYSINFO_COMMON, TASKMGR_STATS};
use crate::ugreen::types::{response_code, CODE_OK};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Names the stats endpoint uses for the aggregate NIC series
const NIC_OVERVIEW_NAMES: [&str; 3] = ["overview", "Overview", "Übersicht"];

/// Cached hardware facts; `None` means the probe could not determine the value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CapabilityCounts {
    pub num_rams: Option<usize>,
    pub num_usbs: Option<usize>,
    pub has_ups: Option<bool>,
    pub num_disks: Option<usize>,
    pub num_pools: Option<usize>,
    pub num_volumes: Option<usize>,
    pub num_nics: Option<usize>,
    pub has_cpu_fan: Option<bool>,
    pub num_device_fans: Option<usize>,
    pub has_device_fan: Option<bool>,
    pub has_gpu: Option<bool>,
}

impl CapabilityCounts {
    /// Known values only, as `capability_name -> int|bool`
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        let counts = [
            ("num_rams", self.num_rams),
            ("num_usbs", self.num_usbs),
            ("num_disks", self.num_disks),
            ("num_pools", self.num_pools),
            ("num_volumes", self.num_volumes),
            ("num_nics", self.num_nics),
            ("num_device_fans", self.num_device_fans),
        ];
        let flags = [
            ("has_ups", self.has_ups),
            ("has_cpu_fan", self.has_cpu_fan),
            ("has_device_fan", self.has_device_fan),
            ("has_gpu", self.has_gpu),
        ];

        let mut map = BTreeMap::new();
        for (name, count) in counts {
            if let Some(count) = count {
                map.insert(name.to_string(), Value::from(count));
            }
        }
        for (name, flag) in flags {
            if let Some(flag) = flag {
                map.insert(name.to_string(), Value::from(flag));
            }
        }
        map
    }
}

/// Probes once and serves the cached counts afterwards
#[derive(Debug, Default)]
pub struct CapabilityProber {
    counts: OnceCell<CapabilityCounts>,
}

impl CapabilityProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe on first use; later calls return the cached counts
    pub async fn probe(&self, api: &dyn DeviceApi) -> CapabilityCounts {
        *self
            .counts
            .get_or_init(|| async {
                let counts = probe_counts(api).await;
                debug!("Capability counts: {:?}", counts);
                counts
            })
            .await
    }

    /// Counts if a probe already completed
    pub fn cached(&self) -> Option<CapabilityCounts> {
        self.counts.get().copied()
    }
}

async fn probe_counts(api: &dyn DeviceApi) -> CapabilityCounts {
    let mut counts = CapabilityCounts::default();

    if let Some(sysinfo) = fetch(api, SYSINFO_COMMON).await {
        apply_sysinfo(&mut counts, &sysinfo);
    }
    if let Some(disks) = fetch(api, DISK_LIST).await {
        counts.num_disks = Some(array_len(&extract(&disks, "data.result")));
    }
    if let Some(pools) = fetch(api, POOL_LIST).await {
        apply_pools(&mut counts, &pools);
    }
    if let Some(stats) = fetch(api, TASKMGR_STATS).await {
        if response_code(&stats) == Some(CODE_OK) {
            apply_stats(&mut counts, &stats);
        } else {
            debug!("Stats endpoint returned code {:?}, skipping", response_code(&stats));
        }
    }

    counts
}

async fn fetch(api: &dyn DeviceApi, endpoint: &str) -> Option<Value> {
    match api.fetch_json(endpoint).await {
        Ok(response) => Some(response),
        Err(e) => {
            warn!("Capability probe of {} failed: {}", endpoint, e);
            None
        }
    }
}

fn apply_sysinfo(counts: &mut CapabilityCounts, sysinfo: &Value) {
    let hardware = extract(sysinfo, "data.hardware");
    counts.num_rams = Some(array_len(&hardware["mem"]));
    counts.num_usbs = Some(array_len(&hardware["usb"]));
    counts.has_ups = Some(array_len(&hardware["ups"]) > 0);
}

fn apply_pools(counts: &mut CapabilityCounts, pools: &Value) {
    let result = extract(pools, "data.result");
    let pools = result.as_array().map(Vec::as_slice).unwrap_or_default();
    counts.num_pools = Some(pools.len());
    counts.num_volumes = Some(pools.iter().map(|pool| array_len(&pool["volumes"])).sum());
}

fn apply_stats(counts: &mut CapabilityCounts, stats: &Value) {
    let data = &stats["data"];

    let nics = data["net"]["series"]
        .as_array()
        .map(|series| {
            series
                .iter()
                .filter(|entry| {
                    !entry["name"]
                        .as_str()
                        .is_some_and(|name| NIC_OVERVIEW_NAMES.contains(&name))
                })
                .count()
        })
        .unwrap_or_default();
    counts.num_nics = Some(nics);

    let cpu_fans = unit_count(&data["overview"]["cpu_fan"]);
    let device_fans = unit_count(&data["overview"]["device_fan"]);
    counts.has_cpu_fan = Some(cpu_fans > 0);
    counts.num_device_fans = Some(device_fans);
    counts.has_device_fan = Some(device_fans > 0);

    let has_gpu = data["gpu"]["series"]
        .as_array()
        .is_some_and(|series| {
            series
                .iter()
                .any(|gpu| gpu["gpu_name"].as_str().is_some_and(|name| !name.trim().is_empty()))
        });
    counts.has_gpu = Some(has_gpu);
}

fn array_len(value: &Value) -> usize {
    value.as_array().map(Vec::len).unwrap_or_default()
}

/// Fan lists are sometimes reported as a single object instead of an array
fn unit_count(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) if !map.is_empty() => 1,
        _ => 0,
    }
}
