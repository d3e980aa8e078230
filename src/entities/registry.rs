//! Category registry
//!
//! Table of hardware categories discovered per appliance, one table per
//! cadence. Each entry says where the instance count comes from, which
//! templates to expand and how to name the instances. Storage has its own
//! builder because disks and volumes are nested under pools.

use super::builder::{self, expand_instances, InstanceSource, Naming, ResponseCache};
use super::catalog;
use super::template::{self, TemplateError, TemplateParams};
use super::{MetricDescriptor, MetricTemplate};
use crate::extract::extract;
use crate::probe::{CapabilityCounts, CapabilityProber};
use crate::ugreen::client::DeviceApi;
use crate::ugreen::endpoints::{DISK_LIST, POOL_LIST, SYSINFO_COMMON, TASKMGR_STATS};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Refresh schedule a descriptor set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    /// Slow: identity, hardware inventory, storage layout
    Config,
    /// Fast: usage, temperatures, throughput, fans
    State,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => f.write_str("config"),
            Self::State => f.write_str("state"),
        }
    }
}

/// Probed count driving a count-sourced category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountRule {
    Rams,
    Nics,
    Disks,
    CpuFan,
    DeviceFans,
}

impl CountRule {
    /// Unknown counts resolve to zero
    pub fn count(self, counts: &CapabilityCounts) -> usize {
        match self {
            Self::Rams => counts.num_rams.unwrap_or_default(),
            Self::Nics => counts.num_nics.unwrap_or_default(),
            Self::Disks => counts.num_disks.unwrap_or_default(),
            Self::CpuFan => usize::from(counts.has_cpu_fan.unwrap_or_default()),
            Self::DeviceFans => counts.num_device_fans.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySource {
    /// Array length at `list_path` of the category endpoint
    List { list_path: &'static str },
    Count(CountRule),
    /// Pools with their disks and volumes
    Storage,
}

/// Extra descriptors appended after a category built at least one descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostHook {
    RamTotal,
}

impl PostHook {
    pub fn descriptors(self) -> Result<Vec<MetricDescriptor>, TemplateError> {
        match self {
            Self::RamTotal => {
                template::expand(&[catalog::RAM_TOTAL], &TemplateParams::default())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryDefinition {
    pub key: &'static str,
    pub source: CategorySource,
    pub templates: &'static [MetricTemplate],
    pub endpoint: &'static str,
    pub naming: Naming,
    pub post: Option<PostHook>,
}

impl CategoryDefinition {
    const fn list(
        key: &'static str,
        templates: &'static [MetricTemplate],
        endpoint: &'static str,
        list_path: &'static str,
        naming: Naming,
    ) -> Self {
        Self {
            key,
            source: CategorySource::List { list_path },
            templates,
            endpoint,
            naming,
            post: None,
        }
    }

    const fn count(
        key: &'static str,
        templates: &'static [MetricTemplate],
        endpoint: &'static str,
        rule: CountRule,
        naming: Naming,
    ) -> Self {
        Self {
            key,
            source: CategorySource::Count(rule),
            templates,
            endpoint,
            naming,
            post: None,
        }
    }

    const fn with_post(mut self, hook: PostHook) -> Self {
        self.post = Some(hook);
        self
    }
}

pub const CONFIG_DEFINITIONS: &[CategoryDefinition] = &[
    CategoryDefinition::list(
        "LAN",
        catalog::LAN_CONFIG_TEMPLATES,
        SYSINFO_COMMON,
        "data.hardware.net",
        Naming::new("LAN", "LAN Port", "Network"),
    ),
    CategoryDefinition::list(
        "USB",
        catalog::USB_CONFIG_TEMPLATES,
        SYSINFO_COMMON,
        "data.hardware.usb",
        Naming::new("USB_device", "USB Device", "USB"),
    ),
    CategoryDefinition::list(
        "UPS",
        catalog::UPS_CONFIG_TEMPLATES,
        SYSINFO_COMMON,
        "data.hardware.ups",
        Naming::new("UPS", "UPS", "UPS"),
    ),
    CategoryDefinition::count(
        "RAM",
        catalog::RAM_CONFIG_TEMPLATES,
        SYSINFO_COMMON,
        CountRule::Rams,
        Naming::new("RAM", "RAM Module", "Hardware"),
    )
    .with_post(PostHook::RamTotal),
    CategoryDefinition {
        key: "STORAGE",
        source: CategorySource::Storage,
        templates: &[],
        endpoint: POOL_LIST,
        naming: Naming::new("pool", "Pool", "Pools"),
        post: None,
    },
];

/// Status categories default to numbered names even for a single instance
pub const STATUS_DEFINITIONS: &[CategoryDefinition] = &[
    CategoryDefinition::count(
        "LAN",
        catalog::LAN_STATUS_TEMPLATES,
        TASKMGR_STATS,
        CountRule::Nics,
        Naming::new("lan", "LAN", "LAN").single_compact(false),
    ),
    CategoryDefinition::count(
        "STORAGE_DISK",
        catalog::DISK_STATUS_TEMPLATES,
        TASKMGR_STATS,
        CountRule::Disks,
        Naming::new("disk", "Disk", "Status").single_compact(false),
    ),
    CategoryDefinition::count(
        "FAN_CPU",
        catalog::CPU_FAN_STATUS_TEMPLATES,
        TASKMGR_STATS,
        CountRule::CpuFan,
        Naming::new("cpu_fan", "CPU Fan", "Status").single_compact(false),
    ),
    CategoryDefinition::count(
        "FAN_CHASSIS",
        catalog::DEVICE_FAN_STATUS_TEMPLATES,
        TASKMGR_STATS,
        CountRule::DeviceFans,
        Naming::new("device_fan", "Device Fan", "Status"),
    ),
];

pub fn definitions(cadence: Cadence) -> &'static [CategoryDefinition] {
    match cadence {
        Cadence::Config => CONFIG_DEFINITIONS,
        Cadence::State => STATUS_DEFINITIONS,
    }
}

/// Common descriptors of a cadence, shared by every appliance
pub fn common_descriptors(cadence: Cadence) -> Result<Vec<MetricDescriptor>, TemplateError> {
    let templates = match cadence {
        Cadence::Config => catalog::COMMON_CONFIG,
        Cadence::State => catalog::COMMON_STATE,
    };
    template::expand(templates, &TemplateParams::default())
}

pub fn action_descriptors() -> Result<Vec<MetricDescriptor>, TemplateError> {
    template::expand(catalog::BUTTONS, &TemplateParams::default())
}

/// Builds the appliance-specific descriptors of a cadence
pub struct MetricRegistry<'a> {
    api: &'a dyn DeviceApi,
    prober: &'a CapabilityProber,
}

impl<'a> MetricRegistry<'a> {
    pub fn new(api: &'a dyn DeviceApi, prober: &'a CapabilityProber) -> Self {
        Self { api, prober }
    }

    /// Build every category of `cadence`.
    ///
    /// A category that fails to expand is logged and skipped; the others are
    /// still built.
    pub async fn build(&self, cadence: Cadence) -> Vec<MetricDescriptor> {
        self.build_definitions(definitions(cadence)).await
    }

    pub async fn build_definitions(
        &self,
        definitions: &[CategoryDefinition],
    ) -> Vec<MetricDescriptor> {
        let mut cache = ResponseCache::new();
        let mut counts: Option<CapabilityCounts> = None;
        let mut out = Vec::new();

        for definition in definitions {
            let built = match definition.source {
                CategorySource::Storage => build_storage(self.api, &mut cache).await,
                CategorySource::List { list_path } => {
                    if definition.templates.is_empty() {
                        continue;
                    }
                    builder::build(
                        self.api,
                        &mut cache,
                        InstanceSource::List {
                            endpoint: definition.endpoint,
                            list_path,
                        },
                        definition.templates,
                        &definition.naming,
                        definition.endpoint,
                    )
                    .await
                }
                CategorySource::Count(rule) => {
                    if definition.templates.is_empty() {
                        continue;
                    }
                    let probed = match counts {
                        Some(probed) => probed,
                        None => {
                            let probed = self.prober.probe(self.api).await;
                            counts = Some(probed);
                            probed
                        }
                    };
                    expand_instances(
                        rule.count(&probed),
                        definition.templates,
                        &definition.naming,
                        definition.endpoint,
                    )
                }
            };

            let built = built.and_then(|mut descriptors| {
                if let Some(hook) = definition.post {
                    if !descriptors.is_empty() {
                        descriptors.extend(hook.descriptors()?);
                    }
                }
                Ok(descriptors)
            });

            match built {
                Ok(descriptors) => {
                    debug!(
                        "Category {} produced {} descriptor(s)",
                        definition.key,
                        descriptors.len()
                    );
                    out.extend(descriptors);
                }
                Err(e) => warn!("Skipping category {}: {}", definition.key, e),
            }
        }

        out
    }
}

/// Pools, the disks of every pool and the volumes of every pool.
///
/// Disk descriptors read the global disk list at the index of the disk whose
/// `dev_name` (or `name`) matches the pool member; members without a match are
/// skipped.
pub async fn build_storage(
    api: &dyn DeviceApi,
    cache: &mut ResponseCache,
) -> Result<Vec<MetricDescriptor>, TemplateError> {
    let Some(pools_response) = cache.get(api, POOL_LIST).await.cloned() else {
        return Ok(Vec::new());
    };
    let pools = extract(&pools_response, "data.result");
    let pools = pools.as_array().map(Vec::as_slice).unwrap_or_default();
    if pools.is_empty() {
        debug!("No pools in {} response", POOL_LIST);
        return Ok(Vec::new());
    }

    let mut out = expand_instances(
        pools.len(),
        catalog::POOL_CONFIG_TEMPLATES,
        &Naming::new("pool", "Pool", "Pools"),
        POOL_LIST,
    )?;

    let disk_index = match cache.get(api, DISK_LIST).await {
        Some(disks) => disk_positions(disks),
        None => HashMap::new(),
    };

    for (p, pool) in pools.iter().enumerate() {
        let members = pool["disks"].as_array().map(Vec::as_slice).unwrap_or_default();
        for (d, member) in members.iter().enumerate() {
            let Some(global) = disk_name(member).and_then(|name| disk_index.get(name)) else {
                debug!(
                    "Pool {} disk {:?} not found in the global disk list",
                    p + 1,
                    disk_name(member)
                );
                continue;
            };
            let params = TemplateParams {
                prefix_key: Some(format!("disk{}_pool{}", d + 1, p + 1)),
                prefix_name: Some(format!("(Pool {} | Disk {})", p + 1, d + 1)),
                series_index: Some(*global),
                endpoint: Some(DISK_LIST.to_string()),
                category: Some("Disks".to_string()),
                ..TemplateParams::default()
            };
            out.extend(template::expand(catalog::DISK_CONFIG_TEMPLATES, &params)?);
        }

        let volumes = pool["volumes"].as_array().map(Vec::len).unwrap_or_default();
        for v in 0..volumes {
            let params = TemplateParams {
                prefix_key: Some(format!("volume{}_pool{}", v + 1, p + 1)),
                prefix_name: Some(format!("(Pool {} | Volume {})", p + 1, v + 1)),
                i: Some(v),
                pool_index: Some(p),
                endpoint: Some(POOL_LIST.to_string()),
                category: Some("Volumes".to_string()),
                ..TemplateParams::default()
            };
            out.extend(template::expand(catalog::VOLUME_CONFIG_TEMPLATES, &params)?);
        }
    }

    Ok(out)
}

fn disk_name(disk: &Value) -> Option<&str> {
    ["dev_name", "name"]
        .iter()
        .filter_map(|field| disk[*field].as_str())
        .find(|name| !name.is_empty())
}

/// Position of every named disk in the global disk list
fn disk_positions(disks: &Value) -> HashMap<String, usize> {
    extract(disks, "data.result")
        .as_array()
        .map(|list| {
            list.iter()
                .enumerate()
                .filter_map(|(index, disk)| disk_name(disk).map(|name| (name.to_string(), index)))
                .collect()
        })
        .unwrap_or_default()
}
