//! Capability probe tests

mod common;

use common::FakeApi;
use serde_json::json;
use std::time::Duration;
use ugreen_exporter::probe::{CapabilityCounts, CapabilityProber};
use ugreen_exporter::ugreen::endpoints::{DISK_LIST, POOL_LIST, SYSINFO_COMMON, TASKMGR_STATS};

#[tokio::test]
async fn test_probe_counts_appliance_hardware() {
    // Given: A two-disk appliance with one pool and one NIC
    let api = FakeApi::appliance();
    let prober = CapabilityProber::new();

    // When: Probing
    let counts = prober.probe(&api).await;

    // Then: Every count is derived from its endpoint
    assert_eq!(
        counts,
        CapabilityCounts {
            num_rams: Some(2),
            num_usbs: Some(0),
            has_ups: Some(false),
            num_disks: Some(2),
            num_pools: Some(1),
            num_volumes: Some(1),
            num_nics: Some(1),
            has_cpu_fan: Some(true),
            num_device_fans: Some(1),
            has_device_fan: Some(true),
            has_gpu: Some(false),
        }
    );
}

#[tokio::test]
async fn test_probe_runs_once() {
    // Given: A prober that already probed
    let api = FakeApi::appliance();
    let prober = CapabilityProber::new();
    assert!(prober.cached().is_none());
    let first = prober.probe(&api).await;

    // When: Probing again
    let second = prober.probe(&api).await;

    // Then: The cached result is returned without new requests
    assert_eq!(first, second);
    assert_eq!(prober.cached(), Some(first));
    assert_eq!(api.calls(SYSINFO_COMMON), 1);
    assert_eq!(api.calls(TASKMGR_STATS), 1);
}

#[tokio::test]
async fn test_concurrent_first_probes_share_one_run() {
    // Given: A slow appliance and a fresh prober
    let api = FakeApi::appliance().with_latency(Duration::from_millis(50));
    let prober = CapabilityProber::new();

    // When: Two callers probe at the same time
    let (first, second) = tokio::join!(prober.probe(&api), prober.probe(&api));

    // Then: Both see the same counts from a single pass over the endpoints
    assert_eq!(first, second);
    assert_eq!(api.calls(SYSINFO_COMMON), 1);
    assert_eq!(api.calls(DISK_LIST), 1);
    assert_eq!(api.calls(TASKMGR_STATS), 1);
}

#[tokio::test]
async fn test_failed_sub_probe_leaves_fields_unknown() {
    // Given: An appliance whose disk list endpoint fails
    let api = FakeApi::appliance().without(DISK_LIST);

    // When: Probing
    let counts = CapabilityProber::new().probe(&api).await;

    // Then: Only the disk count is unknown
    assert_eq!(counts.num_disks, None);
    assert_eq!(counts.num_rams, Some(2));
    assert_eq!(counts.num_pools, Some(1));
    assert!(!counts.to_map().contains_key("num_disks"));
}

#[tokio::test]
async fn test_stats_with_error_code_are_ignored() {
    // Given: A stats endpoint answering with a device error
    let api = FakeApi::appliance().with(TASKMGR_STATS, json!({"code": 500, "data": {}}));

    // When: Probing
    let counts = CapabilityProber::new().probe(&api).await;

    // Then: NIC and fan facts stay unknown
    assert_eq!(counts.num_nics, None);
    assert_eq!(counts.has_cpu_fan, None);
    assert_eq!(counts.num_disks, Some(2));
}

#[tokio::test]
async fn test_overview_series_names_are_not_nics() {
    // Given: Stats listing the aggregate series under localized names
    let stats = json!({
        "code": 200,
        "data": {
            "net": {"series": [
                {"name": "Übersicht"}, {"name": "Overview"}, {"name": "eth0"}, {"name": "eth1"}
            ]},
            "overview": {"cpu_fan": [], "device_fan": [{"speed": 1}, {"speed": 2}]},
            "gpu": {"series": [{"gpu_name": "  "}, {"gpu_name": "Intel UHD"}]}
        }
    });
    let api = FakeApi::appliance().with(TASKMGR_STATS, stats);

    // When: Probing
    let counts = CapabilityProber::new().probe(&api).await;

    // Then: Only real interfaces count, empty fan lists mean no fan
    assert_eq!(counts.num_nics, Some(2));
    assert_eq!(counts.has_cpu_fan, Some(false));
    assert_eq!(counts.num_device_fans, Some(2));
    assert_eq!(counts.has_gpu, Some(true));
}

#[tokio::test]
async fn test_pool_without_volumes() {
    let api = FakeApi::appliance().with(
        POOL_LIST,
        json!({"code": 200, "data": {"result": [{"name": "a"}, {"name": "b", "volumes": [{}, {}]}]}}),
    );
    let counts = CapabilityProber::new().probe(&api).await;
    assert_eq!(counts.num_pools, Some(2));
    assert_eq!(counts.num_volumes, Some(2));
}

#[test]
fn test_capability_map_uses_ints_and_bools() {
    let counts = CapabilityCounts {
        num_rams: Some(2),
        has_ups: Some(true),
        ..CapabilityCounts::default()
    };
    let map = counts.to_map();
    assert_eq!(map.len(), 2);
    assert_eq!(map["num_rams"], json!(2));
    assert_eq!(map["has_ups"], json!(true));
}
