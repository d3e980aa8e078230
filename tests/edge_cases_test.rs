//! Edge case tests
//!
//! Tests for unusual but valid data scenarios.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use ugreen_exporter::entities::template::{expand_one, TemplateParams};
use ugreen_exporter::entities::{MetricDescriptor, MetricTemplate, SizeUnit, UnitHint};
use ugreen_exporter::format::ValueFormatter;
use ugreen_exporter::metrics::MetricsCollector;
use ugreen_exporter::nas::Snapshot;

/// Helper to create a test metrics instance
fn create_test_metrics() -> MetricsCollector {
    MetricsCollector::new().expect("Failed to create metrics")
}

fn descriptor(key: &'static str, unit: UnitHint) -> MetricDescriptor {
    let template = MetricTemplate::new(key, "Value", "", "/e", "p")
        .unit(unit)
        .category("Status");
    expand_one(&template, &TemplateParams::default()).expect("expand")
}

fn record_one(metrics: &MetricsCollector, descriptor: &MetricDescriptor, raw: Value) {
    let formatted = ValueFormatter::format(&raw, descriptor);
    let snapshot = Snapshot {
        raw: BTreeMap::from([(descriptor.key.clone(), raw)]),
        formatted: BTreeMap::from([(descriptor.key.clone(), formatted)]),
    };
    metrics.record(std::slice::from_ref(descriptor), &snapshot);
}

#[test]
fn test_empty_collections_render_without_error() {
    // Given: A metrics collector with no data set
    let metrics = create_test_metrics();

    // When: Rendering metrics
    let result = metrics.render();

    // Then: Should render successfully with only base metrics
    assert!(result.is_ok());
    let rendered = result.unwrap();
    assert!(rendered.contains("# HELP"));
    assert!(rendered.contains("# TYPE"));
}

#[test]
fn test_very_large_pool_size() {
    // Given: A petabyte-scale pool
    let metrics = create_test_metrics();
    let pool_total = descriptor("pool_total", UnitHint::Size(SizeUnit::B));

    // When: Recording and formatting it
    record_one(&metrics, &pool_total, json!(5_000_000_000_000_000u64));
    let rendered = metrics.render().expect("Failed to render");

    // Then: The raw value survives and the formatted value stops at the largest unit
    assert!(rendered.contains("key=\"pool_total\"} 5000000000000000"));
    let formatted = ValueFormatter::format(&json!(5_000_000_000_000_000u64), &pool_total);
    assert_eq!(formatted, json!(4.44));
}

#[test]
fn test_text_value_with_special_characters() {
    // Given: A textual value with quotes, backslashes and newlines
    let metrics = create_test_metrics();
    let message = descriptor("message", UnitHint::None);

    // When: Recording it
    record_one(&metrics, &message, json!("disk \"sda\" at C:\\ warm\nnext"));
    let rendered = metrics.render().expect("Failed to render");

    // Then: The label value is escaped
    assert!(rendered.contains("\\\"sda\\\""));
    assert!(rendered.contains("\\n"));
}

#[test]
fn test_unicode_text_values() {
    let metrics = create_test_metrics();
    let name = descriptor("device_name", UnitHint::None);

    record_one(&metrics, &name, json!("Übersicht-NAS 🚀"));
    let rendered = metrics.render().expect("Failed to render");

    assert!(rendered.contains("Übersicht-NAS 🚀"));
}

#[test]
fn test_empty_string_is_not_an_info_series() {
    let metrics = create_test_metrics();
    let message = descriptor("message", UnitHint::None);

    record_one(&metrics, &message, json!(""));
    let rendered = metrics.render().expect("Failed to render");

    assert!(!rendered.contains("key=\"message\""));
}

#[test]
fn test_zero_and_negative_values_are_exported() {
    let metrics = create_test_metrics();
    let zero = descriptor("zero", UnitHint::None);
    let negative = descriptor("negative", UnitHint::None);

    record_one(&metrics, &zero, json!(0));
    record_one(&metrics, &negative, json!(-5.5));
    let rendered = metrics.render().expect("Failed to render");

    assert!(rendered.contains("key=\"zero\"} 0"));
    assert!(rendered.contains("key=\"negative\"} -5.5"));
}

#[test]
fn test_booleans_are_numeric() {
    let metrics = create_test_metrics();
    let cache = descriptor("volume_hascache", UnitHint::None);

    record_one(&metrics, &cache, json!(true));
    let rendered = metrics.render().expect("Failed to render");

    assert!(rendered.contains("key=\"volume_hascache\"} 1"));
}

#[test]
fn test_status_value_exports_code_and_label() {
    // Given: A status descriptor with a numeric code
    let metrics = create_test_metrics();
    let template = MetricTemplate::new("server_status", "Server Status", "", "/e", "p")
        .status(ugreen_exporter::format::StatusTable::ServerStatus)
        .category("Status");
    let status = expand_one(&template, &TemplateParams::default()).unwrap();

    // When: Recording the code
    record_one(&metrics, &status, json!(2));
    let rendered = metrics.render().unwrap();

    // Then: Both the code and its label are visible
    assert!(rendered.contains("key=\"server_status\"} 2"));
    assert!(rendered.contains("key=\"server_status\",value=\"Normal\"} 1"));
}

#[test]
fn test_formatting_nested_json_passes_through() {
    // Given: An extraction that hit an object instead of a scalar
    let plain = descriptor("odd", UnitHint::None);
    let raw = json!({"unexpected": [1, 2]});

    // When: Formatting
    // Then: The value passes through unchanged
    assert_eq!(ValueFormatter::format(&raw, &plain), raw);
}

#[test]
fn test_percentage_out_of_range_is_kept() {
    let pct = descriptor("cpu_usage", UnitHint::Percent);
    assert_eq!(ValueFormatter::format(&json!(250.04), &pct), json!(250.0));
    assert_eq!(ValueFormatter::format(&json!(-1), &pct), json!(-1.0));
}

#[test]
fn test_metrics_stability_after_multiple_renders() {
    let metrics = create_test_metrics();
    let usage = descriptor("cpu_usage", UnitHint::Percent);
    record_one(&metrics, &usage, json!(33));

    let first = metrics.render().unwrap();
    for _ in 0..5 {
        assert_eq!(metrics.render().unwrap(), first);
    }
}
