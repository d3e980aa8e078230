//! Value formatting tests

use serde_json::{json, Value};
use ugreen_exporter::entities::template::{expand_one, TemplateParams};
use ugreen_exporter::entities::{MetricDescriptor, MetricTemplate, SizeUnit, UnitHint};
use ugreen_exporter::format::{display_unit, scale_bytes_per_second, StatusTable, ValueFormatter};

fn descriptor(
    name: &'static str,
    unit: UnitHint,
    places: u32,
    status: Option<StatusTable>,
) -> MetricDescriptor {
    let mut template = MetricTemplate::new("k", name, "", "/e", "p").unit(unit).places(places);
    if let Some(table) = status {
        template = template.status(table);
    }
    expand_one(&template, &TemplateParams::default()).expect("expand")
}

fn format(raw: Value, descriptor: &MetricDescriptor) -> Value {
    ValueFormatter::format(&raw, descriptor)
}

#[test]
fn test_sizes_scale_to_largest_unit() {
    // Given: A byte-size descriptor with two places
    let size = descriptor("Pool Total Size", UnitHint::Size(SizeUnit::B), 2, None);

    // When: Formatting sizes of different magnitudes
    // Then: The value is scaled and rounded
    assert_eq!(format(json!(512), &size), json!(512.0));
    assert_eq!(format(json!(1536), &size), json!(1.5));
    assert_eq!(format(json!(4000787030016u64), &size), json!(3.64));
    assert_eq!(format(json!("1073741824"), &size), json!(1.0));
    assert_eq!(format(json!(null), &size), json!(null));
    assert_eq!(format(json!("n/a"), &size), json!(null));
}

#[test]
fn test_size_ties_round_half_up() {
    // Given: Sizes sitting exactly on a rounding midpoint in decimal
    let size = descriptor("Volume Used Size", UnitHint::Size(SizeUnit::B), 2, None);

    // When: Formatting numbers and numeric strings
    // Then: Midpoints go up even when the float is just below them in binary
    assert_eq!(format(json!(1.005), &size), json!(1.01));
    assert_eq!(format(json!("1.005"), &size), json!(1.01));
    assert_eq!(format(json!("2,675"), &size), json!(2.68));
    assert_eq!(format(json!(1.004), &size), json!(1.0));
}

#[test]
fn test_size_with_zero_places_is_integer() {
    let size = descriptor("RAM Total Size", UnitHint::Size(SizeUnit::B), 0, None);
    assert_eq!(format(json!(17179869184u64), &size), json!(16));
}

#[test]
fn test_size_display_unit_follows_magnitude() {
    let size = descriptor("Pool Total Size", UnitHint::Size(SizeUnit::B), 2, None);
    assert_eq!(display_unit(&json!(4000787030016u64), &size).as_deref(), Some("TB"));
    assert_eq!(display_unit(&json!(100), &size).as_deref(), Some("B"));
}

#[test]
fn test_timestamps() {
    // Given: A descriptor whose name marks it as a timestamp
    let ts = descriptor("Last Boot Timestamp", UnitHint::None, 2, None);

    // When: Formatting
    let formatted = format(json!(1700000000), &ts);

    // Then: Valid values become local date-times, others markers
    let text = formatted.as_str().expect("string");
    assert_eq!(text.len(), "2023-11-14 22:13:20".len());
    assert!(text.starts_with("2023-11-1"));
    assert_eq!(format(json!(null), &ts), json!("N/A"));
    assert_eq!(format(json!("soon"), &ts), json!("Invalid timestamp"));
}

#[test]
fn test_status_tables() {
    // Given: Descriptors tagged with status tables
    let server = descriptor("Server Status", UnitHint::None, 2, Some(StatusTable::ServerStatus));
    let disk_type = descriptor("Disk Type", UnitHint::None, 2, Some(StatusTable::DiskType));
    let fan = descriptor("CPU Fan Status", UnitHint::None, 2, Some(StatusTable::FanUnit));

    // Then: Known codes map to labels, unknown codes and junk to markers
    assert_eq!(format(json!(2), &server), json!("Normal"));
    assert_eq!(format(json!(7), &server), json!("Unknown status: 7"));
    assert_eq!(format(json!("abc"), &server), json!("Invalid value: abc"));
    assert_eq!(format(json!(2), &disk_type), json!("M.2"));
    assert_eq!(format(json!("1"), &disk_type), json!("SSD"));
    assert_eq!(format(json!(0), &fan), json!("ERROR!"));
}

#[test]
fn test_percentages_and_temperatures() {
    let pct = descriptor("CPU Usage", UnitHint::Percent, 0, None);
    let temp = descriptor("CPU Temperature", UnitHint::Celsius, 0, None);

    assert_eq!(format(json!(12.34), &pct), json!(12.3));
    assert_eq!(format(json!("55.56"), &pct), json!(55.6));
    assert_eq!(format(json!(null), &pct), json!(0));
    assert_eq!(format(json!(12.25), &pct), json!(12.2));
    assert_eq!(format(json!(12.35), &pct), json!(12.3));
    assert_eq!(format(json!(0.15), &pct), json!(0.1));

    // Ties round to even
    assert_eq!(format(json!(41.5), &temp), json!(42));
    assert_eq!(format(json!(42.5), &temp), json!(42));
    assert_eq!(format(json!("hot"), &temp), json!(0));
}

#[test]
fn test_rates_scale_like_sizes() {
    let rate = descriptor("Upload", UnitHint::Rate(SizeUnit::KB), 1, None);
    assert_eq!(format(json!(2048), &rate), json!(2.0));
    assert_eq!(display_unit(&json!(2048), &rate).as_deref(), Some("MB/s"));
}

#[test]
fn test_megahertz_strings() {
    let mhz = descriptor("RAM Module Speed", UnitHint::Megahertz, 0, None);
    assert_eq!(format(json!("4800 MHz"), &mhz), json!(4800));
    assert_eq!(format(json!("fast MHz"), &mhz), json!("fast MHz"));
    assert_eq!(format(json!(3200), &mhz), json!(3200));
}

#[test]
fn test_plain_values_are_coerced_to_numbers() {
    // Given: A descriptor with no special unit
    let plain = descriptor("Pool Disk Count", UnitHint::None, 2, None);

    // Then: Numeric strings become numbers, other values pass through
    assert_eq!(format(json!("42"), &plain), json!(42));
    assert_eq!(format(json!("3,14159"), &plain), json!(3.14));
    assert_eq!(format(json!(" 7 "), &plain), json!(7));
    assert_eq!(format(json!("raid1"), &plain), json!("raid1"));
    assert_eq!(format(json!(""), &plain), json!(""));
    assert_eq!(format(json!(true), &plain), json!(true));
    assert_eq!(format(json!(null), &plain), json!(null));
}

#[test]
fn test_scale_bytes_per_second() {
    assert_eq!(scale_bytes_per_second(&json!(0)).as_deref(), Some("0 B/s"));
    assert_eq!(scale_bytes_per_second(&json!(1023)).as_deref(), Some("1023 B/s"));
    assert_eq!(scale_bytes_per_second(&json!(1536)).as_deref(), Some("2 kB/s"));
    assert_eq!(scale_bytes_per_second(&json!(2560)).as_deref(), Some("3 kB/s"));
    assert_eq!(scale_bytes_per_second(&json!(1535.9)).as_deref(), Some("1 kB/s"));
    assert_eq!(scale_bytes_per_second(&json!(1048576)).as_deref(), Some("1 MB/s"));
    assert_eq!(scale_bytes_per_second(&json!("2048")).as_deref(), Some("2 kB/s"));
    assert_eq!(scale_bytes_per_second(&json!("fast")), None);
    assert_eq!(scale_bytes_per_second(&json!(null)), None);
}
