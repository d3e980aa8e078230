//! Path extraction tests

use serde_json::json;
use std::collections::BTreeMap;
use ugreen_exporter::extract::{extract, ram_total_size, Extraction, PathError, ValuePath};

#[test]
fn test_extract_nested_keys_and_indices() {
    // Given: A response with nested objects and arrays
    let response = json!({
        "data": {"hardware": {"mem": [{"size": 1}, {"size": 2}]}, "flag": false}
    });

    // When: Extracting along different paths
    // Then: Present values are returned as-is
    assert_eq!(extract(&response, "data.hardware.mem[1].size"), json!(2));
    assert_eq!(extract(&response, "data.flag"), json!(false));
    assert_eq!(extract(&response, "data.hardware.mem"), json!([{"size": 1}, {"size": 2}]));
}

#[test]
fn test_extract_is_fail_soft() {
    // Given: A response
    let response = json!({"data": {"list": [1, 2], "scalar": "x"}});

    // When: Paths miss, overrun an index or cross a type mismatch
    // Then: null is returned every time
    assert_eq!(extract(&response, "data.missing"), json!(null));
    assert_eq!(extract(&response, "data.list[5]"), json!(null));
    assert_eq!(extract(&response, "data.scalar.inner"), json!(null));
    assert_eq!(extract(&response, "data.scalar[0]"), json!(null));
    assert_eq!(extract(&json!([1]), "data"), json!(null));
}

#[test]
fn test_extract_malformed_path_yields_null() {
    // Given: A response
    let response = json!({"a": [[1]]});

    // When: Paths with broken index syntax are used
    // Then: null is returned rather than panicking
    assert_eq!(extract(&response, "a[0][0]"), json!(null));
    assert_eq!(extract(&response, "a[x]"), json!(null));
    assert_eq!(extract(&response, "a[0"), json!(null));
}

#[test]
fn test_negative_index_counts_from_the_end() {
    // Given: A three-element list
    let response = json!({"data": {"list": ["a", "b", "c"]}});

    // When: Indexing from the end
    // Then: -1 is the last element and anything past the start is null
    assert_eq!(extract(&response, "data.list[-1]"), json!("c"));
    assert_eq!(extract(&response, "data.list[-3]"), json!("a"));
    assert_eq!(extract(&response, "data.list[-4]"), json!(null));
    assert_eq!(extract(&response, "data.list[-10]"), json!(null));

    let path: ValuePath = "data.list[-2]".parse().expect("valid path");
    assert_eq!(path.segments()[1].index, Some(-2));
}

#[test]
fn test_path_parse_errors() {
    // Given: Malformed paths
    // When: Parsing
    // Then: Each reports why it was rejected
    assert!(matches!(
        "a[0][1]".parse::<ValuePath>(),
        Err(PathError::MultipleIndices(_))
    ));
    assert!(matches!("a[x]".parse::<ValuePath>(), Err(PathError::InvalidIndex(_))));
    assert!(matches!("a]".parse::<ValuePath>(), Err(PathError::Unbalanced(_))));
}

#[test]
fn test_path_segments() {
    // Given: A path with an index
    let path: ValuePath = "data.result[3].name".parse().expect("valid path");

    // Then: Segments carry keys and optional indices
    let segments = path.segments();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[1].key, "result");
    assert_eq!(segments[1].index, Some(3));
    assert_eq!(segments[2].index, None);
}

#[test]
fn test_calculated_markers() {
    // Given: Extraction paths of each kind
    // When: Classifying them
    // Then: Handlers are selected by marker
    assert_eq!(Extraction::parse("data.x"), Extraction::Direct("data.x"));
    assert_eq!(
        Extraction::parse("calculated:ram_total_size"),
        Extraction::RamTotalSize
    );
    assert_eq!(
        Extraction::parse("calculated:scale_bytes_per_second:data.net.series[1].send_rate"),
        Extraction::ScaleBytesPerSecond("data.net.series[1].send_rate")
    );
    assert_eq!(
        Extraction::parse("calculated:bogus"),
        Extraction::Unknown("bogus")
    );
    assert!(Extraction::RamTotalSize.is_aggregate());
    assert!(!Extraction::Direct("x").is_aggregate());
}

#[test]
fn test_ram_total_size_sums_module_sizes() {
    // Given: Values of one pass including RAM module sizes and unrelated keys
    let values = BTreeMap::from([
        ("RAM1_size".to_string(), json!(8589934592u64)),
        ("RAM2_size".to_string(), json!(8589934592u64)),
        ("RAM1_model".to_string(), json!("DDR5")),
        ("disk1_size".to_string(), json!(1)),
    ]);

    // When: Summing
    // Then: Only RAM*_size keys contribute
    assert_eq!(ram_total_size(&values), json!(17179869184u64));
}

#[test]
fn test_ram_total_size_null_when_a_module_is_unknown() {
    // Given: One RAM size could not be read
    let values = BTreeMap::from([
        ("RAM1_size".to_string(), json!(1024)),
        ("RAM2_size".to_string(), json!(null)),
    ]);

    // Then: The total is unknown as well
    assert_eq!(ram_total_size(&values), json!(null));
}

#[test]
fn test_ram_total_size_without_modules_is_zero() {
    // Given: No RAM values at all
    let values = BTreeMap::from([("cpu_usage".to_string(), json!(10))]);

    // Then: The empty sum is zero
    assert_eq!(ram_total_size(&values), json!(0));
}
