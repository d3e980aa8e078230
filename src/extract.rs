//! Path-Based Value Extraction
//!
//! Every descriptor names the value it reads with a compact path into the JSON
//! document returned by its endpoint:
//!
//! ```text
//! data.hardware.mem[1].size
//! └──┘ └──────┘ └─┘└┘ └──┘
//! key   key     key idx key
//! ```
//!
//! Segments are separated by `.`; a segment may end with a single `[<index>]`.
//! A negative index counts from the end of the array, so `[-1]` is the last element.
//! Extraction is fail-soft: a missing key, an out-of-range index, or a type
//! mismatch all resolve to `null` instead of an error.
//!
//! Paths starting with `calculated:` are not looked up directly. They select a
//! derived-value handler, see [`Extraction`].

use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Marker prefix for derived values
pub const CALCULATED_PREFIX: &str = "calculated:";

const RAM_TOTAL_SIZE: &str = "ram_total_size";
const SCALE_BYTES_PER_SECOND: &str = "scale_bytes_per_second";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("segment '{0}' carries more than one index")]
    MultipleIndices(String),

    #[error("segment '{0}' has an invalid index")]
    InvalidIndex(String),

    #[error("segment '{0}' has unbalanced brackets")]
    Unbalanced(String),
}

/// One `key` or `key[index]` step of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub key: String,
    pub index: Option<isize>,
}

/// Parsed dotted/indexed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePath {
    segments: Vec<PathSegment>,
}

impl ValuePath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walk `root` along the path, borrowing the addressed value
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = current.as_object()?.get(&segment.key)?;
            if let Some(index) = segment.index {
                let items = current.as_array()?;
                let position = if index < 0 {
                    items.len().checked_sub(index.unsigned_abs())?
                } else {
                    index.unsigned_abs()
                };
                current = items.get(position)?;
            }
        }
        Some(current)
    }
}

impl FromStr for ValuePath {
    type Err = PathError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments = path
            .split('.')
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }
}

fn parse_segment(part: &str) -> Result<PathSegment, PathError> {
    let Some(open) = part.find('[') else {
        if part.contains(']') {
            return Err(PathError::Unbalanced(part.to_string()));
        }
        return Ok(PathSegment {
            key: part.to_string(),
            index: None,
        });
    };

    let inner = part[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| PathError::Unbalanced(part.to_string()))?;
    if inner.contains('[') || inner.contains(']') {
        return Err(PathError::MultipleIndices(part.to_string()));
    }
    let index = inner
        .trim()
        .parse::<isize>()
        .map_err(|_| PathError::InvalidIndex(part.to_string()))?;

    Ok(PathSegment {
        key: part[..open].to_string(),
        index: Some(index),
    })
}

/// Extract the value at `path`, or `null` if anything along the way does not match.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use ugreen_exporter::extract::extract;
///
/// let response = json!({"data": {"hardware": {"cpu": [{"model": "N100"}]}}});
/// assert_eq!(extract(&response, "data.hardware.cpu[0].model"), json!("N100"));
/// assert_eq!(extract(&response, "data.hardware.cpu[3].model"), json!(null));
/// ```
pub fn extract(root: &Value, path: &str) -> Value {
    path.parse::<ValuePath>()
        .ok()
        .and_then(|parsed| parsed.resolve(root).cloned())
        .unwrap_or(Value::Null)
}

/// How a descriptor's extraction path is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction<'a> {
    /// Plain path lookup in the endpoint response
    Direct(&'a str),
    /// Sum of all `RAM*_size` values of the same refresh pass
    RamTotalSize,
    /// Inner path lookup rendered as a scaled `"<n> <unit>/s"` string
    ScaleBytesPerSecond(&'a str),
    /// `calculated:` marker without a handler
    Unknown(&'a str),
}

impl<'a> Extraction<'a> {
    pub fn parse(path: &'a str) -> Self {
        let Some(marker) = path.strip_prefix(CALCULATED_PREFIX) else {
            return Self::Direct(path);
        };
        match marker.split_once(':') {
            Some((SCALE_BYTES_PER_SECOND, inner)) => Self::ScaleBytesPerSecond(inner),
            Some((RAM_TOTAL_SIZE, _)) => Self::RamTotalSize,
            None if marker == RAM_TOTAL_SIZE => Self::RamTotalSize,
            _ => Self::Unknown(marker),
        }
    }

    /// Derived values that read other keys of the same pass
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::RamTotalSize)
    }
}

/// Sum every extracted value whose key starts with `RAM` and ends with `_size`.
///
/// Any non-numeric contributor (including `null`) makes the total `null`.
pub fn ram_total_size(values: &BTreeMap<String, Value>) -> Value {
    let sizes: Vec<&Value> = values
        .iter()
        .filter(|(key, _)| key.starts_with("RAM") && key.ends_with("_size"))
        .map(|(_, value)| value)
        .collect();

    if let Some(total) = sizes
        .iter()
        .map(|value| value.as_u64())
        .try_fold(0u64, |acc, size| acc.checked_add(size?))
    {
        return Value::Number(total.into());
    }

    sizes
        .iter()
        .map(|value| value.as_f64())
        .sum::<Option<f64>>()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
