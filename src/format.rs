//! Value Formatting
//!
//! Raw extracted values are turned into presentation values according to the
//! [`SemanticKind`] fixed on each descriptor when it is built. The dispatch
//! order is encoded in [`SemanticKind::classify`]:
//!
//! 1. byte sizes (`B`..`TB`)
//! 2. display names containing `Timestamp`
//! 3. status-code tables
//! 4. percentages
//! 5. temperatures
//! 6. byte rates (`kB/s`..`GB/s`)
//! 7. `"<n> MHz"` strings
//! 8. numeric coercion of everything else
//!
//! Formatting never fails: unusable input degrades to `null`, `0` or a marker string.

use crate::entities::{MetricDescriptor, SizeUnit, UnitHint};
use chrono::{Local, TimeZone};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde_json::{Number, Value};
use std::str::FromStr;

const KIB: Decimal = Decimal::from_parts(1024, 0, 0, false, 0);

/// Code to label tables for enumerated device values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusTable {
    ServerStatus,
    DiskStatus,
    FanOverall,
    FanUnit,
    DiskType,
    VolumeHealth,
    UsbDeviceType,
}

impl StatusTable {
    pub fn entries(self) -> &'static [(i64, &'static str)] {
        match self {
            Self::ServerStatus => &[(2, "Normal")],
            Self::DiskStatus => &[(1, "Normal")],
            Self::FanOverall => &[(0, "Normal")],
            Self::FanUnit => &[(0, "ERROR!"), (1, "Normal")],
            Self::DiskType => &[(0, "HDD"), (1, "SSD"), (2, "M.2")],
            Self::VolumeHealth => &[(0, "Normal")],
            Self::UsbDeviceType => &[(0, "Generic USB Device")],
        }
    }

    pub fn lookup(self, code: i64) -> Option<&'static str> {
        self.entries()
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }

    /// Label for `raw`, or an `Unknown status` / `Invalid value` marker
    pub fn render(self, raw: &Value) -> String {
        match as_integer(raw) {
            Some(code) => self
                .lookup(code)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Unknown status: {}", display_raw(raw))),
            None => format!("Invalid value: {}", display_raw(raw)),
        }
    }
}

/// Formatting strategy of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SemanticKind {
    Size(SizeUnit),
    Timestamp,
    Status(StatusTable),
    Percentage,
    Temperature,
    Rate(SizeUnit),
    FrequencyMhz,
    Plain,
}

impl SemanticKind {
    /// Pick the strategy for a descriptor; the first matching rule wins.
    pub fn classify(unit: UnitHint, display_name: &str, status: Option<StatusTable>) -> Self {
        if let UnitHint::Size(size) = unit {
            if size <= SizeUnit::TB {
                return Self::Size(size);
            }
        }
        if display_name.contains("Timestamp") {
            return Self::Timestamp;
        }
        if let Some(table) = status {
            return Self::Status(table);
        }
        match unit {
            UnitHint::Percent => Self::Percentage,
            UnitHint::Celsius => Self::Temperature,
            UnitHint::Rate(rate @ (SizeUnit::KB | SizeUnit::MB | SizeUnit::GB)) => Self::Rate(rate),
            UnitHint::Megahertz => Self::FrequencyMhz,
            _ => Self::Plain,
        }
    }
}

/// Turns raw values into presentation values
pub struct ValueFormatter;

impl ValueFormatter {
    pub fn format(raw: &Value, descriptor: &MetricDescriptor) -> Value {
        let places = descriptor.decimal_places;
        match descriptor.kind {
            SemanticKind::Size(unit) | SemanticKind::Rate(unit) => {
                format_dynamic_size(raw, unit, places).unwrap_or(Value::Null)
            }
            SemanticKind::Timestamp => Value::String(format_timestamp(raw)),
            SemanticKind::Status(table) => Value::String(table.render(raw)),
            SemanticKind::Percentage => format_percentage(raw),
            SemanticKind::Temperature => format_temperature(raw),
            SemanticKind::FrequencyMhz => format_frequency_mhz(raw),
            SemanticKind::Plain => convert_string_to_number(raw, places),
        }
    }
}

/// Unit to show next to a formatted value.
///
/// Sizes and rates follow the magnitude of the raw value, everything else uses
/// the declared unit.
pub fn display_unit(raw: &Value, descriptor: &MetricDescriptor) -> Option<String> {
    match descriptor.unit_hint {
        UnitHint::Size(unit) => Some(scaled_unit(raw, unit).symbol().to_string()),
        UnitHint::Rate(unit) => Some(format!("{}/s", scaled_unit(raw, unit).symbol())),
        other => other.symbol(),
    }
}

fn scaled_unit(raw: &Value, unit: SizeUnit) -> SizeUnit {
    let mut size = parse_decimal(raw).unwrap_or(Decimal::ZERO);
    let mut unit = unit;
    while size >= KIB {
        let Some(next) = unit.next() else { break };
        size /= KIB;
        unit = next;
    }
    unit
}

/// Render a bytes-per-second value as `"<n> <unit>/s"` with an integer magnitude.
///
/// ```
/// use serde_json::json;
/// use ugreen_exporter::format::scale_bytes_per_second;
///
/// assert_eq!(scale_bytes_per_second(&json!(0)), Some("0 B/s".to_string()));
/// assert_eq!(scale_bytes_per_second(&json!(3_221_225_472u64)), Some("3 GB/s".to_string()));
/// assert_eq!(scale_bytes_per_second(&json!(null)), None);
/// ```
pub fn scale_bytes_per_second(raw: &Value) -> Option<String> {
    let mut value = parse_decimal(raw)?;
    let mut unit = SizeUnit::B;
    while value >= KIB && unit < SizeUnit::TB {
        value /= KIB;
        unit = unit.next()?;
    }
    let magnitude = value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    Some(format!("{} {}/s", magnitude, unit.symbol()))
}

fn format_dynamic_size(raw: &Value, unit: SizeUnit, places: u32) -> Option<Value> {
    let mut size = parse_decimal(raw)?;
    for _ in 0..unit.exponent() {
        size = size.checked_mul(KIB)?;
    }
    let mut current = SizeUnit::B;
    while size >= KIB {
        let Some(next) = current.next() else { break };
        size /= KIB;
        current = next;
    }
    let size = size.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    Some(decimal_value(size, places))
}

fn format_timestamp(raw: &Value) -> String {
    if raw.is_null() {
        return "N/A".to_string();
    }
    as_float(raw)
        .filter(|secs| secs.is_finite())
        .and_then(|secs| {
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            Local.timestamp_opt(whole as i64, nanos).single()
        })
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Invalid timestamp".to_string())
}

fn format_percentage(raw: &Value) -> Value {
    as_float(raw)
        .map(|pct| round_float(pct, 1))
        .unwrap_or_else(|| Value::from(0))
}

fn format_temperature(raw: &Value) -> Value {
    as_float(raw)
        .map(|temp| Value::from(temp.round_ties_even() as i64))
        .unwrap_or_else(|| Value::from(0))
}

fn format_frequency_mhz(raw: &Value) -> Value {
    if let Value::String(text) = raw {
        if text.contains("MHz") {
            let cleaned = text.replace("MHz", "");
            let cleaned = cleaned.trim();
            if !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(mhz) = cleaned.parse::<u64>() {
                    return Value::from(mhz);
                }
            }
        }
    }
    raw.clone()
}

fn convert_string_to_number(raw: &Value, places: u32) -> Value {
    let Value::String(text) = raw else {
        return raw.clone();
    };
    let cleaned = text.trim().replace(',', ".");
    if cleaned.is_empty() {
        return Value::String(cleaned);
    }
    if cleaned.contains('.') {
        return cleaned
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| round_float(v, places))
            .unwrap_or(Value::String(cleaned));
    }
    if let Ok(int) = cleaned.parse::<i64>() {
        return Value::from(int);
    }
    decimal_from_text(&cleaned)
        .map(|v| decimal_value(v.round_dp(places), places))
        .unwrap_or(Value::String(cleaned))
}

/// Round the exact binary value of `value`, ties to even
fn round_float(value: f64, places: u32) -> Value {
    match Decimal::from_f64_retain(value) {
        Some(exact) => decimal_value(
            exact.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven),
            places,
        ),
        // Beyond the decimal range there are no fractional digits left to round
        None => Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null),
    }
}

/// Zero places yields an integer, anything else a float
fn decimal_value(value: Decimal, places: u32) -> Value {
    if places == 0 {
        if let Some(int) = value.to_i64() {
            return Value::from(int);
        }
    }
    value
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn decimal_from_text(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Numbers, or numeric strings that may use `,` as decimal separator.
///
/// Floats are read through their shortest text form so `1.005` stays `1.005`.
fn parse_decimal(raw: &Value) -> Option<Decimal> {
    match raw {
        Value::Number(n) => match (n.as_u64(), n.as_i64()) {
            (Some(unsigned), _) => Some(Decimal::from(unsigned)),
            (_, Some(signed)) => Some(Decimal::from(signed)),
            _ => decimal_from_text(&n.to_string()),
        },
        Value::String(s) => decimal_from_text(&s.trim().replace(',', ".")),
        _ => None,
    }
}

fn as_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    }
}

fn as_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn display_raw(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
