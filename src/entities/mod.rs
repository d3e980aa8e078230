//! Metric Descriptors and Templates
//!
//! A [`MetricDescriptor`] is everything the exporter knows about one value on the
//! appliance: where to read it, how to address it inside the response, and how to
//! present it. Descriptors for hardware that exists a variable number of times
//! (disks, NICs, RAM modules, ...) are produced from [`MetricTemplate`]s whose
//! string fields carry placeholders such as `{prefix_key}` or `{series_index}`.
//!
//! # Submodules
//!
//! - [`template`] - placeholder parsing and expansion
//! - [`builder`] - per-instance expansion with naming conventions
//! - [`catalog`] - static descriptor and template tables
//! - [`registry`] - category table driving discovery

pub mod builder;
pub mod catalog;
pub mod registry;
pub mod template;

use crate::format::{SemanticKind, StatusTable};
use serde::Serialize;
use std::fmt;

/// HTTP method used to read or trigger a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// Byte magnitude, stepping by 1024
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SizeUnit {
    B,
    KB,
    MB,
    GB,
    TB,
    PB,
}

impl SizeUnit {
    pub const ALL: [SizeUnit; 6] = [
        SizeUnit::B,
        SizeUnit::KB,
        SizeUnit::MB,
        SizeUnit::GB,
        SizeUnit::TB,
        SizeUnit::PB,
    ];

    pub fn exponent(self) -> i32 {
        self as i32
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::B => "B",
            Self::KB => "kB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
            Self::PB => "PB",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self as usize + 1).copied()
    }
}

/// Unit metadata declared on a template
///
/// This is a semantic tag; it decides the formatting strategy rather than being
/// printed verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitHint {
    None,
    Size(SizeUnit),
    Rate(SizeUnit),
    Percent,
    Celsius,
    Megahertz,
    Seconds,
    Rpm,
    Label(&'static str),
}

impl UnitHint {
    pub fn symbol(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Size(unit) => Some(unit.symbol().to_string()),
            Self::Rate(unit) => Some(format!("{}/s", unit.symbol())),
            Self::Percent => Some("%".to_string()),
            Self::Celsius => Some("°C".to_string()),
            Self::Megahertz => Some("MHz".to_string()),
            Self::Seconds => Some("s".to_string()),
            Self::Rpm => Some("rpm".to_string()),
            Self::Label(label) => Some((*label).to_string()),
        }
    }
}

/// Fully resolved definition of one readable or writable value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDescriptor {
    pub key: String,
    pub display_name: String,
    pub icon: &'static str,
    pub endpoint: String,
    pub extraction_path: String,
    pub unit_hint: UnitHint,
    pub decimal_places: u32,
    pub request_method: RequestMethod,
    pub category: String,
    /// Formatting strategy, fixed when the descriptor is built
    pub kind: SemanticKind,
}

impl MetricDescriptor {
    /// Write-only action descriptors have no extraction path
    pub fn is_action(&self) -> bool {
        self.request_method == RequestMethod::Post && self.extraction_path.is_empty()
    }
}

/// Descriptor prototype whose string fields may contain placeholders
///
/// Templates are declared in `const` tables, so all builder methods are `const fn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricTemplate {
    pub key: &'static str,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub endpoint: &'static str,
    pub extraction_path: &'static str,
    pub unit_hint: UnitHint,
    pub decimal_places: u32,
    pub request_method: RequestMethod,
    pub category: &'static str,
    pub status_table: Option<StatusTable>,
}

impl MetricTemplate {
    pub const fn new(
        key: &'static str,
        display_name: &'static str,
        icon: &'static str,
        endpoint: &'static str,
        extraction_path: &'static str,
    ) -> Self {
        Self {
            key,
            display_name,
            icon,
            endpoint,
            extraction_path,
            unit_hint: UnitHint::None,
            decimal_places: 2,
            request_method: RequestMethod::Get,
            category: "",
            status_table: None,
        }
    }

    pub const fn unit(mut self, unit_hint: UnitHint) -> Self {
        self.unit_hint = unit_hint;
        self
    }

    pub const fn places(mut self, decimal_places: u32) -> Self {
        self.decimal_places = decimal_places;
        self
    }

    pub const fn category(mut self, category: &'static str) -> Self {
        self.category = category;
        self
    }

    pub const fn status(mut self, table: StatusTable) -> Self {
        self.status_table = Some(table);
        self
    }

    pub const fn post(mut self) -> Self {
        self.request_method = RequestMethod::Post;
        self
    }
}
