//! Prometheus Metrics Definitions
//!
//! Descriptors are discovered at runtime, so values are exposed through a few
//! labelled families instead of one metric per value:
//!
//! - `ugreen_up` - 1 when the last refresh reached the NAS
//! - `ugreen_value{key,category}` - raw numeric values
//! - `ugreen_info{key,category,value}` - 1 for every textual value, the text in `value`
//! - `ugreen_capability{name}` - probed hardware counts, flags as 0/1
//! - `ugreen_refresh_timestamp_seconds{cadence}` / `ugreen_refresh_duration_seconds{cadence}`
//!
//! A textual value that changes drops its previous `ugreen_info` series.

use crate::entities::MetricDescriptor;
use crate::nas::Snapshot;
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Metrics collector for a UGREEN NAS
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    pub up: Arc<Gauge>,
    pub value: Arc<GaugeVec>,
    pub info: Arc<GaugeVec>,
    pub capability: Arc<GaugeVec>,
    pub refresh_timestamp_seconds: Arc<GaugeVec>,
    pub refresh_duration_seconds: Arc<GaugeVec>,

    // key -> (category, text) of the live ugreen_info series
    info_labels: Arc<Mutex<HashMap<String, (String, String)>>>,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let up = Gauge::with_opts(
            Opts::new("up", "Whether the last refresh reached the NAS (1=up, 0=down)")
                .namespace("ugreen"),
        )?;

        let value = GaugeVec::new(
            Opts::new("value", "Raw numeric value of a discovered NAS metric").namespace("ugreen"),
            &["key", "category"],
        )?;

        let info = GaugeVec::new(
            Opts::new("info", "Textual value of a discovered NAS metric (always 1)")
                .namespace("ugreen"),
            &["key", "category", "value"],
        )?;

        let capability = GaugeVec::new(
            Opts::new(
                "capability",
                "Probed hardware capability counts (flags as 1/0)",
            )
            .namespace("ugreen"),
            &["name"],
        )?;

        let refresh_timestamp_seconds = GaugeVec::new(
            Opts::new(
                "refresh_timestamp_seconds",
                "Unix time of the last completed refresh",
            )
            .namespace("ugreen"),
            &["cadence"],
        )?;

        let refresh_duration_seconds = GaugeVec::new(
            Opts::new(
                "refresh_duration_seconds",
                "Duration of the last refresh",
            )
            .namespace("ugreen"),
            &["cadence"],
        )?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(value.clone()))?;
        registry.register(Box::new(info.clone()))?;
        registry.register(Box::new(capability.clone()))?;
        registry.register(Box::new(refresh_timestamp_seconds.clone()))?;
        registry.register(Box::new(refresh_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            up: Arc::new(up),
            value: Arc::new(value),
            info: Arc::new(info),
            capability: Arc::new(capability),
            refresh_timestamp_seconds: Arc::new(refresh_timestamp_seconds),
            refresh_duration_seconds: Arc::new(refresh_duration_seconds),
            info_labels: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Update value and info series from one refresh pass
    pub fn record(&self, descriptors: &[MetricDescriptor], snapshot: &Snapshot) {
        for descriptor in descriptors.iter().filter(|d| !d.is_action()) {
            let key = descriptor.key.as_str();
            let category = descriptor.category.as_str();
            let raw = snapshot.raw.get(key).unwrap_or(&Value::Null);

            match as_sample(raw) {
                Some(sample) => self.value.with_label_values(&[key, category]).set(sample),
                None => {
                    let _ = self.value.remove_label_values(&[key, category]);
                }
            }

            let text = snapshot.formatted.get(key).and_then(as_text);
            self.set_info(key, category, text);
        }
    }

    pub fn record_capabilities(&self, capabilities: &BTreeMap<String, Value>) {
        for (name, value) in capabilities {
            if let Some(sample) = as_sample(value) {
                self.capability.with_label_values(&[name.as_str()]).set(sample);
            }
        }
    }

    fn set_info(&self, key: &str, category: &str, text: Option<String>) {
        let Ok(mut live) = self.info_labels.lock() else {
            return;
        };

        if let Some((old_category, old_text)) = live.get(key) {
            if Some(old_text) == text.as_ref() && old_category == category {
                return;
            }
            debug!("Dropping stale info series for {}", key);
            let _ = self
                .info
                .remove_label_values(&[key, old_category.as_str(), old_text.as_str()]);
            live.remove(key);
        }

        if let Some(text) = text {
            self.info
                .with_label_values(&[key, category, text.as_str()])
                .set(1.0);
            live.insert(key.to_string(), (category.to_string(), text));
        }
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn as_sample(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
