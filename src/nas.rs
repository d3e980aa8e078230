//! UGREEN NAS facade
//!
//! [`UgreenNas`] owns everything that belongs to one appliance: the REST client
//! with its auth session, the cached capability counts and the descriptor sets
//! built at connect time. The descriptor sets are immutable afterwards, so the
//! two refresh cadences can run concurrently against the same instance.

use crate::config::NasConfig;
use crate::entities::registry::{self, Cadence, MetricRegistry};
use crate::entities::MetricDescriptor;
use crate::error::{ExporterError, Result};
use crate::fetch::fetch_all;
use crate::format::ValueFormatter;
use crate::probe::CapabilityProber;
use crate::ugreen::{AuthSession, RequestClient};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Raw and formatted values of one refresh pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub raw: BTreeMap<String, Value>,
    pub formatted: BTreeMap<String, Value>,
}

pub struct UgreenNas {
    client: Arc<RequestClient>,
    prober: CapabilityProber,
    config_descriptors: Vec<MetricDescriptor>,
    state_descriptors: Vec<MetricDescriptor>,
    actions: Vec<MetricDescriptor>,
}

impl UgreenNas {
    /// Authenticate, probe the hardware and build all descriptor sets.
    ///
    /// Failing to authenticate is fatal; everything after that degrades to
    /// fewer descriptors instead of failing.
    pub async fn connect(config: &NasConfig) -> Result<Self> {
        let client = Arc::new(RequestClient::new(config)?);
        Self::with_client(client).await
    }

    pub async fn with_client(client: Arc<RequestClient>) -> Result<Self> {
        if !client.session().authenticate().await {
            return Err(ExporterError::Auth(format!(
                "could not log in to {}",
                client.session().base_url()
            )));
        }
        info!("Authenticated against {}", client.session().base_url());

        let prober = CapabilityProber::new();
        prober.probe(&*client).await;

        let registry = MetricRegistry::new(&*client, &prober);

        let mut config_descriptors = registry::common_descriptors(Cadence::Config)?;
        config_descriptors.extend(registry.build(Cadence::Config).await);

        let mut state_descriptors = registry::common_descriptors(Cadence::State)?;
        state_descriptors.extend(registry.build(Cadence::State).await);

        let actions = registry::action_descriptors()?;

        info!(
            "Discovered {} config, {} state and {} action descriptors",
            config_descriptors.len(),
            state_descriptors.len(),
            actions.len()
        );

        Ok(Self {
            client,
            prober,
            config_descriptors,
            state_descriptors,
            actions,
        })
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        self.client.session()
    }

    pub fn descriptors(&self, cadence: Cadence) -> &[MetricDescriptor] {
        match cadence {
            Cadence::Config => &self.config_descriptors,
            Cadence::State => &self.state_descriptors,
        }
    }

    pub fn actions(&self) -> &[MetricDescriptor] {
        &self.actions
    }

    /// Look up a readable descriptor of either cadence
    pub fn descriptor(&self, key: &str) -> Option<&MetricDescriptor> {
        self.config_descriptors
            .iter()
            .chain(&self.state_descriptors)
            .find(|d| d.key == key)
    }

    /// One refresh pass returning raw and formatted values
    pub async fn collect(&self, cadence: Cadence) -> Snapshot {
        let descriptors = self.descriptors(cadence);
        let raw = fetch_all(&*self.client, descriptors).await;
        let formatted = descriptors
            .iter()
            .filter_map(|descriptor| {
                raw.get(&descriptor.key).map(|value| {
                    (
                        descriptor.key.clone(),
                        ValueFormatter::format(value, descriptor),
                    )
                })
            })
            .collect();
        Snapshot { raw, formatted }
    }

    /// One refresh pass returning `key -> formatted value`
    pub async fn refresh(&self, cadence: Cadence) -> BTreeMap<String, Value> {
        self.collect(cadence).await.formatted
    }

    /// Probed capability counts; empty when the probe learned nothing
    pub fn capabilities(&self) -> BTreeMap<String, Value> {
        self.prober
            .cached()
            .map(|counts| counts.to_map())
            .unwrap_or_default()
    }

    /// Trigger a write-only action such as `shutdown` or `reboot`
    pub async fn press(&self, key: &str) -> Result<()> {
        let action = self
            .actions
            .iter()
            .find(|a| a.key == key && a.is_action())
            .ok_or_else(|| ExporterError::Api(format!("unknown action '{}'", key)))?;

        info!("Pressing action '{}'", action.key);
        let response = self.client.post(&action.endpoint, None).await;
        if response.as_object().is_some_and(|o| o.is_empty()) {
            warn!("Action '{}' got no response from the NAS", action.key);
        }
        Ok(())
    }
}
