//! UGREEN NAS Telemetry Exporter
//!
//! Discovers what an UGREEN NAS can report, reads it over the appliance's REST
//! API and exposes it in Prometheus format.
//!
//! # Overview
//!
//! The appliance has no schema endpoint, so the set of metrics is built at
//! connect time: a capability probe counts RAM modules, NICs, disks, pools,
//! volumes and fans, and per-category templates are expanded once per
//! instance into flat metric descriptors. Each descriptor names the endpoint
//! it is read from and a dotted path into that endpoint's JSON.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   REST (token)    ┌──────────────────────────┐
//! │  UGREEN     │ ◄───────────────► │  Exporter                │
//! │   NAS       │                   │  probe → registry        │      HTTP      ┌────────────┐
//! │             │   WebSocket       │  fetch → format          │ ◄────────────► │ Prometheus │
//! │             │ ◄───────────────► │  keep-alive              │   /metrics     └────────────┘
//! └─────────────┘                   └──────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`ugreen`] - authenticated REST client, login session and keep-alive channel
//! - [`probe`] - one-shot hardware capability counts
//! - [`entities`] - metric templates, category registry and descriptor builder
//! - [`extract`] - dotted-path extraction and calculated values
//! - [`fetch`] - grouped concurrent refresh of a descriptor set
//! - [`format`] - unit scaling and status-code translation
//! - [`nas`] - facade tying one appliance together
//! - [`metrics`] - Prometheus metric definitions
//! - [`server`] - HTTP server and refresh loops
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use ugreen_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod entities;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod metrics;
pub mod nas;
pub mod probe;
pub mod server;
pub mod ugreen;
