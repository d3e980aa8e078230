//! HTTP Server and Refresh Loops
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing metrics, health and the latest values
//! - **Refresh Loops**: one background task per cadence (config and state)
//! - **Keep-Alive**: optional WebSocket channel holding the NAS session open
//! - **Shutdown**: Ctrl-C stops the loops, drains the server and closes the channel
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - 200 if the last state refresh reached the NAS, 503 otherwise
//! - `GET /state` - latest formatted values of both cadences with unit and category
//! - `GET /capabilities` - probed hardware counts as JSON
//! - `POST /actions/{key}` - trigger `shutdown` or `reboot`
//!
//! # Error Handling
//!
//! A refresh where every endpoint failed marks the NAS down but never stops
//! the loop; the next tick tries again.

use crate::config::Config;
use crate::entities::registry::Cadence;
use crate::format::display_unit;
use crate::metrics::MetricsCollector;
use crate::nas::UgreenNas;
use crate::ugreen::KeepAliveChannel;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// One key of `/state`
#[derive(Debug, Clone, Serialize)]
pub struct StateEntry {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub category: String,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub metrics: MetricsCollector,
    pub nas: Arc<UgreenNas>,
    /// Latest formatted values of both cadences
    pub latest: Arc<RwLock<BTreeMap<String, StateEntry>>>,
}

impl AppState {
    pub fn new(config: Config, metrics: MetricsCollector, nas: Arc<UgreenNas>) -> Self {
        metrics.record_capabilities(&nas.capabilities());
        Self {
            config,
            metrics,
            nas,
            latest: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/state", get(state_handler))
        .route("/capabilities", get(capabilities_handler))
        .route("/actions/{key}", post(action_handler))
        .with_state(state)
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let metrics = MetricsCollector::new()?;
    let nas = Arc::new(UgreenNas::connect(&config.nas).await?);
    let state = AppState::new(config.clone(), metrics, nas.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Refresh loops, state first so /health turns green quickly
    let mut loops = Vec::new();
    for (cadence, seconds) in [
        (Cadence::State, config.polling.state_interval_seconds),
        (Cadence::Config, config.polling.config_interval_seconds),
    ] {
        let loop_state = state.clone();
        let loop_shutdown = shutdown_rx.clone();
        loops.push(tokio::spawn(async move {
            refresh_loop(loop_state, cadence, Duration::from_secs(seconds), loop_shutdown).await;
        }));
    }

    let keepalive = if config.keepalive.enabled {
        let channel = KeepAliveChannel::new(&config.nas, &config.keepalive, nas.session().clone());
        let keepalive_shutdown = shutdown_rx.clone();
        Some(tokio::spawn(channel.run(keepalive_shutdown)))
    } else {
        info!("Keep-alive channel disabled");
        None
    };

    let app = router(state);

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let mut server_shutdown = shutdown_rx.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = server_shutdown.changed().await;
    });

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    let grace = Duration::from_secs(config.keepalive.shutdown_grace_seconds);
    for handle in loops {
        if tokio::time::timeout(grace, handle).await.is_err() {
            warn!("Refresh loop did not stop within {:?}", grace);
        }
    }
    if let Some(handle) = keepalive {
        if tokio::time::timeout(grace, handle).await.is_err() {
            warn!("Keep-alive channel did not close within {:?}", grace);
        }
    }

    info!("Shutdown complete");
    Ok(())
}

async fn refresh_loop(
    state: AppState,
    cadence: Cadence,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        if let Err(e) = refresh(&state, cadence).await {
            error!("Failed to refresh {} values: {}", cadence, e);
        }
    }

    info!("{} refresh loop stopped", cadence);
}

/// Run one refresh pass and publish it to metrics and `/state`.
///
/// The state cadence also drives `ugreen_up`.
pub async fn refresh(state: &AppState, cadence: Cadence) -> anyhow::Result<()> {
    let started = Instant::now();
    let snapshot = state.nas.collect(cadence).await;
    let elapsed = started.elapsed();

    state.metrics.record(state.nas.descriptors(cadence), &snapshot);
    state
        .metrics
        .refresh_duration_seconds
        .with_label_values(&[cadence.to_string().as_str()])
        .set(elapsed.as_secs_f64());

    let any_value = snapshot.raw.values().any(|v| !v.is_null());
    {
        let mut latest = state.latest.write().await;
        for descriptor in state.nas.descriptors(cadence) {
            let Some(value) = snapshot.formatted.get(&descriptor.key) else {
                continue;
            };
            let raw = snapshot.raw.get(&descriptor.key).unwrap_or(&Value::Null);
            latest.insert(
                descriptor.key.clone(),
                StateEntry {
                    value: value.clone(),
                    unit: display_unit(raw, descriptor),
                    category: descriptor.category.clone(),
                },
            );
        }
    }

    let reachable = any_value || snapshot.raw.is_empty();
    if cadence == Cadence::State {
        state.metrics.up.set(if reachable { 1.0 } else { 0.0 });
    }
    if !reachable {
        anyhow::bail!("No values could be read from the NAS");
    }

    state
        .metrics
        .refresh_timestamp_seconds
        .with_label_values(&[cadence.to_string().as_str()])
        .set(chrono::Utc::now().timestamp() as f64);
    info!(
        "Refreshed {} {} values in {:?}",
        snapshot.raw.len(),
        cadence,
        elapsed
    );
    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>UGREEN NAS Exporter</title></head>
<body>
<h1>UGREEN NAS Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
<p><a href="/state">State</a></p>
<p><a href="/capabilities">Capabilities</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.metrics.up.get() > 0.0 {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NAS unreachable")
    }
}

async fn state_handler(State(state): State<AppState>) -> Json<BTreeMap<String, StateEntry>> {
    Json(state.latest.read().await.clone())
}

async fn capabilities_handler(State(state): State<AppState>) -> Json<BTreeMap<String, Value>> {
    Json(state.nas.capabilities())
}

async fn action_handler(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    if !state.nas.actions().iter().any(|a| a.key == key) {
        return (StatusCode::NOT_FOUND, format!("Unknown action '{}'", key)).into_response();
    }
    match state.nas.press(&key).await {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(e) => {
            error!("Action '{}' failed: {}", key, e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}
