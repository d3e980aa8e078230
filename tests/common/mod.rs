//! Shared fixtures: canned appliance responses, an in-memory `DeviceApi` and an
//! HTTP mock appliance implementing the login exchange.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs8::EncodePublicKey;
use rsa::rand_core::OsRng;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ugreen_exporter::config::NasConfig;
use ugreen_exporter::error::{ExporterError, Result};
use ugreen_exporter::ugreen::endpoints::{
    DISK_LIST, NETWORK_IFACES, POOL_LIST, SYSINFO_COMMON, SYSTEM_STATUS, TASKMGR_STATS,
    TEMPERATURE_MONITORING,
};
use ugreen_exporter::ugreen::DeviceApi;

pub const PASSWORD: &str = "hunter2";

pub fn sysinfo() -> Value {
    json!({
        "code": 200,
        "data": {
            "common": {"nas_owner": "alice"},
            "hardware": {
                "cpu": [{"model": "Intel N100", "ghz": "3400 MHz", "core": 4, "thread": 4}],
                "mem": [
                    {"model": "DDR5", "manufacturer": "Samsung", "size": 8589934592u64, "mhz": "4800 MHz"},
                    {"model": "DDR5", "manufacturer": "Samsung", "size": 8589934592u64, "mhz": "4800 MHz"}
                ],
                "net": [
                    {"model": "RTL8125", "ip": "192.168.1.10", "mac": "6c:1f:f7:00:00:01", "speed": 2500, "mtu": 1500, "mask": "255.255.255.0"}
                ],
                "usb": [],
                "ups": []
            }
        }
    })
}

pub fn disk_list() -> Value {
    json!({
        "code": 200,
        "data": {
            "result": [
                {"name": "sda", "dev_name": "/dev/sda", "type": 0, "size": 4000787030016u64, "status": 1, "temperature": 34, "serial": "WD-A"},
                {"name": "sdb", "dev_name": "/dev/sdb", "type": 1, "size": 1000204886016u64, "status": 1, "temperature": 41, "serial": "S4-B"}
            ]
        }
    })
}

pub fn pool_list() -> Value {
    json!({
        "code": 200,
        "data": {
            "result": [
                {
                    "name": "pool1",
                    "label": "Main",
                    "level": "raid1",
                    "total": 1000204886016u64,
                    "disks": [{"dev_name": "/dev/sdb"}, {"dev_name": "/dev/sdx"}],
                    "volumes": [{"name": "vol1", "health": 0, "total": 536870912000u64}]
                }
            ]
        }
    })
}

pub fn stats() -> Value {
    json!({
        "code": 200,
        "data": {
            "overview": {
                "cpu": [{"used_percent": 12.34, "temp": 41.5}],
                "mem": [{"used_percent": 40.0}],
                "cpu_fan": [{"speed": 1200, "status": 1}],
                "device_fan": {"speed": 800, "status": 1}
            },
            "net": {
                "series": [
                    {"name": "overview", "send_rate": 1536, "recv_rate": 0},
                    {"name": "eth0", "send_rate": 2048, "recv_rate": 3221225472u64}
                ]
            },
            "disk": {
                "series": [
                    {"name": "overview", "read_rate": 0, "write_rate": 0},
                    {"name": "sda", "temperature": 34.5, "read_rate": 1048576, "write_rate": 0},
                    {"name": "sdb", "temperature": 41.0, "read_rate": 0, "write_rate": 512}
                ]
            },
            "volume": {"series": [{"read_rate": 0, "write_rate": 0}]},
            "mem": {"structure": {"total": 16384, "free": 8192, "cache": 1024, "share": 0, "used": 4096}},
            "gpu": {"series": []}
        }
    })
}

pub fn system_status() -> Value {
    json!({
        "code": 200,
        "data": {
            "type": "DXP4800 Plus",
            "dev_name": "nas",
            "server_status": 2,
            "status": 0,
            "last_boot_time": 1700000000,
            "total_run_time": 86400,
            "message": ""
        }
    })
}

pub fn temperature_monitoring() -> Value {
    json!({
        "code": 200,
        "data": {"cpu_status": 0, "status": 0, "message": "", "fan_status": 0}
    })
}

pub fn ifaces() -> Value {
    json!({
        "code": 200,
        "data": {"ifaces": [{"ipv4": {"gateway": "192.168.1.1", "dns": ["1.1.1.1"]}}]}
    })
}

/// Every endpoint of a healthy two-disk appliance
pub fn appliance_responses() -> HashMap<String, Value> {
    HashMap::from([
        (SYSINFO_COMMON.to_string(), sysinfo()),
        (DISK_LIST.to_string(), disk_list()),
        (POOL_LIST.to_string(), pool_list()),
        (TASKMGR_STATS.to_string(), stats()),
        (SYSTEM_STATUS.to_string(), system_status()),
        (TEMPERATURE_MONITORING.to_string(), temperature_monitoring()),
        (NETWORK_IFACES.to_string(), ifaces()),
    ])
}

/// In-memory appliance; endpoints without a response fail
#[derive(Default)]
pub struct FakeApi {
    responses: HashMap<String, Value>,
    calls: Mutex<HashMap<String, usize>>,
    latency: Option<Duration>,
}

impl FakeApi {
    pub fn new(responses: HashMap<String, Value>) -> Self {
        Self {
            responses,
            calls: Mutex::new(HashMap::new()),
            latency: None,
        }
    }

    pub fn appliance() -> Self {
        Self::new(appliance_responses())
    }

    pub fn without(mut self, endpoint: &str) -> Self {
        self.responses.remove(endpoint);
        self
    }

    pub fn with(mut self, endpoint: &str, response: Value) -> Self {
        self.responses.insert(endpoint.to_string(), response);
        self
    }

    /// Every response is delayed, so overlapping callers actually overlap
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(endpoint)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DeviceApi for FakeApi {
    async fn fetch_json(&self, endpoint: &str) -> Result<Value> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default() += 1;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.responses
            .get(endpoint)
            .cloned()
            .ok_or_else(|| ExporterError::Api(format!("no fixture for {}", endpoint)))
    }
}

/// HTTP appliance with the RSA login exchange and token checking
pub struct MockAppliance {
    pub port: u16,
    pub logins: Arc<AtomicUsize>,
    pub actions: Arc<Mutex<Vec<String>>>,
}

#[derive(Clone)]
struct MockState {
    key: Arc<RsaPrivateKey>,
    valid_token: Arc<Mutex<String>>,
    accept_login: bool,
    always_expired: bool,
    logins: Arc<AtomicUsize>,
    actions: Arc<Mutex<Vec<String>>>,
    responses: Arc<HashMap<String, Value>>,
}

impl MockAppliance {
    /// `valid_token` is the token the appliance accepts before the first login
    pub async fn start(valid_token: &str, accept_login: bool) -> Self {
        Self::launch(valid_token, accept_login, false).await
    }

    /// Appliance that accepts logins but answers every data call with 1024
    pub async fn start_always_expired() -> Self {
        Self::launch("unset", true, true).await
    }

    async fn launch(valid_token: &str, accept_login: bool, always_expired: bool) -> Self {
        let key = RsaPrivateKey::new(&mut OsRng, 1024).expect("key generation");
        let logins = Arc::new(AtomicUsize::new(0));
        let actions = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            key: Arc::new(key),
            valid_token: Arc::new(Mutex::new(valid_token.to_string())),
            accept_login,
            always_expired,
            logins: logins.clone(),
            actions: actions.clone(),
            responses: Arc::new(appliance_responses()),
        };

        let app = Router::new()
            .route("/ugreen/v1/verify/check", post(check))
            .route("/ugreen/v1/verify/login", post(login))
            .route("/ugreen/v1/desktop/components/data", get(component))
            .route("/ugreen/v1/desktop/shutdown", post(action))
            .route("/ugreen/v1/desktop/reboot", post(action))
            .route("/ugreen/{*rest}", get(data))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            port,
            logins,
            actions,
        }
    }

    pub fn config(&self, seed_token: Option<&str>) -> NasConfig {
        NasConfig {
            host: "127.0.0.1".to_string(),
            port: self.port,
            username: "admin".to_string(),
            password: SecretString::from(PASSWORD),
            token: seed_token.map(SecretString::from),
            use_tls: false,
            verify_ssl: false,
            otp: false,
            request_timeout_seconds: 5,
        }
    }

    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

async fn check(State(state): State<MockState>) -> (HeaderMap, Json<Value>) {
    let der = state
        .key
        .to_public_key()
        .to_public_key_der()
        .expect("public key der");
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-rsa-token",
        HeaderValue::from_str(&BASE64.encode(der.as_bytes())).expect("header"),
    );
    (headers, Json(json!({"code": 200})))
}

async fn login(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.logins.fetch_add(1, Ordering::SeqCst);

    let password = body["password"]
        .as_str()
        .and_then(|p| BASE64.decode(p).ok())
        .and_then(|cipher| state.key.decrypt(Pkcs1v15Encrypt, &cipher).ok())
        .and_then(|plain| String::from_utf8(plain).ok());

    if !state.accept_login || password.as_deref() != Some(PASSWORD) {
        return Json(json!({"code": 1001, "msg": "wrong password"}));
    }

    let token = format!("token-{}", state.logins.load(Ordering::SeqCst));
    *state.valid_token.lock().unwrap() = token.clone();
    Json(json!({"code": 200, "data": {"token": token}}))
}

fn authorized(state: &MockState, query: &HashMap<String, String>) -> bool {
    !state.always_expired
        && query.get("token") == Some(&*state.valid_token.lock().unwrap())
}

async fn component(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    if !authorized(&state, &query) {
        return Json(json!({"code": 1024}));
    }
    let endpoint = match query.get("id").map(String::as_str) {
        Some("desktop.component.SystemStatus") => SYSTEM_STATUS,
        Some("desktop.component.TemperatureMonitoring") => TEMPERATURE_MONITORING,
        _ => return Json(json!({"code": 404})),
    };
    Json(state.responses[endpoint].clone())
}

async fn action(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
    uri: axum::http::Uri,
) -> Json<Value> {
    if !authorized(&state, &query) {
        return Json(json!({"code": 1024}));
    }
    state.actions.lock().unwrap().push(uri.path().to_string());
    Json(json!({"code": 200}))
}

async fn data(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
    uri: axum::http::Uri,
) -> Json<Value> {
    if !authorized(&state, &query) {
        return Json(json!({"code": 1024}));
    }
    Json(
        state
            .responses
            .get(uri.path())
            .cloned()
            .unwrap_or_else(|| json!({"code": 404})),
    )
}
