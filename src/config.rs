use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub nas: NasConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub keepalive: KeepAliveConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NasConfig {
    pub host: String,
    #[serde(default = "default_nas_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_secret")]
    pub password: SecretString,
    /// Seed token handed over by an external token supplier
    #[serde(default)]
    pub token: Option<SecretString>,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default)]
    pub verify_ssl: bool,
    #[serde(default)]
    pub otp: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_config_interval")]
    pub config_interval_seconds: u64,
    #[serde(default = "default_state_interval")]
    pub state_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeepAliveConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_heartbeat")]
    pub heartbeat_seconds: u64,
    #[serde(default = "default_idle_retry")]
    pub idle_retry_seconds: u64,
    #[serde(default = "default_backoff_initial")]
    pub backoff_initial_seconds: u64,
    #[serde(default = "default_backoff_max")]
    pub backoff_max_seconds: u64,
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
}

impl NasConfig {
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    pub fn websocket_base_url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            config_interval_seconds: default_config_interval(),
            state_interval_seconds: default_state_interval(),
        }
    }
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            lang: default_lang(),
            heartbeat_seconds: default_heartbeat(),
            idle_retry_seconds: default_idle_retry(),
            backoff_initial_seconds: default_backoff_initial(),
            backoff_max_seconds: default_backoff_max(),
            shutdown_grace_seconds: default_shutdown_grace(),
            topics: default_topics(),
        }
    }
}

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

fn default_nas_port() -> u16 {
    9999
}

fn default_request_timeout() -> u64 {
    10
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9100
}

fn default_config_interval() -> u64 {
    300
}

fn default_state_interval() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_heartbeat() -> u64 {
    25
}

fn default_idle_retry() -> u64 {
    15
}

fn default_backoff_initial() -> u64 {
    1
}

fn default_backoff_max() -> u64 {
    60
}

fn default_shutdown_grace() -> u64 {
    5
}

fn default_topics() -> Vec<String> {
    vec!["cpu_usage".to_string(), "cpu_temp".to_string()]
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("UGREEN_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
