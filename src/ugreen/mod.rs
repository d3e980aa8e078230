//! UGREEN appliance protocol
//!
//! - [`session`] - RSA login handshake and bearer token state
//! - [`client`] - authenticated REST calls with the expired-token retry rule
//! - [`keepalive`] - desktop WebSocket that keeps the session warm
//! - [`types`] - wire types and device response codes

pub mod client;
pub mod keepalive;
pub mod session;
pub mod types;

pub use client::{DeviceApi, RequestClient};
pub use keepalive::KeepAliveChannel;
pub use session::AuthSession;

/// REST endpoints used by the exporter
pub mod endpoints {
    pub const VERIFY_CHECK: &str = "/ugreen/v1/verify/check";
    pub const VERIFY_LOGIN: &str = "/ugreen/v1/verify/login";
    pub const DESKTOP_WS: &str = "/ugreen/v1/desktop/ws";

    pub const SYSINFO_COMMON: &str = "/ugreen/v1/sysinfo/machine/common";
    pub const DISK_LIST: &str = "/ugreen/v2/storage/disk/list";
    pub const POOL_LIST: &str = "/ugreen/v1/storage/pool/list";
    pub const TASKMGR_STATS: &str = "/ugreen/v1/taskmgr/stat/get_all";
    pub const NETWORK_IFACES: &str = "/ugreen/v1/network/iface/list";
    pub const SYSTEM_STATUS: &str =
        "/ugreen/v1/desktop/components/data?id=desktop.component.SystemStatus";
    pub const TEMPERATURE_MONITORING: &str =
        "/ugreen/v1/desktop/components/data?id=desktop.component.TemperatureMonitoring";

    pub const SHUTDOWN: &str = "/ugreen/v1/desktop/shutdown";
    pub const REBOOT: &str = "/ugreen/v1/desktop/reboot";
}
