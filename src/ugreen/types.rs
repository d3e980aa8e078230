//! UGREEN API Wire Types
//!
//! Every REST response is a JSON envelope with a numeric `code` and a `data`
//! payload. The exporter reads `data` through extraction paths, so only the
//! envelope, the login exchange and the WebSocket subscribe message are typed.
//!
//! # Response codes
//!
//! - `200` - success
//! - `1024` - bearer token expired, log in again and retry once
//! - anything else - device specific failure

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CODE_OK: i64 = 200;
pub const CODE_TOKEN_EXPIRED: i64 = 1024;

/// Response header carrying the login public key
pub const RSA_TOKEN_HEADER: &str = "x-rsa-token";

/// Read the envelope `code` of a raw response
pub fn response_code(response: &Value) -> Option<i64> {
    response.get("code").and_then(Value::as_i64)
}

/// Body of `POST /ugreen/v1/verify/check`
#[derive(Debug, Serialize)]
pub struct CheckRequest<'a> {
    pub username: &'a str,
}

/// Body of `POST /ugreen/v1/verify/login`
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub is_simple: bool,
    pub keepalive: bool,
    pub otp: bool,
    pub username: &'a str,
    /// Base64 of the RSA PKCS#1 v1.5 encrypted password
    pub password: String,
}

impl<'a> LoginRequest<'a> {
    pub fn new(username: &'a str, encrypted_password: String, otp: bool) -> Self {
        Self {
            is_simple: true,
            keepalive: true,
            otp,
            username,
            password: encrypted_password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub debug: Option<String>,
    #[serde(default)]
    pub data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: Option<String>,
}

impl LoginResponse {
    /// Device message explaining a rejected login
    pub fn reason(&self) -> &str {
        self.msg
            .as_deref()
            .filter(|m| !m.is_empty())
            .or(self.debug.as_deref())
            .unwrap_or("")
    }
}

/// Topic subscription sent right after the desktop WebSocket connects
#[derive(Debug, Serialize)]
pub struct SubscribeMessage<'a> {
    pub op: &'static str,
    pub topics: &'a [String],
    /// Epoch milliseconds
    pub ts: i64,
}

impl<'a> SubscribeMessage<'a> {
    pub fn new(topics: &'a [String], ts: i64) -> Self {
        Self {
            op: "subscribe",
            topics,
            ts,
        }
    }
}
