//! UGREEN REST Client
//!
//! Every authenticated call carries the bearer token as a `token` query
//! parameter. A call follows a fixed sequence:
//!
//! 1. no token yet: log in first, fail the call if that fails
//! 2. send the request
//! 3. `code == 1024`: log in again and send the request exactly once more
//! 4. return the second response as is, even if it is another 1024
//!
//! A transport failure drops the token it was sent with, so the next call
//! logs in again.
//!
//! # Example
//!
//! ```no_run
//! use ugreen_exporter::config::NasConfig;
//! use ugreen_exporter::ugreen::RequestClient;
//! use secrecy::SecretString;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = NasConfig {
//!     host: "nas.local".to_string(),
//!     port: 9999,
//!     username: "admin".to_string(),
//!     password: SecretString::from("secret"),
//!     token: None,
//!     use_tls: false,
//!     verify_ssl: false,
//!     otp: false,
//!     request_timeout_seconds: 10,
//! };
//!
//! let client = RequestClient::new(&config)?;
//! let sysinfo = client.get("/ugreen/v1/sysinfo/machine/common").await;
//! # Ok(())
//! # }
//! ```

use crate::config::NasConfig;
use crate::entities::RequestMethod;
use crate::error::{ExporterError, Result};
use crate::ugreen::session::AuthSession;
use crate::ugreen::types::{response_code, CODE_TOKEN_EXPIRED};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Read access to the appliance, the seam used by discovery and fetching
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// GET `endpoint` and return the decoded JSON envelope
    async fn fetch_json(&self, endpoint: &str) -> Result<Value>;
}

/// Build the HTTP client shared by login and API calls
pub fn http_client(config: &NasConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .danger_accept_invalid_certs(config.use_tls && !config.verify_ssl)
        .build()?;
    Ok(client)
}

/// Append the bearer token to a URL that may already have a query string
pub fn with_token(url: &str, token: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", url, separator, token)
}

pub struct RequestClient {
    http: reqwest::Client,
    session: Arc<AuthSession>,
}

impl RequestClient {
    pub fn new(config: &NasConfig) -> Result<Self> {
        let http = http_client(config)?;
        let session = Arc::new(AuthSession::new(config, http.clone()));
        Ok(Self { http, session })
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// Issue one authenticated call, applying the expired-token retry.
    ///
    /// Transport failures and undecodable bodies are returned as errors; device
    /// codes other than 1024 are left for the caller to interpret.
    pub async fn request(
        &self,
        method: RequestMethod,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<Value> {
        let token = self.current_token().await?;
        let response = self.send_or_drop(method, endpoint, payload, &token).await?;

        if response_code(&response) != Some(CODE_TOKEN_EXPIRED) {
            return Ok(response);
        }

        warn!("Token expired on {} {}, logging in again", method, endpoint);
        if !self.session.login_replacing(Some(&token)).await {
            self.session.invalidate().await;
            return Err(ExporterError::Auth(
                "re-login after expired token failed".to_string(),
            ));
        }
        let token = self.current_token().await?;
        self.send_or_drop(method, endpoint, payload, &token).await
    }

    /// GET returning `{}` on any failure
    pub async fn get(&self, endpoint: &str) -> Value {
        self.request_or_empty(RequestMethod::Get, endpoint, None)
            .await
    }

    /// POST returning `{}` on any failure
    pub async fn post(&self, endpoint: &str, payload: Option<&Value>) -> Value {
        self.request_or_empty(RequestMethod::Post, endpoint, payload)
            .await
    }

    async fn request_or_empty(
        &self,
        method: RequestMethod,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Value {
        match self.request(method, endpoint, payload).await {
            Ok(response) => response,
            Err(e) => {
                error!("{} {} failed: {}", method, endpoint, e);
                json!({})
            }
        }
    }

    async fn current_token(&self) -> Result<SecretString> {
        if let Some(token) = self.session.token().await {
            return Ok(token);
        }
        if !self.session.login_replacing(None).await {
            return Err(ExporterError::Auth("no token and login failed".to_string()));
        }
        self.session
            .token()
            .await
            .ok_or_else(|| ExporterError::Auth("no token after login".to_string()))
    }

    async fn send_or_drop(
        &self,
        method: RequestMethod,
        endpoint: &str,
        payload: Option<&Value>,
        token: &SecretString,
    ) -> Result<Value> {
        let result = self.send(method, endpoint, payload, token).await;
        if let Err(ExporterError::Http(_)) = &result {
            if self.session.invalidate_if(token).await {
                debug!("Transport failure on {} {}, token dropped", method, endpoint);
            }
        }
        result
    }

    async fn send(
        &self,
        method: RequestMethod,
        endpoint: &str,
        payload: Option<&Value>,
        token: &SecretString,
    ) -> Result<Value> {
        let url = format!("{}{}", self.session.base_url(), endpoint);
        let url = with_token(&url, token.expose_secret());
        debug!("{} {}", method, endpoint);

        let request = match method {
            RequestMethod::Get => self.http.get(&url),
            RequestMethod::Post => {
                let empty = json!({});
                self.http.post(&url).json(payload.unwrap_or(&empty))
            }
        };

        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl DeviceApi for RequestClient {
    async fn fetch_json(&self, endpoint: &str) -> Result<Value> {
        self.request(RequestMethod::Get, endpoint, None).await
    }
}
