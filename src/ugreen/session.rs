//! Authentication Session
//!
//! Login is a two step exchange:
//!
//! 1. `POST /ugreen/v1/verify/check?token=` with the username. The device answers
//!    with an RSA public key in the `x-rsa-token` header (base64 of DER, or PEM).
//! 2. The password is encrypted with RSA PKCS#1 v1.5, base64 encoded and sent to
//!    `POST /ugreen/v1/verify/login`. A `code` of 200 carries the bearer token in
//!    `data.token`.
//!
//! Only one login runs at a time. Callers that queued behind a login which
//! already refreshed the token reuse that token instead of logging in again.

use crate::config::NasConfig;
use crate::error::{ExporterError, Result};
use crate::ugreen::endpoints::{VERIFY_CHECK, VERIFY_LOGIN};
use crate::ugreen::types::{CheckRequest, LoginRequest, LoginResponse, CODE_OK, RSA_TOKEN_HEADER};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::rand_core::OsRng;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use secrecy::{ExposeSecret, SecretString};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

/// Bearer token state shared by the REST client and the keep-alive channel
pub struct AuthSession {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: SecretString,
    otp: bool,
    token: RwLock<Option<SecretString>>,
    login_gate: Mutex<()>,
    login_attempts: AtomicU64,
}

impl AuthSession {
    /// Create a session; a configured seed token is used until the device rejects it
    pub fn new(config: &NasConfig, http: reqwest::Client) -> Self {
        let seed = config
            .token
            .as_ref()
            .filter(|token| !token.expose_secret().trim().is_empty())
            .cloned();

        Self {
            http,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            otp: config.otp,
            token: RwLock::new(seed),
            login_gate: Mutex::new(()),
            login_attempts: AtomicU64::new(0),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current bearer token, if any
    pub async fn token(&self) -> Option<SecretString> {
        self.token.read().await.clone()
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Drop the current token so the next request logs in again
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    /// Drop the token only if it is still `used`.
    ///
    /// Returns `true` if it was dropped; a token installed by a newer login is kept.
    pub async fn invalidate_if(&self, used: &SecretString) -> bool {
        let mut current = self.token.write().await;
        match current.as_ref() {
            Some(token) if token.expose_secret() == used.expose_secret() => {
                *current = None;
                true
            }
            _ => false,
        }
    }

    /// Number of login exchanges performed so far
    pub fn login_attempts(&self) -> u64 {
        self.login_attempts.load(Ordering::SeqCst)
    }

    /// Make sure a token is present, logging in if necessary
    pub async fn authenticate(&self) -> bool {
        if self.has_token().await {
            return true;
        }
        self.login_replacing(None).await
    }

    /// Log in unconditionally (unless a concurrent login just finished)
    pub async fn login(&self) -> bool {
        self.login_replacing(None).await
    }

    /// Log in to replace `stale`.
    ///
    /// If another caller finished a login while this one waited for the gate, or
    /// the stored token already differs from `stale`, no new exchange is made.
    /// Failures are logged and reported as `false`.
    pub async fn login_replacing(&self, stale: Option<&SecretString>) -> bool {
        let seen = self.login_attempts.load(Ordering::SeqCst);
        let _gate = self.login_gate.lock().await;

        if self.login_attempts.load(Ordering::SeqCst) != seen {
            debug!("Login finished while waiting, reusing its result");
            return self.has_token().await;
        }

        if let Some(stale) = stale {
            let current = self.token.read().await;
            if let Some(current) = current.as_ref() {
                if current.expose_secret() != stale.expose_secret() {
                    debug!("Token already replaced, skipping login");
                    return true;
                }
            }
        }

        let outcome = self.exchange().await;
        self.login_attempts.fetch_add(1, Ordering::SeqCst);

        match outcome {
            Ok(token) => {
                *self.token.write().await = Some(token);
                info!("Logged in to UGREEN NAS as '{}'", self.username);
                true
            }
            Err(e) => {
                error!("Login failed: {}", e);
                false
            }
        }
    }

    async fn exchange(&self) -> Result<SecretString> {
        debug!("Requesting login public key");
        let check_url = format!("{}{}?token=", self.base_url, VERIFY_CHECK);
        let response = self
            .http
            .post(&check_url)
            .json(&CheckRequest {
                username: &self.username,
            })
            .send()
            .await?
            .error_for_status()?;

        let header = response
            .headers()
            .get(RSA_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ExporterError::Auth(format!("missing {} header", RSA_TOKEN_HEADER)))?
            .to_string();

        let public_key = parse_public_key(&header)?;
        let encrypted = encrypt_password(&public_key, self.password.expose_secret())?;

        debug!("Sending login request (otp={})", self.otp);
        let login_url = format!("{}{}", self.base_url, VERIFY_LOGIN);
        let login: LoginResponse = self
            .http
            .post(&login_url)
            .json(&LoginRequest::new(&self.username, encrypted, self.otp))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if login.code != Some(CODE_OK) {
            return Err(ExporterError::Auth(format!(
                "device rejected login (code={:?}): {}",
                login.code,
                login.reason()
            )));
        }

        login
            .data
            .and_then(|data| data.token)
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ExporterError::Auth("login succeeded but no token returned".to_string()))
    }
}

/// Decode the `x-rsa-token` header into a public key.
///
/// The header is base64 when possible, raw text otherwise; the key bytes are
/// tried as DER (SPKI, then PKCS#1) before falling back to PEM.
pub fn parse_public_key(header: &str) -> Result<RsaPublicKey> {
    let bytes = BASE64
        .decode(header.trim())
        .unwrap_or_else(|_| header.as_bytes().to_vec());

    if let Ok(key) = RsaPublicKey::from_public_key_der(&bytes) {
        return Ok(key);
    }
    if let Ok(key) = RsaPublicKey::from_pkcs1_der(&bytes) {
        return Ok(key);
    }

    let pem = std::str::from_utf8(&bytes)
        .map_err(|_| ExporterError::Auth("public key is neither DER nor PEM".to_string()))?;
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| ExporterError::Auth(format!("invalid public key: {}", e)))
}

/// RSA PKCS#1 v1.5 encrypt and base64 encode
pub fn encrypt_password(key: &RsaPublicKey, password: &str) -> Result<String> {
    let cipher = key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, password.as_bytes())
        .map_err(|e| ExporterError::Auth(format!("password encryption failed: {}", e)))?;
    Ok(BASE64.encode(cipher))
}
