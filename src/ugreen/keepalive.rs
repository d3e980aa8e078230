//! Desktop WebSocket keep-alive
//!
//! The appliance expires bearer tokens of clients that do not hold its desktop
//! WebSocket open. This channel keeps one connection alive next to the REST
//! traffic:
//!
//! - connects to `/ugreen/v1/desktop/ws?client_id=<uuid>-WEB&lang=<lang>&token=<bearer>`
//! - subscribes to the configured topics right after connecting
//! - pings every heartbeat interval and drops the connection when nothing was
//!   received for longer than heartbeat + 5 seconds
//! - reconnects with exponential backoff, reset after every successful connect
//! - idles while no token is available and checks again on a short interval
//! - closes the socket within the grace period once shutdown is signalled

use crate::config::{KeepAliveConfig, NasConfig};
use crate::error::{ExporterError, Result};
use crate::ugreen::endpoints::DESKTOP_WS;
use crate::ugreen::session::AuthSession;
use crate::ugreen::types::SubscribeMessage;
use futures_util::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Exponential reconnect delay with a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// Return the delay to wait now and double the next one
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Why a connected session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Shutdown,
    ClosedByPeer,
    TokenLost,
}

pub struct KeepAliveChannel {
    session: Arc<AuthSession>,
    ws_base_url: String,
    origin: String,
    accept_invalid_certs: bool,
    settings: KeepAliveConfig,
}

impl KeepAliveChannel {
    pub fn new(nas: &NasConfig, settings: &KeepAliveConfig, session: Arc<AuthSession>) -> Self {
        Self {
            session,
            ws_base_url: nas.websocket_base_url(),
            origin: nas.base_url(),
            accept_invalid_certs: nas.use_tls && !nas.verify_ssl,
            settings: settings.clone(),
        }
    }

    /// WebSocket URL for `token` with a fresh client id
    pub fn url(&self, token: &str) -> String {
        format!(
            "{}{}?client_id={}-WEB&lang={}&token={}",
            self.ws_base_url,
            DESKTOP_WS,
            uuid::Uuid::new_v4(),
            self.settings.lang,
            token
        )
    }

    /// Keep the channel alive until `shutdown` flips to `true` or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut backoff = Backoff::new(
            Duration::from_secs(self.settings.backoff_initial_seconds),
            Duration::from_secs(self.settings.backoff_max_seconds),
        );
        let idle_retry = Duration::from_secs(self.settings.idle_retry_seconds);

        info!("Keep-alive channel started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            let Some(token) = self.session.token().await else {
                debug!("No token available, keep-alive idle");
                if wait_or_shutdown(idle_retry, &mut shutdown).await {
                    break;
                }
                continue;
            };

            match self.connect(token.expose_secret()).await {
                Ok(stream) => {
                    info!("Keep-alive WebSocket connected");
                    backoff.reset();
                    match self.hold(stream, &mut shutdown).await {
                        Ok(SessionEnd::Shutdown) => break,
                        Ok(SessionEnd::TokenLost) => {
                            debug!("Token dropped, closing keep-alive WebSocket");
                            continue;
                        }
                        Ok(SessionEnd::ClosedByPeer) => {
                            warn!("Keep-alive WebSocket closed by the NAS");
                        }
                        Err(e) => warn!("Keep-alive WebSocket dropped: {}", e),
                    }
                }
                Err(e) => warn!("Keep-alive connect failed: {}", e),
            }

            let delay = backoff.next_delay();
            debug!("Reconnecting keep-alive in {:?}", delay);
            if wait_or_shutdown(delay, &mut shutdown).await {
                break;
            }
        }
        info!("Keep-alive channel stopped");
    }

    async fn connect(&self, token: &str) -> Result<WsStream> {
        let mut request = self.url(token).into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            "Origin",
            HeaderValue::from_str(&self.origin)
                .map_err(|e| ExporterError::Config(format!("invalid origin: {}", e)))?,
        );
        headers.insert("Pragma", HeaderValue::from_static("no-cache"));
        headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));

        let connector = if self.accept_invalid_certs {
            // Appliances ship self-signed certificates
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| ExporterError::Config(e.to_string()))?;
            Some(tokio_tungstenite::Connector::NativeTls(tls))
        } else {
            None
        };

        let (stream, _) =
            tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector)
                .await?;
        Ok(stream)
    }

    async fn hold(
        &self,
        stream: WsStream,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd> {
        let (mut write, mut read) = stream.split();

        let subscribe = SubscribeMessage::new(
            &self.settings.topics,
            chrono::Utc::now().timestamp_millis(),
        );
        write
            .send(Message::Text(serde_json::to_string(&subscribe)?.into()))
            .await?;
        debug!("Subscribed to {:?}", self.settings.topics);

        let heartbeat_every = Duration::from_secs(self.settings.heartbeat_seconds);
        let idle_limit = heartbeat_every + Duration::from_secs(5);
        let grace = Duration::from_secs(self.settings.shutdown_grace_seconds);

        let mut heartbeat = tokio::time::interval(heartbeat_every);
        heartbeat.tick().await;
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        let close = async {
                            let _ = write.send(Message::Close(None)).await;
                            let _ = write.close().await;
                        };
                        if tokio::time::timeout(grace, close).await.is_err() {
                            warn!("Keep-alive close did not finish within {:?}", grace);
                        }
                        return Ok(SessionEnd::Shutdown);
                    }
                }
                _ = heartbeat.tick() => {
                    if !self.session.has_token().await {
                        let _ = tokio::time::timeout(grace, write.close()).await;
                        return Ok(SessionEnd::TokenLost);
                    }
                    if last_seen.elapsed() > idle_limit {
                        return Err(ExporterError::Api(format!(
                            "no keep-alive traffic for {:?}",
                            last_seen.elapsed()
                        )));
                    }
                    write.send(Message::Ping(Vec::new().into())).await?;
                }
                message = read.next() => {
                    match message {
                        None | Some(Ok(Message::Close(_))) => return Ok(SessionEnd::ClosedByPeer),
                        Some(Err(e)) => return Err(e.into()),
                        Some(Ok(_)) => last_seen = Instant::now(),
                    }
                }
            }
        }
    }
}

/// Sleep for `delay`; returns `true` if shutdown was signalled first
async fn wait_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}
