//! Relay viewer client
//!
//! Connects to a relay server, announces itself as a viewer and stores every
//! frame the relay forwards. Any transport failure triggers a reconnect under
//! capped exponential backoff, forever, until shutdown.

use crate::backoff::Backoff;
use crate::error::RelayError;
use crate::receiver::FrameSlot;
use crate::shutdown::Shutdown;
use crate::source::FrameSource;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;
use visage_core::{MocapFrame, RelayConfig};

/// First message a client sends to the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Viewer => "viewer",
        }
    }

    pub fn handshake(self) -> String {
        serde_json::json!({ "role": self.as_str() }).to_string()
    }
}

/// Validate a relay URL: must parse and use ws:// or wss://
pub fn parse_relay_url(url: &str) -> Result<Url, RelayError> {
    let parsed = Url::parse(url)
        .map_err(|e| RelayError::Config(format!("Invalid relay URL '{}': {}", url, e)))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        other => Err(RelayError::Config(format!(
            "Invalid relay URL '{}': scheme must be ws or wss, got '{}'",
            url, other
        ))),
    }
}

pub type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open a WebSocket to `url`, failing after `timeout`.
///
/// Returns `Ok(None)` as soon as `shutdown` fires, even mid-handshake.
pub async fn connect_relay(
    url: &str,
    timeout: Duration,
    shutdown: &Shutdown,
) -> Result<Option<RelayStream>, RelayError> {
    let mut stop = shutdown.clone();
    tokio::select! {
        _ = stop.stopped() => Ok(None),
        result = tokio::time::timeout(timeout, connect_async(url)) => {
            let (ws, _) = result
                .map_err(|_| RelayError::Network("Relay connection timed out".to_string()))?
                .map_err(|e| RelayError::Network(format!("Failed to connect to relay: {}", e)))?;
            Ok(Some(ws))
        }
    }
}

/// Decode a relayed message into a frame.
///
/// Only messages carrying a `pts` object count as frames; anything else the
/// relay sends (acks, status) is ignored.
pub fn parse_relay_message(text: &str) -> Option<MocapFrame> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            trace!("Ignoring non-JSON relay message: {}", e);
            return None;
        }
    };
    if !value.get("pts").map_or(false, Value::is_object) {
        trace!("Ignoring relay message without pts");
        return None;
    }
    match MocapFrame::from_value(value) {
        Ok(frame) => Some(frame),
        Err(e) => {
            debug!("Dropping malformed relay frame: {}", e);
            None
        }
    }
}

pub struct RelayClient {
    url: Url,
    config: RelayConfig,
}

impl RelayClient {
    pub fn new(url: &str, config: RelayConfig) -> Result<Self, RelayError> {
        Ok(Self {
            url: parse_relay_url(url)?,
            config,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// One connection lifetime. Returns `Ok` on clean close or shutdown.
    async fn session(
        &self,
        slot: &FrameSlot,
        shutdown: &Shutdown,
        backoff: &mut Backoff,
    ) -> Result<(), RelayError> {
        let Some(mut ws) =
            connect_relay(self.url.as_str(), self.config.connect_timeout(), shutdown).await?
        else {
            return Ok(());
        };

        info!("Connected to relay {}", self.url);
        backoff.reset();
        ws.send(Message::Text(Role::Viewer.handshake()))
            .await
            .map_err(|e| RelayError::Network(format!("Handshake failed: {}", e)))?;

        loop {
            if shutdown.is_stopped() {
                let _ = ws.close(None).await;
                return Ok(());
            }

            let msg = match tokio::time::timeout(self.config.poll_interval(), ws.next()).await {
                Err(_) => continue,
                Ok(None) => return Err(RelayError::Network("Relay closed the stream".to_string())),
                Ok(Some(Err(e))) => return Err(RelayError::Network(e.to_string())),
                Ok(Some(Ok(msg))) => msg,
            };

            match msg {
                Message::Text(text) => {
                    if let Some(frame) = parse_relay_message(&text) {
                        slot.store(frame);
                    }
                }
                Message::Binary(data) => {
                    if let Some(frame) = std::str::from_utf8(&data).ok().and_then(parse_relay_message) {
                        slot.store(frame);
                    }
                }
                Message::Close(frame) => {
                    debug!("Relay sent close: {:?}", frame);
                    return Err(RelayError::Network("Relay closed the connection".to_string()));
                }
                _ => {}
            }
        }
    }
}

#[async_trait]
impl FrameSource for RelayClient {
    fn name(&self) -> &str {
        "relay"
    }

    async fn run(self: Box<Self>, slot: FrameSlot, mut shutdown: Shutdown) {
        let mut backoff = Backoff::from_config(&self.config);

        while !shutdown.is_stopped() {
            match self.session(&slot, &shutdown, &mut backoff).await {
                Ok(()) => break,
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!("Relay {}: {}; reconnecting in {:?}", self.url, e, delay);
                    if shutdown.sleep(delay).await {
                        break;
                    }
                }
            }
        }

        info!("Relay client for {} stopped", self.url);
    }
}
