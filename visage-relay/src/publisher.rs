//! Relay producer: pushes locally generated frames to a relay server
//!
//! Frames are published into a `watch` slot, so a slow or reconnecting link
//! only ever sends the newest frame; stale ones are skipped.

use crate::backoff::Backoff;
use crate::client::{connect_relay, parse_relay_url, Role};
use crate::error::RelayError;
use crate::shutdown::Shutdown;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;
use visage_core::{MocapFrame, RelayConfig};

/// Handle used to publish frames to a running `RelayPublisher`
#[derive(Debug, Clone)]
pub struct FramePublisher {
    tx: Arc<watch::Sender<Option<MocapFrame>>>,
}

impl FramePublisher {
    /// Replace the pending frame
    pub fn publish(&self, frame: MocapFrame) {
        self.tx.send_replace(Some(frame));
    }
}

pub struct RelayPublisher {
    url: Url,
    config: RelayConfig,
    rx: watch::Receiver<Option<MocapFrame>>,
}

impl RelayPublisher {
    pub fn new(url: &str, config: RelayConfig) -> Result<(Self, FramePublisher), RelayError> {
        let url = parse_relay_url(url)?;
        let (tx, rx) = watch::channel(None);
        Ok((Self { url, config, rx }, FramePublisher { tx: Arc::new(tx) }))
    }

    /// Spawn the publishing loop on the current runtime
    pub fn spawn(self, shutdown: Shutdown) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(mut self, mut shutdown: Shutdown) {
        let mut backoff = Backoff::from_config(&self.config);

        while !shutdown.is_stopped() {
            match self.session(&shutdown, &mut backoff).await {
                Ok(()) => break,
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!("Relay publisher {}: {}; reconnecting in {:?}", self.url, e, delay);
                    if shutdown.sleep(delay).await {
                        break;
                    }
                }
            }
        }

        info!("Relay publisher for {} stopped", self.url);
    }

    async fn session(&mut self, shutdown: &Shutdown, backoff: &mut Backoff) -> Result<(), RelayError> {
        let Some(ws) =
            connect_relay(self.url.as_str(), self.config.connect_timeout(), shutdown).await?
        else {
            return Ok(());
        };

        info!("Publishing to relay {}", self.url);
        backoff.reset();
        let (mut sink, mut incoming) = ws.split();
        sink.send(Message::Text(Role::Producer.handshake()))
            .await
            .map_err(|e| RelayError::Network(format!("Handshake failed: {}", e)))?;

        // Re-send whatever is pending after a reconnect
        self.rx.mark_changed();

        loop {
            if shutdown.is_stopped() {
                let _ = sink.close().await;
                return Ok(());
            }

            tokio::select! {
                changed = tokio::time::timeout(self.config.poll_interval(), self.rx.changed()) => {
                    match changed {
                        Err(_) => continue,
                        // Every FramePublisher handle dropped: nothing more to send
                        Ok(Err(_)) => {
                            let _ = sink.close().await;
                            return Ok(());
                        }
                        Ok(Ok(())) => {}
                    }
                    let frame = *self.rx.borrow_and_update();
                    if let Some(frame) = frame {
                        let json = frame.to_json()?;
                        sink.send(Message::Text(json))
                            .await
                            .map_err(|e| RelayError::Network(format!("Send failed: {}", e)))?;
                    }
                }
                msg = incoming.next() => {
                    match msg {
                        None => return Err(RelayError::Network("Relay closed the stream".to_string())),
                        Some(Err(e)) => return Err(RelayError::Network(e.to_string())),
                        Some(Ok(Message::Close(frame))) => {
                            debug!("Relay sent close: {:?}", frame);
                            return Err(RelayError::Network("Relay closed the connection".to_string()));
                        }
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_url() {
        assert!(matches!(
            RelayPublisher::new("tcp://localhost:1", RelayConfig::default()),
            Err(RelayError::Config(_))
        ));
    }

    #[test]
    fn test_latest_frame_wins() {
        let (publisher, handle) = RelayPublisher::new("ws://localhost:3000", RelayConfig::default()).unwrap();
        handle.publish(MocapFrame::new(1.0, Default::default()));
        handle.publish(MocapFrame::new(2.0, Default::default()));
        let pending = *publisher.rx.borrow();
        assert_eq!(pending.map(|f| f.t), Some(2.0));
    }
}
