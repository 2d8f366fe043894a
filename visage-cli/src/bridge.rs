// Emote bridge: emote-vector WebSocket in, mocap frames out to a relay

use anyhow::Context;
use futures_util::StreamExt;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use visage_anim::{emote_to_pose, EmoteVector};
use visage_core::{MocapFrame, RelayConfig};
use visage_relay::{connect_relay, parse_relay_url, Backoff, FramePublisher, RelayPublisher, Shutdown};

/// Wall-clock seconds since the Unix epoch
fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

fn timestamp(value: Option<&Value>) -> Option<f64> {
    let t = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    t.filter(|t| t.is_finite())
}

/// Map one emote message to a frame. Non-JSON input yields `None`; a missing
/// or unreadable `t` is replaced by the current time.
pub fn emote_frame(text: &str) -> Option<MocapFrame> {
    let value: Value = serde_json::from_str(text).ok()?;
    if !value.is_object() {
        return None;
    }
    let emote = EmoteVector::from_json(&value);
    let t = timestamp(value.get("t")).unwrap_or_else(unix_now);
    Some(MocapFrame::new(t, emote_to_pose(&emote)))
}

/// Run until shutdown: publish to `out_url`, consume emotes from `in_url`
pub async fn run(in_url: &str, out_url: &str, config: RelayConfig, shutdown: Shutdown) -> anyhow::Result<()> {
    let in_url = parse_relay_url(in_url).context("Invalid --in URL")?;
    let (publisher, frames) = RelayPublisher::new(out_url, config.clone()).context("Invalid --out URL")?;
    let publishing = publisher.spawn(shutdown.clone());

    consume(in_url.as_str(), &frames, &config, shutdown).await;

    drop(frames);
    let _ = publishing.await;
    Ok(())
}

async fn consume(url: &str, frames: &FramePublisher, config: &RelayConfig, mut shutdown: Shutdown) {
    let mut backoff = Backoff::from_config(config);

    while !shutdown.is_stopped() {
        match session(url, frames, config, &shutdown, &mut backoff).await {
            Ok(()) => break,
            Err(e) => {
                let delay = backoff.next_delay();
                warn!("Emote source {}: {}; reconnecting in {:?}", url, e, delay);
                if shutdown.sleep(delay).await {
                    break;
                }
            }
        }
    }
    info!("Emote bridge stopped");
}

async fn session(
    url: &str,
    frames: &FramePublisher,
    config: &RelayConfig,
    shutdown: &Shutdown,
    backoff: &mut Backoff,
) -> anyhow::Result<()> {
    let Some(mut ws) = connect_relay(url, config.connect_timeout(), shutdown)
        .await
        .context("Failed to connect to emote source")?
    else {
        return Ok(());
    };

    info!("Reading emotes from {}", url);
    backoff.reset();

    loop {
        if shutdown.is_stopped() {
            let _ = ws.close(None).await;
            return Ok(());
        }

        let msg = match tokio::time::timeout(config.poll_interval(), ws.next()).await {
            Err(_) => continue,
            Ok(None) => anyhow::bail!("Emote source closed the stream"),
            Ok(Some(msg)) => msg.context("Emote source read failed")?,
        };

        let frame = match msg {
            Message::Text(text) => emote_frame(&text),
            Message::Binary(data) => std::str::from_utf8(&data).ok().and_then(emote_frame),
            Message::Close(_) => anyhow::bail!("Emote source closed the connection"),
            _ => None,
        };

        match frame {
            Some(frame) => frames.publish(frame),
            None => debug!("Skipping unreadable emote message"),
        }
    }
}
