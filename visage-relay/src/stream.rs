//! Line-delimited pose-frame ingestion from a local async stream

use crate::receiver::FrameSlot;
use crate::shutdown::Shutdown;
use crate::source::FrameSource;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};
use visage_core::MocapFrame;

/// Parse one input line. Blank or malformed lines yield `None`.
pub fn parse_line(line: &str) -> Option<MocapFrame> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match MocapFrame::from_json(line) {
        Ok(frame) => Some(frame),
        Err(e) => {
            debug!("Dropping malformed frame line: {}", e);
            None
        }
    }
}

/// Reads one JSON frame per line until EOF or shutdown
pub struct LineStreamSource<R> {
    name: String,
    reader: R,
    poll_interval: Duration,
}

impl<R> LineStreamSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(name: impl Into<String>, reader: R, poll_interval: Duration) -> Self {
        Self {
            name: name.into(),
            reader,
            poll_interval,
        }
    }
}

impl LineStreamSource<tokio::io::Stdin> {
    pub fn stdin(poll_interval: Duration) -> Self {
        Self::new("stdin", tokio::io::stdin(), poll_interval)
    }
}

#[async_trait]
impl<R> FrameSource for LineStreamSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(self: Box<Self>, slot: FrameSlot, shutdown: Shutdown) {
        let LineStreamSource {
            name,
            reader,
            poll_interval,
        } = *self;
        let mut lines = BufReader::new(reader).lines();
        let mut accepted: u64 = 0;

        loop {
            if shutdown.is_stopped() {
                break;
            }

            // Timeout so the stop flag is re-checked every poll interval
            match tokio::time::timeout(poll_interval, lines.next_line()).await {
                Err(_) => continue,
                Ok(Ok(Some(line))) => {
                    if let Some(frame) = parse_line(&line) {
                        slot.store(frame);
                        accepted += 1;
                    }
                }
                Ok(Ok(None)) => {
                    info!("Frame stream '{}' reached EOF", name);
                    break;
                }
                Ok(Err(e)) => {
                    warn!("Frame stream '{}' read error: {}", name, e);
                    break;
                }
            }
        }

        info!("Frame stream '{}' stopped after {} frames", name, accepted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_core::PoseParam;

    #[test]
    fn test_parse_line() {
        let frame = parse_line(r#"  {"t": 1.5, "pts": {"mouth_open": 0.4}}  "#).unwrap();
        assert_eq!(frame.t, 1.5);
        assert_eq!(frame.pose[PoseParam::MouthOpen], 0.4);
        assert_eq!(frame.pose[PoseParam::LeftEyeOpen], 1.0);
    }

    #[test]
    fn test_parse_line_drops_garbage() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("{not json").is_none());
        assert!(parse_line("42").is_none());
    }

    #[test]
    fn test_source_runs_to_eof() {
        let input: &'static [u8] = b"{\"t\": 1.0}\nnot json\n{\"t\": 2.0, \"pts\": {\"mouth_wide\": 0.3}}\n";
        let slot = FrameSlot::new();
        let (_trigger, shutdown) = crate::shutdown::channel();
        let source = Box::new(LineStreamSource::new("bytes", input, Duration::from_millis(50)));
        assert_eq!(source.name(), "bytes");

        tokio_test::block_on(source.run(slot.clone(), shutdown));
        let frame = slot.load();
        assert_eq!(frame.t, 2.0);
        assert_eq!(frame.pose[PoseParam::MouthWide], 0.3);
    }

    #[test]
    fn test_parse_line_without_pts_is_neutral() {
        let frame = parse_line(r#"{"t": 3.0}"#).unwrap();
        assert_eq!(frame.t, 3.0);
        assert_eq!(frame.pose, visage_core::PoseVector::neutral());
    }
}
