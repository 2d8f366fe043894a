//! Thread-safe single-slot frame store and its ingestion tasks
//!
//! Writers replace the slot wholesale; readers clone an `Arc` out of it.
//! No lock is ever held across an `.await`.

use crate::error::RelayError;
use crate::shutdown::{self, ShutdownTrigger};
use crate::source::FrameSource;
use crate::stream::LineStreamSource;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use visage_core::{MocapFrame, RelayConfig};

/// Shared handle to the latest frame
#[derive(Debug, Clone)]
pub struct FrameSlot {
    inner: Arc<RwLock<Arc<MocapFrame>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(MocapFrame::neutral()))),
        }
    }

    /// Atomically replace the stored frame
    pub fn store(&self, frame: MocapFrame) {
        let frame = Arc::new(frame);
        *self.inner.write() = frame;
    }

    /// Snapshot of the stored frame
    pub fn load(&self) -> Arc<MocapFrame> {
        self.inner.read().clone()
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest-frame store fed by background ingestion tasks
pub struct FrameReceiver {
    slot: FrameSlot,
    trigger: ShutdownTrigger,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    config: RelayConfig,
}

impl FrameReceiver {
    pub fn new(config: RelayConfig) -> Self {
        let (trigger, _) = shutdown::channel();
        Self {
            slot: FrameSlot::new(),
            trigger,
            tasks: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Programmatic frame injection
    pub fn push(&self, frame: MocapFrame) {
        self.slot.store(frame);
    }

    /// Most recent frame; neutral at t = 0 until something arrives
    pub fn latest(&self) -> Arc<MocapFrame> {
        self.slot.load()
    }

    pub fn slot(&self) -> FrameSlot {
        self.slot.clone()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Spawn a source on the current tokio runtime.
    ///
    /// A stopped receiver cannot be restarted: the source is dropped with a
    /// warning and `false` is returned.
    pub fn start(&self, source: Box<dyn FrameSource>) -> bool {
        let name = source.name().to_string();
        if self.trigger.is_stopped() {
            warn!("Frame receiver already stopped; not starting '{}'", name);
            return false;
        }
        let slot = self.slot.clone();
        let shutdown = self.trigger.subscribe();
        info!("Starting frame source '{}'", name);

        let handle = tokio::spawn(async move {
            source.run(slot, shutdown).await;
            debug!("Frame source '{}' exited", name);
        });
        self.tasks.lock().push(handle);
        true
    }

    /// Ingest line-delimited frames from `reader`
    pub fn start_stream<R>(&self, name: &str, reader: R)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let source = LineStreamSource::new(name, reader, self.config.poll_interval());
        self.start(Box::new(source));
    }

    /// Ingest line-delimited frames from stdin
    pub fn start_stdin(&self) {
        self.start(Box::new(LineStreamSource::stdin(self.config.poll_interval())));
    }

    /// Connect to a relay as a viewer.
    ///
    /// Fails immediately on an invalid URL or when relay support is compiled
    /// out; transport failures after that are retried forever.
    pub fn start_relay(&self, url: &str) -> Result<(), RelayError> {
        #[cfg(feature = "relay")]
        {
            let client = crate::client::RelayClient::new(url, self.config.clone())?;
            self.start(Box::new(client));
            Ok(())
        }

        #[cfg(not(feature = "relay"))]
        {
            Err(RelayError::Config(format!(
                "Cannot connect to relay '{}': relay support not enabled. Enable 'relay' feature.",
                url
            )))
        }
    }

    /// Signal every task to exit. Idempotent.
    pub fn stop(&self) {
        if !self.trigger.is_stopped() {
            info!("Stopping frame receiver");
        }
        self.trigger.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.trigger.is_stopped()
    }

    /// Number of tasks still running
    pub fn active_tasks(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|handle| !handle.is_finished());
        tasks.len()
    }

    /// Wait for every spawned task to finish
    pub async fn join(&self) {
        let handles: Vec<_> = self.tasks.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}

impl Drop for FrameReceiver {
    fn drop(&mut self) {
        self.trigger.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use visage_core::{PoseParam, PoseVector};

    #[test]
    fn test_latest_before_any_frame() {
        let receiver = FrameReceiver::default();
        let frame = receiver.latest();
        assert_eq!(frame.t, 0.0);
        assert_eq!(frame.pose, PoseVector::neutral());
    }

    #[test]
    fn test_push_overwrites() {
        let receiver = FrameReceiver::default();
        receiver.push(MocapFrame::new(1.0, PoseVector::neutral().with(PoseParam::MouthOpen, 0.2)));
        receiver.push(MocapFrame::new(2.0, PoseVector::neutral().with(PoseParam::MouthOpen, 0.7)));
        let frame = receiver.latest();
        assert_eq!(frame.t, 2.0);
        assert_eq!(frame.pose[PoseParam::MouthOpen], 0.7);
    }

    #[test]
    fn test_snapshot_is_stable() {
        let receiver = FrameReceiver::default();
        let before = receiver.latest();
        receiver.push(MocapFrame::new(5.0, PoseVector::neutral()));
        assert_eq!(before.t, 0.0);
        assert_eq!(receiver.latest().t, 5.0);
    }

    #[test]
    fn test_stop_idempotent() {
        let receiver = FrameReceiver::default();
        receiver.stop();
        receiver.stop();
        assert!(receiver.is_stopped());
    }

    #[tokio::test]
    async fn test_stopped_receiver_does_not_start_sources() {
        let receiver = FrameReceiver::default();
        receiver.stop();
        let source = LineStreamSource::new("late", &b"{\"t\": 1.0, \"pts\": {}}\n"[..], Duration::from_millis(10));
        assert!(!receiver.start(Box::new(source)));
        receiver.start_stream("late", tokio::io::empty());
        assert_eq!(receiver.active_tasks(), 0);
        assert_eq!(receiver.latest().t, 0.0);
    }

    #[tokio::test]
    async fn test_stream_ingestion() {
        let input = b"{\"t\": 1.0, \"pts\": {\"mouth_smile\": 0.5}}\n\ngarbage\n{\"t\": 2.0, \"pts\": {\"head_yaw\": 0.1}}\n";
        let receiver = FrameReceiver::default();
        receiver.start_stream("test", &input[..]);
        tokio::time::timeout(Duration::from_secs(2), receiver.join())
            .await
            .unwrap();

        let frame = receiver.latest();
        assert_eq!(frame.t, 2.0);
        assert_eq!(frame.pose[PoseParam::HeadYaw], 0.1);
        assert_eq!(frame.pose[PoseParam::MouthSmile], 0.0);
    }

    #[tokio::test]
    async fn test_stop_ends_blocked_stream() {
        let (_writer, reader) = tokio::io::duplex(64);
        let receiver = FrameReceiver::default();
        receiver.start_stream("idle", reader);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(receiver.active_tasks(), 1);

        receiver.stop();
        tokio::time::timeout(Duration::from_millis(500), receiver.join())
            .await
            .unwrap();
        assert_eq!(receiver.active_tasks(), 0);
    }

    #[cfg(not(feature = "relay"))]
    #[test]
    fn test_relay_disabled_is_config_error() {
        let receiver = FrameReceiver::default();
        assert!(matches!(
            receiver.start_relay("ws://localhost:3000"),
            Err(RelayError::Config(_))
        ));
    }

    #[cfg(feature = "relay")]
    #[test]
    fn test_invalid_relay_url_is_config_error() {
        let receiver = FrameReceiver::default();
        assert!(matches!(
            receiver.start_relay("http://localhost:3000"),
            Err(RelayError::Config(_))
        ));
        assert!(matches!(receiver.start_relay("not a url"), Err(RelayError::Config(_))));
    }
}
