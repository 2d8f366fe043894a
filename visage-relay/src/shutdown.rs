//! Shared cancellation signal for ingestion tasks

use std::time::Duration;
use tokio::sync::watch;

/// Create a linked trigger/listener pair
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Owner side: flips the signal
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signal every listener. Safe to call any number of times.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Another listener on this signal
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Task side: observes the signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// A dropped trigger counts as stopped
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Wait until stopped
    pub async fn stopped(&mut self) {
        while !self.is_stopped() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Sleep for `duration` unless stopped first; returns `true` when stopped
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.stopped() => {}
        }
        self.is_stopped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (trigger, shutdown) = channel();
        assert!(!shutdown.is_stopped());
        trigger.stop();
        trigger.stop();
        assert!(shutdown.is_stopped());
        assert!(trigger.subscribe().is_stopped());
    }

    #[tokio::test]
    async fn test_sleep_interrupted() {
        let (trigger, mut shutdown) = channel();
        let handle = tokio::spawn(async move { shutdown.sleep(Duration::from_secs(30)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.stop();
        let stopped = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(stopped);
    }

    #[tokio::test]
    async fn test_dropped_trigger_counts_as_stopped() {
        let (trigger, mut shutdown) = channel();
        drop(trigger);
        tokio::time::timeout(Duration::from_secs(1), shutdown.stopped())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sleep_elapses() {
        let (_trigger, mut shutdown) = channel();
        assert!(!shutdown.sleep(Duration::from_millis(10)).await);
    }
}
