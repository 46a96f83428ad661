//! Shutdown coordination for the engine.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Triggering is sticky: listeners that subscribe late still observe it.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Request shutdown. Safe to call from any task, any number of times.
    /// Returns true only for the call that flipped the state.
    pub fn trigger(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half handed to each serving task.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolve once shutdown has been triggered.
    pub async fn wait(&mut self) {
        // Err means the coordinator is gone, which also means stop.
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_once() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let mut listener = shutdown.subscribe();
        tokio::time::timeout(Duration::from_secs(1), listener.wait())
            .await
            .expect("listener should observe earlier trigger");
    }

    #[tokio::test]
    async fn test_waiting_listener_wakes() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();

        let handle = tokio::spawn(async move { listener.wait().await });
        tokio::task::yield_now().await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("listener should wake")
            .unwrap();
    }
}
