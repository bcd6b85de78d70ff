//! Cooperative shutdown signal shared by the resolver, fetchers and pipeline

use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable cancellation token
///
/// Every clone observes the same signal. Once triggered it stays triggered.
#[derive(Debug, Clone)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    /// Creates a new, untriggered token
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Triggers the signal for every clone of this token
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once the signal has been triggered
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Completes when the signal is triggered
    pub async fn triggered(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|triggered| *triggered).await.is_err() {
            // The sender lives as long as any clone, so this never resolves.
            std::future::pending::<()>().await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_token_is_not_triggered() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
    }

    #[test]
    fn test_trigger_is_seen_by_clones() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();
        shutdown.trigger();
        assert!(clone.is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_wakes_waiters() {
        let shutdown = Shutdown::new();
        let waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.triggered().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_triggered_returns_immediately_when_already_set() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_millis(100), shutdown.triggered())
            .await
            .expect("already triggered");
    }
}
