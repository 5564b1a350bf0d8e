//! Graceful shutdown signaling.

use tokio::sync::watch;
use tracing::info;

/// Handle used to trigger a shutdown programmatically.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Triggers shutdown.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Shutdown signal awaited by the serve loop.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Creates a signal triggered manually through the returned handle.
    #[must_use]
    pub fn manual() -> (Self, ShutdownHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { rx }, ShutdownHandle { tx })
    }

    /// Creates a signal triggered by Ctrl-C / SIGINT.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let (signal, handle) = Self::manual();

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                handle.shutdown();
            }
        });

        signal
    }

    /// Waits until shutdown is triggered.
    pub async fn wait(&mut self) {
        // Already triggered before we started waiting.
        if *self.rx.borrow() {
            return;
        }
        let _ = self.rx.changed().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_manual_trigger() {
        let (mut signal, handle) = ShutdownSignal::manual();
        handle.shutdown();

        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("signal should fire");
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let (mut signal, handle) = ShutdownSignal::manual();
        handle.shutdown();
        signal.wait().await;
        // A second wait must not hang.
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("signal should stay fired");
    }

    #[tokio::test]
    async fn test_untriggered_signal_pends() {
        let (mut signal, _handle) = ShutdownSignal::manual();
        let result = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;
        assert!(result.is_err());
    }
}
