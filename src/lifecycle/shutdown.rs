//! Shutdown coordination for the sidecar.
//!
//! A stop request is a latched flag, not a message: listeners that subscribe
//! after `trigger` (the control loop is built late in startup) still see it.

use std::sync::Arc;

use tokio::sync::watch;

/// Sending side, shared by the signal handler and startup.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

/// Receiving side held by the control loop and the HTTP server.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Request shutdown. Idempotent; stays set for every current and future
    /// subscriber.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
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

impl ShutdownSignal {
    /// Resolve once shutdown is requested. Never resolves if every
    /// [`Shutdown`] handle is dropped without triggering.
    pub async fn triggered(&mut self) {
        let requested = self.rx.wait_for(|stop| *stop).await.is_ok();
        if !requested {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_trigger_reaches_every_subscriber() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.clone().subscribe();

        shutdown.trigger();

        timeout(Duration::from_secs(1), a.triggered()).await.unwrap();
        timeout(Duration::from_secs(1), b.triggered()).await.unwrap();
    }

    #[tokio::test]
    async fn test_trigger_before_subscribe_is_not_lost() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(shutdown.is_triggered());

        let mut late = shutdown.subscribe();
        timeout(Duration::from_millis(200), late.triggered())
            .await
            .expect("late subscriber must see an earlier trigger");
    }

    #[tokio::test]
    async fn test_dropped_coordinator_never_fires() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        drop(shutdown);

        assert!(timeout(Duration::from_millis(100), signal.triggered()).await.is_err());
    }

    #[tokio::test]
    async fn test_repeated_trigger_is_harmless() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        shutdown.trigger();
        shutdown.trigger();

        timeout(Duration::from_secs(1), signal.triggered()).await.unwrap();
        // Still set on a second wait.
        timeout(Duration::from_secs(1), signal.triggered()).await.unwrap();
    }
}
