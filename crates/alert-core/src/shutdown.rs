//! Interruptible waits driven by a process-wide shutdown signal.

use std::time::Duration;

use tokio::sync::watch;

/// Fires the shutdown signal. Held by whoever listens for OS signals.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Request shutdown. Every [`Shutdown`] handle observes it.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Create another listening handle.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Cloneable listening side of the shutdown signal.
///
/// Every long wait in the relay (lock retries, send pacing, the poll sleep)
/// goes through [`Shutdown::sleep`] so a termination request is noticed
/// promptly instead of after the full delay.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Create a connected trigger / listener pair.
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// A handle that never fires.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested. Never resolves if the trigger was dropped unfired.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `duration` unless shutdown is requested first.
    ///
    /// Returns `true` if the full duration elapsed, `false` if interrupted.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        tokio::select! {
            biased;
            () = self.wait() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}
