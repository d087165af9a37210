//! Shutdown coordination for the relay.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

use crate::relay::body::ShutdownSignal;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Debug)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    /// Set before broadcasting, so late subscribers still see the shutdown.
    triggered: AtomicBool,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// A boxed future resolving on shutdown, for relay streams.
    ///
    /// Resolves immediately when shutdown was already triggered, and also
    /// if the coordinator itself is dropped.
    pub fn signal(&self) -> ShutdownSignal {
        let mut rx = self.subscribe();
        let triggered = self.is_triggered();
        Box::pin(async move {
            if !triggered {
                let _ = rx.recv().await;
            }
        })
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    /// Whether shutdown has been triggered.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
