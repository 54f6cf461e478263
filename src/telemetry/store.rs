//! # Telemetry Store
//!
//! Holds the single current [`TelemetrySnapshot`].
//!
//! Each publish swaps in a whole new `Arc<TelemetrySnapshot>`; readers clone
//! the `Arc` and keep a complete snapshot from exactly one publish for as long
//! as they hold it. Writing is only possible through the one
//! [`TelemetryPublisher`] returned by [`channel`].

use std::sync::Arc;

use tokio::sync::watch;

use super::TelemetrySnapshot;

/// Create the store, seeded with `initial`
///
/// # Examples
///
/// ```
/// use energy_node::telemetry::{store, TelemetrySnapshot};
///
/// let (publisher, reader) = store::channel(TelemetrySnapshot::initial(50.0, 0));
/// let mut next = *reader.read();
/// next.timestamp = 10;
/// publisher.publish(next);
/// assert_eq!(reader.read().timestamp, 10);
/// ```
pub fn channel(initial: TelemetrySnapshot) -> (TelemetryPublisher, TelemetryStore) {
    let (tx, rx) = watch::channel(Arc::new(initial));
    (TelemetryPublisher { tx }, TelemetryStore { rx })
}

/// Single writer side of the store
#[derive(Debug)]
pub struct TelemetryPublisher {
    tx: watch::Sender<Arc<TelemetrySnapshot>>,
}

impl TelemetryPublisher {
    /// Replace the current snapshot
    ///
    /// Timestamps never go backwards: a snapshot stamped earlier than the one
    /// it replaces takes over the current timestamp.
    pub fn publish(&self, mut snapshot: TelemetrySnapshot) {
        let previous = self.tx.borrow().timestamp;
        snapshot.timestamp = snapshot.timestamp.max(previous);
        self.tx.send_replace(Arc::new(snapshot));
    }

    /// Most recently published snapshot
    pub fn current(&self) -> Arc<TelemetrySnapshot> {
        self.tx.borrow().clone()
    }
}

/// Reader side of the store; cheap to clone
#[derive(Debug, Clone)]
pub struct TelemetryStore {
    rx: watch::Receiver<Arc<TelemetrySnapshot>>,
}

impl TelemetryStore {
    /// Latest published snapshot
    pub fn read(&self) -> Arc<TelemetrySnapshot> {
        self.rx.borrow().clone()
    }

    /// Wait until a snapshot newer than the last one seen by this handle is published
    ///
    /// Returns `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<Arc<TelemetrySnapshot>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
