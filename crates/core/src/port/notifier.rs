// Change Notification Port

use crate::domain::{AppointmentId, EntryId, EntryStatus, PartitionKey};
use serde::Serialize;
use tokio::sync::broadcast;

/// Summary of one committed admission or transition
#[derive(Debug, Clone, Serialize)]
pub struct QueueChange {
    pub partition: PartitionKey,
    pub entry_id: EntryId,
    pub appointment_id: AppointmentId,
    pub status: EntryStatus,
    pub committed_at: i64, // epoch ms
}

/// Outbound notification interface.
///
/// Delivery is at-least-once and unordered across partitions; subscribers
/// that need exact state re-query the store.
pub trait ChangeNotifier: Send + Sync {
    fn publish(&self, change: QueueChange);
}

/// Tokio broadcast-backed notifier. Lagging subscribers lose the oldest
/// messages rather than blocking committers.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<QueueChange>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueChange> {
        self.tx.subscribe()
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn publish(&self, change: QueueChange) {
        // Err means no subscribers right now; changes are not buffered for
        // consumers that have not subscribed yet.
        let _ = self.tx.send(change);
    }
}
