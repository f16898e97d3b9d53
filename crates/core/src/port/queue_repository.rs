// Queue Repository Port (Interface)

use crate::domain::{EntryId, EntryStatus, PartitionKey, QueueEntry};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for QueueEntry persistence.
///
/// Admission goes through [`crate::port::TransactionalQueueRepository`];
/// this trait covers reads and the per-entry status compare-and-swap.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Find entry by ID
    async fn find_by_id(&self, id: &EntryId) -> Result<Option<QueueEntry>>;

    /// Find the active (non-terminal) entry for an appointment, if any
    async fn find_active_by_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<QueueEntry>>;

    /// Active entries of a partition ordered by queue_number ascending
    async fn list_active(&self, partition: &PartitionKey) -> Result<Vec<QueueEntry>>;

    /// Lowest-numbered WAITING entry of a partition
    async fn next_waiting(&self, partition: &PartitionKey) -> Result<Option<QueueEntry>>;

    /// Status compare-and-swap: apply `to` only if the stored status still
    /// equals `from`. Returns false when the caller lost a race or the entry
    /// does not exist; the caller re-reads to tell the two apart.
    async fn transition_status(
        &self,
        id: &EntryId,
        from: EntryStatus,
        to: EntryStatus,
        now_millis: i64,
    ) -> Result<bool>;

    /// Number of active entries ahead of the given queue_number in a partition
    async fn count_active_ahead(
        &self,
        partition: &PartitionKey,
        queue_number: i64,
    ) -> Result<i64>;

    /// Count entries of a partition by status
    async fn count_by_status(
        &self,
        partition: &PartitionKey,
        status: EntryStatus,
    ) -> Result<i64>;
}
