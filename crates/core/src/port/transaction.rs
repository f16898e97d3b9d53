// Transaction port for atomic admission

use crate::domain::{PartitionKey, QueueEntry};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Entry point for transactional admission
#[async_trait]
pub trait TransactionalQueueRepository: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<Box<dyn QueueTransaction>>;
}

/// Queue store operations that must share one transaction.
///
/// Reserve-number and insert commit together, so a crash in between never
/// publishes a number without its row; duplicates are impossible, gaps are
/// acceptable.
#[async_trait]
pub trait QueueTransaction: Transaction {
    /// Idempotency check (within transaction)
    async fn find_active_by_appointment(
        &mut self,
        appointment_id: &str,
    ) -> Result<Option<QueueEntry>>;

    /// Atomically reserve the next queue number of a partition
    async fn reserve_queue_number(&mut self, partition: &PartitionKey) -> Result<i64>;

    /// Insert entry (within transaction)
    async fn insert(&mut self, entry: &QueueEntry) -> Result<()>;
}
