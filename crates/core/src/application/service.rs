// Queue Service - Query/Notification Facade

use crate::application::admission::{self, AdmissionOutcome, AdmitRequest};
use crate::application::transition;
use crate::domain::{EntryId, EntryStatus, PartitionKey, QueueEntry};
use crate::error::{AppError, Result};
use crate::port::{
    BroadcastNotifier, ChangeNotifier, IdProvider, QueueChange, QueueRepository, TimeProvider,
    TransactionalQueueRepository,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// How often call_next retries after losing the WAITING->CALLED race to a
/// concurrent staff client before giving up.
const CALL_NEXT_MAX_ATTEMPTS: usize = 8;

/// Position of an appointment in its partition
#[derive(Debug, Clone)]
pub struct QueuePosition {
    pub entry: QueueEntry,
    /// 1-based position among active entries
    pub position: i64,
    /// Active entries with a lower queue number
    pub ahead: i64,
}

/// Facade over admission, transitions and ordered reads. Every committed
/// write publishes a [`QueueChange`] to subscribers.
pub struct QueueService {
    tx_repo: Arc<dyn TransactionalQueueRepository>,
    repo: Arc<dyn QueueRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    notifier: Arc<BroadcastNotifier>,
}

impl QueueService {
    pub fn new(
        tx_repo: Arc<dyn TransactionalQueueRepository>,
        repo: Arc<dyn QueueRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        notifier: Arc<BroadcastNotifier>,
    ) -> Self {
        Self {
            tx_repo,
            repo,
            id_provider,
            time_provider,
            notifier,
        }
    }

    /// Admit an appointment; idempotent per appointment_id
    pub async fn admit(&self, req: AdmitRequest) -> Result<AdmissionOutcome> {
        let outcome = admission::execute(
            self.tx_repo.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await?;

        if let AdmissionOutcome::Admitted(entry) = &outcome {
            info!(
                entry_id = %entry.id,
                appointment_id = %entry.appointment_id,
                partition = %entry.partition(),
                queue_number = entry.queue_number,
                "Admitted queue entry"
            );
            self.publish(entry);
        }
        Ok(outcome)
    }

    /// Active entries of a partition, ordered by queue number
    pub async fn list_active(&self, partition: &PartitionKey) -> Result<Vec<QueueEntry>> {
        self.repo.list_active(partition).await
    }

    pub async fn find_entry(&self, id: &EntryId) -> Result<Option<QueueEntry>> {
        self.repo.find_by_id(id).await
    }

    /// Position and count-ahead of an active appointment
    pub async fn position_of(&self, appointment_id: &str) -> Result<QueuePosition> {
        let entry = self
            .repo
            .find_active_by_appointment(appointment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No active queue entry for appointment {}",
                    appointment_id
                ))
            })?;

        let ahead = self
            .repo
            .count_active_ahead(&entry.partition(), entry.queue_number)
            .await?;

        Ok(QueuePosition {
            entry,
            position: ahead + 1,
            ahead,
        })
    }

    /// Call the lowest-numbered waiting entry of a partition.
    ///
    /// Racing callers each win a distinct entry: a caller that loses the
    /// CAS simply moves on to the following waiting entry.
    pub async fn call_next(&self, partition: &PartitionKey) -> Result<QueueEntry> {
        for _ in 0..CALL_NEXT_MAX_ATTEMPTS {
            let next = match self.repo.next_waiting(partition).await? {
                Some(entry) => entry,
                None => return Err(AppError::EmptyQueue(partition.to_string())),
            };

            let now = self.time_provider.now_millis();
            if self
                .repo
                .transition_status(&next.id, EntryStatus::Waiting, EntryStatus::Called, now)
                .await?
            {
                let mut entry = next;
                entry.transition(EntryStatus::Called, now)?;
                info!(
                    entry_id = %entry.id,
                    partition = %partition,
                    queue_number = entry.queue_number,
                    "Called next entry"
                );
                self.publish(&entry);
                return Ok(entry);
            }
            // Another client called that entry first; take the one after it
        }

        Err(AppError::Conflict(format!(
            "call_next contended in partition {}",
            partition
        )))
    }

    /// Apply a status transition to an entry
    pub async fn transition(
        &self,
        entry_id: &EntryId,
        target: EntryStatus,
    ) -> Result<QueueEntry> {
        let entry = transition::execute(
            self.repo.as_ref(),
            self.time_provider.as_ref(),
            entry_id,
            target,
        )
        .await?;

        info!(
            entry_id = %entry.id,
            partition = %entry.partition(),
            status = %entry.status,
            "Entry status changed"
        );
        self.publish(&entry);
        Ok(entry)
    }

    /// Count entries of a partition by status
    pub async fn count_by_status(
        &self,
        partition: &PartitionKey,
        status: EntryStatus,
    ) -> Result<i64> {
        self.repo.count_by_status(partition, status).await
    }

    /// Subscribe to committed queue changes
    pub fn subscribe(&self) -> broadcast::Receiver<QueueChange> {
        self.notifier.subscribe()
    }

    fn publish(&self, entry: &QueueEntry) {
        self.notifier.publish(QueueChange {
            partition: entry.partition(),
            entry_id: entry.id.clone(),
            appointment_id: entry.appointment_id.clone(),
            status: entry.status,
            committed_at: self.time_provider.now_millis(),
        });
    }
}
