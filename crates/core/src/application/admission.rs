// Admission Use Case (Sequencer)

use crate::domain::{PartitionKey, QueueEntry};
use crate::error::Result;
use crate::port::{IdProvider, TimeProvider, TransactionalQueueRepository};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized admission request produced by the ingestor (or staff RPC)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmitRequest {
    pub appointment_id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    pub clinic_day: NaiveDate,
    pub session: String,
}

/// Result of an admission. Redelivery of an already-queued appointment is
/// not an error; the caller gets the original entry back.
#[derive(Debug, Clone)]
pub enum AdmissionOutcome {
    Admitted(QueueEntry),
    AlreadyQueued(QueueEntry),
}

impl AdmissionOutcome {
    pub fn entry(&self) -> &QueueEntry {
        match self {
            AdmissionOutcome::Admitted(e) | AdmissionOutcome::AlreadyQueued(e) => e,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, AdmissionOutcome::Admitted(_))
    }
}

/// Execute admission (with transaction for atomicity)
///
/// The idempotency check, the queue-number reservation and the insert share
/// one store transaction: concurrent admissions of the same partition
/// serialize on the counter row and never receive the same number, and a
/// duplicate event collapses to the existing active entry.
///
/// # Arguments
///
/// * `repo` - Transactional queue repository
/// * `id_provider` - ID generator (injected for determinism)
/// * `time_provider` - Time provider (injected for determinism)
/// * `req` - Normalized admission request
pub async fn execute(
    repo: &dyn TransactionalQueueRepository,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: AdmitRequest,
) -> Result<AdmissionOutcome> {
    let mut tx = repo.begin_transaction().await?;

    // At-least-once delivery makes redelivery normal; return the live entry
    if let Some(existing) = tx.find_active_by_appointment(&req.appointment_id).await? {
        tx.rollback().await?;
        return Ok(AdmissionOutcome::AlreadyQueued(existing));
    }

    let partition = PartitionKey::new(req.clinic_day, req.session.clone());
    let queue_number = tx.reserve_queue_number(&partition).await?;

    let entry = QueueEntry::new(
        id_provider.generate_id(),
        time_provider.now_millis(),
        req.appointment_id,
        req.patient_id,
        req.doctor_id,
        req.clinic_day,
        req.session,
        queue_number,
    );

    tx.insert(&entry).await?;
    tx.commit().await?;

    Ok(AdmissionOutcome::Admitted(entry))
}
