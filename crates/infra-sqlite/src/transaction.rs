// SQLite Transaction Implementation (admission path)

use async_trait::async_trait;
use clinicq_core::domain::{PartitionKey, QueueEntry};
use clinicq_core::error::Result;
use clinicq_core::port::{QueueTransaction, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};

use crate::queue_repository::{map_sqlx_error, EntryRow};

pub struct SqliteQueueTransaction<'a> {
    tx: SqlxTransaction<'a, Sqlite>,
}

impl<'a> SqliteQueueTransaction<'a> {
    pub fn new(tx: SqlxTransaction<'a, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for SqliteQueueTransaction<'_> {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl QueueTransaction for SqliteQueueTransaction<'_> {
    async fn find_active_by_appointment(
        &mut self,
        appointment_id: &str,
    ) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT * FROM queue_entries \
             WHERE appointment_id = ? AND status NOT IN ('DONE', 'SKIPPED')",
        )
        .bind(appointment_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|r| r.into_entry()).transpose()
    }

    async fn reserve_queue_number(&mut self, partition: &PartitionKey) -> Result<i64> {
        // Atomic reserve: the counter row is the per-partition serialization
        // point. Committing together with the insert means a crash in
        // between can burn a number (gap) but never duplicate one.
        let number: i64 = sqlx::query_scalar(
            "INSERT INTO queue_counters (clinic_day, session, last_number) \
             VALUES (?, ?, 1) \
             ON CONFLICT (clinic_day, session) \
             DO UPDATE SET last_number = last_number + 1 \
             RETURNING last_number",
        )
        .bind(partition.clinic_day)
        .bind(&partition.session)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(number)
    }

    async fn insert(&mut self, entry: &QueueEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO queue_entries ( \
                id, appointment_id, patient_id, doctor_id, \
                clinic_day, session, queue_number, status, \
                created_at, called_at, finished_at \
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.appointment_id)
        .bind(&entry.patient_id)
        .bind(&entry.doctor_id)
        .bind(entry.clinic_day)
        .bind(&entry.session)
        .bind(entry.queue_number)
        .bind(entry.status.to_string())
        .bind(entry.created_at)
        .bind(entry.called_at)
        .bind(entry.finished_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
