// SQLite QueueRepository Implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use clinicq_core::domain::{EntryId, EntryStatus, PartitionKey, QueueEntry};
use clinicq_core::error::{AppError, Result};
use clinicq_core::port::{QueueRepository, QueueTransaction, TransactionalQueueRepository};
use sqlx::SqlitePool;

use crate::SqliteQueueTransaction;

// Helper to convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => {
                        // UNIQUE constraint failed - an admission race lost
                        // against the partial active-appointment index or
                        // the (partition, queue_number) index
                        AppError::Conflict(format!(
                            "Unique constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "5" | "6" => {
                        // SQLITE_BUSY / SQLITE_LOCKED - transient, retryable
                        AppError::StoreUnavailable(format!(
                            "Database locked: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::PoolTimedOut => {
            AppError::StoreUnavailable("Connection pool acquire timed out".to_string())
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        _ => AppError::Database(err.to_string()),
    }
}

const TERMINAL_STATUSES: &str = "('DONE', 'SKIPPED')";

pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn find_by_id(&self, id: &EntryId) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>("SELECT * FROM queue_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(|r| r.into_entry()).transpose()
    }

    async fn find_active_by_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT * FROM queue_entries \
             WHERE appointment_id = ? AND status NOT IN {TERMINAL_STATUSES}"
        ))
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|r| r.into_entry()).transpose()
    }

    async fn list_active(&self, partition: &PartitionKey) -> Result<Vec<QueueEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "SELECT * FROM queue_entries \
             WHERE clinic_day = ? AND session = ? AND status NOT IN {TERMINAL_STATUSES} \
             ORDER BY queue_number ASC"
        ))
        .bind(partition.clinic_day)
        .bind(&partition.session)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(|r| r.into_entry()).collect()
    }

    async fn next_waiting(&self, partition: &PartitionKey) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT * FROM queue_entries \
             WHERE clinic_day = ? AND session = ? AND status = 'WAITING' \
             ORDER BY queue_number ASC LIMIT 1",
        )
        .bind(partition.clinic_day)
        .bind(&partition.session)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|r| r.into_entry()).transpose()
    }

    async fn transition_status(
        &self,
        id: &EntryId,
        from: EntryStatus,
        to: EntryStatus,
        now_millis: i64,
    ) -> Result<bool> {
        // Compare-and-swap: the WHERE clause on the prior status makes
        // exactly one of two racing transitions win.
        let query = if to == EntryStatus::Called {
            sqlx::query(
                "UPDATE queue_entries SET status = ?, called_at = ? \
                 WHERE id = ? AND status = ?",
            )
            .bind(to.to_string())
            .bind(now_millis)
        } else if to.is_terminal() {
            sqlx::query(
                "UPDATE queue_entries SET status = ?, finished_at = ? \
                 WHERE id = ? AND status = ?",
            )
            .bind(to.to_string())
            .bind(now_millis)
        } else {
            sqlx::query("UPDATE queue_entries SET status = ? WHERE id = ? AND status = ?")
                .bind(to.to_string())
        };

        let result = query
            .bind(id)
            .bind(from.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_active_ahead(
        &self,
        partition: &PartitionKey,
        queue_number: i64,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM queue_entries \
             WHERE clinic_day = ? AND session = ? AND queue_number < ? \
               AND status NOT IN {TERMINAL_STATUSES}"
        ))
        .bind(partition.clinic_day)
        .bind(&partition.session)
        .bind(queue_number)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count)
    }

    async fn count_by_status(
        &self,
        partition: &PartitionKey,
        status: EntryStatus,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM queue_entries \
             WHERE clinic_day = ? AND session = ? AND status = ?",
        )
        .bind(partition.clinic_day)
        .bind(&partition.session)
        .bind(status.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count)
    }
}

#[async_trait]
impl TransactionalQueueRepository for SqliteQueueRepository {
    async fn begin_transaction(&self) -> Result<Box<dyn QueueTransaction>> {
        // Take the write lock up front. A deferred transaction that reads
        // before writing can fail with SQLITE_BUSY_SNAPSHOT, which the busy
        // timeout never retries.
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteQueueTransaction::new(tx)))
    }
}

/// SQLite row representation of a queue entry
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntryRow {
    id: String,
    appointment_id: String,
    patient_id: String,
    doctor_id: Option<String>,
    clinic_day: NaiveDate,
    session: String,
    queue_number: i64,
    status: String,
    created_at: i64,
    called_at: Option<i64>,
    finished_at: Option<i64>,
}

impl EntryRow {
    pub(crate) fn into_entry(self) -> Result<QueueEntry> {
        let status = EntryStatus::parse(&self.status)?;

        Ok(QueueEntry {
            id: self.id,
            appointment_id: self.appointment_id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            clinic_day: self.clinic_day,
            session: self.session,
            queue_number: self.queue_number,
            status,
            created_at: self.created_at,
            called_at: self.called_at,
            finished_at: self.finished_at,
        })
    }
}
