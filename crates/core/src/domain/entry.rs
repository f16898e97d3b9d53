// Queue Entry Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::partition::PartitionKey;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Queue entry ID (UUID v4)
pub type EntryId = String;

/// Opaque appointment identifier issued by the external appointment service
pub type AppointmentId = String;

/// Patient identifier
pub type PatientId = String;

/// Inbound appointment-ready event, exactly as delivered by the broker.
/// Received, never mutated by this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentInfo {
    pub appointment_id: AppointmentId,
    pub patient_id: PatientId,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub session: Option<String>,
}

/// Queue entry lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Waiting,
    Called,
    InProgress,
    Done,
    Skipped,
}

impl EntryStatus {
    /// Legal-transition table. WAITING -> {CALLED, SKIPPED},
    /// CALLED -> {IN_PROGRESS, SKIPPED}, IN_PROGRESS -> DONE.
    /// Terminal states (DONE, SKIPPED) are never left.
    pub fn can_transition_to(self, target: EntryStatus) -> bool {
        use EntryStatus::*;
        matches!(
            (self, target),
            (Waiting, Called)
                | (Waiting, Skipped)
                | (Called, InProgress)
                | (Called, Skipped)
                | (InProgress, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EntryStatus::Done | EntryStatus::Skipped)
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "WAITING" => Ok(EntryStatus::Waiting),
            "CALLED" => Ok(EntryStatus::Called),
            "IN_PROGRESS" => Ok(EntryStatus::InProgress),
            "DONE" => Ok(EntryStatus::Done),
            "SKIPPED" => Ok(EntryStatus::Skipped),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryStatus::Waiting => write!(f, "WAITING"),
            EntryStatus::Called => write!(f, "CALLED"),
            EntryStatus::InProgress => write!(f, "IN_PROGRESS"),
            EntryStatus::Done => write!(f, "DONE"),
            EntryStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Queue Entry Entity
///
/// Owned exclusively by the queue store. Everything except `status`,
/// `called_at` and `finished_at` is immutable after admission; `status`
/// changes only through the compare-and-swap in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub appointment_id: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_id: Option<String>,

    // Partition key
    pub clinic_day: NaiveDate,
    pub session: String,

    /// Assigned once by the sequencer; unique within (clinic_day, session)
    pub queue_number: i64,

    pub status: EntryStatus,

    pub created_at: i64, // epoch ms
    pub called_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl QueueEntry {
    /// Create a freshly-admitted entry
    ///
    /// # Arguments
    ///
    /// * `id` - Unique entry ID (injected, not generated)
    /// * `created_at` - Admission timestamp in epoch ms (injected, not system time)
    /// * `clinic_day` / `session` - Partition the sequencer numbered within
    /// * `queue_number` - Number reserved by the sequencer
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        appointment_id: impl Into<String>,
        patient_id: impl Into<String>,
        doctor_id: Option<String>,
        clinic_day: NaiveDate,
        session: impl Into<String>,
        queue_number: i64,
    ) -> Self {
        Self {
            id: id.into(),
            appointment_id: appointment_id.into(),
            patient_id: patient_id.into(),
            doctor_id,
            clinic_day,
            session: session.into(),
            queue_number,
            status: EntryStatus::Waiting,
            created_at,
            called_at: None,
            finished_at: None,
        }
    }

    pub fn partition(&self) -> PartitionKey {
        PartitionKey::new(self.clinic_day, self.session.clone())
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Apply a status transition with explicit timestamp.
    ///
    /// In-memory counterpart of the store's conditional update; the store
    /// CAS remains the authority under concurrency.
    pub fn transition(&mut self, target: EntryStatus, now_millis: i64) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::IllegalTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        match target {
            EntryStatus::Called => self.called_at = Some(now_millis),
            t if t.is_terminal() => self.finished_at = Some(now_millis),
            _ => {}
        }
        self.status = target;
        Ok(())
    }
}

impl QueueEntry {
    /// Create a test entry with deterministic ID, timestamp and number.
    ///
    /// **Note**: tests only. Production code injects ID and time via
    /// providers and numbers via the sequencer.
    pub fn new_test(
        appointment_id: impl Into<String>,
        session: impl Into<String>,
        queue_number: i64,
    ) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let appointment_id = appointment_id.into();
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        Self::new(
            format!("entry-{}", counter),
            (counter * 1000) as i64,
            appointment_id.clone(),
            format!("patient-for-{}", appointment_id),
            None,
            day,
            session,
            queue_number,
        )
    }
}
