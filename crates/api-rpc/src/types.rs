//! RPC Request/Response Types

use clinicq_core::domain::QueueEntry;
use serde::{Deserialize, Serialize};

/// Pre-verified identity claims attached to every request by the gateway.
/// Verification happens in the external auth service; these are trusted.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub subject: String,
    pub role: String,
}

/// Wire view of a queue entry
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub id: String,
    pub appointment_id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    pub clinic_day: String,
    pub session: String,
    pub queue_number: i64,
    pub status: String,
    pub created_at: i64,
    pub called_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl From<QueueEntry> for EntryView {
    fn from(entry: QueueEntry) -> Self {
        Self {
            id: entry.id,
            appointment_id: entry.appointment_id,
            patient_id: entry.patient_id,
            doctor_id: entry.doctor_id,
            clinic_day: entry.clinic_day.to_string(),
            session: entry.session,
            queue_number: entry.queue_number,
            status: entry.status.to_string(),
            created_at: entry.created_at,
            called_at: entry.called_at,
            finished_at: entry.finished_at,
        }
    }
}

/// queue.admit.v1 - Staff walk-in admission
#[derive(Debug, Deserialize)]
pub struct AdmitRequest {
    pub auth: Claims,
    pub appointment_id: String,
    pub patient_id: String,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdmitResponse {
    pub entry: EntryView,
    /// true when the appointment was already queued (idempotent admission)
    pub already_queued: bool,
}

/// queue.list.v1 - Ordered active queue of a partition
#[derive(Debug, Deserialize)]
pub struct ListQueueRequest {
    pub auth: Claims,
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListQueueResponse {
    pub partition: String,
    pub entries: Vec<EntryView>,
}

/// queue.position.v1 - Position of an appointment in its partition
#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub auth: Claims,
    pub appointment_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionResponse {
    pub entry_id: String,
    pub partition: String,
    pub queue_number: i64,
    pub position: i64,
    pub ahead: i64,
}

/// queue.call_next.v1 - Call the lowest-numbered waiting entry
#[derive(Debug, Deserialize)]
pub struct CallNextRequest {
    pub auth: Claims,
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallNextResponse {
    pub entry: EntryView,
}

/// queue.transition.v1 - Apply a status transition
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub auth: Claims,
    pub entry_id: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionResponse {
    pub entry: EntryView,
}

/// admin.stats.v1 - Per-status counts of a partition
#[derive(Debug, Deserialize)]
pub struct StatsRequest {
    pub auth: Claims,
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub partition: String,
    pub waiting: i64,
    pub called: i64,
    pub in_progress: i64,
    pub done: i64,
    pub skipped: i64,
}
