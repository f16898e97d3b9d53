// Event Ingestor - broker consumption loop

#[cfg(test)]
mod normalize_test;

use crate::application::admission::{AdmissionOutcome, AdmitRequest};
use crate::application::backoff::Backoff;
use crate::application::service::QueueService;
use crate::application::shutdown::ShutdownToken;
use crate::domain::{AppointmentInfo, ClinicCalendar, SessionSet};
use crate::error::{AppError, Result};
use crate::port::{Delivery, EventSource, TimeProvider};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Validation and normalization rules applied to every inbound event
#[derive(Debug, Clone)]
pub struct IngestPolicy {
    sessions: SessionSet,
    calendar: ClinicCalendar,
    /// How far in the past a start_time may lie before the event is rejected
    grace_window_ms: i64,
}

impl IngestPolicy {
    pub fn new(sessions: SessionSet, calendar: ClinicCalendar, grace_window_ms: i64) -> Self {
        Self {
            sessions,
            calendar,
            grace_window_ms,
        }
    }

    pub fn sessions(&self) -> &SessionSet {
        &self.sessions
    }

    pub fn calendar(&self) -> ClinicCalendar {
        self.calendar
    }

    /// Validate an inbound event and normalize it into an admission request.
    ///
    /// Failures are `InvalidEvent` and end in the dead-letter queue; they
    /// never crash the ingest loop.
    pub fn normalize(&self, info: &AppointmentInfo, now_millis: i64) -> Result<AdmitRequest> {
        if info.appointment_id.trim().is_empty() {
            return Err(AppError::InvalidEvent(
                "appointment_id must not be empty".to_string(),
            ));
        }
        if info.patient_id.trim().is_empty() {
            return Err(AppError::InvalidEvent(
                "patient_id must not be empty".to_string(),
            ));
        }

        let session = self
            .sessions
            .resolve(info.session.as_deref())
            .map_err(|e| AppError::InvalidEvent(e.to_string()))?
            .to_string();

        if let Some(start_time) = info.start_time {
            let start_millis = start_time.timestamp_millis();
            if start_millis < now_millis - self.grace_window_ms {
                return Err(AppError::InvalidEvent(format!(
                    "start_time {} is past the grace window",
                    start_time.to_rfc3339()
                )));
            }
        }

        Ok(AdmitRequest {
            appointment_id: info.appointment_id.clone(),
            patient_id: info.patient_id.clone(),
            doctor_id: info.doctor_id.clone(),
            clinic_day: self.calendar.day_of(now_millis),
            session,
        })
    }
}

/// Consumes appointment-ready deliveries and drives them through admission.
///
/// Settlement contract: ack only after the admission transaction committed
/// (or the duplicate was resolved), reject invalid payloads to the
/// dead-letter queue, requeue on transient store failure. Unacknowledged
/// deliveries are the backpressure that stops ingestion from outrunning
/// the store.
pub struct Ingestor {
    source: Arc<dyn EventSource>,
    service: Arc<QueueService>,
    policy: IngestPolicy,
    time_provider: Arc<dyn TimeProvider>,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn EventSource>,
        service: Arc<QueueService>,
        policy: IngestPolicy,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            source,
            service,
            policy,
            time_provider,
        }
    }

    /// Run the ingest loop until shutdown or source close
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!("Ingestor started");
        let mut backoff = Backoff::new(250, 30_000);

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            let delivery = tokio::select! {
                next = self.source.next() => next?,
                _ = shutdown.wait() => break,
            };

            let Some(delivery) = delivery else {
                info!("Event source closed, ingestor stopping");
                break;
            };

            self.handle_delivery(delivery, &mut backoff).await?;
        }

        info!("Ingestor stopped");
        Ok(())
    }

    async fn handle_delivery(&self, delivery: Delivery, backoff: &mut Backoff) -> Result<()> {
        let tag = delivery.tag;

        let info: AppointmentInfo = match serde_json::from_value(delivery.payload) {
            Ok(info) => info,
            Err(e) => {
                warn!(tag, error = %e, "Undecodable appointment event, dead-lettering");
                return self.source.reject(tag).await;
            }
        };

        let now = self.time_provider.now_millis();
        let req = match self.policy.normalize(&info, now) {
            Ok(req) => req,
            Err(e) => {
                warn!(
                    tag,
                    appointment_id = %info.appointment_id,
                    error = %e,
                    "Invalid appointment event, dead-lettering"
                );
                return self.source.reject(tag).await;
            }
        };

        match self.service.admit(req).await {
            Ok(AdmissionOutcome::Admitted(entry)) => {
                debug!(tag, entry_id = %entry.id, "Admission committed, acking delivery");
                backoff.reset();
                self.source.ack(tag).await
            }
            Ok(AdmissionOutcome::AlreadyQueued(entry)) => {
                // At-least-once redelivery; the original entry stands
                debug!(
                    tag,
                    entry_id = %entry.id,
                    appointment_id = %entry.appointment_id,
                    "Duplicate admission event, acking redelivery"
                );
                backoff.reset();
                self.source.ack(tag).await
            }
            Err(e) if e.is_retryable() => {
                let delay = backoff.next_delay();
                warn!(
                    tag,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Store unavailable, requeueing delivery"
                );
                self.source.requeue(tag).await?;
                sleep(delay).await;
                Ok(())
            }
            Err(e) => {
                error!(tag, error = %e, "Admission rejected, dead-lettering");
                self.source.reject(tag).await
            }
        }
    }
}
